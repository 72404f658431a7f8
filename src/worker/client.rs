use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex as SyncMutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use super::error::{WorkerError, WorkerResult};
use super::protocol::{methods, ConnectionParams, QueryParams, QueryResult, Reply, Request};
use crate::config::WorkerSettings;
use crate::sql::BoundQuery;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Replies are routed to their caller by request id. Once the connector
/// exits the table is closed and no new waiter can register.
///
/// Guarded by a std mutex: it is never held across an await, and the
/// [`WaiterSlot`] drop guard needs to lock it synchronously.
#[derive(Default)]
struct Waiters {
    slots: HashMap<String, oneshot::Sender<Reply>>,
    closed: bool,
}

type SharedWaiters = Arc<SyncMutex<Waiters>>;

fn lock(waiters: &SharedWaiters) -> MutexGuard<'_, Waiters> {
    waiters.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes its waiter when the request finishes, fails, times out, or the
/// caller drops the future mid-flight.
struct WaiterSlot<'a> {
    waiters: &'a SharedWaiters,
    id: &'a str,
}

impl Drop for WaiterSlot<'_> {
    fn drop(&mut self) {
        lock(self.waiters).slots.remove(self.id);
    }
}

/// Handle to a running connector process.
///
/// Requests are multiplexed over the child's stdin; a background task reads
/// stdout and hands each reply to the waiter registered under its id, so
/// any number of queries may be outstanding at once. Dropping the client
/// kills the child.
pub struct WorkerClient {
    stdin: Mutex<BufWriter<ChildStdin>>,
    waiters: SharedWaiters,
    reader: JoinHandle<()>,
    timeout: Duration,
    _child: Child,
}

impl WorkerClient {
    pub async fn spawn(program: impl AsRef<Path>) -> WorkerResult<Self> {
        Self::spawn_with(program, &[], DEFAULT_TIMEOUT).await
    }

    /// Start the connector named in `[warehouse.worker]`.
    pub async fn spawn_with_settings(settings: &WorkerSettings) -> WorkerResult<Self> {
        let Some(program) = settings.path.as_deref() else {
            return Err(WorkerError::Spawn(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no connector configured; set warehouse.worker.path",
            )));
        };
        Self::spawn_with(program, &settings.args, Duration::from_secs(settings.timeout_secs)).await
    }

    pub async fn spawn_with(
        program: impl AsRef<Path>,
        args: &[String],
        timeout: Duration,
    ) -> WorkerResult<Self> {
        let program = program.as_ref();
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(WorkerError::Spawn)?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(WorkerError::Spawn(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "connector stdio not captured",
            )));
        };

        let waiters = SharedWaiters::default();
        let reader = tokio::spawn(read_replies(stdout, Arc::clone(&waiters)));
        tracing::debug!(program = %program.display(), ?timeout, "started warehouse connector");

        Ok(Self {
            stdin: Mutex::new(BufWriter::new(stdin)),
            waiters,
            reader,
            timeout,
            _child: child,
        })
    }

    /// Run one query on the warehouse behind `connection`.
    pub async fn execute_query(
        &self,
        connection: &ConnectionParams,
        query: &BoundQuery,
    ) -> WorkerResult<QueryResult> {
        self.call(methods::EXECUTE_QUERY, QueryParams::new(connection, query))
            .await
    }

    /// Send a request and decode its result.
    ///
    /// Error replies are mapped onto [`WorkerError`] by code. A reply that
    /// arrives after the timeout is dropped.
    pub async fn call<P, R>(&self, method: &str, params: P) -> WorkerResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = uuid::Uuid::new_v4().to_string();
        let line = encode_line(&id, method, params)?;

        let (tx, rx) = oneshot::channel();
        {
            let mut waiters = lock(&self.waiters);
            if waiters.closed {
                return Err(WorkerError::Exited);
            }
            waiters.slots.insert(id.clone(), tx);
        }
        let _slot = WaiterSlot {
            waiters: &self.waiters,
            id: &id,
        };

        self.send(&line).await?;

        let reply = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(reply)) => reply,
            // The reader drops every waiter when the connector closes stdout.
            Ok(Err(_)) => return Err(WorkerError::Exited),
            Err(_) => return Err(WorkerError::Timeout(self.timeout)),
        };

        let value = reply.into_result()?;
        serde_json::from_value(value).map_err(WorkerError::Decode)
    }

    /// False once the connector has closed its stdout.
    pub fn is_alive(&self) -> bool {
        !self.reader.is_finished()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send(&self, line: &str) -> WorkerResult<()> {
        let mut stdin = self.stdin.lock().await;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(WorkerError::Write)?;
        stdin.flush().await.map_err(WorkerError::Write)
    }

    fn outstanding(&self) -> usize {
        lock(&self.waiters).slots.len()
    }
}

impl std::fmt::Debug for WorkerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerClient")
            .field("timeout", &self.timeout)
            .field("alive", &self.is_alive())
            .field("outstanding", &self.outstanding())
            .finish_non_exhaustive()
    }
}

fn encode_line<P: Serialize>(id: &str, method: &str, params: P) -> WorkerResult<String> {
    let request = Request {
        id,
        method,
        params: serde_json::to_value(params).map_err(WorkerError::Encode)?,
    };
    let mut line = serde_json::to_string(&request).map_err(WorkerError::Encode)?;
    line.push('\n');
    Ok(line)
}

async fn read_replies(stdout: ChildStdout, waiters: SharedWaiters) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match serde_json::from_str::<Reply>(&line) {
                Ok(reply) => {
                    let waiter = lock(&waiters).slots.remove(&reply.id);
                    if let Some(tx) = waiter {
                        let _ = tx.send(reply);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "ignoring unparsable connector output"),
            },
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "connector stdout read failed");
                break;
            }
        }
    }

    let orphaned = {
        let mut waiters = lock(&waiters);
        waiters.closed = true;
        let n = waiters.slots.len();
        waiters.slots.clear();
        n
    };
    if orphaned > 0 {
        tracing::warn!(orphaned, "connector exited with requests outstanding");
    } else {
        tracing::debug!("connector exited");
    }
}
