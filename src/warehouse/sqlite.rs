//! SQLite-backed query engine.
//!
//! Files are opened read-only; the engine never writes to the source data.
//! The connection sits behind a mutex and queries run on the blocking pool,
//! so concurrent probes are serialised. A probe whose caller gives up (the
//! validator's per-query timeout) is interrupted, or skipped if it has not
//! started yet, so it cannot hold the connection for later probes.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, InterruptHandle, OpenFlags};
use serde_json::Value;

use super::engine::{QueryEngine, Row};
use super::error::{WarehouseError, WarehouseResult};
use crate::sql::{BoundQuery, Dialect};

/// Query engine over a SQLite database.
#[derive(Clone)]
pub struct SqliteEngine {
    conn: Arc<Mutex<Connection>>,
    interrupt: Arc<InterruptHandle>,
}

impl SqliteEngine {
    /// Open a database file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> WarehouseResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| WarehouseError::Unreachable(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an existing connection (in-memory fixtures, attached databases).
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            interrupt: Arc::new(conn.get_interrupt_handle()),
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Queued,
    Running,
    Done,
    Abandoned,
}

/// Lifecycle of one blocking query, shared with the async caller.
///
/// Phase changes and the interrupt happen under the same lock, so an
/// interrupt only ever lands on the statement it was meant for.
struct QueryTicket {
    phase: Mutex<Phase>,
    interrupt: Arc<InterruptHandle>,
}

impl QueryTicket {
    fn phase(&self) -> std::sync::MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `Running` unless the caller already left.
    fn start(&self) -> bool {
        let mut phase = self.phase();
        if *phase == Phase::Abandoned {
            return false;
        }
        *phase = Phase::Running;
        true
    }

    fn finish(&self) {
        *self.phase() = Phase::Done;
    }

    fn abandon(&self) {
        let mut phase = self.phase();
        match *phase {
            Phase::Queued => *phase = Phase::Abandoned,
            Phase::Running => {
                self.interrupt.interrupt();
                *phase = Phase::Abandoned;
            }
            Phase::Done | Phase::Abandoned => {}
        }
    }
}

/// Abandons the ticket when the awaiting future is dropped.
struct AbandonOnDrop(Arc<QueryTicket>);

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        self.0.abandon();
    }
}

#[async_trait]
impl QueryEngine for SqliteEngine {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch(&self, query: &BoundQuery) -> WarehouseResult<Vec<Row>> {
        let conn = self.conn.clone();
        let query = query.clone();
        let ticket = Arc::new(QueryTicket {
            phase: Mutex::new(Phase::Queued),
            interrupt: Arc::clone(&self.interrupt),
        });
        let guard = AbandonOnDrop(Arc::clone(&ticket));

        let outcome = tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| WarehouseError::Unreachable("sqlite connection poisoned".into()))?;
            if !ticket.start() {
                return Err(WarehouseError::Query("abandoned before it started".into()));
            }
            let rows = run_query(&conn, &query);
            ticket.finish();
            rows
        })
        .await;

        drop(guard);
        outcome.map_err(|e| WarehouseError::Unreachable(format!("sqlite task failed: {e}")))?
    }
}

fn run_query(conn: &Connection, query: &BoundQuery) -> WarehouseResult<Vec<Row>> {
    let mut stmt = conn.prepare(&query.sql)?;
    let width = stmt.column_count();

    let rows = stmt
        .query_map(rusqlite::params_from_iter(query.args.iter()), |row| {
            (0..width)
                .map(|i| row.get_ref(i).map(to_json))
                .collect::<Result<Row, _>>()
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) | ValueRef::Blob(t) => {
            Value::String(String::from_utf8_lossy(t).into_owned())
        }
    }
}
