//! Reading and writing checkpoint files.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::{CheckpointError, CheckpointResult};
use super::row::ValidationRow;
use super::{CANDIDATES_FILE, DIAGRAM_FILE, HTML_FILE, SCHEMA_FILE, VALIDATION_FILE};
use crate::keys::{ColumnRef, KeyCandidate, ValidatedCandidate};
use crate::validate::ValidationObserver;

/// A directory of stage checkpoints.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    pub fn exists(&self, file: &str) -> bool {
        self.path(file).is_file()
    }

    /// Delete a checkpoint so the stage recomputes. Missing files are fine.
    pub fn remove(&self, file: &str) -> CheckpointResult<()> {
        let path = self.path(file);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CheckpointError::io(path, e)),
        }
    }

    pub fn save_schema(&self, columns: &[ColumnRef]) -> CheckpointResult<()> {
        self.write_records(SCHEMA_FILE, columns)
    }

    pub fn load_schema(&self) -> CheckpointResult<Vec<ColumnRef>> {
        self.read_records(SCHEMA_FILE)
    }

    pub fn save_candidates(&self, candidates: &[KeyCandidate]) -> CheckpointResult<()> {
        self.write_records(CANDIDATES_FILE, candidates)
    }

    pub fn load_candidates(&self) -> CheckpointResult<Vec<KeyCandidate>> {
        self.read_records(CANDIDATES_FILE)
    }

    /// Replace `validation.csv` with a complete result set.
    pub fn save_validation(&self, rows: &[ValidatedCandidate]) -> CheckpointResult<()> {
        let flat: Vec<ValidationRow> = rows.iter().map(ValidationRow::from).collect();
        self.write_records(VALIDATION_FILE, &flat)
    }

    /// Read `validation.csv`, which may be a partial run's output.
    ///
    /// Rows that do not parse are skipped.
    pub fn load_validation(&self) -> CheckpointResult<Vec<ValidatedCandidate>> {
        let path = self.path(VALIDATION_FILE);
        let mut reader = self.reader(&path)?;
        let mut rows = Vec::new();
        for (line, record) in reader.deserialize::<ValidationRow>().enumerate() {
            match record {
                Ok(row) => rows.push(row.into()),
                Err(e) => tracing::warn!(path = %path.display(), line = line + 2, error = %e, "skipping unreadable row"),
            }
        }
        Ok(rows)
    }

    /// Open `validation.csv` for appending, writing a header if it is new.
    pub fn validation_writer(&self) -> CheckpointResult<ValidationWriter> {
        self.ensure_dir()?;
        let path = self.path(VALIDATION_FILE);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| CheckpointError::io(&path, e))?;
        let is_new = file
            .metadata()
            .map_err(|e| CheckpointError::io(&path, e))?
            .len()
            == 0;

        let writer = csv::WriterBuilder::new().has_headers(is_new).from_writer(file);
        Ok(ValidationWriter {
            writer,
            path,
            written: 0,
            error: None,
        })
    }

    pub fn save_diagram(&self, mermaid: &str, html: &str) -> CheckpointResult<()> {
        self.write_text(DIAGRAM_FILE, mermaid)?;
        self.write_text(HTML_FILE, html)
    }

    pub fn load_diagram(&self) -> CheckpointResult<String> {
        let path = self.path(DIAGRAM_FILE);
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CheckpointError::NotFound(path),
            _ => CheckpointError::io(path, e),
        })
    }

    fn ensure_dir(&self) -> CheckpointResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| CheckpointError::io(&self.dir, e))
    }

    fn reader(&self, path: &Path) -> CheckpointResult<csv::Reader<File>> {
        if !path.is_file() {
            return Err(CheckpointError::NotFound(path.to_path_buf()));
        }
        csv::Reader::from_path(path).map_err(|e| CheckpointError::csv(path, e))
    }

    fn read_records<T: DeserializeOwned>(&self, file: &str) -> CheckpointResult<Vec<T>> {
        let path = self.path(file);
        let mut reader = self.reader(&path)?;
        reader
            .deserialize()
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| CheckpointError::csv(&path, e))
    }

    /// Write through a temporary file so a crash never leaves half a checkpoint.
    fn write_records<T: Serialize>(&self, file: &str, records: &[T]) -> CheckpointResult<()> {
        self.ensure_dir()?;
        let path = self.path(file);
        let tmp = self.path(&format!("{file}.tmp"));

        let mut writer = csv::Writer::from_path(&tmp).map_err(|e| CheckpointError::csv(&tmp, e))?;
        for record in records {
            writer.serialize(record).map_err(|e| CheckpointError::csv(&tmp, e))?;
        }
        writer.flush().map_err(|e| CheckpointError::io(&tmp, e))?;
        drop(writer);

        fs::rename(&tmp, &path).map_err(|e| CheckpointError::io(&path, e))?;
        tracing::debug!(path = %path.display(), rows = records.len(), "checkpoint written");
        Ok(())
    }

    fn write_text(&self, file: &str, text: &str) -> CheckpointResult<()> {
        self.ensure_dir()?;
        let path = self.path(file);
        fs::write(&path, text).map_err(|e| CheckpointError::io(&path, e))
    }
}

/// Appends validated rows to `validation.csv` as they complete.
///
/// Write failures are remembered and returned by [`finish`](Self::finish).
pub struct ValidationWriter {
    writer: csv::Writer<File>,
    path: PathBuf,
    written: usize,
    error: Option<CheckpointError>,
}

impl ValidationWriter {
    pub fn append(&mut self, row: &ValidatedCandidate) -> CheckpointResult<()> {
        self.writer
            .serialize(ValidationRow::from(row))
            .map_err(|e| CheckpointError::csv(&self.path, e))?;
        self.writer
            .flush()
            .map_err(|e| CheckpointError::io(&self.path, e))?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Rows written, or the first write error.
    pub fn finish(self) -> CheckpointResult<usize> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.written),
        }
    }
}

impl ValidationObserver for ValidationWriter {
    fn on_validated(&mut self, row: &ValidatedCandidate) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.append(row) {
            tracing::warn!(error = %e, "failed to append validation checkpoint");
            self.error = Some(e);
        }
    }
}
