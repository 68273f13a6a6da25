//! Filesystem result sink
//!
//! Results land under `<out>/<lca|cost|combined>/<project>/<stem>_<UTC timestamp>.json`,
//! failures in `<out>/errors/<project>.jsonl` and processing history in
//! `<out>/history.jsonl`.

use chrono::{DateTime, Utc};
use kennwert::serializers::results_to_json;
use kennwert::store::{ProcessingRecord, ResultKind, ResultSink, StoreError};
use kennwert::{ElementResult, ErrorLogEntry};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Path segments must not escape the output directory
fn sanitize(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| if c == '/' || c == '\\' || c == ':' { '_' } else { c })
        .collect();
    match cleaned.trim() {
        "" | "." | ".." => "_".to_string(),
        other => other.to_string(),
    }
}

pub fn archive_path(out_dir: &Path, kind: ResultKind, project: &str, stem: &str, timestamp: DateTime<Utc>) -> PathBuf {
    out_dir
        .join(kind.as_str())
        .join(sanitize(project))
        .join(format!("{}_{}.json", sanitize(stem), timestamp.format(TIMESTAMP_FORMAT)))
}

pub fn report_path(out_dir: &Path, project: &str, stem: &str, timestamp: DateTime<Utc>) -> PathBuf {
    out_dir
        .join("reports")
        .join(sanitize(project))
        .join(format!("{}_{}.txt", sanitize(stem), timestamp.format(TIMESTAMP_FORMAT)))
}

fn backend(err: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(backend)?;
    }
    Ok(())
}

fn append_line(path: &Path, line: &str) -> Result<(), StoreError> {
    ensure_parent(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(backend)?;
    writeln!(file, "{}", line).map_err(backend)
}

/// Archives one batch file's results, stamped with a single run timestamp
pub struct ArchiveSink {
    out_dir: PathBuf,
    stem: String,
    timestamp: DateTime<Utc>,
}

impl ArchiveSink {
    pub fn new(out_dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            out_dir: out_dir.into(),
            stem: stem.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn results_path(&self, project: &str, kind: ResultKind) -> PathBuf {
        archive_path(&self.out_dir, kind, project, &self.stem, self.timestamp)
    }

    /// Write the human-readable summary report next to the archives
    pub fn write_report(&self, project: &str, report: &str) -> Result<PathBuf, StoreError> {
        let path = report_path(&self.out_dir, project, &self.stem, self.timestamp);
        ensure_parent(&path)?;
        fs::write(&path, report).map_err(backend)?;
        Ok(path)
    }
}

impl ResultSink for ArchiveSink {
    fn store_results(&self, project_id: &str, kind: ResultKind, results: &[ElementResult]) -> Result<(), StoreError> {
        let path = self.results_path(project_id, kind);
        ensure_parent(&path)?;
        let json = results_to_json(results).map_err(backend)?;
        fs::write(&path, json).map_err(backend)?;
        tracing::info!(path = %path.display(), elements = results.len(), "archived results");
        Ok(())
    }

    fn log_processing_error(&self, project_id: &str, entry: ErrorLogEntry) -> Result<(), StoreError> {
        let path = self
            .out_dir
            .join("errors")
            .join(format!("{}.jsonl", sanitize(project_id)));
        let line = serde_json::to_string(&entry).map_err(backend)?;
        append_line(&path, &line)
    }

    fn record_processing(&self, record: ProcessingRecord) -> Result<(), StoreError> {
        let line = serde_json::to_string(&record).map_err(backend)?;
        append_line(&self.out_dir.join("history.jsonl"), &line)
    }
}
