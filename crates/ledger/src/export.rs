//! Append-only transaction export sinks

use std::fmt::Debug;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use types::{ExportError, NewTransaction};

/// Column order shared by every export format
pub const EXPORT_HEADER: [&str; 7] = [
    "worker_id",
    "withdraw_amount",
    "fee_amount",
    "owner_1_received",
    "owner_2_received",
    "status",
    "screenshot_reference",
];

/// Destination receiving a copy of every recorded transaction
pub trait ExportSink: Send + Sync + Debug {
    /// Append one record
    fn append(&self, record: &NewTransaction) -> Result<(), ExportError>;

    /// Get the name of the sink
    fn name(&self) -> &str;
}

/// Sink that drops every record
#[derive(Debug, Clone, Default)]
pub struct NoopExportSink;

impl ExportSink for NoopExportSink {
    fn append(&self, _record: &NewTransaction) -> Result<(), ExportError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// CSV file with a header row written when the file is first created
#[derive(Debug)]
pub struct CsvExportSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvExportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExportSink for CsvExportSink {
    fn append(&self, record: &NewTransaction) -> Result<(), ExportError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let needs_header = is_missing_or_empty(&self.path);
        let file = open_for_append(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer
                .write_record(EXPORT_HEADER)
                .map_err(|e| ExportError::Encoding(e.to_string()))?;
        }

        writer
            .serialize(record)
            .map_err(|e| ExportError::Encoding(e.to_string()))?;
        writer.flush().map_err(|e| io_error(&self.path, e))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Journal with one JSON object per line
#[derive(Debug)]
pub struct JsonLinesExportSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesExportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExportSink for JsonLinesExportSink {
    fn append(&self, record: &NewTransaction) -> Result<(), ExportError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut line =
            serde_json::to_string(record).map_err(|e| ExportError::Encoding(e.to_string()))?;
        line.push('\n');

        let mut file = open_for_append(&self.path)?;
        file.write_all(line.as_bytes())
            .map_err(|e| io_error(&self.path, e))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}

/// Feeds every record to each inner sink.
///
/// A failing sink does not stop the others; the first error is returned
/// after all sinks were tried.
#[derive(Debug, Default)]
pub struct FanoutExportSink {
    sinks: Vec<Box<dyn ExportSink>>,
}

impl FanoutExportSink {
    pub fn new(sinks: Vec<Box<dyn ExportSink>>) -> Self {
        Self { sinks }
    }

    /// Sinks configured for the application
    pub fn from_config(config: &config::ExportConfig) -> Self {
        if !config.enabled {
            return Self::default();
        }

        Self::new(vec![
            Box::new(CsvExportSink::new(&config.csv_path)),
            Box::new(JsonLinesExportSink::new(&config.journal_path)),
        ])
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ExportSink for FanoutExportSink {
    fn append(&self, record: &NewTransaction) -> Result<(), ExportError> {
        let mut first_error = None;

        for sink in &self.sinks {
            if let Err(e) = sink.append(record) {
                tracing::warn!(sink = sink.name(), error = %e, "Export sink failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "fanout"
    }
}

fn is_missing_or_empty(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true)
}

fn open_for_append(path: &Path) -> Result<File, ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| io_error(path, e))?;
        }
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, err: std::io::Error) -> ExportError {
    ExportError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(worker_id: i64, screenshot: &str) -> NewTransaction {
        NewTransaction {
            worker_id,
            withdraw_amount: 100.0,
            fee_amount: 30.0,
            owner_1_received: 15.0,
            owner_2_received: 15.0,
            status: "completed".to_string(),
            screenshot_reference: screenshot.to_string(),
        }
    }

    #[test]
    fn test_csv_header_written_once() {
        let dir = TempDir::new().unwrap();
        let sink = CsvExportSink::new(dir.path().join("exports").join("tx.csv"));

        sink.append(&record(1, "photo-a")).unwrap();
        sink.append(&record(2, "photo, with comma")).unwrap();

        let content = fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "worker_id,withdraw_amount,fee_amount,owner_1_received,owner_2_received,status,screenshot_reference"
        );
        assert!(lines[1].starts_with("1,100.0,30.0,15.0,15.0,completed,photo-a"));
        assert!(lines[2].ends_with("\"photo, with comma\""));
    }

    #[test]
    fn test_csv_appends_to_existing_file_without_new_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tx.csv");

        CsvExportSink::new(&path).append(&record(1, "a")).unwrap();
        CsvExportSink::new(&path).append(&record(2, "b")).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<NewTransaction> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows, vec![record(1, "a"), record(2, "b")]);
    }

    #[test]
    fn test_json_lines_journal() {
        let dir = TempDir::new().unwrap();
        let sink = JsonLinesExportSink::new(dir.path().join("tx.jsonl"));

        sink.append(&record(5, "x")).unwrap();
        sink.append(&record(6, "y")).unwrap();

        let content = fs::read_to_string(sink.path()).unwrap();
        let parsed: Vec<NewTransaction> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(parsed, vec![record(5, "x"), record(6, "y")]);
    }

    #[test]
    fn test_fanout_continues_after_failure() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be opened for appending
        let broken = CsvExportSink::new(dir.path());
        let journal_path = dir.path().join("tx.jsonl");
        let fanout = FanoutExportSink::new(vec![
            Box::new(broken),
            Box::new(JsonLinesExportSink::new(&journal_path)),
        ]);

        assert!(fanout.append(&record(1, "a")).is_err());
        assert_eq!(fs::read_to_string(&journal_path).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_disabled_export_has_no_sinks() {
        let config = config::ExportConfig {
            enabled: false,
            ..config::ExportConfig::default()
        };
        let fanout = FanoutExportSink::from_config(&config);
        assert!(fanout.is_empty());
        assert!(fanout.append(&record(1, "a")).is_ok());
    }
}
