//! JSONL persistence for tasks, responses and analysis records.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{ProfilerError, RecordSinkError};
use crate::types::AnalysisRecord;

/// Destination for finished analysis records.
pub trait RecordSink: Send + Sync {
    fn record(&self, record: AnalysisRecord) -> Result<(), RecordSinkError>;
}

/// Records buffered between the analyzer and the writer thread. A full
/// buffer blocks the analyzer until the writer catches up.
pub const SINK_CAPACITY: usize = 256;

/// Streams records to a JSONL file, one object per line, from a dedicated
/// writer thread.
#[derive(Clone)]
pub struct JsonlRecordSink {
    sender: mpsc::SyncSender<AnalysisRecord>,
}

/// What the writer thread put on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrittenRecords {
    pub lines: usize,
    pub per_model: BTreeMap<String, usize>,
}

/// Handle on the writer thread of a [`JsonlRecordSink`].
pub struct RecordWriter {
    path: PathBuf,
    handle: Option<std::thread::JoinHandle<Result<WrittenRecords, RecordSinkError>>>,
}

impl RecordWriter {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the writer to drain the channel and flush. Every sink clone
    /// must be dropped first or this blocks forever.
    pub fn join(mut self) -> Result<WrittenRecords, RecordSinkError> {
        let Some(handle) = self.handle.take() else {
            return Ok(WrittenRecords::default());
        };
        let written = handle
            .join()
            .map_err(|_| RecordSinkError::Join("record writer panicked".to_string()))??;
        debug!(
            path = %self.path.display(),
            lines = written.lines,
            models = written.per_model.len(),
            "record writer finished"
        );
        Ok(written)
    }
}

impl JsonlRecordSink {
    pub fn new(path: impl AsRef<Path>) -> Result<(Self, RecordWriter), RecordSinkError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let (sender, receiver) = mpsc::sync_channel::<AnalysisRecord>(SINK_CAPACITY);
        let handle = std::thread::spawn(move || drain_records(BufWriter::new(file), receiver));
        Ok((
            Self { sender },
            RecordWriter {
                path,
                handle: Some(handle),
            },
        ))
    }
}

impl RecordSink for JsonlRecordSink {
    fn record(&self, record: AnalysisRecord) -> Result<(), RecordSinkError> {
        self.sender
            .send(record)
            .map_err(|_| RecordSinkError::Closed)
    }
}

fn drain_records<W: Write>(
    mut out: W,
    receiver: mpsc::Receiver<AnalysisRecord>,
) -> Result<WrittenRecords, RecordSinkError> {
    let mut written = WrittenRecords::default();
    for record in receiver {
        serde_json::to_writer(&mut out, &record)
            .map_err(|e| RecordSinkError::Serde(e.to_string()))?;
        out.write_all(b"\n")?;
        written.lines += 1;
        *written.per_model.entry(record.model_name).or_insert(0) += 1;
    }
    out.flush()?;
    Ok(written)
}

/// Read a JSONL file. Blank lines are skipped; a malformed line fails with
/// its 1-based line number.
pub fn read_jsonl<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>, ProfilerError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ProfilerError::io(path, e))?;
    let mut items = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| ProfilerError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line).map_err(|e| ProfilerError::Json {
            path: path.to_path_buf(),
            line: idx + 1,
            message: e.to_string(),
        })?;
        items.push(item);
    }
    Ok(items)
}

/// Write items as JSONL, replacing the file.
pub fn write_jsonl<T: Serialize>(
    path: impl AsRef<Path>,
    items: &[T],
) -> Result<(), ProfilerError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| ProfilerError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for item in items {
        let line = serde_json::to_string(item).map_err(|e| json_error(path, e))?;
        writeln!(writer, "{line}").map_err(|e| ProfilerError::io(path, e))?;
    }
    writer.flush().map_err(|e| ProfilerError::io(path, e))
}

/// Read one JSON document.
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ProfilerError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| ProfilerError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|e| ProfilerError::Json {
        path: path.to_path_buf(),
        line: e.line(),
        message: e.to_string(),
    })
}

/// Write one pretty-printed JSON document.
pub fn write_json_pretty<T: Serialize>(
    path: impl AsRef<Path>,
    value: &T,
) -> Result<(), ProfilerError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(value).map_err(|e| json_error(path, e))?;
    std::fs::write(path, json).map_err(|e| ProfilerError::io(path, e))
}

fn json_error(path: &Path, err: serde_json::Error) -> ProfilerError {
    ProfilerError::Json {
        path: path.to_path_buf(),
        line: 0,
        message: err.to_string(),
    }
}
