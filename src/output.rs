/// Append-only CSV table output.
///
/// The header row is written only when the destination is new (or empty).
/// All bytes are serialized in memory before the file is touched, then
/// written with a single `write_all` under an exclusive lock, so a failure
/// while building rows never leaves a lone header behind.
use fs2::FileExt;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// What an append did to the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    pub header_written: bool,
    pub rows_written: usize,
}

/// Serialize `rows` as CSV records, without a header.
pub fn serialize_rows<R: Serialize>(rows: &[R]) -> Result<Vec<u8>, OutputError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).map_err(OutputError::Serialize)?;
    }
    into_bytes(writer)
}

/// Serialize a header record.
pub fn serialize_header(headers: &[&str]) -> Result<Vec<u8>, OutputError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(headers).map_err(OutputError::Serialize)?;
    into_bytes(writer)
}

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, OutputError> {
    writer.into_inner().map_err(|e| {
        let io = std::io::Error::new(e.error().kind(), e.error().to_string());
        OutputError::Serialize(csv::Error::from(io))
    })
}

/// Append `rows` to the CSV table at `path`, creating it with `headers`
/// when it does not exist yet.
pub fn append_rows<R: Serialize>(
    path: &Path,
    headers: &[&str],
    rows: &[R],
) -> Result<AppendOutcome, OutputError> {
    let body = serialize_rows(rows)?;
    let header = serialize_header(headers)?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| OutputError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;

    FileExt::lock_exclusive(&file).map_err(|e| OutputError::Lock {
        path: path.to_path_buf(),
        source: e,
    })?;

    let write_err = |e: std::io::Error| OutputError::Write {
        path: path.to_path_buf(),
        source: e,
    };

    let header_written = file.metadata().map_err(write_err)?.len() == 0;
    let mut buf = if header_written { header } else { Vec::new() };
    buf.extend_from_slice(&body);

    file.write_all(&buf).map_err(write_err)?;
    file.flush().map_err(write_err)?;

    if let Err(e) = FileExt::unlock(&file) {
        tracing::debug!(error = %e, path = %path.display(), "failed to release output lock");
    }

    tracing::debug!(
        path = %path.display(),
        header_written,
        rows = rows.len(),
        "appended rows to table"
    );

    Ok(AppendOutcome {
        header_written,
        rows_written: rows.len(),
    })
}

/// Errors from writing the output table.
#[derive(Debug)]
pub enum OutputError {
    /// Failed to open or create the destination.
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to acquire the exclusive lock.
    Lock {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A row could not be encoded as CSV.
    Serialize(csv::Error),
    /// Failed to write to the destination.
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputError::Open { path, source } => {
                write!(f, "failed to open CSV file '{}': {source}", path.display())
            }
            OutputError::Lock { path, source } => {
                write!(f, "failed to lock CSV file '{}': {source}", path.display())
            }
            OutputError::Serialize(e) => write!(f, "failed to encode CSV row: {e}"),
            OutputError::Write { path, source } => {
                write!(f, "error writing to CSV file '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::Open { source, .. }
            | OutputError::Lock { source, .. }
            | OutputError::Write { source, .. } => Some(source),
            OutputError::Serialize(e) => Some(e),
        }
    }
}
