//! Pipe-delimited account export
//!
//! One record per line, the listing projection in order. A literal `|` in a
//! value is written as `\|`, line breaks become spaces and values are
//! trimmed; unset and null values are empty.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use sfsync_domain::constants::ACCOUNT_LIST_FIELDS;
use sfsync_domain::{Record, Result, SyncError};
use tracing::info;

const DELIMITER: &str = "|";

fn clean(value: &str) -> String {
    value.replace('|', "\\|").replace(['\n', '\r'], " ").trim().to_string()
}

/// One export line, without the trailing newline
pub fn format_line(record: &Record, fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| record.get(field).map(|value| clean(&value.to_string())).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(DELIMITER)
}

/// Write every record with the account listing projection
///
/// # Errors
/// `Internal` when the writer fails.
pub fn write_accounts<W: Write>(writer: &mut W, records: &[Record]) -> Result<usize> {
    for record in records {
        writeln!(writer, "{}", format_line(record, &ACCOUNT_LIST_FIELDS)).map_err(io_error)?;
    }
    writer.flush().map_err(io_error)?;
    Ok(records.len())
}

/// Create (or truncate) `path` and export the records into it
///
/// # Errors
/// `Internal` when the file cannot be created or written.
pub fn export_accounts(path: &Path, records: &[Record]) -> Result<usize> {
    let file = File::create(path)
        .map_err(|err| SyncError::Internal(format!("cannot create {}: {err}", path.display())))?;
    let mut writer = BufWriter::new(file);
    let written = write_accounts(&mut writer, records)?;
    info!(path = %path.display(), records = written, "accounts exported");
    Ok(written)
}

fn io_error(err: std::io::Error) -> SyncError {
    SyncError::Internal(format!("export write failed: {err}"))
}
