//! JSON serialization of the record set and failure log

use crate::output::report::CrawlFailure;
use crate::record::BookRecord;
use crate::FolioError;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes records as a JSON array of seven-key objects
///
/// Parent directories are created as needed. An empty record set writes `[]`.
///
/// # Returns
///
/// * `Ok(())` - File written
/// * `Err(FolioError)` - IO or serialization failure
pub fn write_records(path: &Path, records: &[BookRecord]) -> Result<(), FolioError> {
    write_json(path, records)?;
    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Writes the failure log as a JSON array
pub fn write_failures(path: &Path, failures: &[CrawlFailure]) -> Result<(), FolioError> {
    write_json(path, failures)?;
    tracing::info!("Wrote {} failures to {}", failures.len(), path.display());
    Ok(())
}

/// Reads a record file written by [`write_records`]
pub fn read_records(path: &Path) -> Result<Vec<BookRecord>, FolioError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), FolioError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
