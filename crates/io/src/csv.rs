// Node snapshot CSV read/write
//
// Fixed header `hostname,hardware_model,node_id,contact,ipv6_address`,
// UTF-8, `\n` line endings. Rows keyed by `node_id`; a later row with the
// same id replaces an earlier one.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use nodewatch_recon::{NodeRecord, RecordSet, FIELD_NAMES};

use crate::atomic::{stage, Staged};
use crate::error::PersistError;

/// Load the snapshot at `path`. A missing file is an empty set (first run).
pub fn read_snapshot(path: &Path) -> Result<RecordSet, PersistError> {
    match fs::read_to_string(path) {
        Ok(data) => parse_snapshot(path, &data),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(RecordSet::new()),
        Err(e) => Err(PersistError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

/// Parse snapshot text. `path` is used for error context only.
pub fn parse_snapshot(path: &Path, data: &str) -> Result<RecordSet, PersistError> {
    let data = data.strip_prefix('\u{feff}').unwrap_or(data);
    if data.trim().is_empty() {
        return Ok(RecordSet::new());
    }

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data.as_bytes());

    let headers = reader.headers().map_err(|e| PersistError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if headers.iter().ne(FIELD_NAMES.iter().copied()) {
        return Err(PersistError::Header {
            path: path.to_path_buf(),
            found: headers.iter().map(str::to_string).collect(),
        });
    }

    let mut records = RecordSet::new();
    for row in reader.deserialize::<NodeRecord>() {
        let record = row.map_err(|e| PersistError::Row {
            path: path.to_path_buf(),
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        records.insert(record);
    }

    Ok(records)
}

/// Serialize a record set in its iteration order, header first.
pub fn render_snapshot(records: &RecordSet) -> Result<Vec<u8>, ::csv::Error> {
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(::csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(FIELD_NAMES)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer.into_inner().map_err(|e| e.into_error().into())
}

/// Write the rendered snapshot next to `path`; [`Staged::commit`] replaces it.
pub fn stage_snapshot(path: &Path, records: &RecordSet) -> Result<Staged, PersistError> {
    let bytes = render_snapshot(records).map_err(|e| PersistError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    stage(path, &bytes)
}

/// Replace the snapshot at `path` wholesale.
pub fn write_snapshot(path: &Path, records: &RecordSet) -> Result<(), PersistError> {
    stage_snapshot(path, records)?.commit()
}
