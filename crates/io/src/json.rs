// Raw payload JSON export

use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::atomic::{stage, Staged};
use crate::error::PersistError;

const INDENT: &[u8] = b"    ";

/// Pretty-print with a four-space indent and a trailing newline.
pub fn render_payload(payload: &serde_json::Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
    payload.serialize(&mut ser)?;
    out.push(b'\n');
    Ok(out)
}

pub fn stage_payload(path: &Path, payload: &serde_json::Value) -> Result<Staged, PersistError> {
    let bytes = render_payload(payload).map_err(|e| PersistError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    stage(path, &bytes)
}

/// Overwrite `path` with the fetched payload.
pub fn write_payload(path: &Path, payload: &serde_json::Value) -> Result<(), PersistError> {
    stage_payload(path, payload)?.commit()
}
