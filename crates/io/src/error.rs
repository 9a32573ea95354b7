use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum PersistError {
    /// File exists but cannot be read.
    Read { path: PathBuf, message: String },
    /// Snapshot header does not match the expected columns.
    Header { path: PathBuf, found: Vec<String> },
    /// A snapshot row cannot be decoded.
    Row { path: PathBuf, line: u64, message: String },
    /// Payload cannot be serialized.
    Encode { path: PathBuf, message: String },
    /// Temp file write or final rename failed.
    Write { path: PathBuf, message: String },
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => {
                write!(f, "cannot read {}: {message}", path.display())
            }
            Self::Header { path, found } => write!(
                f,
                "{}: unexpected snapshot header [{}]",
                path.display(),
                found.join(",")
            ),
            Self::Row { path, line, message } => {
                write!(f, "{}: line {line}: {message}", path.display())
            }
            Self::Encode { path, message } => {
                write!(f, "cannot encode {}: {message}", path.display())
            }
            Self::Write { path, message } => {
                write!(f, "cannot write {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for PersistError {}
