// Whole-file replacement via a sibling temp file

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PersistError;

/// `<path>.tmp`, in the same directory so the rename stays on one filesystem.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Bytes written to the temp file of `path`, not yet renamed into place.
///
/// Dropping without [`Staged::commit`] removes the temp file and leaves
/// `path` as it was.
#[derive(Debug)]
pub struct Staged {
    path: PathBuf,
    tmp: PathBuf,
    committed: bool,
}

impl Staged {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename the temp file over `path`.
    pub fn commit(mut self) -> Result<(), PersistError> {
        fs::rename(&self.tmp, &self.path).map_err(|e| PersistError::Write {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for Staged {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

/// Write `bytes` to the temp file of `path`.
pub fn stage(path: &Path, bytes: &[u8]) -> Result<Staged, PersistError> {
    let tmp = temp_path(path);
    if let Err(e) = fs::write(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(PersistError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        });
    }
    Ok(Staged { path: path.to_path_buf(), tmp, committed: false })
}

/// Replace `path` with `bytes`. On failure the previous file is untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    stage(path, bytes)?.commit()
}
