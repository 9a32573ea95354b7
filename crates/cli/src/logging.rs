//! Console + file logging.
//!
//! Every record goes to stderr and is appended to the log file, one line
//! each: `2026-10-14 06:00:01,042 - INFO - New node ...`. `RUST_LOG`
//! overrides the configured level.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;
use env_logger::{Builder, Target};
use log::LevelFilter;

use crate::config::ConfigError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Writes every byte to both sinks.
pub struct Tee<A, B> {
    a: A,
    b: B,
}

impl<A: Write, B: Write> Tee<A, B> {
    pub fn new(a: A, b: B) -> Self {
        Self { a, b }
    }
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.a.write_all(buf)?;
        self.b.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.a.flush()?;
        self.b.flush()
    }
}

pub fn open_log_file(path: &Path) -> Result<File, ConfigError> {
    let setup = |e: io::Error| ConfigError::Setup {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(setup)?;
    }
    OpenOptions::new().create(true).append(true).open(path).map_err(setup)
}

/// Install the global logger. A second call in the same process is a no-op.
pub fn init(log_file: &Path, level: LevelFilter) -> Result<(), ConfigError> {
    let file = open_log_file(log_file)?;

    let _ = Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                Local::now().format(TIMESTAMP_FORMAT),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(Tee::new(io::stderr(), file))))
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn tee_writes_both_sinks() {
        let mut left = Vec::new();
        let mut right = Vec::new();
        {
            let mut tee = Tee::new(&mut left, &mut right);
            writeln!(tee, "Unchanged node aabbccddeeff").unwrap();
            tee.flush().unwrap();
        }
        assert_eq!(left, b"Unchanged node aabbccddeeff\n");
        assert_eq!(left, right);
    }

    #[test]
    fn log_file_is_appended() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("nodes_export.log");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "earlier run\n").unwrap();

        let mut file = open_log_file(&path).unwrap();
        writeln!(file, "this run").unwrap();
        drop(file);

        assert_eq!(fs::read_to_string(&path).unwrap(), "earlier run\nthis run\n");
    }

    #[test]
    fn log_file_parent_is_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("var").join("nodewatch.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }
}
