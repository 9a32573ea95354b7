//! Run configuration.
//!
//! Loaded from `nodewatch.toml` (or `--config`), then overridden by
//! command-line flags, then resolved into a [`SourceMode`]. Every failure in
//! here is a configuration failure: the run aborts before any fetch.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use clap::Args;
use log::LevelFilter;
use serde::Deserialize;

use nodewatch_recon::{Ipv6Policy, ReconOptions, WriteOrder};

use crate::sources::{parse_url, read_sources, sources_in_dir};

pub const DEFAULT_CONFIG_FILE: &str = "nodewatch.toml";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    /// Config or sources file exists but cannot be read.
    Read { path: PathBuf, message: String },
    /// TOML parse / deserialization error.
    Parse { path: PathBuf, message: String },
    /// Explicit `--config` path does not exist.
    ConfigMissing { path: PathBuf },
    /// Neither `url` nor `sources_file` configured.
    NoSources,
    SourcesMissing { path: PathBuf },
    SourcesEmpty { path: PathBuf },
    BadUrl { url: String, message: String },
    /// Value out of range or unknown.
    Invalid(String),
    /// Log file or output directory cannot be prepared.
    Setup { path: PathBuf, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::Parse { path, message } => {
                write!(f, "config parse error in {}: {message}", path.display())
            }
            Self::ConfigMissing { path } => write!(f, "config file {} not found", path.display()),
            Self::NoSources => write!(f, "no source configured (set `url` or `sources_file`)"),
            Self::SourcesMissing { path } => {
                write!(f, "sources file {} not found", path.display())
            }
            Self::SourcesEmpty { path } => {
                write!(f, "sources file {} lists no URLs", path.display())
            }
            Self::BadUrl { url, message } => write!(f, "invalid source URL '{url}': {message}"),
            Self::Invalid(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Setup { path, message } => {
                write!(f, "cannot prepare {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// File settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub url: Option<String>,
    pub sources_file: Option<PathBuf>,
    pub snapshot: PathBuf,
    pub raw_json: PathBuf,
    pub output_dir: PathBuf,
    pub log_file: PathBuf,
    pub log_level: String,
    pub timeout_secs: u64,
    pub recon: ReconOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: None,
            sources_file: None,
            snapshot: PathBuf::from("nodes.csv"),
            raw_json: PathBuf::from("nodes.json"),
            output_dir: PathBuf::from("."),
            log_file: PathBuf::from("nodes_export.log"),
            log_level: "info".into(),
            timeout_secs: 10,
            recon: ReconOptions::default(),
        }
    }
}

impl Settings {
    pub fn from_toml(path: &Path, input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load `explicit` (must exist) or the default file (optional).
    ///
    /// Returns the settings and the file they came from, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = match explicit {
            Some(p) if !p.exists() => {
                return Err(ConfigError::ConfigMissing { path: p.to_path_buf() })
            }
            Some(p) => p.to_path_buf(),
            None => {
                let p = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !p.exists() {
                    return Ok((Self::default(), None));
                }
                p
            }
        };

        let text = fs::read_to_string(&path).map_err(|e| ConfigError::Read {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok((Self::from_toml(&path, &text)?, Some(path)))
    }

    pub fn apply(&mut self, o: &Overrides) {
        if let Some(url) = &o.url {
            self.url = Some(url.clone());
        }
        if let Some(p) = &o.sources {
            self.sources_file = Some(p.clone());
        }
        if let Some(p) = &o.snapshot {
            self.snapshot = p.clone();
        }
        if let Some(p) = &o.raw_json {
            self.raw_json = p.clone();
        }
        if let Some(p) = &o.output_dir {
            self.output_dir = p.clone();
        }
        if let Some(p) = &o.log_file {
            self.log_file = p.clone();
        }
        if let Some(level) = &o.log_level {
            self.log_level = level.clone();
        }
        if let Some(secs) = o.timeout {
            self.timeout_secs = secs;
        }
        if let Some(value) = &o.default_value {
            self.recon.default_value = value.clone();
        }
        if let Some(policy) = o.ipv6 {
            self.recon.ipv6 = policy;
        }
        if let Some(order) = o.order {
            self.recon.write_order = order;
        }
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)))
    }

    /// Checks that do not touch the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be greater than 0".into()));
        }
        self.recon
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.level_filter()?;
        Ok(())
    }

    /// Resolve the source list. Reads the sources file when configured.
    pub fn resolve_sources(&self) -> Result<SourceMode, ConfigError> {
        if let Some(path) = &self.sources_file {
            let urls = read_sources(path)?;
            return Ok(SourceMode::List {
                file: path.clone(),
                ignored_url: self.url.clone(),
                sources: sources_in_dir(&urls, &self.output_dir),
            });
        }
        match &self.url {
            Some(raw) => {
                let url = parse_url(raw)?;
                Ok(SourceMode::Single(Source {
                    url: url.to_string(),
                    snapshot: self.snapshot.clone(),
                    raw_json: self.raw_json.clone(),
                }))
            }
            None => Err(ConfigError::NoSources),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Command-line overrides
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Config file (default: ./nodewatch.toml if present)
    #[arg(long, short = 'c', env = "NODEWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Source URL (single-source mode)
    #[arg(long)]
    pub url: Option<String>,

    /// File listing one source URL per line (multi-source mode)
    #[arg(long, value_name = "FILE")]
    pub sources: Option<PathBuf>,

    /// Snapshot CSV path (single-source mode)
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Raw payload JSON path (single-source mode)
    #[arg(long)]
    pub raw_json: Option<PathBuf>,

    /// Directory for per-source files (multi-source mode)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Log file (appended)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long)]
    pub log_level: Option<String>,

    /// Fetch timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Sentinel for absent fields
    #[arg(long)]
    pub default_value: Option<String>,

    /// IPv6 selection: colon (first address containing ':') or first
    #[arg(long, value_parser = parse_ipv6_policy)]
    pub ipv6: Option<Ipv6Policy>,

    /// Snapshot row order: source or grouped (new, updated, unchanged)
    #[arg(long, value_parser = parse_write_order)]
    pub order: Option<WriteOrder>,
}

fn parse_ipv6_policy(s: &str) -> Result<Ipv6Policy, String> {
    s.parse().map_err(|e: nodewatch_recon::ReconError| e.to_string())
}

fn parse_write_order(s: &str) -> Result<WriteOrder, String> {
    s.parse().map_err(|e: nodewatch_recon::ReconError| e.to_string())
}

// ---------------------------------------------------------------------------
// Resolved plan
// ---------------------------------------------------------------------------

/// One source and its file pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub url: String,
    pub snapshot: PathBuf,
    pub raw_json: PathBuf,
}

#[derive(Debug)]
pub enum SourceMode {
    Single(Source),
    List {
        file: PathBuf,
        /// `url` was also set; the list takes precedence.
        ignored_url: Option<String>,
        sources: Vec<Source>,
    },
}

impl SourceMode {
    pub fn sources(&self) -> &[Source] {
        match self {
            Self::Single(source) => std::slice::from_ref(source),
            Self::List { sources, .. } => sources,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const FULL: &str = r#"
url          = "https://nef05mon.karte.neanderfunk.de/data/nodes.json"
snapshot     = "data/nodes.csv"
raw_json     = "data/nodes.json"
log_file     = "data/nodes_export.log"
log_level    = "debug"
timeout_secs = 5

[recon]
default_value = "Unbekannt"
ipv6          = "first"
write_order   = "grouped"
"#;

    fn cfg() -> &'static Path {
        Path::new("nodewatch.toml")
    }

    #[test]
    fn parse_full_config() {
        let s = Settings::from_toml(cfg(), FULL).unwrap();
        assert_eq!(s.snapshot, PathBuf::from("data/nodes.csv"));
        assert_eq!(s.timeout_secs, 5);
        assert_eq!(s.recon.default_value, "Unbekannt");
        assert_eq!(s.recon.ipv6, Ipv6Policy::First);
        assert_eq!(s.recon.write_order, WriteOrder::Grouped);
        assert_eq!(s.level_filter().unwrap(), LevelFilter::Debug);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn empty_config_uses_defaults() {
        let s = Settings::from_toml(cfg(), "").unwrap();
        assert_eq!(s.snapshot, PathBuf::from("nodes.csv"));
        assert_eq!(s.raw_json, PathBuf::from("nodes.json"));
        assert_eq!(s.log_file, PathBuf::from("nodes_export.log"));
        assert_eq!(s.timeout_secs, 10);
        assert_eq!(s.recon, ReconOptions::default());
    }

    #[test]
    fn reject_unknown_keys() {
        let err = Settings::from_toml(cfg(), "snapshots = \"x.csv\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let err = Settings::from_toml(cfg(), "[recon]\nipv6 = \"last\"\n").unwrap_err();
        assert!(err.to_string().contains("nodewatch.toml"));
    }

    #[test]
    fn overrides_win_over_file() {
        let mut s = Settings::from_toml(cfg(), FULL).unwrap();
        s.apply(&Overrides {
            url: Some("http://localhost:9000/nodes.json".into()),
            timeout: Some(30),
            order: Some(WriteOrder::Source),
            ..Overrides::default()
        });
        assert_eq!(s.url.as_deref(), Some("http://localhost:9000/nodes.json"));
        assert_eq!(s.timeout_secs, 30);
        assert_eq!(s.recon.write_order, WriteOrder::Source);
        assert_eq!(s.recon.ipv6, Ipv6Policy::First, "untouched by overrides");
    }

    #[test]
    fn validation_errors() {
        let mut s = Settings::default();
        s.timeout_secs = 0;
        assert!(s.validate().unwrap_err().to_string().contains("timeout_secs"));

        let mut s = Settings::default();
        s.log_level = "loud".into();
        assert!(s.validate().unwrap_err().to_string().contains("'loud'"));

        let mut s = Settings::default();
        s.recon.default_value = String::new();
        assert!(s.validate().is_err());
    }

    #[test]
    fn single_source_resolution() {
        let s = Settings::from_toml(cfg(), FULL).unwrap();
        let mode = s.resolve_sources().unwrap();
        let sources = mode.sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].url, "https://nef05mon.karte.neanderfunk.de/data/nodes.json");
        assert_eq!(sources[0].snapshot, PathBuf::from("data/nodes.csv"));
    }

    #[test]
    fn no_source_is_an_error() {
        let err = Settings::default().resolve_sources().unwrap_err();
        assert!(matches!(err, ConfigError::NoSources));
    }

    #[test]
    fn sources_file_takes_precedence() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("urls.txt");
        fs::write(&list, "https://a.example/nodes.json\nhttps://b.example/nodes.json\n").unwrap();

        let mut s = Settings::from_toml(cfg(), FULL).unwrap();
        s.sources_file = Some(list.clone());
        s.output_dir = dir.path().join("out");

        match s.resolve_sources().unwrap() {
            SourceMode::List { file, ignored_url, sources } => {
                assert_eq!(file, list);
                assert!(ignored_url.is_some());
                assert_eq!(sources.len(), 2);
                assert_eq!(sources[0].snapshot, dir.path().join("out").join("a-example-nodes-json.csv"));
            }
            other => panic!("expected list mode, got {other:?}"),
        }
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigMissing { .. }));

        let path = dir.path().join("nodewatch.toml");
        fs::write(&path, FULL).unwrap();
        let (s, from) = Settings::load(Some(&path)).unwrap();
        assert_eq!(from, Some(path));
        assert_eq!(s.timeout_secs, 5);
    }
}
