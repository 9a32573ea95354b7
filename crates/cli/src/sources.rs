//! Multi-source list: one URL per line, blank and `#` lines ignored.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use url::Url;

use crate::config::{ConfigError, Source};

/// Non-empty, non-comment lines, trimmed.
pub fn parse_sources(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read and validate the sources file. Missing, empty or containing an
/// unparseable URL is fatal.
pub fn read_sources(path: &Path) -> Result<Vec<Url>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            ConfigError::SourcesMissing { path: path.to_path_buf() }
        } else {
            ConfigError::Read { path: path.to_path_buf(), message: e.to_string() }
        }
    })?;

    let lines = parse_sources(&text);
    if lines.is_empty() {
        return Err(ConfigError::SourcesEmpty { path: path.to_path_buf() });
    }

    lines.iter().map(|line| parse_url(line)).collect()
}

pub fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::BadUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::BadUrl {
            url: raw.to_string(),
            message: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// File-name stem for a source: host, port and path, lowercased, with
/// every run of other characters collapsed to `-`.
pub fn slug(url: &Url) -> String {
    let mut raw = url.host_str().unwrap_or("source").to_string();
    if let Some(port) = url.port() {
        raw.push_str(&format!("-{port}"));
    }
    raw.push_str(url.path());

    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// One [`Source`] per URL, files under `output_dir`. Colliding slugs get
/// a numeric suffix in list order.
pub fn sources_in_dir(urls: &[Url], output_dir: &Path) -> Vec<Source> {
    let mut taken: Vec<String> = Vec::new();
    urls.iter()
        .map(|url| {
            let base = slug(url);
            let mut stem = base.clone();
            let mut n = 2;
            while taken.contains(&stem) {
                stem = format!("{base}-{n}");
                n += 1;
            }
            taken.push(stem.clone());

            Source {
                url: url.to_string(),
                snapshot: output_dir.join(format!("{stem}.csv")),
                raw_json: output_dir.join(format!("{stem}.json")),
            }
        })
        .collect()
}
