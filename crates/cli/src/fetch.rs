//! Payload fetch.
//!
//! One GET per source per run, no retry. The next scheduled run is the
//! retry. Failures are classified so the pass can decide whether the
//! snapshot is left alone (transport, status) or degraded (malformed body).

use std::fmt;
use std::time::Duration;

use serde_json::Value;

pub const USER_AGENT: &str = concat!("nodewatch/", env!("CARGO_PKG_VERSION"));

/// Characters of a malformed body quoted in the error.
const SNIPPET_LEN: usize = 200;

#[derive(Debug)]
pub enum FetchError {
    /// HTTP client could not be constructed.
    Client(String),
    /// Connection refused, DNS failure, timeout.
    Unreachable { url: String, message: String },
    /// Server answered with a non-2xx status.
    Status { url: String, status: u16 },
    /// 2xx but the body is not JSON.
    MalformedBody { url: String, message: String },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client(msg) => write!(f, "cannot build HTTP client: {msg}"),
            Self::Unreachable { url, message } => write!(f, "cannot reach {url}: {message}"),
            Self::Status { url, status } => write!(f, "{url} returned HTTP {status}"),
            Self::MalformedBody { url, message } => {
                write!(f, "{url} returned a body that is not JSON: {message}")
            }
        }
    }
}

impl std::error::Error for FetchError {}

pub struct FetchClient {
    http: reqwest::blocking::Client,
}

impl FetchClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { http })
    }

    pub fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        let resp = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| FetchError::Unreachable {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
        }

        let body = resp.text().map_err(|e| FetchError::Unreachable {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        parse_body(url, &body)
    }
}

/// Parse a response body. A leading BOM is tolerated.
pub fn parse_body(url: &str, body: &str) -> Result<Value, FetchError> {
    let body = body.trim_start_matches('\u{feff}');
    serde_json::from_str(body).map_err(|e| {
        let snippet: String = body.chars().take(SNIPPET_LEN).collect();
        FetchError::MalformedBody {
            url: url.to_string(),
            message: format!("{e} (body starts with {snippet:?})"),
        }
    })
}
