//! One reconciliation pass: fetch, load prior snapshot, reconcile, persist.

use std::fmt;
use std::path::PathBuf;

use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;

use nodewatch_io::{csv, json, PersistError};
use nodewatch_recon::{
    run, NodeRecord, PassObserver, PayloadShape, ReconOptions, ReconSummary, UpdatedRecord,
};

use crate::config::Source;
use crate::fetch::{FetchClient, FetchError};

#[derive(Debug)]
pub enum PassError {
    Transport(FetchError),
    Persistence(PersistError),
}

impl fmt::Display for PassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport failure: {e}"),
            Self::Persistence(e) => write!(f, "persistence failure: {e}"),
        }
    }
}

impl std::error::Error for PassError {}

impl From<PersistError> for PassError {
    fn from(e: PersistError) -> Self {
        Self::Persistence(e)
    }
}

// ---------------------------------------------------------------------------
// Log observer
// ---------------------------------------------------------------------------

/// One log line per classification decision.
pub struct LogObserver;

impl PassObserver for LogObserver {
    fn on_new(&self, r: &NodeRecord) {
        info!(
            "New node {}: hostname={}, hardware={}, contact={}, ipv6={}",
            r.node_id, r.hostname, r.hardware_model, r.contact, r.ipv6_address
        );
    }

    fn on_updated(&self, update: &UpdatedRecord) {
        let changes: Vec<String> = update
            .changes
            .iter()
            .map(|c| format!("{}: '{}' -> '{}'", c.field, c.old, c.new))
            .collect();
        info!("Updated node {}: {}", update.current.node_id, changes.join(", "));
    }

    fn on_unchanged(&self, r: &NodeRecord) {
        info!("Unchanged node {}", r.node_id);
    }

    fn on_duplicate(&self, node_id: &str) {
        warn!("Duplicate node id {node_id} in payload, keeping the later entry");
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Outcome of a pass, printed by `run --json`.
#[derive(Debug, Serialize)]
pub struct PassReport {
    pub url: String,
    pub snapshot: PathBuf,
    /// Not written when the body was not JSON.
    pub raw_json: Option<PathBuf>,
    /// `None` when the body could not be parsed at all.
    pub shape: Option<PayloadShape>,
    /// Why the pass reconciled zero nodes, if it did so involuntarily.
    pub degraded: Option<String>,
    pub summary: ReconSummary,
    pub new: Vec<String>,
    pub updated: Vec<UpdatedRecord>,
    pub removed: Vec<String>,
}

// ---------------------------------------------------------------------------
// Pass
// ---------------------------------------------------------------------------

/// Run one pass for `source`.
///
/// Transport failures leave both files untouched. A body that is not JSON
/// reconciles as zero nodes: the snapshot is rewritten header-only and the
/// raw payload file is left alone. Persistence failures abort the pass;
/// a failure while staging either file leaves both untouched.
pub fn run_pass(
    source: &Source,
    client: &FetchClient,
    options: &ReconOptions,
) -> Result<PassReport, PassError> {
    let (payload, mut degraded) = match client.fetch(&source.url) {
        Ok(payload) => {
            info!("Fetched payload from {}", source.url);
            (Some(payload), None)
        }
        Err(e @ FetchError::MalformedBody { .. }) => {
            error!("{e}; reconciling as zero nodes");
            (None, Some(e.to_string()))
        }
        Err(e) => return Err(PassError::Transport(e)),
    };

    if !source.snapshot.exists() {
        info!("No snapshot at {}, treating every node as new", source.snapshot.display());
    }
    let prior = csv::read_snapshot(&source.snapshot)?;
    if !prior.is_empty() {
        info!("Loaded {} records from {}", prior.len(), source.snapshot.display());
    }

    let result = run(payload.as_ref().unwrap_or(&Value::Null), &prior, options, &LogObserver);

    if payload.is_some() && result.shape == PayloadShape::Missing {
        let reason = format!("payload from {} has no usable `nodes` list", source.url);
        error!("{reason}; reconciling as zero nodes");
        degraded = Some(reason);
    }
    for id in &result.removed {
        info!("Node {id} no longer in payload, dropped from snapshot");
    }

    // Both files are staged before either is replaced.
    let staged_payload = payload
        .as_ref()
        .map(|p| json::stage_payload(&source.raw_json, p))
        .transpose()?;
    let staged_snapshot = csv::stage_snapshot(&source.snapshot, &result.records)?;
    staged_snapshot.commit()?;
    if let Some(staged) = staged_payload {
        staged.commit()?;
        info!("Payload saved to {}", source.raw_json.display());
    }

    let s = &result.summary;
    info!(
        "Exported {} nodes to {} ({} new, {} updated, {} unchanged, {} removed)",
        s.total,
        source.snapshot.display(),
        s.new,
        s.updated,
        s.unchanged,
        s.removed
    );

    Ok(PassReport {
        url: source.url.clone(),
        snapshot: source.snapshot.clone(),
        raw_json: payload.as_ref().map(|_| source.raw_json.clone()),
        shape: payload.as_ref().map(|_| result.shape),
        degraded,
        summary: result.summary,
        new: result.new.iter().map(|r| r.node_id.clone()).collect(),
        updated: result.updated,
        removed: result.removed,
    })
}
