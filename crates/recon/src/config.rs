use serde::{Deserialize, Serialize};

use crate::error::ReconError;

pub const DEFAULT_SENTINEL: &str = "N/A";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Per-pass reconciliation options. Deserialized from the `[recon]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconOptions {
    /// Substituted for every absent or empty field.
    pub default_value: String,
    pub ipv6: Ipv6Policy,
    pub write_order: WriteOrder,
}

impl Default for ReconOptions {
    fn default() -> Self {
        Self {
            default_value: DEFAULT_SENTINEL.to_string(),
            ipv6: Ipv6Policy::default(),
            write_order: WriteOrder::default(),
        }
    }
}

impl ReconOptions {
    pub fn validate(&self) -> Result<(), ReconError> {
        if self.default_value.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "default_value must not be empty".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// IPv6 selection
// ---------------------------------------------------------------------------

/// Which entry of `nodeinfo.network.addresses` becomes `ipv6_address`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ipv6Policy {
    /// First entry containing a `:`.
    #[default]
    Colon,
    /// First entry, whatever it contains.
    First,
}

impl std::fmt::Display for Ipv6Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Colon => write!(f, "colon"),
            Self::First => write!(f, "first"),
        }
    }
}

impl std::str::FromStr for Ipv6Policy {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "colon" => Ok(Self::Colon),
            "first" => Ok(Self::First),
            other => Err(ReconError::ConfigValidation(format!(
                "unknown ipv6 policy '{other}' (expected 'colon' or 'first')"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot write order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOrder {
    /// Payload order of first appearance.
    #[default]
    Source,
    /// New, then updated, then unchanged; payload order within each group.
    Grouped,
}

impl std::fmt::Display for WriteOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Grouped => write!(f, "grouped"),
        }
    }
}

impl std::str::FromStr for WriteOrder {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(Self::Source),
            "grouped" => Ok(Self::Grouped),
            other => Err(ReconError::ConfigValidation(format!(
                "unknown write order '{other}' (expected 'source' or 'grouped')"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
