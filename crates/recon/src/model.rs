use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Snapshot column order. Also the serialization order of [`NodeRecord`].
pub const FIELD_NAMES: [&str; 5] = ["hostname", "hardware_model", "node_id", "contact", "ipv6_address"];

/// One normalized node, as persisted in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub hostname: String,
    pub hardware_model: String,
    pub node_id: String,
    pub contact: String,
    pub ipv6_address: String,
}

impl NodeRecord {
    /// Field values in [`FIELD_NAMES`] order.
    pub fn fields(&self) -> [&str; 5] {
        [
            &self.hostname,
            &self.hardware_model,
            &self.node_id,
            &self.contact,
            &self.ipv6_address,
        ]
    }

    /// Fields whose values differ from `previous`, in column order.
    pub fn changes_from(&self, previous: &NodeRecord) -> Vec<FieldChange> {
        FIELD_NAMES
            .iter()
            .zip(previous.fields().iter().zip(self.fields().iter()))
            .filter(|(_, (old, new))| old != new)
            .map(|(field, (old, new))| FieldChange {
                field: (*field).to_string(),
                old: (*old).to_string(),
                new: (*new).to_string(),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Record set
// ---------------------------------------------------------------------------

/// Records keyed by `node_id`, iterated in insertion order.
///
/// Inserting an id that is already present replaces the stored record in
/// place: the value of the last insert wins, the position of the first
/// insert is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    records: Vec<NodeRecord>,
    index: HashMap<String, usize>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns the replaced record, if any.
    pub fn insert(&mut self, record: NodeRecord) -> Option<NodeRecord> {
        match self.index.get(&record.node_id) {
            Some(&pos) => Some(std::mem::replace(&mut self.records[pos], record)),
            None => {
                self.index.insert(record.node_id.clone(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    pub fn get(&self, node_id: &str) -> Option<&NodeRecord> {
        self.index.get(node_id).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.index.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeRecord> {
        self.records.iter()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.node_id.as_str())
    }
}

impl FromIterator<NodeRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = NodeRecord>>(iter: I) -> Self {
        let mut set = RecordSet::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a NodeRecord;
    type IntoIter = std::slice::Iter<'a, NodeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    New,
    Updated,
    Unchanged,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Updated => write!(f, "updated"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub old: String,
    pub new: String,
}

/// A node whose stored record differs from the incoming one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatedRecord {
    pub previous: NodeRecord,
    pub current: NodeRecord,
    pub changes: Vec<FieldChange>,
}

// ---------------------------------------------------------------------------
// Payload shape
// ---------------------------------------------------------------------------

/// How the node list was found in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    /// `nodes` is an array of node objects.
    List,
    /// `nodes` is an object keyed by node id.
    KeyedMap,
    /// No usable `nodes` key; treated as zero nodes.
    Missing,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total: usize,
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Payload entries collapsed into an earlier entry with the same id.
    pub duplicates: usize,
    /// Prior snapshot ids absent from the payload.
    pub removed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub shape: PayloadShape,
    pub summary: ReconSummary,
    #[serde(skip)]
    pub records: RecordSet,
    pub new: Vec<NodeRecord>,
    pub updated: Vec<UpdatedRecord>,
    pub unchanged: Vec<NodeRecord>,
    pub removed: Vec<String>,
}

impl ReconResult {
    /// Classification assigned to `node_id` in this pass.
    pub fn classification_of(&self, node_id: &str) -> Option<Classification> {
        if self.new.iter().any(|r| r.node_id == node_id) {
            Some(Classification::New)
        } else if self.updated.iter().any(|u| u.current.node_id == node_id) {
            Some(Classification::Updated)
        } else if self.unchanged.iter().any(|r| r.node_id == node_id) {
            Some(Classification::Unchanged)
        } else {
            None
        }
    }
}
