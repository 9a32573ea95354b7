use crate::model::{Classification, NodeRecord, RecordSet, UpdatedRecord};

/// Outcome of comparing one incoming record against the prior snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<'a> {
    New,
    Unchanged,
    Updated { previous: &'a NodeRecord },
}

impl Decision<'_> {
    pub fn classification(&self) -> Classification {
        match self {
            Self::New => Classification::New,
            Self::Unchanged => Classification::Unchanged,
            Self::Updated { .. } => Classification::Updated,
        }
    }
}

/// Classify one record. Equality is exact string equality over all fields.
pub fn classify<'a>(record: &NodeRecord, prior: &'a RecordSet) -> Decision<'a> {
    match prior.get(&record.node_id) {
        None => Decision::New,
        Some(previous) if previous == record => Decision::Unchanged,
        Some(previous) => Decision::Updated { previous },
    }
}

/// Partitions of one pass, each in payload order.
#[derive(Debug, Default)]
pub struct Partitions {
    pub new: Vec<NodeRecord>,
    pub updated: Vec<UpdatedRecord>,
    pub unchanged: Vec<NodeRecord>,
}

impl Partitions {
    pub fn push(&mut self, record: NodeRecord, decision: Decision<'_>) {
        match decision {
            Decision::New => self.new.push(record),
            Decision::Unchanged => self.unchanged.push(record),
            Decision::Updated { previous } => self.updated.push(UpdatedRecord {
                changes: record.changes_from(previous),
                previous: previous.clone(),
                current: record,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.new.len() + self.updated.len() + self.unchanged.len()
    }
}
