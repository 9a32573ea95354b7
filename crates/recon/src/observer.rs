use crate::model::{NodeRecord, UpdatedRecord};

/// Receives one call per classification decision of a pass.
///
/// The engine never logs on its own; callers pass an observer that writes
/// to whatever sink they configured. All methods default to no-ops.
pub trait PassObserver {
    fn on_new(&self, _record: &NodeRecord) {}

    fn on_updated(&self, _update: &UpdatedRecord) {}

    fn on_unchanged(&self, _record: &NodeRecord) {}

    /// An id seen earlier in the same payload was overwritten.
    fn on_duplicate(&self, _node_id: &str) {}
}

/// Observer that discards everything.
pub struct Silent;

impl PassObserver for Silent {}
