use crate::classify::Partitions;
use crate::model::ReconSummary;

/// Compute summary counts from the partitions of a pass.
pub fn compute_summary(parts: &Partitions, duplicates: usize, removed: usize) -> ReconSummary {
    ReconSummary {
        total: parts.len(),
        new: parts.new.len(),
        updated: parts.updated.len(),
        unchanged: parts.unchanged.len(),
        duplicates,
        removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Decision;
    use crate::model::NodeRecord;

    fn record(id: &str) -> NodeRecord {
        NodeRecord {
            hostname: "h".into(),
            hardware_model: "m".into(),
            node_id: id.into(),
            contact: "c".into(),
            ipv6_address: "fe80::1".into(),
        }
    }

    #[test]
    fn summary_counts() {
        let previous = record("b");
        let mut parts = Partitions::default();
        parts.push(record("a"), Decision::New);
        parts.push(record("c"), Decision::New);
        parts.push(record("b"), Decision::Updated { previous: &previous });
        parts.push(record("d"), Decision::Unchanged);

        let summary = compute_summary(&parts, 2, 1);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.new, 2);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.duplicates, 2);
        assert_eq!(summary.removed, 1);
    }
}
