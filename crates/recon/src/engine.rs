use serde_json::Value;

use crate::classify::{classify, Partitions};
use crate::config::{ReconOptions, WriteOrder};
use crate::evidence::compute_summary;
use crate::extract::extract_record;
use crate::model::{Classification, PayloadShape, ReconResult, RecordSet};
use crate::observer::PassObserver;

/// Top-level key holding the node list.
pub const NODES_KEY: &str = "nodes";

/// Locate the raw nodes in a payload.
///
/// Accepts `nodes` as an array or as an object keyed by node id (values in
/// document order). Anything else yields no nodes and [`PayloadShape::Missing`].
pub fn node_list(payload: &Value) -> (PayloadShape, Vec<&Value>) {
    match payload.get(NODES_KEY) {
        Some(Value::Array(items)) => (PayloadShape::List, items.iter().collect()),
        Some(Value::Object(map)) => (PayloadShape::KeyedMap, map.values().collect()),
        _ => (PayloadShape::Missing, Vec::new()),
    }
}

/// Normalize and deduplicate raw nodes. Last occurrence of an id wins.
///
/// Returns the record set and the number of entries that were collapsed.
pub fn collect_records(
    nodes: &[&Value],
    options: &ReconOptions,
    observer: &dyn PassObserver,
) -> (RecordSet, usize) {
    let mut records = RecordSet::new();
    let mut duplicates = 0;

    for node in nodes {
        let record = extract_record(node, options);
        let node_id = record.node_id.clone();
        if records.insert(record).is_some() {
            duplicates += 1;
            observer.on_duplicate(&node_id);
        }
    }

    (records, duplicates)
}

/// Run one reconciliation pass of `payload` against the `prior` snapshot.
///
/// Never fails: an unusable payload reconciles as zero nodes.
pub fn run(
    payload: &Value,
    prior: &RecordSet,
    options: &ReconOptions,
    observer: &dyn PassObserver,
) -> ReconResult {
    let (shape, nodes) = node_list(payload);
    let (incoming, duplicates) = collect_records(&nodes, options, observer);

    let mut parts = Partitions::default();
    for record in &incoming {
        let decision = classify(record, prior);
        let classification = decision.classification();
        parts.push(record.clone(), decision);

        match classification {
            Classification::New => observer.on_new(record),
            Classification::Unchanged => observer.on_unchanged(record),
            Classification::Updated => {
                if let Some(update) = parts.updated.last() {
                    observer.on_updated(update);
                }
            }
        }
    }

    let removed: Vec<String> = prior
        .node_ids()
        .filter(|id| !incoming.contains(id))
        .map(str::to_string)
        .collect();

    let summary = compute_summary(&parts, duplicates, removed.len());

    let records = match options.write_order {
        WriteOrder::Source => incoming,
        WriteOrder::Grouped => parts
            .new
            .iter()
            .chain(parts.updated.iter().map(|u| &u.current))
            .chain(parts.unchanged.iter())
            .cloned()
            .collect(),
    };

    ReconResult {
        shape,
        summary,
        records,
        new: parts.new,
        updated: parts.updated,
        unchanged: parts.unchanged,
        removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeRecord;
    use crate::observer::Silent;
    use serde_json::json;

    fn raw(id: &str, hostname: &str) -> Value {
        json!({
            "nodeinfo": {
                "hostname": hostname,
                "node_id": id,
                "hardware": { "model": "Ubiquiti UniFi AP" },
                "network": { "addresses": ["fe80::1"] }
            }
        })
    }

    fn stored(id: &str, hostname: &str) -> NodeRecord {
        NodeRecord {
            hostname: hostname.into(),
            hardware_model: "Ubiquiti UniFi AP".into(),
            node_id: id.into(),
            contact: "N/A".into(),
            ipv6_address: "fe80::1".into(),
        }
    }

    #[test]
    fn node_list_shapes() {
        let list = json!({ "nodes": [raw("a", "x")] });
        assert_eq!(node_list(&list).0, PayloadShape::List);

        let keyed = json!({ "nodes": { "a": raw("a", "x"), "b": raw("b", "y") } });
        let (shape, nodes) = node_list(&keyed);
        assert_eq!(shape, PayloadShape::KeyedMap);
        assert_eq!(nodes.len(), 2);

        assert_eq!(node_list(&json!({ "version": 2 })).0, PayloadShape::Missing);
        assert_eq!(node_list(&json!([1, 2])).0, PayloadShape::Missing);
        assert_eq!(node_list(&json!({ "nodes": "none" })).0, PayloadShape::Missing);
    }

    #[test]
    fn duplicate_ids_last_wins_first_position() {
        let payload = json!({
            "nodes": [raw("a", "first"), raw("b", "bee"), raw("a", "second")]
        });
        let result = run(&payload, &RecordSet::new(), &ReconOptions::default(), &Silent);

        assert_eq!(result.summary.total, 2);
        assert_eq!(result.summary.duplicates, 1);
        assert_eq!(result.records.node_ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(result.records.get("a").unwrap().hostname, "second");
        assert_eq!(result.new.len(), 2);
    }

    #[test]
    fn grouped_order_puts_new_first() {
        let prior: RecordSet = vec![stored("u", "same"), stored("c", "before")]
            .into_iter()
            .collect();
        let payload = json!({
            "nodes": [raw("u", "same"), raw("c", "after"), raw("n", "fresh")]
        });

        let source = run(&payload, &prior, &ReconOptions::default(), &Silent);
        assert_eq!(source.records.node_ids().collect::<Vec<_>>(), vec!["u", "c", "n"]);

        let opts = ReconOptions {
            write_order: WriteOrder::Grouped,
            ..ReconOptions::default()
        };
        let grouped = run(&payload, &prior, &opts, &Silent);
        assert_eq!(grouped.records.node_ids().collect::<Vec<_>>(), vec!["n", "c", "u"]);
        assert_eq!(grouped.summary, source.summary);
    }

    #[test]
    fn removed_ids_are_reported_not_kept() {
        let prior: RecordSet = vec![stored("gone", "old"), stored("kept", "k")]
            .into_iter()
            .collect();
        let payload = json!({ "nodes": [raw("kept", "k")] });
        let result = run(&payload, &prior, &ReconOptions::default(), &Silent);

        assert_eq!(result.removed, vec!["gone".to_string()]);
        assert_eq!(result.summary.removed, 1);
        assert!(!result.records.contains("gone"));
        assert_eq!(result.summary.unchanged, 1);
    }

    #[test]
    fn missing_nodes_key_reconciles_empty() {
        let prior: RecordSet = vec![stored("a", "x")].into_iter().collect();
        let result = run(&json!({ "timestamp": "2026-01-01" }), &prior, &ReconOptions::default(), &Silent);

        assert_eq!(result.shape, PayloadShape::Missing);
        assert!(result.records.is_empty());
        assert_eq!(result.summary.total, 0);
        assert_eq!(result.summary.removed, 1);
    }
}
