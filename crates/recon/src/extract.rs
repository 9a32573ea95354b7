//! RawNode → NodeRecord.
//!
//! Every field is read through [`lookup`], a key-sequence walk that yields
//! `None` as soon as a key is absent or a value on the way is not an object.
//! Absence is data: extraction never fails, it substitutes the configured
//! sentinel.

use serde_json::Value;

use crate::config::{Ipv6Policy, ReconOptions};
use crate::model::NodeRecord;

pub const HOSTNAME_PATH: &[&str] = &["nodeinfo", "hostname"];
pub const HARDWARE_MODEL_PATH: &[&str] = &["nodeinfo", "hardware", "model"];
pub const NODE_ID_PATH: &[&str] = &["nodeinfo", "node_id"];
pub const CONTACT_PATH: &[&str] = &["nodeinfo", "owner", "contact"];
pub const ADDRESSES_PATH: &[&str] = &["nodeinfo", "network", "addresses"];

/// Walk `keys` through nested objects.
pub fn lookup<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .try_fold(value, |current, key| current.as_object()?.get(*key))
}

/// Scalar leaf as text. `null`, `""`, arrays and objects have no text.
pub fn leaf_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Text at `keys`, or `default`.
pub fn text_or(value: &Value, keys: &[&str], default: &str) -> String {
    lookup(value, keys)
        .and_then(leaf_text)
        .unwrap_or_else(|| default.to_string())
}

/// Select the address reported as `ipv6_address` from an address list.
pub fn select_address<'a>(addresses: &'a [Value], policy: Ipv6Policy) -> Option<&'a str> {
    match policy {
        Ipv6Policy::Colon => addresses
            .iter()
            .filter_map(Value::as_str)
            .find(|addr| addr.contains(':')),
        Ipv6Policy::First => addresses
            .first()
            .and_then(Value::as_str)
            .filter(|addr| !addr.is_empty()),
    }
}

/// Normalize one raw node.
pub fn extract_record(node: &Value, options: &ReconOptions) -> NodeRecord {
    let default = options.default_value.as_str();

    let ipv6_address = lookup(node, ADDRESSES_PATH)
        .and_then(Value::as_array)
        .and_then(|addrs| select_address(addrs, options.ipv6))
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string());

    NodeRecord {
        hostname: text_or(node, HOSTNAME_PATH, default),
        hardware_model: text_or(node, HARDWARE_MODEL_PATH, default),
        node_id: text_or(node, NODE_ID_PATH, default),
        contact: text_or(node, CONTACT_PATH, default),
        ipv6_address,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_node() -> Value {
        json!({
            "nodeinfo": {
                "hostname": "ffnef-kirche",
                "hardware": { "model": "TP-Link TL-WR841N/ND v9" },
                "node_id": "aabbccddeeff",
                "owner": { "contact": "kontakt@example.org" },
                "network": {
                    "addresses": ["10.12.0.1", "fdef:ffc0:4fff::1", "fe80::1"]
                }
            }
        })
    }

    #[test]
    fn lookup_nested_paths() {
        let node = full_node();
        assert_eq!(
            lookup(&node, HARDWARE_MODEL_PATH).and_then(Value::as_str),
            Some("TP-Link TL-WR841N/ND v9")
        );
        assert!(lookup(&node, &["nodeinfo", "location", "latitude"]).is_none());
        // Intermediate value is a string, not an object
        assert!(lookup(&node, &["nodeinfo", "hostname", "x"]).is_none());
        // Empty key sequence is the value itself
        assert_eq!(lookup(&node, &[]), Some(&node));
    }

    #[test]
    fn extract_full_node() {
        let record = extract_record(&full_node(), &ReconOptions::default());
        assert_eq!(record.hostname, "ffnef-kirche");
        assert_eq!(record.hardware_model, "TP-Link TL-WR841N/ND v9");
        assert_eq!(record.node_id, "aabbccddeeff");
        assert_eq!(record.contact, "kontakt@example.org");
        assert_eq!(record.ipv6_address, "fdef:ffc0:4fff::1");
    }

    #[test]
    fn missing_addresses_key_yields_sentinel() {
        let node = json!({ "nodeinfo": { "node_id": "n1", "network": {} } });
        let record = extract_record(&node, &ReconOptions::default());
        assert_eq!(record.ipv6_address, "N/A");
        assert_eq!(record.hostname, "N/A");
    }

    #[test]
    fn empty_and_null_leaves_yield_sentinel() {
        let node = json!({
            "nodeinfo": {
                "hostname": "",
                "node_id": "n1",
                "owner": { "contact": null },
                "hardware": { "model": { "nested": true } }
            }
        });
        let opts = ReconOptions {
            default_value: "Unbekannt".into(),
            ..ReconOptions::default()
        };
        let record = extract_record(&node, &opts);
        assert_eq!(record.hostname, "Unbekannt");
        assert_eq!(record.contact, "Unbekannt");
        assert_eq!(record.hardware_model, "Unbekannt");
        assert_eq!(record.node_id, "n1");
    }

    #[test]
    fn numeric_leaf_rendered_as_text() {
        let node = json!({ "nodeinfo": { "node_id": 42, "hostname": true } });
        let record = extract_record(&node, &ReconOptions::default());
        assert_eq!(record.node_id, "42");
        assert_eq!(record.hostname, "true");
    }

    #[test]
    fn colon_policy_skips_ipv4() {
        let addrs = vec![json!("10.0.0.1"), json!(7), json!("2001:db8::1")];
        assert_eq!(select_address(&addrs, Ipv6Policy::Colon), Some("2001:db8::1"));
        assert_eq!(select_address(&addrs, Ipv6Policy::First), Some("10.0.0.1"));
    }

    #[test]
    fn no_qualifying_address() {
        let addrs = vec![json!("10.0.0.1"), json!("192.168.1.1")];
        assert_eq!(select_address(&addrs, Ipv6Policy::Colon), None);
        assert_eq!(select_address(&[], Ipv6Policy::First), None);
        assert_eq!(select_address(&[json!("")], Ipv6Policy::First), None);

        let node = json!({ "nodeinfo": { "network": { "addresses": "fe80::1" } } });
        let record = extract_record(&node, &ReconOptions::default());
        assert_eq!(record.ipv6_address, "N/A", "non-list addresses are ignored");
    }

    #[test]
    fn first_policy_takes_literal_first_entry() {
        let node = json!({
            "nodeinfo": { "network": { "addresses": ["10.12.0.1", "fe80::1"] } }
        });
        let opts = ReconOptions {
            ipv6: Ipv6Policy::First,
            ..ReconOptions::default()
        };
        assert_eq!(extract_record(&node, &opts).ipv6_address, "10.12.0.1");
    }
}
