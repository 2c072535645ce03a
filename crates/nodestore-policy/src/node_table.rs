//! Production node table.
//!
//! The node table is a JSON array of records like
//!
//! ```json
//! {"node_id": "000048B02D05A0A4", "files_public": true, "commission_date": "2021-06-01", "retire_date": null}
//! ```
//!
//! Older listings carry `restricted` instead of `files_public`. Flags may be JSON
//! booleans or strings. Records that cannot be decoded, or whose node ID is not
//! a 16 character hex string, are skipped; malformed dates are logged and left
//! unset. Only a failed request or a payload that is not a JSON array fails the
//! whole load.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::authorizer::NodePolicy;
use crate::error::PolicyError;

/// Node policies keyed by lowercase node ID.
pub type NodeTable = HashMap<String, NodePolicy>;

const NODE_ID_LEN: usize = 16;

// ─── Source ──────────────────────────────────────────────────────────────────

/// Anything that can produce a fresh node table.
#[async_trait]
pub trait NodeTableSource: Send + Sync {
    async fn fetch(&self) -> Result<NodeTable, PolicyError>;
}

/// Fetches the node table over HTTP.
#[derive(Debug, Clone)]
pub struct NodeTableClient {
    http: reqwest::Client,
    url: String,
}

impl NodeTableClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, PolicyError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nodestore/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl NodeTableSource for NodeTableClient {
    async fn fetch(&self) -> Result<NodeTable, PolicyError> {
        let resp = self.http.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PolicyError::Status(status));
        }
        let body = resp.bytes().await?;
        parse_node_table(&body)
    }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct NodeRecord {
    node_id: String,
    #[serde(default, deserialize_with = "flag")]
    restricted: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    files_public: Option<bool>,
    #[serde(default)]
    commission_date: Option<String>,
    #[serde(default)]
    retire_date: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let value = Option::<Flag>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Flag::Bool(b) => Some(b),
        Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
    }))
}

/// Parse a node table payload.
pub fn parse_node_table(payload: &[u8]) -> Result<NodeTable, PolicyError> {
    let items: Vec<serde_json::Value> = serde_json::from_slice(payload)?;
    let mut nodes = NodeTable::with_capacity(items.len());

    for item in items {
        let record: NodeRecord = match serde_json::from_value(item) {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping undecodable node record: {e}");
                continue;
            }
        };

        let node_id = record.node_id.trim().to_lowercase();
        if !is_node_id(&node_id) {
            debug!(node_id = %record.node_id, "Skipping node with invalid id");
            continue;
        }

        // Unknown publicity means private.
        let restricted = record
            .restricted
            .or(record.files_public.map(|public| !public))
            .unwrap_or(true);

        let policy = NodePolicy {
            restricted,
            commission_date: parse_date(&node_id, "commission", record.commission_date.as_deref()),
            retire_date: parse_date(&node_id, "retire", record.retire_date.as_deref()),
        };
        nodes.insert(node_id, policy);
    }

    Ok(nodes)
}

fn is_node_id(s: &str) -> bool {
    s.len() == NODE_ID_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Parse a `YYYY-MM-DD` date as midnight UTC. Empty means unset.
fn parse_date(node_id: &str, which: &str, value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date.and_time(chrono::NaiveTime::MIN).and_utc()),
        Err(e) => {
            warn!(node_id, value, "{which} date is invalid: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn midnight(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn parses_files_public_listing() {
        let nodes = parse_node_table(
            br#"[
                {"node_id": "000048B02D05A0A4", "files_public": true, "commission_date": "2021-06-01", "retire_date": null},
                {"node_id": "000048b02d15bc7c", "files_public": false, "commission_date": "2022-01-15", "retire_date": "2024-02-29"}
            ]"#,
        )
        .unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(
            nodes["000048b02d05a0a4"],
            NodePolicy {
                restricted: false,
                commission_date: Some(midnight(2021, 6, 1)),
                retire_date: None,
            }
        );
        let second = &nodes["000048b02d15bc7c"];
        assert!(second.restricted);
        assert_eq!(second.retire_date, Some(midnight(2024, 2, 29)));
    }

    #[test]
    fn parses_restricted_listing_with_string_flags() {
        let nodes = parse_node_table(
            br#"[
                {"node_id": "000048b02d05a0a4", "restricted": "false", "commission_date": "2021-06-01"},
                {"node_id": "000048b02d15bc7c", "restricted": "TRUE", "commission_date": "2021-06-01"},
                {"node_id": "000048b02d15bc7d", "restricted": true, "files_public": true}
            ]"#,
        )
        .unwrap();

        assert!(!nodes["000048b02d05a0a4"].restricted);
        assert!(nodes["000048b02d15bc7c"].restricted);
        // restricted takes precedence over files_public
        assert!(nodes["000048b02d15bc7d"].restricted);
    }

    #[test]
    fn missing_flags_default_to_restricted() {
        let nodes = parse_node_table(
            br#"[{"node_id": "000048b02d05a0a4", "commission_date": "2021-06-01"},
                 {"node_id": "000048b02d05a0a5", "files_public": "maybe"}]"#,
        )
        .unwrap();
        assert!(nodes["000048b02d05a0a4"].restricted);
        assert!(nodes["000048b02d05a0a5"].restricted);
    }

    #[test]
    fn skips_invalid_node_ids_and_records() {
        let nodes = parse_node_table(
            br#"[
                {"node_id": "", "files_public": true},
                {"node_id": "W023", "files_public": true},
                {"node_id": "000048b02d05a0a4x", "files_public": true},
                {"node_id": "000048b02d05a0g4", "files_public": true},
                {"node_id": 12345, "files_public": true},
                {"files_public": true},
                "not an object",
                {"node_id": "000048B02D05A0A4", "files_public": true}
            ]"#,
        )
        .unwrap();

        assert_eq!(nodes.len(), 1);
        assert!(nodes.contains_key("000048b02d05a0a4"));
    }

    #[test]
    fn malformed_dates_are_left_unset() {
        let nodes = parse_node_table(
            br#"[{"node_id": "000048b02d05a0a4", "files_public": true, "commission_date": "06/01/2021", "retire_date": "2021-13-01"},
                 {"node_id": "000048b02d05a0a5", "files_public": true, "commission_date": ""}]"#,
        )
        .unwrap();

        let node = &nodes["000048b02d05a0a4"];
        assert!(!node.restricted);
        assert_eq!(node.commission_date, None);
        assert_eq!(node.retire_date, None);
        assert_eq!(nodes["000048b02d05a0a5"].commission_date, None);
    }

    #[test]
    fn rejects_non_array_payloads() {
        assert!(matches!(parse_node_table(b"{}"), Err(PolicyError::Decode(_))));
        assert!(matches!(parse_node_table(b"not json"), Err(PolicyError::Decode(_))));
        assert!(parse_node_table(b"[]").unwrap().is_empty());
    }
}
