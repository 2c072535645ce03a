//! Access decisions for stored files.
//!
//! A file may be read when either
//!
//! 1. the request carries credentials matching one of the configured pairs, or
//! 2. the file is *policy-public*: its node is in the node table, is not
//!    restricted, has a commission date no later than the file timestamp, and
//!    the task ID contains none of the restricted substrings.
//!
//! Valid credentials always win, including for restricted nodes and tasks.
//!
//! The [`Authorizer`] holds its configuration as an immutable snapshot behind a
//! read/write lock. Updates swap the whole snapshot; a decision in progress
//! keeps using the snapshot it started with.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use nodestore_common::FileIdentity;
use subtle::Choice;

use crate::credential::Credential;
use crate::node_table::NodeTable;

/// Decides whether a request may read a file.
pub trait Authenticator: Send + Sync {
    /// `credentials` is `None` when the request carried no (usable) Basic auth.
    fn authorized(&self, file: &FileIdentity, credentials: Option<&Credential>) -> bool;
}

/// Grants every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authenticator for AllowAll {
    fn authorized(&self, _: &FileIdentity, _: Option<&Credential>) -> bool {
        true
    }
}

/// Denies every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl Authenticator for DenyAll {
    fn authorized(&self, _: &FileIdentity, _: Option<&Credential>) -> bool {
        false
    }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Access policy for a single node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePolicy {
    /// Forced private, regardless of commission date.
    pub restricted: bool,
    /// Files timestamped at or after this instant are public. `None` means the
    /// node is not public yet.
    pub commission_date: Option<DateTime<Utc>>,
    /// Carried from the node table; not used in decisions.
    pub retire_date: Option<DateTime<Utc>>,
}

impl NodePolicy {
    pub fn public_at(&self, timestamp: DateTime<Utc>) -> bool {
        !self.restricted
            && self
                .commission_date
                .is_some_and(|commissioned| timestamp >= commissioned)
    }
}

/// Immutable policy snapshot.
#[derive(Debug, Clone, Default)]
pub struct AuthorizerConfig {
    credentials: Vec<Credential>,
    nodes: NodeTable,
    restricted_task_substrings: Vec<String>,
}

impl AuthorizerConfig {
    /// Node IDs are lowercased; empty task substrings are dropped.
    pub fn new(
        credentials: Vec<Credential>,
        nodes: NodeTable,
        restricted_task_substrings: Vec<String>,
    ) -> Self {
        let nodes: HashMap<_, _> = nodes
            .into_iter()
            .map(|(id, policy)| (id.to_lowercase(), policy))
            .collect();
        let restricted_task_substrings = restricted_task_substrings
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            credentials,
            nodes,
            restricted_task_substrings,
        }
    }

    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    pub fn node(&self, node_id: &str) -> Option<&NodePolicy> {
        self.nodes.get(&node_id.to_lowercase())
    }

    pub fn restricted_task_substrings(&self) -> &[String] {
        &self.restricted_task_substrings
    }

    /// Whether `credentials` match any configured pair.
    ///
    /// Every configured pair is compared, so the time taken does not depend on
    /// which pair (or which field) matched.
    pub fn authenticated(&self, credentials: Option<&Credential>) -> bool {
        let Some(given) = credentials else {
            return false;
        };
        let matched = self
            .credentials
            .iter()
            .fold(Choice::from(0), |acc, expected| acc | expected.ct_matches(given));
        matched.into()
    }

    pub fn task_restricted(&self, task_id: &str) -> bool {
        self.restricted_task_substrings
            .iter()
            .any(|s| task_id.contains(s.as_str()))
    }

    /// Whether `file` is readable without credentials.
    pub fn policy_public(&self, file: &FileIdentity) -> bool {
        let Some(node) = self.nodes.get(&file.policy_node_id()) else {
            return false;
        };
        node.public_at(file.timestamp) && !self.task_restricted(&file.task_id)
    }
}

// ─── Authorizer ──────────────────────────────────────────────────────────────

/// Table-backed [`Authenticator`] with a swappable configuration.
#[derive(Debug, Default)]
pub struct Authorizer {
    config: RwLock<Arc<AuthorizerConfig>>,
}

impl Authorizer {
    pub fn new(config: AuthorizerConfig) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
        }
    }

    /// Replace the configuration snapshot.
    pub fn update_config(&self, config: AuthorizerConfig) {
        let nodes = config.nodes.len();
        let next = Arc::new(config);
        // The guarded value is a whole snapshot, so a poisoned lock holds either
        // the old or the new one.
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = next;
        tracing::debug!(nodes, "Authorizer configuration updated");
    }

    /// The configuration snapshot currently in effect.
    pub fn snapshot(&self) -> Arc<AuthorizerConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Authenticator for Authorizer {
    fn authorized(&self, file: &FileIdentity, credentials: Option<&Credential>) -> bool {
        let config = self.snapshot();
        config.authenticated(credentials) || config.policy_public(file)
    }
}
