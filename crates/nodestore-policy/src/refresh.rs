//! Periodic node table refresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::authorizer::{Authorizer, AuthorizerConfig};
use crate::credential::Credential;
use crate::error::PolicyError;
use crate::node_table::NodeTableSource;

/// Policy inputs that come from local configuration rather than the node table.
#[derive(Debug, Clone, Default)]
pub struct StaticPolicy {
    pub credentials: Vec<Credential>,
    pub restricted_task_substrings: Vec<String>,
}

impl StaticPolicy {
    /// Snapshot with these inputs and no nodes: credentials work, nothing is public.
    pub fn initial_config(&self) -> AuthorizerConfig {
        AuthorizerConfig::new(
            self.credentials.clone(),
            Default::default(),
            self.restricted_task_substrings.clone(),
        )
    }
}

/// Reloads the node table into an [`Authorizer`] on a fixed interval.
pub struct Refresher<S> {
    authorizer: Arc<Authorizer>,
    source: S,
    policy: StaticPolicy,
    interval: Duration,
    retry_interval: Duration,
}

impl<S: NodeTableSource + 'static> Refresher<S> {
    pub fn new(
        authorizer: Arc<Authorizer>,
        source: S,
        policy: StaticPolicy,
        interval: Duration,
        retry_interval: Duration,
    ) -> Self {
        Self {
            authorizer,
            source,
            policy,
            interval,
            retry_interval,
        }
    }

    /// Fetch the node table once and install it. On error the current
    /// configuration is left in place.
    pub async fn refresh_once(&self) -> Result<usize, PolicyError> {
        let nodes = self.source.fetch().await?;
        let count = nodes.len();
        self.authorizer.update_config(AuthorizerConfig::new(
            self.policy.credentials.clone(),
            nodes,
            self.policy.restricted_task_substrings.clone(),
        ));
        Ok(count)
    }

    /// Refresh forever. The first fetch happens immediately.
    pub async fn run(self) {
        loop {
            let wait = match self.refresh_once().await {
                Ok(nodes) => {
                    info!(nodes, "Node table refreshed");
                    self.interval
                }
                Err(e) => {
                    warn!(retry_in = ?self.retry_interval, "Node table refresh failed: {e}");
                    self.retry_interval
                }
            };
            tokio::time::sleep(wait).await;
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
