//! # nodestore-policy
//!
//! Access policy for node data.
//!
//! ## Key concepts
//!
//! - **Authenticator** (`authorizer.rs`): the single decision seam used by the HTTP
//!   layer. The table-backed [`Authorizer`] grants access when static credentials
//!   match, or when the file is policy-public: its node is known, not restricted,
//!   commissioned on or before the file timestamp, and its task is not restricted.
//! - **Node table** (`node_table.rs`): fetches the production node list and
//!   normalizes it into per-node policies.
//! - **Refresher** (`refresh.rs`): background task that periodically reloads the
//!   node table and swaps a new configuration snapshot into the Authorizer.

pub mod authorizer;
pub mod credential;
pub mod error;
pub mod node_table;
pub mod refresh;

pub use authorizer::{AllowAll, Authenticator, Authorizer, AuthorizerConfig, DenyAll, NodePolicy};
pub use credential::Credential;
pub use error::PolicyError;
pub use node_table::{NodeTable, NodeTableClient, NodeTableSource};
pub use refresh::{Refresher, StaticPolicy};
