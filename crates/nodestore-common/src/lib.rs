//! # nodestore-common
//!
//! Shared types, configuration, error handling, and the request path parser used
//! across all nodestore crates. No policy or storage logic lives here.

pub mod config;
pub mod error;
pub mod file_id;

pub use error::{StoreError, StoreResult};
pub use file_id::{FileIdError, FileIdentity};
