//! Policy-specific error types.

use thiserror::Error;

/// Errors that can occur while loading policy inputs.
#[derive(Debug, Error)]
pub enum PolicyError {
    // ── Node table ───────────────────────────────────────────────────────────

    #[error("failed to get node table: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to get node table: {0}")]
    Status(reqwest::StatusCode),

    #[error("error when reading node table: {0}")]
    Decode(#[from] serde_json::Error),

    // ── Static configuration ─────────────────────────────────────────────────

    #[error("failed to parse static credentials: entry {0} has no ':' separator")]
    InvalidCredentials(usize),
}
