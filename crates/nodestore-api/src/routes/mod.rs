pub mod data;
pub mod discovery;
pub mod metrics;
