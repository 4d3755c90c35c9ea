//! Error handling module
//!
//! Provides the crate-wide error type returned by every synchronization
//! entry point.

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::descriptor::DescriptorError;

/// A single CREATE/ALTER statement that failed to apply.
///
/// The raw driver message is preserved so callers can diagnose type
/// conflicts, permission problems and syntax errors without re-running the
/// statement by hand.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementFailure {
    pub statement: String,
    pub reason: String,
}

/// Errors produced by a synchronization pass.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The database rejected a query outside the per-statement batch
    /// (introspection, connection probe). Fatal for the pass.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// No connection could be checked out of the pool. Fatal for the pass.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// Malformed entity metadata. Raised before any DDL is emitted.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Writing the generated script artifact failed.
    #[error("Failed to persist schema script: {0}")]
    Io(#[from] std::io::Error),

    /// One or more statements failed while the rest of the pass ran to
    /// completion. Carries every failure, in execution order.
    #[error("{} schema statement(s) failed to apply", .0.len())]
    Statements(Vec<StatementFailure>),
}

impl SyncError {
    /// The per-statement failures, if this error carries any.
    pub fn statement_failures(&self) -> &[StatementFailure] {
        match self {
            SyncError::Statements(failures) => failures,
            _ => &[],
        }
    }
}

/// Result type alias used across the crate.
pub type SyncResult<T> = Result<T, SyncError>;
