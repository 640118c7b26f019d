//! Error types for the intel orchestrator.

use thiserror::Error;

/// Errors surfaced by the orchestration engine.
///
/// Only `UnknownSource`, `DuplicateSource` and `InvalidMode` ever reach a
/// caller. The remaining variants are produced at the runner boundary, logged,
/// and folded into health records.
#[derive(Debug, Error)]
pub enum IntelError {
    /// Lookup of a source id that was never registered.
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// Attempted to register a source id twice.
    #[error("source already registered: {0}")]
    DuplicateSource(String),

    /// A collector raised, timed out, panicked or returned an invalid payload.
    #[error("collection failed for {source_id}: {reason}")]
    CollectionFailure { source_id: String, reason: String },

    /// Best-effort snapshot persistence failed.
    #[error("persisting snapshot for {source_id} failed: {reason}")]
    PersistenceFailure { source_id: String, reason: String },

    /// Best-effort audit log write failed.
    #[error("audit log write failed: {0}")]
    AuditLogFailure(String),

    /// Transport mode string did not parse.
    #[error("invalid transport mode: {0}")]
    InvalidMode(String),
}

impl IntelError {
    pub fn collection(source_id: &str, reason: impl std::fmt::Display) -> Self {
        Self::CollectionFailure {
            source_id: source_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type IntelResult<T> = std::result::Result<T, IntelError>;
