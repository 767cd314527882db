use thiserror::Error;

use crate::award::types::{AwardId, AwardStatus};

/// Errors surfaced by the workflow state machine and its orchestrator.
///
/// Transitions are all-or-nothing: when any of these is returned, no award or
/// section state has been persisted.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("missing required fields: {}", .0.iter().map(|m| m.label.as_str()).collect::<Vec<_>>().join(", "))]
    MissingFields(Vec<MissingFieldError>),

    #[error("invalid transition from status {status:?}")]
    InvalidTransition { status: AwardStatus },

    #[error("unsupported flag combination at status {status:?}: {detail}")]
    UnsupportedCombination {
        status: AwardStatus,
        detail: String,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A single unset field reported by the minimum-field validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFieldError {
    pub field: &'static str,
    pub label: String,
}

/// Errors from the persistence boundary.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("award {0} not found")]
    NotFound(AwardId),

    /// Optimistic lock failure. Retryable by the caller; the engine never
    /// retries on its own.
    #[error("concurrent modification of award {0}")]
    Conflict(AwardId),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the notification channel. Always swallowed and logged by the
/// dispatcher; never propagated into a transition result.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}
