//! Error types for worker construction, dispatch, and planning.

use taskloom_core::{AgentKind, StoreError};
use thiserror::Error;

/// Errors raised by the coordination layer and its workers.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Dispatch addressed a worker identity that is absent from the
    /// registry (its construction failed or it was never built).
    #[error("Worker unavailable: {0}")]
    WorkerUnavailable(AgentKind),

    /// A step reached dispatch without an assigned worker.
    #[error("Step {0} has no assigned worker")]
    MissingAssignment(String),

    /// Provisioning a worker's backing model session failed.
    #[error("Failed to provision {kind}: {message}")]
    Provision { kind: AgentKind, message: String },

    /// A model invocation failed.
    #[error("Model call failed: {0}")]
    Model(String),

    /// The planner's decomposition could not be parsed.
    #[error("Planner returned an unusable plan: {0}")]
    PlanParse(String),

    /// No plan matched the lookup.
    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    /// No step matched the lookup.
    #[error("Step not found: {0}")]
    StepNotFound(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// A store operation failed; fatal to the current operation.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AgentError {
    /// Get the error code suitable for logging or reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            AgentError::WorkerUnavailable(_) => "WORKER_UNAVAILABLE",
            AgentError::MissingAssignment(_) => "MISSING_ASSIGNMENT",
            AgentError::Provision { .. } => "PROVISION_FAILED",
            AgentError::Model(_) => "MODEL_ERROR",
            AgentError::PlanParse(_) => "PLAN_PARSE_ERROR",
            AgentError::PlanNotFound(_) => "PLAN_NOT_FOUND",
            AgentError::StepNotFound(_) => "STEP_NOT_FOUND",
            AgentError::Internal(_) => "INTERNAL_ERROR",
            AgentError::Store(_) => "STORE_ERROR",
        }
    }
}

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
