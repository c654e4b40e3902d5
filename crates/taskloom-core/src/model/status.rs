//! Status machines for plans, steps, and human approval.

use serde::{Deserialize, Serialize};

/// Status of a single step in its lifecycle.
///
/// The lifecycle is linear with an explicit rejection branch:
/// `Planned → (AwaitingFeedback) → Approved/Rejected → ActionRequested →
/// Completed/Failed`. `Completed` and `Failed` are terminal; a `Rejected`
/// step is never dispatched again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step created by the planner, not yet acted on
    Planned,
    /// Step is waiting for human approval
    AwaitingFeedback,
    /// Human approved the step
    Approved,
    /// Human rejected the step
    Rejected,
    /// Step was dispatched to its assigned worker
    ActionRequested,
    /// Worker finished the step successfully
    Completed,
    /// Worker could not complete the step
    Failed,
}

impl StepStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }

    /// Check whether moving from `self` to `next` follows the lifecycle
    /// edges. Terminal states admit no further transition, and a rejected
    /// step cannot re-enter the dispatch path.
    pub fn can_transition(self, next: StepStatus) -> bool {
        use StepStatus::*;
        match self {
            Planned => matches!(next, AwaitingFeedback | Approved | Rejected | ActionRequested),
            AwaitingFeedback => matches!(next, Approved | Rejected),
            Approved => matches!(next, ActionRequested),
            Rejected => false,
            ActionRequested => matches!(next, Completed | Failed),
            Completed | Failed => false,
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Planned => write!(f, "planned"),
            StepStatus::AwaitingFeedback => write!(f, "awaiting_feedback"),
            StepStatus::Approved => write!(f, "approved"),
            StepStatus::Rejected => write!(f, "rejected"),
            StepStatus::ActionRequested => write!(f, "action_requested"),
            StepStatus::Completed => write!(f, "completed"),
            StepStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Overall status of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// Plan has steps that are not yet terminal
    InProgress,
    /// Every owned step reached a terminal status
    Completed,
    /// Plan creation or execution failed outright
    Failed,
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanStatus::InProgress => write!(f, "in_progress"),
            PlanStatus::Completed => write!(f, "completed"),
            PlanStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Human approval state recorded on a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Approval has been requested but not yet given
    Requested,
    /// Human accepted the step
    Accepted,
    /// Human rejected the step
    Rejected,
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalStatus::Requested => write!(f, "requested"),
            ApprovalStatus::Accepted => write!(f, "accepted"),
            ApprovalStatus::Rejected => write!(f, "rejected"),
        }
    }
}
