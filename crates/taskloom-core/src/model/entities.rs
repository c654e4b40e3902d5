//! Stored entities: sessions, plans, steps, and inter-agent messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agent_kind::AgentKind;
use super::status::{ApprovalStatus, PlanStatus, StepStatus};

/// A user's interaction context. Created once at run start, mutated to
/// reflect session-level status, never deleted during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Free-form session status, e.g. `active`
    pub current_status: String,
    /// Optional message surfaced to the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_to_user: Option<String>,
    /// When the session was created
    pub timestamp: DateTime<Utc>,
}

impl Session {
    /// Create a new session for a user.
    pub fn new(user_id: impl Into<String>, current_status: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            current_status: current_status.into(),
            message_to_user: None,
            timestamp: Utc::now(),
        }
    }
}

/// The unit of work derived from one user goal.
///
/// A plan is owned by the session that created it. Its `overall_status`
/// becomes [`PlanStatus::Completed`] only when every owned step is terminal,
/// and never regresses afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Unique plan identifier
    pub id: String,
    /// Owning session
    pub session_id: String,
    /// Owning user
    pub user_id: String,
    /// The goal text as the user stated it
    pub initial_goal: String,
    /// Overall plan status
    pub overall_status: PlanStatus,
    /// Which agent produced the plan
    pub source: AgentKind,
    /// Planner-produced summary of the plan and its steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Clarifying question the planner wants answered before execution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_clarification_request: Option<String>,
    /// The user's answer to the clarification request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_clarification_response: Option<String>,
    /// When the plan was created
    pub created_at: DateTime<Utc>,
}

impl Plan {
    /// Create a new in-progress plan for a goal.
    pub fn new(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        initial_goal: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            user_id: user_id.into(),
            initial_goal: initial_goal.into(),
            overall_status: PlanStatus::InProgress,
            source: AgentKind::Planner,
            summary: None,
            human_clarification_request: None,
            human_clarification_response: None,
            created_at: Utc::now(),
        }
    }
}

/// One unit of delegated work within a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Unique step identifier
    pub id: String,
    /// Owning plan
    pub plan_id: String,
    /// Owning session
    pub session_id: String,
    /// Owning user
    pub user_id: String,
    /// Human-readable instruction for the assigned worker
    pub action: String,
    /// The worker this step is assigned to; `None` means the planner failed
    /// to assign one, which fails fast at dispatch time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentKind>,
    /// Current lifecycle status
    pub status: StepStatus,
    /// The worker's textual result, once it has replied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_reply: Option<String>,
    /// Combined human feedback recorded against this step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_feedback: Option<String>,
    /// Where the step stands with the human approver
    pub human_approval_status: ApprovalStatus,
    /// Human-supplied replacement for `action`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_action: Option<String>,
    /// When the step was created
    pub timestamp: DateTime<Utc>,
}

impl Step {
    /// Create a new planned step.
    pub fn new(
        plan_id: impl Into<String>,
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        action: impl Into<String>,
        agent: Option<AgentKind>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            plan_id: plan_id.into(),
            session_id: session_id.into(),
            user_id: user_id.into(),
            action: action.into(),
            agent,
            status: StepStatus::Planned,
            agent_reply: None,
            human_feedback: None,
            human_approval_status: ApprovalStatus::Requested,
            updated_action: None,
            timestamp: Utc::now(),
        }
    }

    /// Check if the step reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Immutable audit record of one communication in the conversation.
///
/// Append-only: used for the audit trail and for reconstructing the
/// conversational context fed to workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Unique message identifier
    pub id: String,
    /// Owning session
    pub session_id: String,
    /// Owning user
    pub user_id: String,
    /// Owning plan; empty when the message precedes plan creation
    pub plan_id: String,
    /// Free-text content
    pub content: String,
    /// The party that emitted the message
    pub source: AgentKind,
    /// The step this message belongs to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    /// When the message was recorded
    pub timestamp: DateTime<Utc>,
}

impl AgentMessage {
    /// Create a new audit message.
    pub fn new(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        plan_id: impl Into<String>,
        content: impl Into<String>,
        source: AgentKind,
        step_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            user_id: user_id.into(),
            plan_id: plan_id.into(),
            content: content.into(),
            source,
            step_id,
            timestamp: Utc::now(),
        }
    }
}

/// A stored entity of any kind, for the generic `add_item` dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "data_type", rename_all = "snake_case")]
pub enum Entity {
    Session(Session),
    Plan(Plan),
    Step(Step),
    Message(AgentMessage),
}

/// Per-status step counts for a plan, with the plan-completion rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanProgress {
    pub total: usize,
    pub planned: usize,
    pub awaiting_feedback: usize,
    pub approved: usize,
    pub rejected: usize,
    pub action_requested: usize,
    pub completed: usize,
    pub failed: usize,
}

impl PlanProgress {
    /// Tally the steps of one plan by status.
    pub fn from_steps(steps: &[Step]) -> Self {
        let mut progress = Self {
            total: steps.len(),
            ..Self::default()
        };
        for step in steps {
            match step.status {
                StepStatus::Planned => progress.planned += 1,
                StepStatus::AwaitingFeedback => progress.awaiting_feedback += 1,
                StepStatus::Approved => progress.approved += 1,
                StepStatus::Rejected => progress.rejected += 1,
                StepStatus::ActionRequested => progress.action_requested += 1,
                StepStatus::Completed => progress.completed += 1,
                StepStatus::Failed => progress.failed += 1,
            }
        }
        progress
    }

    /// Check if every step is in a terminal status.
    pub fn all_terminal(&self) -> bool {
        self.completed + self.failed == self.total
    }

    /// Compute the plan status implied by these counts, given the current
    /// status. A plan is `Completed` exactly when all steps are terminal,
    /// and a `Completed` plan never regresses.
    pub fn plan_status(&self, current: PlanStatus) -> PlanStatus {
        if current == PlanStatus::Completed || self.all_terminal() {
            PlanStatus::Completed
        } else {
            current
        }
    }
}
