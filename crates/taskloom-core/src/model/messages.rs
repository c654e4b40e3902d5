//! Message types exchanged between the coordinator, planner, workers, and
//! the human user. These are transient values, not stored entities.

use serde::{Deserialize, Serialize};

use super::agent_kind::AgentKind;
use super::status::StepStatus;

/// The initial input task from the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputTask {
    /// Session the task belongs to
    pub session_id: String,
    /// The user's goal, in natural language
    pub description: String,
}

/// Human feedback on one step, or on every pending step of a plan when
/// `step_id` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanFeedback {
    /// The step the feedback targets; `None` applies it plan-wide
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    /// The plan the feedback targets
    pub plan_id: String,
    /// Session the feedback belongs to
    pub session_id: String,
    /// Whether the human approved the step(s)
    pub approved: bool,
    /// Optional free-text guidance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_feedback: Option<String>,
    /// Optional replacement action text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_action: Option<String>,
}

/// The user's answer to a plan-level clarification request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanClarification {
    /// The plan the clarification belongs to
    pub plan_id: String,
    /// Session the clarification belongs to
    pub session_id: String,
    /// The clarification text
    pub human_clarification: String,
}

/// Request sent toward the human worker to approve one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub step_id: String,
    pub plan_id: String,
    pub session_id: String,
    pub user_id: String,
    /// The action awaiting approval
    pub action: String,
    /// The worker the step is assigned to
    pub agent: AgentKind,
}

/// Instruction sent to a worker to perform one step's action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub step_id: String,
    pub plan_id: String,
    pub session_id: String,
    /// Composed instruction: conversation context plus the step's action
    pub action: String,
    /// The worker the request is addressed to
    pub agent: AgentKind,
}

/// A worker's answer to an [`ActionRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub step_id: String,
    pub plan_id: String,
    pub session_id: String,
    /// Textual result of performing the action
    pub result: String,
    /// Terminal outcome: `Completed` or `Failed`
    pub status: StepStatus,
}

/// One step of a planner decomposition, as produced by the model.
///
/// The agent name is kept as raw text; the planner resolves it against
/// [`AgentKind`] and leaves the step unassigned when the name is unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedStep {
    /// Instruction for the assigned worker
    pub action: String,
    /// Wire name of the assigned worker, e.g. `Hr_Agent`
    pub agent: String,
}

/// The decomposition a planner model returns for one goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedWork {
    /// The goal, restated
    pub initial_goal: String,
    /// Ordered steps to reach the goal
    pub steps: Vec<PlannedStep>,
    /// Summary of the plan and its steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Question the planner wants the human to answer first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_clarification_request: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planned_work_deserializes_without_optionals() {
        let json = r#"{
            "initial_goal": "onboard employee Jane",
            "steps": [
                {"action": "set up payroll", "agent": "Hr_Agent"},
                {"action": "order a laptop", "agent": "Procurement_Agent"}
            ]
        }"#;
        let work: PlannedWork = serde_json::from_str(json).unwrap();
        assert_eq!(work.steps.len(), 2);
        assert!(work.summary.is_none());
        assert!(work.human_clarification_request.is_none());
    }

    #[test]
    fn test_action_response_round_trip() {
        let response = ActionResponse {
            step_id: "st-1".to_string(),
            plan_id: "p-1".to_string(),
            session_id: "s-1".to_string(),
            result: "done".to_string(),
            status: StepStatus::Completed,
        };
        let json = serde_json::to_string(&response).unwrap();
        let back: ActionResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
    }

    #[test]
    fn test_plan_wide_feedback_has_no_step_id() {
        let feedback = HumanFeedback {
            step_id: None,
            plan_id: "p-1".to_string(),
            session_id: "s-1".to_string(),
            approved: false,
            human_feedback: Some("not yet".to_string()),
            updated_action: None,
        };
        let json = serde_json::to_string(&feedback).unwrap();
        assert!(!json.contains("step_id"));
    }
}
