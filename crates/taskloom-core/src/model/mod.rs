//! Data model for the orchestrator: entities, statuses, and the message
//! types exchanged between the coordinator, planner, and workers.

mod agent_kind;
mod entities;
mod messages;
mod status;

pub use agent_kind::AgentKind;
pub use entities::{AgentMessage, Entity, Plan, PlanProgress, Session, Step};
pub use messages::{
    ActionRequest, ActionResponse, ApprovalRequest, HumanClarification, HumanFeedback, InputTask,
    PlannedStep, PlannedWork,
};
pub use status::{ApprovalStatus, PlanStatus, StepStatus};
