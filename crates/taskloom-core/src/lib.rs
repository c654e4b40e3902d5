//! # Taskloom Core
//!
//! Core data model and storage contract for the Taskloom multi-agent
//! orchestrator: sessions, plans, steps, inter-agent messages, their status
//! machines, and the persistence contract the coordination layer runs
//! against.

pub mod error;
pub mod model;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use model::{
    ActionRequest, ActionResponse, AgentKind, AgentMessage, ApprovalRequest, ApprovalStatus,
    Entity, HumanClarification, HumanFeedback, InputTask, Plan, PlanProgress, PlanStatus,
    PlannedStep, PlannedWork, Session, Step, StepStatus,
};
pub use store::{InMemoryStore, Store, StoreStats};
