//! Persistence contract for the orchestrator.
//!
//! The coordination layer only ever talks to [`Store`]; any backend that
//! implements it (the in-memory reference store, a document database, a
//! relational table) is substitutable without touching the core. Within one
//! run, writes are immediately visible to subsequent reads, and the last
//! writer wins; no conflict resolution is defined.

mod in_memory;

pub use in_memory::InMemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::model::{AgentMessage, Entity, Plan, Session, Step, StepStatus};

/// Entity counts for one store, used for status displays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub sessions: usize,
    pub plans: usize,
    pub steps: usize,
    pub messages: usize,
}

/// Keyed persistence for sessions, plans, steps, and inter-agent messages.
///
/// All operations may suspend on I/O in a real backend. `create_*` and
/// `update_*` both upsert by id; `get_*` return `None` for unknown ids.
#[async_trait]
pub trait Store: Send + Sync {
    // Sessions
    async fn create_session(&self, session: Session) -> StoreResult<Session>;
    async fn get_session(&self, session_id: &str) -> StoreResult<Option<Session>>;
    async fn update_session(&self, session: Session) -> StoreResult<Session>;

    // Plans
    async fn create_plan(&self, plan: Plan) -> StoreResult<Plan>;
    async fn get_plan(&self, plan_id: &str) -> StoreResult<Option<Plan>>;
    async fn update_plan(&self, plan: Plan) -> StoreResult<Plan>;

    /// The plan with the greatest creation timestamp among those matching
    /// both the session and the user, or `None` when nothing matches.
    async fn latest_plan_for_session(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> StoreResult<Option<Plan>>;

    // Steps
    async fn create_step(&self, step: Step) -> StoreResult<Step>;
    async fn get_step(&self, step_id: &str, session_id: &str) -> StoreResult<Option<Step>>;
    async fn update_step(&self, step: Step) -> StoreResult<Step>;

    /// All steps of a plan, in insertion order. This order defines both the
    /// conversation-history order and the dispatch order.
    async fn steps_for_plan(&self, plan_id: &str) -> StoreResult<Vec<Step>>;

    /// The plan's steps that are still waiting to be dispatched.
    async fn pending_steps_for_plan(&self, plan_id: &str) -> StoreResult<Vec<Step>> {
        let steps = self.steps_for_plan(plan_id).await?;
        Ok(steps
            .into_iter()
            .filter(|s| s.status == StepStatus::Planned)
            .collect())
    }

    // Agent messages
    async fn create_agent_message(&self, message: AgentMessage) -> StoreResult<AgentMessage>;
    async fn get_agent_message(&self, message_id: &str) -> StoreResult<Option<AgentMessage>>;
    async fn messages_for_session(&self, session_id: &str) -> StoreResult<Vec<AgentMessage>>;
    async fn messages_for_plan(&self, plan_id: &str) -> StoreResult<Vec<AgentMessage>>;
    async fn messages_for_step(&self, step_id: &str) -> StoreResult<Vec<AgentMessage>>;

    /// Store any entity through its typed creator.
    async fn add_item(&self, item: Entity) -> StoreResult<()> {
        match item {
            Entity::Session(session) => {
                self.create_session(session).await?;
            }
            Entity::Plan(plan) => {
                self.create_plan(plan).await?;
            }
            Entity::Step(step) => {
                self.create_step(step).await?;
            }
            Entity::Message(message) => {
                self.create_agent_message(message).await?;
            }
        }
        Ok(())
    }

    /// Drop every stored entity. Test reset only.
    async fn clear_all(&self) -> StoreResult<()>;

    /// Entity counts.
    async fn stats(&self) -> StoreResult<StoreStats>;
}
