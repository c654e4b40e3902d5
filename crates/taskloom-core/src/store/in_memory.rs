//! In-memory reference implementation of the [`Store`] contract.
//!
//! Entities live in insertion-ordered vectors behind a single writer, so
//! `steps_for_plan` and the message queries return insertion order even when
//! timestamps collide within one run. Everything is lost on process exit.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreResult;
use crate::model::{AgentMessage, Plan, Session, Step};

use super::{Store, StoreStats};

/// In-memory store for a single run. Thread-safe with interior mutability.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    sessions: RwLock<Vec<Session>>,
    plans: RwLock<Vec<Plan>>,
    steps: RwLock<Vec<Step>>,
    messages: RwLock<Vec<AgentMessage>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store wrapped in `Arc` for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

/// Insert or replace-in-place by id, preserving insertion order.
fn upsert<T, F>(items: &mut Vec<T>, item: T, same_id: F)
where
    F: Fn(&T) -> bool,
{
    match items.iter_mut().find(|existing| same_id(existing)) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_session(&self, session: Session) -> StoreResult<Session> {
        debug!(session_id = %session.id, "Storing session");
        let mut sessions = self.sessions.write().await;
        upsert(&mut sessions, session.clone(), |s| s.id == session.id);
        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> StoreResult<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.iter().find(|s| s.id == session_id).cloned())
    }

    async fn update_session(&self, session: Session) -> StoreResult<Session> {
        self.create_session(session).await
    }

    async fn create_plan(&self, plan: Plan) -> StoreResult<Plan> {
        debug!(plan_id = %plan.id, session_id = %plan.session_id, "Storing plan");
        let mut plans = self.plans.write().await;
        upsert(&mut plans, plan.clone(), |p| p.id == plan.id);
        Ok(plan)
    }

    async fn get_plan(&self, plan_id: &str) -> StoreResult<Option<Plan>> {
        let plans = self.plans.read().await;
        Ok(plans.iter().find(|p| p.id == plan_id).cloned())
    }

    async fn update_plan(&self, plan: Plan) -> StoreResult<Plan> {
        self.create_plan(plan).await
    }

    async fn latest_plan_for_session(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> StoreResult<Option<Plan>> {
        let plans = self.plans.read().await;
        Ok(plans
            .iter()
            .filter(|p| p.session_id == session_id && p.user_id == user_id)
            .max_by_key(|p| p.created_at)
            .cloned())
    }

    async fn create_step(&self, step: Step) -> StoreResult<Step> {
        debug!(step_id = %step.id, plan_id = %step.plan_id, status = %step.status, "Storing step");
        let mut steps = self.steps.write().await;
        upsert(&mut steps, step.clone(), |s| s.id == step.id);
        Ok(step)
    }

    async fn get_step(&self, step_id: &str, _session_id: &str) -> StoreResult<Option<Step>> {
        // The session id partitions steps in a real backend; a single run's
        // memory holds them all, so the id alone is enough here.
        let steps = self.steps.read().await;
        Ok(steps.iter().find(|s| s.id == step_id).cloned())
    }

    async fn update_step(&self, step: Step) -> StoreResult<Step> {
        self.create_step(step).await
    }

    async fn steps_for_plan(&self, plan_id: &str) -> StoreResult<Vec<Step>> {
        let steps = self.steps.read().await;
        Ok(steps
            .iter()
            .filter(|s| s.plan_id == plan_id)
            .cloned()
            .collect())
    }

    async fn create_agent_message(&self, message: AgentMessage) -> StoreResult<AgentMessage> {
        debug!(message_id = %message.id, source = %message.source, "Storing agent message");
        let mut messages = self.messages.write().await;
        upsert(&mut messages, message.clone(), |m| m.id == message.id);
        Ok(message)
    }

    async fn get_agent_message(&self, message_id: &str) -> StoreResult<Option<AgentMessage>> {
        let messages = self.messages.read().await;
        Ok(messages.iter().find(|m| m.id == message_id).cloned())
    }

    async fn messages_for_session(&self, session_id: &str) -> StoreResult<Vec<AgentMessage>> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn messages_for_plan(&self, plan_id: &str) -> StoreResult<Vec<AgentMessage>> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| m.plan_id == plan_id)
            .cloned()
            .collect())
    }

    async fn messages_for_step(&self, step_id: &str) -> StoreResult<Vec<AgentMessage>> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| m.step_id.as_deref() == Some(step_id))
            .cloned()
            .collect())
    }

    async fn clear_all(&self) -> StoreResult<()> {
        self.sessions.write().await.clear();
        self.plans.write().await.clear();
        self.steps.write().await.clear();
        self.messages.write().await.clear();
        debug!("Cleared all stored entities");
        Ok(())
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        Ok(StoreStats {
            sessions: self.sessions.read().await.len(),
            plans: self.plans.read().await.len(),
            steps: self.steps.read().await.len(),
            messages: self.messages.read().await.len(),
        })
    }
}
