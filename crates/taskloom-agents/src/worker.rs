//! The worker capability contract.
//!
//! Every worker, regardless of specialization, exposes the same surface to
//! the coordinator: its identity, its persona, and one action-handling
//! operation. The coordinator calls nothing else on a generic worker.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use taskloom_core::{
    ActionRequest, ActionResponse, AgentKind, AgentMessage, Entity, StepStatus, Store,
};

use crate::error::{AgentError, AgentResult};
use crate::model_client::{ModelClient, ModelSessionHandle};

/// Shared construction context for workers: the session they serve, the
/// store they write through, and the model runtime backing them.
#[derive(Clone)]
pub struct WorkerConfig {
    pub session_id: String,
    pub user_id: String,
    pub store: Arc<dyn Store>,
    pub model: Arc<dyn ModelClient>,
}

impl WorkerConfig {
    pub fn new(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        store: Arc<dyn Store>,
        model: Arc<dyn ModelClient>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            store,
            model,
        }
    }
}

/// A component that can execute one step's action.
#[async_trait]
pub trait Worker: Send + Sync {
    /// The worker's identity.
    fn kind(&self) -> AgentKind;

    /// The persona instructions the worker was provisioned with.
    fn system_message(&self) -> &str;

    /// Execute one step's action and return a textual result with a
    /// terminal status. A failed action is a normal `Failed` response, not
    /// an error; errors are reserved for infrastructure problems.
    async fn handle_action_request(&self, request: ActionRequest) -> AgentResult<ActionResponse>;
}

/// Static persona instructions per worker identity.
pub fn default_system_message(kind: AgentKind) -> String {
    match kind {
        AgentKind::Human => {
            "You represent the human user. Steps assigned to you are satisfied by recorded feedback."
        }
        AgentKind::Hr => {
            "You are an HR agent. You handle onboarding, payroll, benefits, and other human-resources actions."
        }
        AgentKind::Marketing => {
            "You are a Marketing agent. You handle campaigns, copy, and market-facing communication."
        }
        AgentKind::Product => {
            "You are a Product agent. You answer questions about products and manage product configuration."
        }
        AgentKind::Procurement => {
            "You are a Procurement agent. You handle ordering equipment, supplies, and services."
        }
        AgentKind::TechSupport => {
            "You are a Tech Support agent. You handle accounts, devices, and IT requests."
        }
        AgentKind::Generic => {
            "You are a general-purpose agent. You handle actions that no specialized agent covers."
        }
        AgentKind::Planner => {
            "You are a Planner agent. You break a goal into ordered steps and assign each step to the best suited agent."
        }
        AgentKind::Coordinator => {
            "You are a Coordinator agent responsible for driving plans. You dispatch steps to specialized agents and track them to completion."
        }
    }
    .to_string()
}

/// Run one action against the model and record the outcome on the step.
///
/// The step mutation written here is the source of truth for the step's
/// terminal state after a dispatch; the coordinator does not rewrite it.
/// A model failure becomes a `Failed` response with an explanatory result.
pub(crate) async fn run_model_action(
    config: &WorkerConfig,
    kind: AgentKind,
    model_session: &ModelSessionHandle,
    request: ActionRequest,
) -> AgentResult<ActionResponse> {
    let mut step = config
        .store
        .get_step(&request.step_id, &request.session_id)
        .await?
        .ok_or_else(|| AgentError::StepNotFound(request.step_id.clone()))?;

    let (result, status) = match config.model.complete(model_session, &request.action).await {
        Ok(reply) => (reply, StepStatus::Completed),
        Err(error) => {
            warn!(agent = %kind, step_id = %request.step_id, error = %error, "Action failed");
            (
                format!("Unable to complete the action: {error}"),
                StepStatus::Failed,
            )
        }
    };

    step.agent_reply = Some(result.clone());
    step.status = status;
    config.store.update_step(step).await?;

    config
        .store
        .add_item(Entity::Message(AgentMessage::new(
            &request.session_id,
            &config.user_id,
            &request.plan_id,
            &result,
            kind,
            Some(request.step_id.clone()),
        )))
        .await?;

    Ok(ActionResponse {
        step_id: request.step_id,
        plan_id: request.plan_id,
        session_id: request.session_id,
        result,
        status,
    })
}
