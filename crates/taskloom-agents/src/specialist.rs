//! Model-backed specialist workers and the identity-only human worker.

use async_trait::async_trait;
use tracing::{debug, info};

use taskloom_core::{ActionRequest, ActionResponse, AgentKind, StepStatus};

use crate::error::AgentResult;
use crate::model_client::ModelSessionHandle;
use crate::worker::{default_system_message, run_model_action, Worker, WorkerConfig};

/// A model-backed worker for one specialist identity (HR, Marketing,
/// Product, Procurement, Tech Support, or Generic).
///
/// Construction provisions a backing model session; a provisioning failure
/// surfaces as a construction error the factory isolates.
pub struct SpecialistWorker {
    kind: AgentKind,
    config: WorkerConfig,
    system_message: String,
    model_session: ModelSessionHandle,
}

impl std::fmt::Debug for SpecialistWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecialistWorker")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl SpecialistWorker {
    /// Construct and fully initialize a specialist for `kind`.
    pub async fn create(kind: AgentKind, config: WorkerConfig) -> AgentResult<Self> {
        let system_message = default_system_message(kind);
        let model_session = config.model.provision(kind, &system_message).await?;
        info!(agent = %kind, "Created specialist worker");
        Ok(Self {
            kind,
            config,
            system_message,
            model_session,
        })
    }
}

#[async_trait]
impl Worker for SpecialistWorker {
    fn kind(&self) -> AgentKind {
        self.kind
    }

    fn system_message(&self) -> &str {
        &self.system_message
    }

    async fn handle_action_request(&self, request: ActionRequest) -> AgentResult<ActionResponse> {
        debug!(agent = %self.kind, step_id = %request.step_id, "Handling action request");
        run_model_action(&self.config, self.kind, &self.model_session, request).await
    }
}

/// The human identity. It owns no model session: the coordinator treats a
/// step assigned here as satisfied once feedback has been recorded and
/// never actually dispatches to it.
pub struct HumanWorker {
    system_message: String,
}

impl HumanWorker {
    pub fn new() -> Self {
        Self {
            system_message: default_system_message(AgentKind::Human),
        }
    }
}

impl Default for HumanWorker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for HumanWorker {
    fn kind(&self) -> AgentKind {
        AgentKind::Human
    }

    fn system_message(&self) -> &str {
        &self.system_message
    }

    async fn handle_action_request(&self, request: ActionRequest) -> AgentResult<ActionResponse> {
        debug!(step_id = %request.step_id, "Human worker acknowledged action request");
        Ok(ActionResponse {
            step_id: request.step_id,
            plan_id: request.plan_id,
            session_id: request.session_id,
            result: "Satisfied by recorded human feedback.".to_string(),
            status: StepStatus::Completed,
        })
    }
}
