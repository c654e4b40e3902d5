//! The planner: turns a user goal into a stored plan with ordered steps.

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{info, warn};

use taskloom_core::{
    ActionRequest, ActionResponse, AgentKind, AgentMessage, Entity, InputTask, Plan, PlannedWork,
    Step,
};

use crate::error::{AgentError, AgentResult};
use crate::model_client::ModelSessionHandle;
use crate::registry::WorkerRegistry;
use crate::worker::{default_system_message, run_model_action, Worker, WorkerConfig};

/// Decomposes a goal into a [`Plan`] plus ordered [`Step`]s, persisted
/// through the store.
///
/// The planner is constructed with the set of assignable worker identities;
/// once the registry exists, an immutable snapshot of it is injected so the
/// prompt only offers identities that were actually built.
pub struct Planner {
    config: WorkerConfig,
    system_message: String,
    model_session: ModelSessionHandle,
    available: Vec<AgentKind>,
    peers: OnceCell<Arc<WorkerRegistry>>,
}

impl Planner {
    /// Construct and fully initialize the planner.
    pub async fn create(config: WorkerConfig, available: Vec<AgentKind>) -> AgentResult<Self> {
        let system_message = default_system_message(AgentKind::Planner);
        let model_session = config
            .model
            .provision(AgentKind::Planner, &system_message)
            .await?;
        info!("Created planner worker");
        Ok(Self {
            config,
            system_message,
            model_session,
            available,
            peers: OnceCell::new(),
        })
    }

    /// Inject the registry snapshot. Effective only on the first call.
    pub fn attach_peers(&self, registry: Arc<WorkerRegistry>) {
        if self.peers.set(registry).is_err() {
            warn!("Planner peers were already attached");
        }
    }

    /// The identities a plan may assign steps to: the construction-time set,
    /// narrowed to workers that actually exist once the registry is known.
    fn assignable(&self) -> Vec<AgentKind> {
        match self.peers.get() {
            Some(registry) => self
                .available
                .iter()
                .copied()
                .filter(|kind| registry.contains(*kind))
                .collect(),
            None => self.available.clone(),
        }
    }

    fn planning_prompt(&self, description: &str) -> String {
        let agents = self
            .assignable()
            .iter()
            .map(|kind| format!("- {kind}"))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "{system}\n\nGoal: {description}\n\nAvailable agents:\n{agents}\n\n\
             Respond with a single JSON object of the form\n\
             {{\"initial_goal\": string, \"steps\": [{{\"action\": string, \"agent\": string}}], \
             \"summary\": string, \"human_clarification_request\": string or null}}.\n\
             Assign every step to one of the available agents by its exact name.",
            system = self.system_message,
        )
    }

    /// Create a plan for the task and persist it with its steps.
    ///
    /// Model and parse failures propagate unmodified; no plan is created.
    pub async fn handle_input_task(&self, task: InputTask) -> AgentResult<Plan> {
        info!(session_id = %task.session_id, "Planning goal");
        let prompt = self.planning_prompt(&task.description);
        let raw = self
            .config
            .model
            .complete(&self.model_session, &prompt)
            .await?;
        let parsed: PlannedWork = serde_json::from_str(extract_json(&raw))
            .map_err(|error| AgentError::PlanParse(error.to_string()))?;

        let mut plan = Plan::new(&task.session_id, &self.config.user_id, &task.description);
        plan.summary = parsed.summary.clone();
        plan.human_clarification_request = parsed.human_clarification_request.clone();
        self.config.store.add_item(Entity::Plan(plan.clone())).await?;

        for planned in &parsed.steps {
            let agent = match planned.agent.parse::<AgentKind>() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    warn!(agent = %planned.agent, "Unknown worker in decomposition; step left unassigned");
                    None
                }
            };
            let step = Step::new(
                &plan.id,
                &task.session_id,
                &self.config.user_id,
                &planned.action,
                agent,
            );
            self.config.store.add_item(Entity::Step(step)).await?;
        }

        self.config
            .store
            .add_item(Entity::Message(AgentMessage::new(
                &task.session_id,
                &self.config.user_id,
                &plan.id,
                format!(
                    "Generated a plan with {} steps for goal: {}",
                    parsed.steps.len(),
                    task.description
                ),
                AgentKind::Planner,
                None,
            )))
            .await?;

        info!(plan_id = %plan.id, steps = parsed.steps.len(), "Plan created");
        Ok(plan)
    }
}

/// Trim a model reply down to the JSON object it carries, tolerating fenced
/// or prose-wrapped output.
fn extract_json(raw: &str) -> &str {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end >= start => &raw[start..=end],
        _ => raw,
    }
}

#[async_trait]
impl Worker for Planner {
    fn kind(&self) -> AgentKind {
        AgentKind::Planner
    }

    fn system_message(&self) -> &str {
        &self.system_message
    }

    async fn handle_action_request(&self, request: ActionRequest) -> AgentResult<ActionResponse> {
        run_model_action(&self.config, AgentKind::Planner, &self.model_session, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_client::ScriptedModelClient;
    use taskloom_core::InMemoryStore;

    fn config() -> (WorkerConfig, Arc<ScriptedModelClient>) {
        let store = InMemoryStore::shared();
        let model = ScriptedModelClient::shared();
        (WorkerConfig::new("s-1", "u-1", store, model.clone()), model)
    }

    fn task() -> InputTask {
        InputTask {
            session_id: "s-1".to_string(),
            description: "onboard employee Jane".to_string(),
        }
    }

    #[tokio::test]
    async fn test_plan_and_steps_are_persisted_in_order() {
        let (config, model) = config();
        model.push_reply(
            AgentKind::Planner,
            r#"{
                "initial_goal": "onboard employee Jane",
                "steps": [
                    {"action": "set up payroll for Jane", "agent": "Hr_Agent"},
                    {"action": "order Jane a laptop", "agent": "Procurement_Agent"}
                ],
                "summary": "Onboarding plan for Jane"
            }"#,
        );

        let planner = Planner::create(config.clone(), AgentKind::ASSIGNABLE.to_vec())
            .await
            .unwrap();
        let plan = planner.handle_input_task(task()).await.unwrap();

        assert_eq!(plan.initial_goal, "onboard employee Jane");
        assert_eq!(plan.summary.as_deref(), Some("Onboarding plan for Jane"));

        let steps = config.store.steps_for_plan(&plan.id).await.unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].agent, Some(AgentKind::Hr));
        assert_eq!(steps[1].agent, Some(AgentKind::Procurement));
        assert_eq!(steps[0].action, "set up payroll for Jane");

        let messages = config.store.messages_for_plan(&plan.id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].source, AgentKind::Planner);
    }

    #[tokio::test]
    async fn test_fenced_reply_still_parses() {
        let (config, model) = config();
        model.push_reply(
            AgentKind::Planner,
            "```json\n{\"initial_goal\": \"g\", \"steps\": [{\"action\": \"a\", \"agent\": \"Generic_Agent\"}]}\n```",
        );

        let planner = Planner::create(config, AgentKind::ASSIGNABLE.to_vec())
            .await
            .unwrap();
        let plan = planner.handle_input_task(task()).await.unwrap();
        assert!(!plan.id.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_agent_leaves_step_unassigned() {
        let (config, model) = config();
        model.push_reply(
            AgentKind::Planner,
            r#"{"initial_goal": "g", "steps": [{"action": "a", "agent": "Finance_Agent"}]}"#,
        );

        let planner = Planner::create(config.clone(), AgentKind::ASSIGNABLE.to_vec())
            .await
            .unwrap();
        let plan = planner.handle_input_task(task()).await.unwrap();
        let steps = config.store.steps_for_plan(&plan.id).await.unwrap();
        assert_eq!(steps[0].agent, None);
    }

    #[tokio::test]
    async fn test_unparseable_reply_creates_no_plan() {
        let (config, model) = config();
        model.push_reply(AgentKind::Planner, "I cannot plan this.");

        let planner = Planner::create(config.clone(), AgentKind::ASSIGNABLE.to_vec())
            .await
            .unwrap();
        let err = planner.handle_input_task(task()).await.unwrap_err();
        assert_eq!(err.error_code(), "PLAN_PARSE_ERROR");
        assert!(
            config
                .store
                .latest_plan_for_session("s-1", "u-1")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let (config, model) = config();
        model.fail_completions(AgentKind::Planner);

        let planner = Planner::create(config, AgentKind::ASSIGNABLE.to_vec())
            .await
            .unwrap();
        let err = planner.handle_input_task(task()).await.unwrap_err();
        assert_eq!(err.error_code(), "MODEL_ERROR");
    }
}
