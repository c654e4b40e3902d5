//! The coordinator: owns the step lifecycle.
//!
//! It dispatches each step to its assigned worker, threads conversational
//! context from prior steps into every dispatch, applies human feedback,
//! and drives a plan to completion. Steps are processed strictly
//! sequentially, because each step's context depends on all prior
//! recorded replies, and there is no mid-pass abort.

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{debug, info, warn};

use taskloom_core::{
    ActionRequest, ActionResponse, AgentKind, AgentMessage, ApprovalRequest, ApprovalStatus,
    Entity, HumanClarification, HumanFeedback, InputTask, Plan, PlanProgress, Step, StepStatus,
};

use crate::error::{AgentError, AgentResult};
use crate::model_client::ModelSessionHandle;
use crate::planner::Planner;
use crate::registry::WorkerRegistry;
use crate::worker::{default_system_message, run_model_action, Worker, WorkerConfig};

/// The immutable peer snapshot injected after registry construction.
struct Peers {
    registry: Arc<WorkerRegistry>,
    planner: Option<Arc<Planner>>,
}

/// Drives plans to completion: creates them through the planner, applies
/// human feedback, and dispatches steps to workers one at a time.
///
/// The coordinator is itself a [`Worker`] so it can be addressed uniformly,
/// but its real surface is [`handle_input_task`], [`handle_human_feedback`],
/// [`execute_step`], and [`execute_plan`].
///
/// [`handle_input_task`]: Coordinator::handle_input_task
/// [`handle_human_feedback`]: Coordinator::handle_human_feedback
/// [`execute_step`]: Coordinator::execute_step
/// [`execute_plan`]: Coordinator::execute_plan
pub struct Coordinator {
    config: WorkerConfig,
    system_message: String,
    model_session: ModelSessionHandle,
    peers: OnceCell<Peers>,
}

impl Coordinator {
    /// Construct and fully initialize the coordinator.
    pub async fn create(config: WorkerConfig) -> AgentResult<Self> {
        let system_message = default_system_message(AgentKind::Coordinator);
        let model_session = config
            .model
            .provision(AgentKind::Coordinator, &system_message)
            .await?;
        info!("Created coordinator worker");
        Ok(Self {
            config,
            system_message,
            model_session,
            peers: OnceCell::new(),
        })
    }

    /// Inject the registry snapshot and the planner handle. Effective only
    /// on the first call.
    pub fn attach_peers(&self, registry: Arc<WorkerRegistry>, planner: Option<Arc<Planner>>) {
        if self.peers.set(Peers { registry, planner }).is_err() {
            warn!("Coordinator peers were already attached");
        }
    }

    fn peers(&self) -> AgentResult<&Peers> {
        self.peers
            .get()
            .ok_or_else(|| AgentError::Internal("worker registry not attached".to_string()))
    }

    /// Record the user's task and forward it to the planner.
    ///
    /// Planner failures propagate unmodified; no plan is created then.
    pub async fn handle_input_task(&self, task: InputTask) -> AgentResult<Plan> {
        info!(session_id = %task.session_id, "Received input task");
        self.config
            .store
            .add_item(Entity::Message(AgentMessage::new(
                &task.session_id,
                &self.config.user_id,
                "",
                &task.description,
                AgentKind::Human,
                None,
            )))
            .await?;

        let planner = self
            .peers()?
            .planner
            .clone()
            .ok_or(AgentError::WorkerUnavailable(AgentKind::Planner))?;
        let plan = planner.handle_input_task(task).await?;
        info!(plan_id = %plan.id, "Plan created");
        Ok(plan)
    }

    /// Apply human approval feedback to a single step, or to every step of
    /// the plan when `feedback.step_id` is absent. Approved steps are
    /// executed; rejected steps are never dispatched.
    pub async fn handle_human_feedback(&self, feedback: HumanFeedback) -> AgentResult<()> {
        info!(
            plan_id = %feedback.plan_id,
            approved = feedback.approved,
            "Received human feedback"
        );
        let steps = self.config.store.steps_for_plan(&feedback.plan_id).await?;

        // Per-step feedback comes from the step assigned to the human, when
        // it carries any.
        let step_feedback = steps
            .iter()
            .find(|step| step.agent == Some(AgentKind::Human))
            .and_then(|step| step.human_feedback.clone())
            .unwrap_or_default();

        let general_information = format!("Today's date is {}.", Utc::now().format("%B %d, %Y"));

        let plan = self
            .config
            .store
            .latest_plan_for_session(&feedback.session_id, &self.config.user_id)
            .await?
            .ok_or_else(|| {
                AgentError::PlanNotFound(format!("no plan for session {}", feedback.session_id))
            })?;
        let plan_feedback = match &plan.human_clarification_response {
            Some(response) => format!(
                "{}: {} This information may or may not be relevant to the step you are \
                 executing - it was feedback provided by the human user on the overall plan, \
                 which includes multiple steps, not just the one you are actioning now.",
                plan.human_clarification_request.as_deref().unwrap_or_default(),
                response
            ),
            None => "No human feedback provided on the overall plan.".to_string(),
        };

        let combined = format!("{step_feedback} {general_information} {plan_feedback}");

        match &feedback.step_id {
            Some(step_id) => {
                let Some(step) = steps.iter().find(|step| step.id == *step_id) else {
                    warn!(step_id = %step_id, "Feedback targeted an unknown step");
                    return Ok(());
                };
                self.apply_feedback(step, feedback.approved, &combined).await?;
            }
            None => {
                for step in &steps {
                    self.apply_feedback(step, feedback.approved, &combined).await?;
                }
            }
        }
        Ok(())
    }

    /// Record the feedback on one step and branch on the approval flag:
    /// execute when approved, skip dispatch when rejected.
    async fn apply_feedback(
        &self,
        step: &Step,
        approved: bool,
        combined_feedback: &str,
    ) -> AgentResult<()> {
        let updated = self
            .update_step_feedback(step, approved, combined_feedback)
            .await?;
        if approved {
            self.execute_step(&step.session_id, updated).await?;
        } else {
            debug!(step_id = %step.id, "Step rejected; not dispatching");
        }
        Ok(())
    }

    /// Write the combined feedback and the approval outcome to the step.
    ///
    /// The stored status always lands on `Completed`, whichever branch was
    /// taken; the rejection survives only in `human_approval_status`, and a
    /// rejected step is never dispatched.
    async fn update_step_feedback(
        &self,
        step: &Step,
        approved: bool,
        combined_feedback: &str,
    ) -> AgentResult<Step> {
        let mut step = step.clone();
        if approved {
            step.status = StepStatus::Approved;
            step.human_approval_status = ApprovalStatus::Accepted;
        } else {
            step.status = StepStatus::Rejected;
            step.human_approval_status = ApprovalStatus::Rejected;
        }
        step.human_feedback = Some(combined_feedback.to_string());
        step.status = StepStatus::Completed;
        self.config.store.update_step(step.clone()).await?;
        Ok(step)
    }

    /// Put a step in front of the human for approval.
    pub async fn request_step_approval(&self, step: &Step) -> AgentResult<ApprovalRequest> {
        let agent = step
            .agent
            .ok_or_else(|| AgentError::MissingAssignment(step.id.clone()))?;

        let mut step = step.clone();
        step.status = StepStatus::AwaitingFeedback;
        self.config.store.update_step(step.clone()).await?;

        self.config
            .store
            .add_item(Entity::Message(AgentMessage::new(
                &step.session_id,
                &self.config.user_id,
                &step.plan_id,
                format!("Requesting approval for step: {}", step.action),
                AgentKind::Coordinator,
                Some(step.id.clone()),
            )))
            .await?;

        Ok(ApprovalRequest {
            step_id: step.id,
            plan_id: step.plan_id,
            session_id: step.session_id,
            user_id: step.user_id,
            action: step.action,
            agent,
        })
    }

    /// Dispatch one step to its assigned worker.
    ///
    /// Marks the step `ActionRequested`, threads the conversation history
    /// of all prior steps into the instruction, and routes through the
    /// registry. A step assigned to the human completes immediately
    /// without any dispatch, since recorded feedback already satisfies it.
    pub async fn execute_step(&self, session_id: &str, step: Step) -> AgentResult<()> {
        let mut step = step;
        step.status = StepStatus::ActionRequested;
        self.config.store.update_step(step.clone()).await?;

        let plan = self
            .config
            .store
            .latest_plan_for_session(session_id, &self.config.user_id)
            .await?
            .ok_or_else(|| AgentError::PlanNotFound(format!("no plan for session {session_id}")))?;
        let steps = self.config.store.steps_for_plan(&plan.id).await?;
        let history = conversation_history(&plan, &steps, &step.id);

        let agent = step
            .agent
            .ok_or_else(|| AgentError::MissingAssignment(step.id.clone()))?;

        let instruction = format!(
            "{history} Here is the step to action: {action}. ONLY perform the steps and \
             actions required to complete this specific step, the other steps have already \
             been completed. Only use the conversational history for additional information, \
             if it's required to complete the step you have been assigned.",
            action = step.action,
        );
        let request = ActionRequest {
            step_id: step.id.clone(),
            plan_id: step.plan_id.clone(),
            session_id: session_id.to_string(),
            action: instruction,
            agent,
        };

        self.config
            .store
            .add_item(Entity::Message(AgentMessage::new(
                session_id,
                &self.config.user_id,
                &step.plan_id,
                format!(
                    "Requesting {} to perform action: {}",
                    agent.display_name(),
                    step.action
                ),
                AgentKind::Coordinator,
                Some(step.id.clone()),
            )))
            .await?;

        if agent == AgentKind::Human {
            step.status = StepStatus::Completed;
            self.config.store.update_step(step.clone()).await?;
            info!(step_id = %step.id, "Human feedback already recorded; step complete");
            return Ok(());
        }

        let worker = self
            .peers()?
            .registry
            .get(agent)
            .ok_or(AgentError::WorkerUnavailable(agent))?;
        debug!(agent = %agent, step_id = %step.id, "Dispatching action request");
        // The worker's own store writes are the source of truth for the
        // step's terminal state; nothing is rewritten here afterwards.
        worker.handle_action_request(request).await?;
        Ok(())
    }

    /// Execute every planned step of the plan, in store order, then refresh
    /// the plan's overall status from the step counts.
    ///
    /// Single-step failures are contained and logged so the rest of the
    /// plan proceeds; the re-read after each dispatch is observability
    /// only and never aborts the loop.
    pub async fn execute_plan(&self, plan: &Plan) -> AgentResult<()> {
        info!(plan_id = %plan.id, goal = %plan.initial_goal, "Executing plan");
        let steps = self.config.store.steps_for_plan(&plan.id).await?;
        let total = steps.len();

        for (index, step) in steps.iter().enumerate() {
            if step.status != StepStatus::Planned {
                continue;
            }
            info!(
                step = index + 1,
                total,
                agent = %step
                    .agent
                    .map(|a| a.display_name())
                    .unwrap_or_else(|| "unassigned".to_string()),
                action = %step.action,
                "Dispatching step"
            );
            if let Err(error) = self.execute_step(&plan.session_id, step.clone()).await {
                warn!(step_id = %step.id, error = %error, "Step dispatch failed");
                continue;
            }
            match self
                .config
                .store
                .get_step(&step.id, &plan.session_id)
                .await?
            {
                Some(updated) if updated.status == StepStatus::Completed => {
                    info!(step_id = %updated.id, "Step completed");
                }
                Some(updated) => {
                    warn!(step_id = %updated.id, status = %updated.status, "Step did not complete");
                }
                None => warn!(step_id = %step.id, "Step missing after dispatch"),
            }
        }

        let steps = self.config.store.steps_for_plan(&plan.id).await?;
        let progress = PlanProgress::from_steps(&steps);
        let mut plan = self
            .config
            .store
            .get_plan(&plan.id)
            .await?
            .ok_or_else(|| AgentError::PlanNotFound(plan.id.clone()))?;
        plan.overall_status = progress.plan_status(plan.overall_status);
        self.config.store.update_plan(plan.clone()).await?;
        info!(plan_id = %plan.id, status = %plan.overall_status, "Plan execution pass finished");
        Ok(())
    }

    /// Record the human's answer to the plan's clarification request.
    pub async fn handle_human_clarification(
        &self,
        clarification: HumanClarification,
    ) -> AgentResult<()> {
        let mut plan = self
            .config
            .store
            .get_plan(&clarification.plan_id)
            .await?
            .ok_or_else(|| AgentError::PlanNotFound(clarification.plan_id.clone()))?;
        plan.human_clarification_response = Some(clarification.human_clarification.clone());
        self.config.store.update_plan(plan).await?;

        self.config
            .store
            .add_item(Entity::Message(AgentMessage::new(
                &clarification.session_id,
                &self.config.user_id,
                &clarification.plan_id,
                &clarification.human_clarification,
                AgentKind::Human,
                None,
            )))
            .await?;
        info!(plan_id = %clarification.plan_id, "Recorded human clarification");
        Ok(())
    }
}

/// Reconstruct the conversational context for a dispatch: the plan's goal
/// and clarification exchange, then one action/reply line pair per prior
/// step, in store order, strictly excluding the current step.
///
/// This is a pure function of the ordered step list.
pub fn conversation_history(plan: &Plan, steps: &[Step], current_step_id: &str) -> String {
    let mut history = String::new();
    history.push_str(
        "<conversation_history>Here is the conversation history so far for the current plan. \
         This information may or may not be relevant to the step you have been asked to execute.\n",
    );
    history.push_str(&format!(
        "The user's task was:\n{}\n\n",
        plan.summary.as_deref().unwrap_or(&plan.initial_goal)
    ));
    if let (Some(request), Some(response)) = (
        &plan.human_clarification_request,
        &plan.human_clarification_response,
    ) {
        history.push_str(&format!("human_clarification_request:\n{request}\n\n"));
        history.push_str(&format!("human_clarification_response:\n{response}\n\n"));
    }
    history.push_str("The conversation between the previous agents so far is below:\n");
    for (index, step) in steps.iter().enumerate() {
        if step.id == current_step_id {
            break;
        }
        history.push_str(&format!("Step {index}\n"));
        history.push_str(&format!("{}: {}\n", AgentKind::Coordinator, step.action));
        history.push_str(&format!(
            "{}: {}\n",
            step.agent.map(AgentKind::name).unwrap_or("Unassigned"),
            step.agent_reply.as_deref().unwrap_or("")
        ));
    }
    history.push_str("</conversation_history>");
    history
}

#[async_trait]
impl Worker for Coordinator {
    fn kind(&self) -> AgentKind {
        AgentKind::Coordinator
    }

    fn system_message(&self) -> &str {
        &self.system_message
    }

    async fn handle_action_request(&self, request: ActionRequest) -> AgentResult<ActionResponse> {
        run_model_action(
            &self.config,
            AgentKind::Coordinator,
            &self.model_session,
            request,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_client::ScriptedModelClient;
    use crate::specialist::HumanWorker;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use taskloom_core::{InMemoryStore, Store};

    /// Worker double that counts invocations and, like a real worker,
    /// writes the step's terminal state through the store.
    struct CountingWorker {
        kind: AgentKind,
        persona: String,
        store: Arc<InMemoryStore>,
        calls: AtomicUsize,
    }

    impl CountingWorker {
        fn new(kind: AgentKind, store: Arc<InMemoryStore>) -> Arc<Self> {
            Arc::new(Self {
                kind,
                persona: default_system_message(kind),
                store,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Worker for CountingWorker {
        fn kind(&self) -> AgentKind {
            self.kind
        }

        fn system_message(&self) -> &str {
            &self.persona
        }

        async fn handle_action_request(
            &self,
            request: ActionRequest,
        ) -> AgentResult<ActionResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut step = self
                .store
                .get_step(&request.step_id, &request.session_id)
                .await?
                .ok_or_else(|| AgentError::StepNotFound(request.step_id.clone()))?;
            step.agent_reply = Some("ok".to_string());
            step.status = StepStatus::Completed;
            self.store.update_step(step).await?;
            Ok(ActionResponse {
                step_id: request.step_id,
                plan_id: request.plan_id,
                session_id: request.session_id,
                result: "ok".to_string(),
                status: StepStatus::Completed,
            })
        }
    }

    struct Harness {
        coordinator: Coordinator,
        store: Arc<InMemoryStore>,
        hr: Arc<CountingWorker>,
    }

    async fn harness() -> Harness {
        let store = InMemoryStore::shared();
        let model = ScriptedModelClient::shared();
        let config = WorkerConfig::new("s-1", "u-1", store.clone() as Arc<dyn Store>, model);

        let coordinator = Coordinator::create(config).await.unwrap();
        let hr = CountingWorker::new(AgentKind::Hr, store.clone());
        let mut workers: HashMap<AgentKind, Arc<dyn Worker>> = HashMap::new();
        workers.insert(AgentKind::Hr, hr.clone());
        workers.insert(AgentKind::Human, Arc::new(HumanWorker::new()));
        coordinator.attach_peers(Arc::new(WorkerRegistry::new(workers)), None);

        Harness {
            coordinator,
            store,
            hr,
        }
    }

    async fn seed_plan(store: &InMemoryStore) -> Plan {
        let plan = Plan::new("s-1", "u-1", "test goal");
        store.create_plan(plan.clone()).await.unwrap();
        plan
    }

    async fn seed_step(store: &InMemoryStore, plan: &Plan, agent: Option<AgentKind>) -> Step {
        let step = Step::new(&plan.id, "s-1", "u-1", "do the work", agent);
        store.create_step(step.clone()).await.unwrap();
        step
    }

    #[tokio::test]
    async fn test_history_excludes_current_and_later_steps() {
        let mut plan = Plan::new("s-1", "u-1", "goal");
        plan.summary = Some("the overall goal".to_string());
        let mut a = Step::new(&plan.id, "s-1", "u-1", "first action", Some(AgentKind::Hr));
        a.agent_reply = Some("reply x".to_string());
        let mut b = Step::new(&plan.id, "s-1", "u-1", "second action", Some(AgentKind::Product));
        b.agent_reply = Some("reply y".to_string());
        let c = Step::new(&plan.id, "s-1", "u-1", "third action", Some(AgentKind::Generic));

        let steps = vec![a, b, c.clone()];
        let history = conversation_history(&plan, &steps, &c.id);

        assert!(history.contains("first action"));
        assert!(history.contains("reply x"));
        assert!(history.contains("second action"));
        assert!(history.contains("reply y"));
        assert!(!history.contains("third action"));
        assert!(
            history.find("first action").unwrap() < history.find("second action").unwrap()
        );
        // Pure function of its inputs.
        assert_eq!(history, conversation_history(&plan, &steps, &c.id));
    }

    #[tokio::test]
    async fn test_history_includes_clarification_exchange() {
        let mut plan = Plan::new("s-1", "u-1", "goal");
        plan.human_clarification_request = Some("which office?".to_string());
        plan.human_clarification_response = Some("the Berlin office".to_string());
        let history = conversation_history(&plan, &[], "none");
        assert!(history.contains("which office?"));
        assert!(history.contains("the Berlin office"));
    }

    #[tokio::test]
    async fn test_execute_step_dispatches_to_registry_worker() {
        let h = harness().await;
        let plan = seed_plan(&h.store).await;
        let step = seed_step(&h.store, &plan, Some(AgentKind::Hr)).await;

        h.coordinator.execute_step("s-1", step.clone()).await.unwrap();
        assert_eq!(h.hr.calls(), 1);

        let messages = h.store.messages_for_step(&step.id).await.unwrap();
        assert!(messages[0].content.contains("Requesting Hr Agent"));
    }

    #[tokio::test]
    async fn test_execute_step_human_completes_without_dispatch() {
        let h = harness().await;
        let plan = seed_plan(&h.store).await;
        let step = seed_step(&h.store, &plan, Some(AgentKind::Human)).await;

        h.coordinator.execute_step("s-1", step.clone()).await.unwrap();

        let stored = h.store.get_step(&step.id, "s-1").await.unwrap().unwrap();
        assert_eq!(stored.status, StepStatus::Completed);
        assert_eq!(h.hr.calls(), 0);
    }

    #[tokio::test]
    async fn test_execute_step_unassigned_fails_after_marking_only() {
        let h = harness().await;
        let plan = seed_plan(&h.store).await;
        let step = seed_step(&h.store, &plan, None).await;

        let err = h
            .coordinator
            .execute_step("s-1", step.clone())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "MISSING_ASSIGNMENT");

        // Only the dispatch marking happened; no audit message was written.
        let stored = h.store.get_step(&step.id, "s-1").await.unwrap().unwrap();
        assert_eq!(stored.status, StepStatus::ActionRequested);
        assert!(h.store.messages_for_step(&step.id).await.unwrap().is_empty());

        // Idempotent: a second call yields the same error again.
        let err = h
            .coordinator
            .execute_step("s-1", stored)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "MISSING_ASSIGNMENT");
    }

    #[tokio::test]
    async fn test_execute_step_missing_worker_is_unavailable() {
        let h = harness().await;
        let plan = seed_plan(&h.store).await;
        let step = seed_step(&h.store, &plan, Some(AgentKind::Marketing)).await;

        let err = h
            .coordinator
            .execute_step("s-1", step)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AgentError::WorkerUnavailable(AgentKind::Marketing)
        ));
    }

    #[tokio::test]
    async fn test_bulk_rejection_completes_without_dispatch() {
        let h = harness().await;
        let plan = seed_plan(&h.store).await;
        for _ in 0..3 {
            seed_step(&h.store, &plan, Some(AgentKind::Hr)).await;
        }

        h.coordinator
            .handle_human_feedback(HumanFeedback {
                step_id: None,
                plan_id: plan.id.clone(),
                session_id: "s-1".to_string(),
                approved: false,
                human_feedback: None,
                updated_action: None,
            })
            .await
            .unwrap();

        let steps = h.store.steps_for_plan(&plan.id).await.unwrap();
        assert_eq!(steps.len(), 3);
        for step in &steps {
            assert_eq!(step.human_approval_status, ApprovalStatus::Rejected);
            assert_eq!(step.status, StepStatus::Completed);
            assert!(step.human_feedback.as_deref().unwrap().contains("Today's date is"));
        }
        assert_eq!(h.hr.calls(), 0);
    }

    #[tokio::test]
    async fn test_single_step_approval_executes_it() {
        let h = harness().await;
        let plan = seed_plan(&h.store).await;
        let step = seed_step(&h.store, &plan, Some(AgentKind::Hr)).await;
        let other = seed_step(&h.store, &plan, Some(AgentKind::Hr)).await;

        h.coordinator
            .handle_human_feedback(HumanFeedback {
                step_id: Some(step.id.clone()),
                plan_id: plan.id.clone(),
                session_id: "s-1".to_string(),
                approved: true,
                human_feedback: None,
                updated_action: None,
            })
            .await
            .unwrap();

        assert_eq!(h.hr.calls(), 1);
        let untouched = h.store.get_step(&other.id, "s-1").await.unwrap().unwrap();
        assert_eq!(untouched.status, StepStatus::Planned);

        let stored = h.store.get_step(&step.id, "s-1").await.unwrap().unwrap();
        assert_eq!(stored.human_approval_status, ApprovalStatus::Accepted);
    }

    #[tokio::test]
    async fn test_feedback_threads_clarification_context() {
        let h = harness().await;
        let mut plan = seed_plan(&h.store).await;
        plan.human_clarification_request = Some("which team?".to_string());
        plan.human_clarification_response = Some("platform team".to_string());
        h.store.update_plan(plan.clone()).await.unwrap();
        let step = seed_step(&h.store, &plan, Some(AgentKind::Hr)).await;

        h.coordinator
            .handle_human_feedback(HumanFeedback {
                step_id: Some(step.id.clone()),
                plan_id: plan.id.clone(),
                session_id: "s-1".to_string(),
                approved: false,
                human_feedback: None,
                updated_action: None,
            })
            .await
            .unwrap();

        let stored = h.store.get_step(&step.id, "s-1").await.unwrap().unwrap();
        let feedback = stored.human_feedback.unwrap();
        assert!(feedback.contains("which team?: platform team"));
    }

    #[tokio::test]
    async fn test_execute_plan_runs_all_planned_steps_and_completes_plan() {
        let h = harness().await;
        let plan = seed_plan(&h.store).await;
        seed_step(&h.store, &plan, Some(AgentKind::Hr)).await;
        seed_step(&h.store, &plan, Some(AgentKind::Hr)).await;

        h.coordinator.execute_plan(&plan).await.unwrap();
        assert_eq!(h.hr.calls(), 2);

        let stored = h.store.get_plan(&plan.id).await.unwrap().unwrap();
        assert_eq!(stored.overall_status, taskloom_core::PlanStatus::Completed);
    }

    #[tokio::test]
    async fn test_execute_plan_contains_per_step_failures() {
        let h = harness().await;
        let plan = seed_plan(&h.store).await;
        // Marketing has no registered worker; the HR step after it must
        // still run.
        seed_step(&h.store, &plan, Some(AgentKind::Marketing)).await;
        seed_step(&h.store, &plan, Some(AgentKind::Hr)).await;

        h.coordinator.execute_plan(&plan).await.unwrap();
        assert_eq!(h.hr.calls(), 1);

        let stored = h.store.get_plan(&plan.id).await.unwrap().unwrap();
        // The stranded step keeps the plan in progress.
        assert_eq!(stored.overall_status, taskloom_core::PlanStatus::InProgress);
    }

    #[tokio::test]
    async fn test_request_step_approval_marks_awaiting() {
        let h = harness().await;
        let plan = seed_plan(&h.store).await;
        let step = seed_step(&h.store, &plan, Some(AgentKind::Hr)).await;

        let request = h.coordinator.request_step_approval(&step).await.unwrap();
        assert_eq!(request.agent, AgentKind::Hr);

        let stored = h.store.get_step(&step.id, "s-1").await.unwrap().unwrap();
        assert_eq!(stored.status, StepStatus::AwaitingFeedback);
    }

    #[tokio::test]
    async fn test_clarification_is_recorded_on_plan() {
        let h = harness().await;
        let mut plan = seed_plan(&h.store).await;
        plan.human_clarification_request = Some("when?".to_string());
        h.store.update_plan(plan.clone()).await.unwrap();

        h.coordinator
            .handle_human_clarification(HumanClarification {
                plan_id: plan.id.clone(),
                session_id: "s-1".to_string(),
                human_clarification: "next Monday".to_string(),
            })
            .await
            .unwrap();

        let stored = h.store.get_plan(&plan.id).await.unwrap().unwrap();
        assert_eq!(
            stored.human_clarification_response.as_deref(),
            Some("next Monday")
        );
    }
}
