//! Interactive console driver for the Taskloom orchestrator.
//!
//! Collects a goal from the user, submits it through the coordinator,
//! shows the resulting plan, and, once approved, drives it to
//! completion, polling until every step is terminal.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use taskloom_agents::{AgentResult, Coordinator, ScriptedModelClient, WorkerConfig, WorkerFactory};
use taskloom_core::{
    HumanFeedback, InMemoryStore, InputTask, Plan, PlanProgress, Session, Store, StepStatus,
};

/// Delay between completion polls while steps remain non-terminal.
const POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Give up polling after this many rounds without completion.
const MAX_POLLS: usize = 30;

#[derive(Parser)]
#[command(name = "taskloom", about = "Multi-agent task orchestration console")]
struct Cli {
    /// User identity recorded on sessions, plans, and steps
    #[arg(long, default_value = "console_user")]
    user: String,

    /// Ask for approval step by step instead of approving the whole plan
    #[arg(long)]
    stepwise: bool,
}

struct App {
    store: Arc<InMemoryStore>,
    coordinator: Arc<Coordinator>,
    session: Session,
    current_plan: Option<Plan>,
    stepwise: bool,
}

#[tokio::main]
async fn main() -> AgentResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    let store = InMemoryStore::shared();
    let model = ScriptedModelClient::shared();
    let session = Session::new(&cli.user, "active");
    store.create_session(session.clone()).await?;

    let config = WorkerConfig::new(&session.id, &cli.user, store.clone(), model);
    let build = WorkerFactory::create_all(config).await;
    for (kind, error) in &build.failures {
        eprintln!("warning: {kind} could not be created: {error}");
    }
    let Some(coordinator) = build.coordinator else {
        eprintln!("error: the coordinator could not be created; nothing to drive");
        return Ok(());
    };

    let mut app = App {
        store,
        coordinator,
        session,
        current_plan: None,
        stepwise: cli.stepwise,
    };
    app.run().await
}

impl App {
    async fn run(&mut self) -> AgentResult<()> {
        println!("Taskloom console - multi-agent task orchestration");
        print_help();

        let stdin = io::stdin();
        loop {
            print!(">> ");
            io::stdout().flush().ok();

            let mut line = String::new();
            if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
                break;
            }
            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            match input.to_lowercase().as_str() {
                "quit" | "exit" => break,
                "help" => print_help(),
                "status" => {
                    if let Err(error) = self.show_status().await {
                        eprintln!("error: {error}");
                    }
                }
                _ => {
                    if let Err(error) = self.process_task(input).await {
                        eprintln!("error: {error}");
                    }
                }
            }
        }
        println!("Goodbye!");
        Ok(())
    }

    async fn process_task(&mut self, goal: &str) -> AgentResult<()> {
        println!("Processing task: {goal}");

        let plan = self
            .coordinator
            .handle_input_task(InputTask {
                session_id: self.session.id.clone(),
                description: goal.to_string(),
            })
            .await?;

        let steps = self.store.steps_for_plan(&plan.id).await?;
        println!("\nPlan: {}", plan.initial_goal);
        if let Some(request) = &plan.human_clarification_request {
            println!("The planner asks: {request}");
        }
        println!("Steps ({}):", steps.len());
        for (index, step) in steps.iter().enumerate() {
            let agent = step
                .agent
                .map(|a| a.display_name())
                .unwrap_or_else(|| "unassigned".to_string());
            println!("  {}. {agent}: {}", index + 1, step.action);
        }
        self.current_plan = Some(plan.clone());

        if self.stepwise {
            self.approve_stepwise(&plan).await?;
        } else if ask_yes_no("Execute this plan? (y/n): ") {
            self.coordinator.execute_plan(&plan).await?;
        } else {
            println!("Plan rejected; recording feedback.");
            self.coordinator
                .handle_human_feedback(HumanFeedback {
                    step_id: None,
                    plan_id: plan.id.clone(),
                    session_id: self.session.id.clone(),
                    approved: false,
                    human_feedback: None,
                    updated_action: None,
                })
                .await?;
        }

        self.wait_for_completion(&plan).await?;
        self.show_status().await
    }

    /// Put each pending step in front of the user individually.
    async fn approve_stepwise(&self, plan: &Plan) -> AgentResult<()> {
        let steps = self.store.pending_steps_for_plan(&plan.id).await?;
        for step in steps {
            let request = self.coordinator.request_step_approval(&step).await?;
            println!(
                "Approval requested - {}: {}",
                request.agent.display_name(),
                request.action
            );
            let approved = ask_yes_no("Approve this step? (y/n): ");
            self.coordinator
                .handle_human_feedback(HumanFeedback {
                    step_id: Some(step.id.clone()),
                    plan_id: plan.id.clone(),
                    session_id: self.session.id.clone(),
                    approved,
                    human_feedback: None,
                    updated_action: None,
                })
                .await?;
        }
        Ok(())
    }

    /// Poll until every step of the plan is terminal or rejected.
    async fn wait_for_completion(&self, plan: &Plan) -> AgentResult<()> {
        for _ in 0..MAX_POLLS {
            let steps = self.store.steps_for_plan(&plan.id).await?;
            let incomplete = steps
                .iter()
                .filter(|s| !s.is_terminal() && s.status != StepStatus::Rejected)
                .count();
            if incomplete == 0 {
                return Ok(());
            }
            println!(
                "Progress: {}/{} steps completed",
                steps.len() - incomplete,
                steps.len()
            );
            debug!(plan_id = %plan.id, incomplete, "Waiting for steps to finish");
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        println!("Some steps did not finish; see `status` for details.");
        Ok(())
    }

    async fn show_status(&self) -> AgentResult<()> {
        let Some(current) = &self.current_plan else {
            println!("No active plan.");
            return Ok(());
        };
        let Some(plan) = self.store.get_plan(&current.id).await? else {
            println!("No active plan found.");
            return Ok(());
        };

        let steps = self.store.steps_for_plan(&plan.id).await?;
        let progress = PlanProgress::from_steps(&steps);
        println!("\nCurrent plan: {}", plan.initial_goal);
        println!(
            "Status: {} ({} of {} steps terminal)",
            plan.overall_status,
            progress.completed + progress.failed,
            progress.total
        );
        for (index, step) in steps.iter().enumerate() {
            let agent = step
                .agent
                .map(|a| a.display_name())
                .unwrap_or_else(|| "unassigned".to_string());
            println!("  {}. [{}] {agent}: {}", index + 1, step.status, step.action);
            if let Some(reply) = &step.agent_reply {
                println!("     reply: {}", truncate(reply, 120));
            }
        }

        let stats = self.store.stats().await?;
        println!(
            "Stored: {} plans, {} steps, {} messages",
            stats.plans, stats.steps, stats.messages
        );
        Ok(())
    }
}

fn print_help() {
    println!("Commands:");
    println!("  <goal>    submit a task for planning and execution");
    println!("  status    show the current plan and its steps");
    println!("  help      show this message");
    println!("  quit      exit");
}

fn ask_yes_no(prompt: &str) -> bool {
    print!("{prompt}");
    io::stdout().flush().ok();
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer).ok();
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let cut: String = text.chars().take(limit).collect();
        format!("{cut}...")
    }
}
