//! # Taskloom Agents
//!
//! The coordination layer of the Taskloom orchestrator: the worker
//! capability contract, the model-backed specialist workers, the planner
//! that decomposes goals into steps, the coordinator that drives step
//! dispatch and human feedback, and the two-phase factory that wires them
//! together.

pub mod coordinator;
pub mod error;
pub mod model_client;
pub mod planner;
pub mod registry;
pub mod specialist;
pub mod worker;

pub use coordinator::{conversation_history, Coordinator};
pub use error::{AgentError, AgentResult};
pub use model_client::{ModelClient, ModelSessionHandle, ScriptedModelClient};
pub use planner::Planner;
pub use registry::{RegistryBuild, WorkerFactory, WorkerRegistry};
pub use specialist::{HumanWorker, SpecialistWorker};
pub use worker::{default_system_message, Worker, WorkerConfig};
