//! Worker registry and the two-phase factory that populates it.
//!
//! Phase one builds one instance of every worker identity, isolating
//! per-worker construction failures. Phase two wires the planner and the
//! coordinator with an immutable snapshot of the finished identity→worker
//! map: they need to address all peers, but the peers must exist before
//! the map can be built.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use taskloom_core::AgentKind;

use crate::coordinator::Coordinator;
use crate::error::AgentError;
use crate::planner::Planner;
use crate::specialist::{HumanWorker, SpecialistWorker};
use crate::worker::{Worker, WorkerConfig};

/// Immutable identity→worker map, read-only after construction and safe to
/// share by reference.
pub struct WorkerRegistry {
    workers: HashMap<AgentKind, Arc<dyn Worker>>,
}

impl WorkerRegistry {
    pub fn new(workers: HashMap<AgentKind, Arc<dyn Worker>>) -> Self {
        Self { workers }
    }

    /// Look a worker up by identity.
    pub fn get(&self, kind: AgentKind) -> Option<Arc<dyn Worker>> {
        self.workers.get(&kind).cloned()
    }

    pub fn contains(&self, kind: AgentKind) -> bool {
        self.workers.contains_key(&kind)
    }

    /// The identities present in the registry.
    pub fn kinds(&self) -> Vec<AgentKind> {
        self.workers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

/// Outcome of a registry build: the partial registry, typed handles to the
/// orchestration workers, and the construction failures that were isolated.
pub struct RegistryBuild {
    pub registry: Arc<WorkerRegistry>,
    pub planner: Option<Arc<Planner>>,
    pub coordinator: Option<Arc<Coordinator>>,
    pub failures: Vec<(AgentKind, AgentError)>,
}

/// Builds one worker per identity for a session.
pub struct WorkerFactory;

impl WorkerFactory {
    /// Create every worker, then wire the planner and coordinator with the
    /// registry snapshot.
    ///
    /// A single worker's construction failure is logged and that identity
    /// is simply absent from the registry; it never prevents the other
    /// workers from being created. Later dispatch to a missing identity
    /// fails with [`AgentError::WorkerUnavailable`].
    pub async fn create_all(config: WorkerConfig) -> RegistryBuild {
        let mut workers: HashMap<AgentKind, Arc<dyn Worker>> = HashMap::new();
        let mut failures = Vec::new();
        let mut planner: Option<Arc<Planner>> = None;
        let mut coordinator: Option<Arc<Coordinator>> = None;

        for kind in AgentKind::ALL {
            let built: Result<Arc<dyn Worker>, AgentError> = match kind {
                AgentKind::Human => Ok(Arc::new(HumanWorker::new())),
                AgentKind::Planner => {
                    Planner::create(config.clone(), AgentKind::ASSIGNABLE.to_vec())
                        .await
                        .map(|worker| {
                            let worker = Arc::new(worker);
                            planner = Some(worker.clone());
                            worker as Arc<dyn Worker>
                        })
                }
                AgentKind::Coordinator => Coordinator::create(config.clone()).await.map(|worker| {
                    let worker = Arc::new(worker);
                    coordinator = Some(worker.clone());
                    worker as Arc<dyn Worker>
                }),
                specialist => SpecialistWorker::create(specialist, config.clone())
                    .await
                    .map(|worker| Arc::new(worker) as Arc<dyn Worker>),
            };
            match built {
                Ok(worker) => {
                    workers.insert(kind, worker);
                }
                Err(error) => {
                    warn!(agent = %kind, error = %error, "Worker construction failed; continuing without it");
                    failures.push((kind, error));
                }
            }
        }

        let registry = Arc::new(WorkerRegistry::new(workers));
        if let Some(planner) = &planner {
            planner.attach_peers(registry.clone());
        }
        if let Some(coordinator) = &coordinator {
            coordinator.attach_peers(registry.clone(), planner.clone());
        }

        info!(
            workers = registry.len(),
            failed = failures.len(),
            "Worker registry built"
        );
        RegistryBuild {
            registry,
            planner,
            coordinator,
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_client::ScriptedModelClient;
    use taskloom_core::InMemoryStore;

    fn config_with(model: Arc<ScriptedModelClient>) -> WorkerConfig {
        WorkerConfig::new("s-1", "u-1", InMemoryStore::shared(), model)
    }

    #[tokio::test]
    async fn test_create_all_builds_every_identity() {
        let build = WorkerFactory::create_all(config_with(ScriptedModelClient::shared())).await;

        assert_eq!(build.registry.len(), AgentKind::ALL.len());
        assert!(build.failures.is_empty());
        assert!(build.planner.is_some());
        assert!(build.coordinator.is_some());
        for kind in AgentKind::ALL {
            assert!(build.registry.contains(kind));
        }
    }

    #[tokio::test]
    async fn test_single_construction_failure_is_isolated() {
        let model = ScriptedModelClient::shared();
        model.fail_provisioning(AgentKind::Marketing);

        let build = WorkerFactory::create_all(config_with(model)).await;

        assert_eq!(build.registry.len(), AgentKind::ALL.len() - 1);
        assert!(!build.registry.contains(AgentKind::Marketing));
        assert_eq!(build.failures.len(), 1);
        assert_eq!(build.failures[0].0, AgentKind::Marketing);
        // Everyone else survived, including both orchestration workers.
        assert!(build.planner.is_some());
        assert!(build.coordinator.is_some());
    }

    #[tokio::test]
    async fn test_registry_lookup_by_kind() {
        let build = WorkerFactory::create_all(config_with(ScriptedModelClient::shared())).await;
        let worker = build.registry.get(AgentKind::Hr).unwrap();
        assert_eq!(worker.kind(), AgentKind::Hr);
        assert!(build.registry.get(AgentKind::Hr).is_some());

        let mut kinds = build.registry.kinds();
        kinds.sort_by_key(|k| k.name());
        assert_eq!(kinds.len(), AgentKind::ALL.len());
    }
}
