//! The language-model seam.
//!
//! Workers never talk to a model runtime directly; they go through
//! [`ModelClient`], which provisions one backing session per worker and
//! answers completion requests. Any remote-backed implementation is
//! substitutable. The crate ships [`ScriptedModelClient`], a deterministic
//! double used by tests and the demo driver.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

use taskloom_core::AgentKind;

use crate::error::{AgentError, AgentResult};

/// Handle to one provisioned model session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSessionHandle {
    /// Backend-assigned session identifier
    pub id: String,
    /// The worker the session was provisioned for
    pub kind: AgentKind,
}

/// Client for the model runtime backing the workers.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Provision a model session for one worker, seeded with its persona
    /// instructions. May perform a remote call; failure here is a
    /// construction error for that worker.
    async fn provision(
        &self,
        kind: AgentKind,
        instructions: &str,
    ) -> AgentResult<ModelSessionHandle>;

    /// Run one completion against a provisioned session.
    async fn complete(&self, session: &ModelSessionHandle, prompt: &str) -> AgentResult<String>;
}

/// Deterministic model client for tests and the demo driver.
///
/// Replies are served from per-worker queues pushed via [`push_reply`];
/// when a queue is empty a canned reply is synthesized. Provisioning and
/// completion can be forced to fail per worker to exercise the error paths.
///
/// [`push_reply`]: ScriptedModelClient::push_reply
#[derive(Debug, Default)]
pub struct ScriptedModelClient {
    replies: Mutex<HashMap<AgentKind, VecDeque<String>>>,
    fail_provision: Mutex<HashSet<AgentKind>>,
    fail_complete: Mutex<HashSet<AgentKind>>,
    completions: Mutex<HashMap<AgentKind, usize>>,
}

impl ScriptedModelClient {
    /// Create a new client with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client wrapped in `Arc` for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Queue the next reply for a worker.
    pub fn push_reply(&self, kind: AgentKind, reply: impl Into<String>) {
        self.replies
            .lock()
            .expect("reply queue poisoned")
            .entry(kind)
            .or_default()
            .push_back(reply.into());
    }

    /// Make provisioning fail for a worker.
    pub fn fail_provisioning(&self, kind: AgentKind) {
        self.fail_provision
            .lock()
            .expect("provision set poisoned")
            .insert(kind);
    }

    /// Make completions fail for a worker.
    pub fn fail_completions(&self, kind: AgentKind) {
        self.fail_complete
            .lock()
            .expect("completion set poisoned")
            .insert(kind);
    }

    /// How many completions a worker has run.
    pub fn completions(&self, kind: AgentKind) -> usize {
        self.completions
            .lock()
            .expect("completion counter poisoned")
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }

    /// Total completions across all workers.
    pub fn total_completions(&self) -> usize {
        self.completions
            .lock()
            .expect("completion counter poisoned")
            .values()
            .sum()
    }

    /// Canned reply when nothing is scripted: a one-step decomposition for
    /// the planner, a terse acknowledgement for everyone else.
    fn default_reply(kind: AgentKind, prompt: &str) -> String {
        if kind == AgentKind::Planner {
            let goal = prompt
                .lines()
                .find_map(|line| line.strip_prefix("Goal: "))
                .unwrap_or("the requested goal")
                .to_string();
            serde_json::json!({
                "initial_goal": goal,
                "steps": [{ "action": goal, "agent": AgentKind::Generic.name() }],
                "summary": goal,
            })
            .to_string()
        } else {
            format!("{} handled the requested action.", kind.display_name())
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    async fn provision(
        &self,
        kind: AgentKind,
        _instructions: &str,
    ) -> AgentResult<ModelSessionHandle> {
        if self
            .fail_provision
            .lock()
            .expect("provision set poisoned")
            .contains(&kind)
        {
            return Err(AgentError::Provision {
                kind,
                message: "scripted provisioning failure".to_string(),
            });
        }
        debug!(agent = %kind, "Provisioned scripted model session");
        Ok(ModelSessionHandle {
            id: Uuid::new_v4().to_string(),
            kind,
        })
    }

    async fn complete(&self, session: &ModelSessionHandle, prompt: &str) -> AgentResult<String> {
        *self
            .completions
            .lock()
            .expect("completion counter poisoned")
            .entry(session.kind)
            .or_insert(0) += 1;

        if self
            .fail_complete
            .lock()
            .expect("completion set poisoned")
            .contains(&session.kind)
        {
            return Err(AgentError::Model("scripted completion failure".to_string()));
        }

        let scripted = self
            .replies
            .lock()
            .expect("reply queue poisoned")
            .get_mut(&session.kind)
            .and_then(|queue| queue.pop_front());
        Ok(scripted.unwrap_or_else(|| Self::default_reply(session.kind, prompt)))
    }
}
