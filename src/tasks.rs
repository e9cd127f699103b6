//! Background catalog tasks
//!
//! Fetch, apply and validate run on a tokio runtime, off the thread that
//! mutates annotation documents. Each task reports once through its callback
//! with a [`TaskStatus`]. A canceled task never reports, even if the session
//! call it was waiting on completes.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::annotation::Diagnostic;
use crate::error::WorkbenchError;
use crate::model::{CatalogModel, ObjectRef};

/// The remote catalog as seen by background tasks
#[async_trait]
pub trait CatalogSession: Send + Sync {
    /// Fetch a fresh snapshot of the whole model
    async fn fetch_model(&self) -> anyhow::Result<CatalogModel>;

    /// Push the model's annotations and ACLs back to the catalog
    async fn apply(&self, model: &CatalogModel) -> anyhow::Result<()>;

    /// Validate the annotations of one object
    async fn validate(
        &self,
        model: &CatalogModel,
        object: &ObjectRef,
    ) -> anyhow::Result<Vec<Diagnostic>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Fetch,
    Apply,
    Validate,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Fetch => "fetch",
            TaskKind::Apply => "apply",
            TaskKind::Validate => "validate",
        }
    }

    fn success_status(&self) -> &'static str {
        match self {
            TaskKind::Fetch => "Fetch catalog model success.",
            TaskKind::Apply => "Update catalog model success.",
            TaskKind::Validate => "Validation task success.",
        }
    }

    fn failure_status(&self) -> &'static str {
        match self {
            TaskKind::Fetch => "Fetch catalog model failure.",
            TaskKind::Apply => "Update catalog model failure.",
            TaskKind::Validate => "Validation task failed.",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload of a successful task
#[derive(Debug)]
pub enum TaskResult {
    Model(Box<CatalogModel>),
    Applied,
    Diagnostics(Vec<Diagnostic>),
}

/// Completion report handed to the callback
#[derive(Debug)]
pub struct TaskStatus {
    pub success: bool,
    pub status: String,
    /// Full error chain on failure, empty on success
    pub detail: String,
    pub result: Option<TaskResult>,
}

impl TaskStatus {
    fn from_outcome(kind: TaskKind, outcome: anyhow::Result<TaskResult>) -> Self {
        match outcome {
            Ok(result) => TaskStatus {
                success: true,
                status: kind.success_status().to_string(),
                detail: String::new(),
                result: Some(result),
            },
            Err(e) => TaskStatus {
                success: false,
                status: kind.failure_status().to_string(),
                detail: format!("{:#}", e),
                result: None,
            },
        }
    }
}

/// A running task
pub struct TaskHandle {
    kind: TaskKind,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl TaskHandle {
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Ask the task to stop; its result is discarded either way
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait until the task has finished (and reported, unless canceled)
    pub async fn wait(self) {
        if let Err(e) = self.join.await {
            error!("{} task panicked: {}", self.kind, e);
        }
    }
}

struct Slot {
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Slots {
    next_generation: u64,
    running: HashMap<TaskKind, Slot>,
}

/// Frees a task's slot when the task ends, including by panic.
///
/// A slot already taken over by a newer task of the same kind is left alone.
struct SlotRelease {
    slots: Arc<Mutex<Slots>>,
    kind: TaskKind,
    generation: u64,
}

impl Drop for SlotRelease {
    fn drop(&mut self) {
        let mut slots = self.slots.lock();
        if slots
            .running
            .get(&self.kind)
            .is_some_and(|slot| slot.generation == self.generation)
        {
            slots.running.remove(&self.kind);
        }
    }
}

/// Issues tasks against a session, at most one per [`TaskKind`]
pub struct TaskRunner {
    session: Arc<dyn CatalogSession>,
    handle: Handle,
    slots: Arc<Mutex<Slots>>,
}

impl TaskRunner {
    pub fn new(session: Arc<dyn CatalogSession>, handle: Handle) -> Self {
        Self {
            session,
            handle,
            slots: Arc::new(Mutex::new(Slots::default())),
        }
    }

    /// Runner on the current tokio runtime
    pub fn current(session: Arc<dyn CatalogSession>) -> Self {
        Self::new(session, Handle::current())
    }

    pub fn is_running(&self, kind: TaskKind) -> bool {
        self.slots.lock().running.contains_key(&kind)
    }

    /// Cancel the running task of `kind`, freeing its slot at once
    pub fn cancel(&self, kind: TaskKind) -> bool {
        match self.slots.lock().running.remove(&kind) {
            Some(slot) => {
                info!("Canceling {} task", kind);
                slot.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        let mut slots = self.slots.lock();
        for (kind, slot) in slots.running.drain() {
            info!("Canceling {} task", kind);
            slot.cancel.cancel();
        }
    }

    pub fn fetch<F>(&self, on_done: F) -> Result<TaskHandle, WorkbenchError>
    where
        F: FnOnce(TaskStatus) + Send + 'static,
    {
        let session = Arc::clone(&self.session);
        self.issue(
            TaskKind::Fetch,
            async move {
                let model = session.fetch_model().await?;
                Ok(TaskResult::Model(Box::new(model)))
            },
            on_done,
        )
    }

    /// Apply a snapshot of the edited model
    pub fn apply<F>(&self, model: CatalogModel, on_done: F) -> Result<TaskHandle, WorkbenchError>
    where
        F: FnOnce(TaskStatus) + Send + 'static,
    {
        let session = Arc::clone(&self.session);
        self.issue(
            TaskKind::Apply,
            async move {
                session.apply(&model).await?;
                Ok(TaskResult::Applied)
            },
            on_done,
        )
    }

    pub fn validate<F>(
        &self,
        model: CatalogModel,
        object: ObjectRef,
        on_done: F,
    ) -> Result<TaskHandle, WorkbenchError>
    where
        F: FnOnce(TaskStatus) + Send + 'static,
    {
        let session = Arc::clone(&self.session);
        self.issue(
            TaskKind::Validate,
            async move {
                let diagnostics = session.validate(&model, &object).await?;
                Ok(TaskResult::Diagnostics(diagnostics))
            },
            on_done,
        )
    }

    fn issue<W, F>(&self, kind: TaskKind, work: W, on_done: F) -> Result<TaskHandle, WorkbenchError>
    where
        W: Future<Output = anyhow::Result<TaskResult>> + Send + 'static,
        F: FnOnce(TaskStatus) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let generation = {
            let mut slots = self.slots.lock();
            if slots.running.contains_key(&kind) {
                return Err(WorkbenchError::TaskBusy {
                    kind: kind.as_str(),
                });
            }
            slots.next_generation += 1;
            let generation = slots.next_generation;
            slots.running.insert(
                kind,
                Slot {
                    generation,
                    cancel: cancel.clone(),
                },
            );
            generation
        };
        info!("Starting {} task", kind);

        let release = SlotRelease {
            slots: Arc::clone(&self.slots),
            kind,
            generation,
        };
        let token = cancel.clone();
        let join = self.handle.spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => None,
                outcome = work => Some(outcome),
            };
            drop(release);

            match outcome {
                Some(outcome) if !token.is_cancelled() => {
                    let status = TaskStatus::from_outcome(kind, outcome);
                    if status.success {
                        info!("{}", status.status);
                    } else {
                        error!("{}: {}", status.status, status.detail);
                    }
                    on_done(status);
                }
                _ => debug!("{} task canceled, result discarded", kind),
            }
        });

        Ok(TaskHandle { kind, cancel, join })
    }
}
