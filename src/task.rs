//! Discovery task coordination
//!
//! Long-running discoveries are submitted as tasks and polled by id. Each task
//! carries its own cancellation flag which the search loop reads at every
//! expansion, so cancelling stops work that is already running. Concurrency is
//! capped by a semaphore and searches run on tokio's blocking pool.

use crate::discovery::{DiscoveryRequest, DiscoveryResponse};
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult, ErrorBody};
use crate::algo::SearchStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub type TaskId = Uuid;

/// Lifecycle of a discovery task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled)
    }
}

/// What a status poll returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub request: DiscoveryRequest,
    pub submitted_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DiscoveryResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug)]
struct TaskEntry {
    request: DiscoveryRequest,
    status: TaskStatus,
    cancel: Arc<AtomicBool>,
    submitted_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    finished: Option<Instant>,
    result: Option<DiscoveryResponse>,
    error: Option<EngineError>,
}

impl TaskEntry {
    fn snapshot(&self, task_id: TaskId, with_result: bool) -> TaskSnapshot {
        TaskSnapshot {
            task_id,
            status: self.status,
            request: self.request.clone(),
            submitted_at: self.submitted_at,
            finished_at: self.finished_at,
            result: if with_result { self.result.clone() } else { None },
            error: self.error.as_ref().map(ErrorBody::from),
        }
    }

    fn finish(&mut self, status: TaskStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
        self.finished = Some(Instant::now());
    }
}

type TaskTable = Arc<RwLock<HashMap<TaskId, TaskEntry>>>;

/// Runs discoveries in the background and tracks them by id
#[derive(Debug, Clone)]
pub struct DiscoveryCoordinator {
    engine: Arc<Engine>,
    tasks: TaskTable,
    permits: Arc<Semaphore>,
}

impl DiscoveryCoordinator {
    pub fn new(engine: Arc<Engine>) -> Self {
        let permits = Arc::new(Semaphore::new(engine.config().tasks.max_concurrent_tasks));
        Self {
            engine,
            tasks: Arc::new(RwLock::new(HashMap::new())),
            permits,
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Queue a discovery. Must be called from within a tokio runtime.
    ///
    /// Requests that fail validation without touching the graph are rejected
    /// here instead of becoming failed tasks.
    pub fn submit(&self, request: DiscoveryRequest) -> EngineResult<TaskId> {
        request.validate()?;

        let task_id = Uuid::new_v4();
        let cancel = Arc::new(AtomicBool::new(false));
        self.tasks.write().unwrap_or_else(PoisonError::into_inner).insert(
            task_id,
            TaskEntry {
                request: request.clone(),
                status: TaskStatus::Queued,
                cancel: Arc::clone(&cancel),
                submitted_at: Utc::now(),
                finished_at: None,
                finished: None,
                result: None,
                error: None,
            },
        );
        info!(%task_id, source = %request.source_id, target = %request.target_id, "discovery task queued");

        let engine = Arc::clone(&self.engine);
        let tasks = Arc::clone(&self.tasks);
        let permits = Arc::clone(&self.permits);

        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                fail(&tasks, task_id, EngineError::Cancelled);
                return;
            };

            {
                let mut table = tasks.write().unwrap_or_else(PoisonError::into_inner);
                match table.get_mut(&task_id) {
                    Some(entry) if entry.status == TaskStatus::Queued => entry.status = TaskStatus::Running,
                    // cancelled or purged while queued
                    _ => return,
                }
            }
            debug!(%task_id, "discovery task running");

            let budget = engine.search_budget(Some(cancel));
            let outcome = tokio::task::spawn_blocking(move || engine.discover(&request, &budget)).await;

            let mut table = tasks.write().unwrap_or_else(PoisonError::into_inner);
            let Some(entry) = table.get_mut(&task_id) else { return };
            match outcome {
                Ok(Ok(response)) => {
                    let status = if response.status == SearchStatus::Cancelled
                        || entry.status == TaskStatus::Cancelled
                    {
                        TaskStatus::Cancelled
                    } else {
                        TaskStatus::Completed
                    };
                    info!(%task_id, ?status, paths = response.paths.len(), "discovery task finished");
                    entry.result = Some(response);
                    if entry.status != TaskStatus::Cancelled {
                        entry.finish(status);
                    }
                }
                Ok(Err(err)) => {
                    if entry.status != TaskStatus::Cancelled {
                        warn!(%task_id, "discovery task failed: {}", err);
                        entry.error = Some(err);
                        entry.finish(TaskStatus::Failed);
                    }
                }
                Err(join_err) => {
                    warn!(%task_id, "discovery worker aborted: {}", join_err);
                    entry.error = Some(EngineError::GraphInconsistency(format!(
                        "discovery worker aborted: {}",
                        join_err
                    )));
                    entry.finish(TaskStatus::Failed);
                }
            }
        });

        Ok(task_id)
    }

    /// Run a discovery to completion under the same concurrency cap
    pub async fn run(&self, request: DiscoveryRequest) -> EngineResult<DiscoveryResponse> {
        request.validate()?;
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| EngineError::Cancelled)?;
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || {
            let budget = engine.search_budget(None);
            engine.discover(&request, &budget)
        })
        .await
        .map_err(|e| EngineError::GraphInconsistency(format!("discovery worker aborted: {}", e)))?
    }

    pub fn status(&self, task_id: TaskId) -> EngineResult<TaskSnapshot> {
        let table = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
        table
            .get(&task_id)
            .map(|entry| entry.snapshot(task_id, true))
            .ok_or_else(|| EngineError::NotFound(format!("task {}", task_id)))
    }

    /// Cancel a task. Terminal tasks are left as they are.
    pub fn cancel(&self, task_id: TaskId) -> EngineResult<TaskStatus> {
        let mut table = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        let entry = table
            .get_mut(&task_id)
            .ok_or_else(|| EngineError::NotFound(format!("task {}", task_id)))?;

        if !entry.status.is_terminal() {
            entry.cancel.store(true, Ordering::Relaxed);
            entry.finish(TaskStatus::Cancelled);
            info!(%task_id, "discovery task cancelled");
        }
        Ok(entry.status)
    }

    /// Every tracked task, without result payloads, oldest first
    pub fn list(&self) -> Vec<TaskSnapshot> {
        let table = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
        let mut tasks: Vec<TaskSnapshot> = table
            .iter()
            .map(|(&id, entry)| entry.snapshot(id, false))
            .collect();
        tasks.sort_by_key(|t| t.submitted_at);
        tasks
    }

    /// Drop terminal tasks that finished at least `ttl` ago
    pub fn purge_finished(&self, ttl: Duration) -> usize {
        let mut table = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        let before = table.len();
        table.retain(|_, entry| match entry.finished {
            Some(at) if entry.status.is_terminal() => at.elapsed() < ttl,
            _ => true,
        });
        let purged = before - table.len();
        if purged > 0 {
            debug!(purged, "purged finished discovery tasks");
        }
        purged
    }

    /// Poll until the task reaches a terminal state
    pub async fn wait(&self, task_id: TaskId) -> EngineResult<TaskSnapshot> {
        loop {
            let snapshot = self.status(task_id)?;
            if snapshot.status.is_terminal() {
                return Ok(snapshot);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

fn fail(tasks: &TaskTable, task_id: TaskId, err: EngineError) {
    let mut table = tasks.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(entry) = table.get_mut(&task_id) {
        if !entry.status.is_terminal() {
            entry.error = Some(err);
            entry.finish(TaskStatus::Failed);
        }
    }
}

/// Purge finished tasks on a fixed period
pub fn spawn_purger(coordinator: DiscoveryCoordinator) -> tokio::task::JoinHandle<()> {
    let ttl = Duration::from_secs(coordinator.engine().config().tasks.task_ttl_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval((ttl / 4).max(Duration::from_secs(1)));
        loop {
            ticker.tick().await;
            coordinator.purge_finished(ttl);
        }
    })
}
