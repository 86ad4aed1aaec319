//! Background task runner: a fixed pool of workers draining one queue of
//! scheduled query runs and writing the outcomes back into the cache.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cache::{CacheKey, CacheManager};
use crate::database::DbPool;
use crate::queries::{Query, QueryError, RepoSelection};

/// One scheduled query run, created by the cache manager on a miss and
/// consumed by a single worker.
pub struct TaskEnvelope {
    pub task_id: Uuid,
    pub key: CacheKey,
    pub query: Arc<dyn Query>,
    pub repos: RepoSelection,
    pub submitted_at: DateTime<Utc>,
}

impl TaskEnvelope {
    pub fn new(key: CacheKey, query: Arc<dyn Query>, repos: RepoSelection) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            key,
            query,
            repos,
            submitted_at: Utc::now(),
        }
    }
}

/// Producer half of the task queue, held by the cache manager.
#[derive(Clone)]
pub struct TaskSubmitter {
    tx: mpsc::UnboundedSender<TaskEnvelope>,
}

impl TaskSubmitter {
    pub fn submit(&self, envelope: TaskEnvelope) -> Result<(), QueryError> {
        self.tx
            .send(envelope)
            .map_err(|_| QueryError::RunnerUnavailable)
    }
}

/// Consumer half of the task queue, handed to [`TaskRunner::start`].
pub struct TaskReceiver {
    rx: mpsc::UnboundedReceiver<TaskEnvelope>,
}

impl TaskReceiver {
    pub async fn recv(&mut self) -> Option<TaskEnvelope> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Result<TaskEnvelope, mpsc::error::TryRecvError> {
        self.rx.try_recv()
    }
}

/// Create the submit/receive pair connecting the cache manager to the
/// worker pool. The channel is unbounded; backpressure comes from the
/// cache's one-task-per-key guarantee.
pub fn task_channel() -> (TaskSubmitter, TaskReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TaskSubmitter { tx }, TaskReceiver { rx })
}

pub struct TaskRunner {
    handles: Vec<JoinHandle<()>>,
}

impl TaskRunner {
    /// Spawn `workers` consumers over the shared queue. Each task is run
    /// under `time_limit`; exceeding it records a timeout failure for the
    /// entry and frees the worker.
    pub fn start(
        db: DbPool,
        cache: Arc<CacheManager>,
        receiver: TaskReceiver,
        workers: usize,
        time_limit: Duration,
    ) -> Self {
        let shared = Arc::new(Mutex::new(receiver.rx));
        let count = workers.max(1);
        let mut handles = Vec::with_capacity(count);

        for worker_id in 0..count {
            let worker = Worker {
                worker_id,
                db: db.clone(),
                cache: Arc::clone(&cache),
                time_limit,
            };
            let rx = Arc::clone(&shared);
            handles.push(tokio::spawn(async move { worker.run(rx).await }));
        }

        info!(workers = count, time_limit_secs = time_limit.as_secs(), "task runner started");
        Self { handles }
    }

    /// Stop all workers. Outcomes of in-flight queries are discarded; their
    /// cache entries stay pending, so waiters for them run out the wait
    /// ceiling and render the failure placeholder.
    pub async fn shutdown(self) {
        for handle in &self.handles {
            handle.abort();
        }
        for handle in self.handles {
            let _ = handle.await;
        }
        info!("task runner stopped");
    }
}

struct Worker {
    worker_id: usize,
    db: DbPool,
    cache: Arc<CacheManager>,
    time_limit: Duration,
}

impl Worker {
    async fn run(self, rx: Arc<Mutex<mpsc::UnboundedReceiver<TaskEnvelope>>>) {
        debug!(worker_id = self.worker_id, "worker started");

        loop {
            // The lock is held only while parked on recv; it drops before
            // the query runs so an idle worker can take the next task.
            let envelope = { rx.lock().await.recv().await };
            let Some(envelope) = envelope else {
                break;
            };
            self.process(envelope).await;
        }

        warn!(worker_id = self.worker_id, "worker queue closed, exiting");
    }

    async fn process(&self, envelope: TaskEnvelope) {
        let started = std::time::Instant::now();
        let queued_ms = (Utc::now() - envelope.submitted_at).num_milliseconds();
        debug!(
            worker_id = self.worker_id,
            task_id = %envelope.task_id,
            key = %envelope.key,
            queued_ms,
            "running query task"
        );

        // The query runs on its own task so a panic inside `run` settles
        // the entry as failed instead of unwinding this worker and leaving
        // the key pending forever.
        let db = self.db.clone();
        let query = Arc::clone(&envelope.query);
        let repos = envelope.repos.clone();
        let mut run = tokio::spawn(async move { query.run(&db, &repos).await });

        let run_result = timeout(self.time_limit, &mut run).await;
        let outcome = match run_result {
            Ok(Ok(result)) => result,
            // The handle is never aborted before the deadline, so a join
            // error here is a panic.
            Ok(Err(_)) => Err(QueryError::Panicked),
            Err(_) => {
                run.abort();
                Err(QueryError::Timeout(self.time_limit))
            }
        };

        match &outcome {
            Ok(frame) => info!(
                worker_id = self.worker_id,
                task_id = %envelope.task_id,
                key = %envelope.key,
                rows = frame.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "query task completed"
            ),
            Err(err) => error!(
                worker_id = self.worker_id,
                task_id = %envelope.task_id,
                key = %envelope.key,
                error = %err,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "query task failed"
            ),
        }

        if !self.cache.complete(&envelope.key, outcome) {
            warn!(
                worker_id = self.worker_id,
                key = %envelope.key,
                "completion dropped, entry no longer pending"
            );
        }
    }
}
