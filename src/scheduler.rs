//! FIFO execution queues for interpreters.
//!
//! Each scheduler key gets exactly one worker task. Jobs submitted under that
//! key run one at a time, in submission order, each to completion before the
//! next one starts.

use crate::error::{NotebookError, Result};
use crate::interpreter::{Interpreter, InterpreterContext, InterpreterResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Maximum number of jobs that can wait in one queue (default).
pub const DEFAULT_MAX_QUEUE_DEPTH: usize = 64;

/// Unique identifier for a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

impl JobId {
    /// Generates a new unique job ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A query waiting for the worker.
struct Job {
    id: JobId,
    query: String,
    context: InterpreterContext,
    reply: oneshot::Sender<InterpreterResult>,
}

/// Single-worker FIFO queue bound to one interpreter instance.
pub struct FifoScheduler {
    key: String,
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl FifoScheduler {
    /// Starts the worker task for `interpreter`. Must be called inside a Tokio runtime.
    pub fn spawn(key: impl Into<String>, interpreter: Arc<dyn Interpreter>, max_depth: usize) -> Self {
        let key = key.into();
        let (sender, receiver) = mpsc::channel(max_depth.max(1));
        let worker = tokio::spawn(run_worker(key.clone(), interpreter, receiver));

        Self {
            key,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Returns the key this scheduler serves.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Queues `query` and waits for its result.
    ///
    /// Fails immediately when the queue is full or shut down.
    pub async fn submit(
        &self,
        query: impl Into<String>,
        context: InterpreterContext,
    ) -> Result<InterpreterResult> {
        let sender = self
            .sender
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
            .ok_or_else(|| NotebookError::internal(format!("Scheduler '{}' is shut down", self.key)))?;

        let (reply, response) = oneshot::channel();
        let job = Job {
            id: JobId::new(),
            query: query.into(),
            context,
            reply,
        };
        let id = job.id;

        sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                NotebookError::internal(format!("Queue '{}' is full", self.key))
            }
            mpsc::error::TrySendError::Closed(_) => {
                NotebookError::internal(format!("Scheduler '{}' is shut down", self.key))
            }
        })?;
        debug!("Queued job {id} on '{}'", self.key);

        response
            .await
            .map_err(|_| NotebookError::internal(format!("Job {id} was dropped before finishing")))
    }

    /// Stops accepting jobs, lets queued ones finish and waits for the worker.
    pub async fn shutdown(&self) {
        if let Ok(mut guard) = self.sender.lock() {
            guard.take();
        }
        let worker = self.worker.lock().ok().and_then(|mut guard| guard.take());
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!("Worker for '{}' ended abnormally: {e}", self.key);
            }
        }
    }
}

async fn run_worker(
    key: String,
    interpreter: Arc<dyn Interpreter>,
    mut receiver: mpsc::Receiver<Job>,
) {
    while let Some(job) = receiver.recv().await {
        debug!("Running job {} on '{key}'", job.id);
        let result = interpreter.interpret(&job.query, &job.context).await;
        if job.reply.send(result).is_err() {
            debug!("Submitter of job {} went away", job.id);
        }
    }
    debug!("Worker for '{key}' stopped");
}

/// Hands out one FIFO scheduler per key.
pub struct SchedulerFactory {
    max_depth: usize,
    schedulers: Mutex<HashMap<String, Arc<FifoScheduler>>>,
}

impl SchedulerFactory {
    /// Creates a factory whose queues hold at most `max_depth` waiting jobs.
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            schedulers: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the scheduler for the interpreter's key, creating it on first use.
    pub fn get_or_create_fifo(&self, interpreter: Arc<dyn Interpreter>) -> Result<Arc<FifoScheduler>> {
        let key = interpreter.scheduler_key();
        let mut schedulers = self
            .schedulers
            .lock()
            .map_err(|_| NotebookError::internal("Scheduler registry poisoned"))?;

        let scheduler = schedulers
            .entry(key.clone())
            .or_insert_with(|| Arc::new(FifoScheduler::spawn(key, interpreter, self.max_depth)));
        Ok(Arc::clone(scheduler))
    }

    /// Removes and shuts down the scheduler for `key`, if any.
    pub async fn remove(&self, key: &str) {
        let scheduler = self.schedulers.lock().ok().and_then(|mut s| s.remove(key));
        if let Some(scheduler) = scheduler {
            scheduler.shutdown().await;
        }
    }

    /// Shuts down every scheduler.
    pub async fn shutdown_all(&self) {
        let schedulers: Vec<Arc<FifoScheduler>> = self
            .schedulers
            .lock()
            .map(|mut s| s.drain().map(|(_, v)| v).collect())
            .unwrap_or_default();
        for scheduler in schedulers {
            scheduler.shutdown().await;
        }
    }
}

impl Default for SchedulerFactory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_QUEUE_DEPTH)
    }
}
