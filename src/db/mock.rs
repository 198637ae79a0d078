//! Mock session for testing.
//!
//! Returns a canned outcome for every query and records what it was asked to
//! run, so interpreter and scheduler tests can run without a server.

use super::{ExecutionOutcome, RawResult, SqlSession};
use crate::config::ConnectionTarget;
use crate::error::{NotebookError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mock session that returns a predefined outcome.
#[derive(Debug, Clone)]
pub struct MockSession {
    response: std::result::Result<ExecutionOutcome, NotebookError>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<(ConnectionTarget, String)>>>,
    open: Arc<AtomicUsize>,
    max_open: Arc<AtomicUsize>,
}

impl MockSession {
    /// Creates a mock that answers every query with `outcome`.
    pub fn returning(outcome: ExecutionOutcome) -> Self {
        Self {
            response: Ok(outcome),
            delay: None,
            calls: Arc::default(),
            open: Arc::default(),
            max_open: Arc::default(),
        }
    }

    /// Creates a mock that answers every query with a result set.
    pub fn with_result(raw: RawResult) -> Self {
        Self::returning(ExecutionOutcome::ResultSet(raw))
    }

    /// Creates a mock that fails every query with `error`.
    pub fn failing(error: NotebookError) -> Self {
        Self {
            response: Err(error),
            ..Self::returning(ExecutionOutcome::NoResultSet { rows_affected: 0 })
        }
    }

    /// Makes every query take `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the (target, query) pairs seen so far, in call order.
    pub fn calls(&self) -> Vec<(ConnectionTarget, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Returns how many sessions are currently open.
    pub fn open_sessions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Returns the highest number of sessions ever open at once.
    pub fn max_concurrent_sessions(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::returning(ExecutionOutcome::NoResultSet { rows_affected: 0 })
    }
}

/// Decrements the open-session counter on every exit path.
struct OpenGuard<'a>(&'a AtomicUsize);

impl Drop for OpenGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SqlSession for MockSession {
    async fn execute(&self, target: &ConnectionTarget, query: &str) -> Result<ExecutionOutcome> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((target.clone(), query.to_string()));
        }

        let now_open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_open.fetch_max(now_open, Ordering::SeqCst);
        let _guard = OpenGuard(&self.open);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.response.clone()
    }
}
