//! Database abstraction layer for pg-notebook.
//!
//! A session owns one connection for exactly one query: it connects, runs
//! the text, reads every row and disconnects before returning.

mod mock;
mod postgres;
mod types;

pub use mock::MockSession;
pub use postgres::PostgresSession;
pub use types::{ExecutionOutcome, RawResult, Row};

use crate::config::ConnectionTarget;
use crate::error::Result;
use async_trait::async_trait;

/// Trait defining the interface for per-query database sessions.
///
/// Implementations must release whatever they acquire before returning,
/// on success and on failure alike.
#[async_trait]
pub trait SqlSession: Send + Sync {
    /// Connects to `target`, submits `query` verbatim and reads the result.
    async fn execute(&self, target: &ConnectionTarget, query: &str) -> Result<ExecutionOutcome>;
}
