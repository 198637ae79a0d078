//! PostgreSQL interpreter.
//!
//! Runs each paragraph as one query over a fresh connection and renders the
//! result as a `%table` payload.

use super::{FormType, Interpreter, InterpreterContext, InterpreterResult};
use crate::config::{ConnectionTarget, InterpreterSettings, Properties};
use crate::db::{PostgresSession, SqlSession};
use crate::error::{NotebookError, Result};
use crate::format;
use crate::registry::InterpreterRegistry;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, error, info, warn};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Registers the `postgresql` interpreter with `registry`.
pub fn register(registry: &mut InterpreterRegistry, settings: InterpreterSettings) -> Result<()> {
    registry.register(<PostgresInterpreter>::NAME, move |properties| {
        Arc::new(PostgresInterpreter::new(properties, settings.clone())) as Arc<dyn Interpreter>
    })
}

/// Interpreter that sends paragraphs to PostgreSQL.
pub struct PostgresInterpreter<S: SqlSession = PostgresSession> {
    properties: RwLock<Properties>,
    settings: InterpreterSettings,
    session: S,
    instance_id: u64,
}

impl PostgresInterpreter<PostgresSession> {
    /// Name the interpreter is registered under.
    pub const NAME: &'static str = "postgresql";

    /// Creates an interpreter backed by a real PostgreSQL session.
    pub fn new(properties: Properties, settings: InterpreterSettings) -> Self {
        Self::with_session(properties, settings, PostgresSession::new())
    }
}

impl<S: SqlSession> PostgresInterpreter<S> {
    /// Creates an interpreter using the given session implementation.
    pub fn with_session(properties: Properties, settings: InterpreterSettings, session: S) -> Self {
        Self {
            properties: RwLock::new(properties),
            settings,
            session,
            instance_id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Replaces the interpreter properties. Takes effect on the next run.
    pub fn set_properties(&self, properties: Properties) {
        let mut guard = self.properties.write().unwrap_or_else(|poisoned| {
            warn!("Properties lock poisoned, replacing them anyway");
            PoisonError::into_inner(poisoned)
        });
        *guard = properties;
    }

    /// Returns a snapshot of the current properties.
    ///
    /// A writer that panicked leaves the map whole, so a poisoned lock is read
    /// through rather than treated as empty.
    pub fn properties(&self) -> Properties {
        self.properties
            .read()
            .unwrap_or_else(|poisoned| {
                warn!("Properties lock poisoned, reading them anyway");
                PoisonError::into_inner(poisoned)
            })
            .clone()
    }

    /// Resolves the target and runs the query, bounded by the command timeout.
    async fn run(&self, query: &str) -> Result<String> {
        let target = ConnectionTarget::resolve(&self.properties());
        debug!("Target: {}", target.display_string());

        let execution = self.session.execute(&target, query);
        let outcome = match self.settings.command_timeout() {
            Some(limit) => tokio::time::timeout(limit, execution)
                .await
                .map_err(|_| {
                    NotebookError::timeout(format!(
                        "Query timed out after {} ms",
                        limit.as_millis()
                    ))
                })??,
            None => execution.await?,
        };

        Ok(format::render(&outcome))
    }
}

#[async_trait]
impl<S: SqlSession> Interpreter for PostgresInterpreter<S> {
    async fn open(&self) {
        debug!("Opened postgresql interpreter {}", self.instance_id);
    }

    async fn close(&self) {
        debug!("Closed postgresql interpreter {}", self.instance_id);
    }

    async fn interpret(&self, query: &str, context: &InterpreterContext) -> InterpreterResult {
        info!(paragraph = %context.paragraph_id, "Run postgresql command '{query}'");
        let start = Instant::now();

        match self.run(query).await {
            Ok(payload) => {
                debug!("Finished in {:?}", start.elapsed());
                InterpreterResult::success(payload)
            }
            Err(e) => {
                error!("Can not run {query}: {e}");
                InterpreterResult::error(&e)
            }
        }
    }

    async fn cancel(&self, _context: &InterpreterContext) {}

    fn progress(&self, _context: &InterpreterContext) -> u8 {
        0
    }

    fn form_type(&self) -> FormType {
        FormType::Simple
    }

    fn completion(&self, _buffer: &str, _cursor: usize) -> Vec<String> {
        Vec::new()
    }

    fn scheduler_key(&self) -> String {
        format!("{}-{}", <PostgresInterpreter>::NAME, self.instance_id)
    }
}
