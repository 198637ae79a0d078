//! Host-facing interpreter interface.
//!
//! A notebook host drives interpreters through this trait: it opens them once,
//! hands them paragraphs to run (always through the FIFO queue named by
//! [`Interpreter::scheduler_key`]) and closes them on shutdown.

mod postgres;

pub use postgres::{register, PostgresInterpreter};

use crate::error::{ErrorKind, NotebookError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Opaque execution context supplied by the host for each paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterContext {
    pub note_id: String,
    pub paragraph_id: String,
}

impl InterpreterContext {
    pub fn new(note_id: impl Into<String>, paragraph_id: impl Into<String>) -> Self {
        Self {
            note_id: note_id.into(),
            paragraph_id: paragraph_id.into(),
        }
    }
}

/// Status of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Code {
    Success,
    Error,
}

/// How the host should render the input form for this interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormType {
    Native,
    Simple,
    None,
}

/// Outcome of one interpreter run as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterResult {
    pub code: Code,

    /// Rendered payload on success, the underlying error text on failure.
    pub message: String,

    /// Kind of failure, for hosts that care. Always None on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl InterpreterResult {
    /// Creates a successful result carrying `message`.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            code: Code::Success,
            message: message.into(),
            error_kind: None,
        }
    }

    /// Creates an error result from a NotebookError.
    pub fn error(err: &NotebookError) -> Self {
        Self {
            code: Code::Error,
            message: err.message().to_string(),
            error_kind: Some(err.kind()),
        }
    }

    /// Returns true if the run succeeded.
    pub fn is_success(&self) -> bool {
        self.code == Code::Success
    }
}

/// Lifecycle and execution hooks a host calls on an interpreter.
#[async_trait]
pub trait Interpreter: Send + Sync {
    /// Prepares the interpreter for use.
    async fn open(&self);

    /// Releases anything held between runs.
    async fn close(&self);

    /// Runs `query` to completion and returns the rendered result.
    async fn interpret(&self, query: &str, context: &InterpreterContext) -> InterpreterResult;

    /// Requests cancellation of the run for `context`.
    async fn cancel(&self, context: &InterpreterContext);

    /// Returns progress of the run for `context`, 0..=100.
    fn progress(&self, context: &InterpreterContext) -> u8;

    /// Returns the form type the host should show.
    fn form_type(&self) -> FormType;

    /// Returns completion candidates for `buffer` at `cursor`.
    fn completion(&self, buffer: &str, cursor: usize) -> Vec<String>;

    /// Returns the identity of the FIFO queue all runs must go through.
    fn scheduler_key(&self) -> String;
}
