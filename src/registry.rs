//! Explicit interpreter registration.
//!
//! The host builds a registry at startup and registers every interpreter it
//! wants to offer. Nothing registers itself as a side effect of loading.

use crate::config::Properties;
use crate::error::{NotebookError, Result};
use crate::interpreter::Interpreter;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Builds an interpreter instance from its properties.
pub type InterpreterFactory = Box<dyn Fn(Properties) -> Arc<dyn Interpreter> + Send + Sync>;

/// Name-to-factory map of the interpreters a host offers.
#[derive(Default)]
pub struct InterpreterRegistry {
    factories: HashMap<String, InterpreterFactory>,
}

impl InterpreterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `name`. Names must be unique.
    pub fn register<F>(&mut self, name: &str, factory: F) -> Result<()>
    where
        F: Fn(Properties) -> Arc<dyn Interpreter> + Send + Sync + 'static,
    {
        if self.factories.contains_key(name) {
            return Err(NotebookError::internal(format!(
                "Interpreter '{name}' is already registered"
            )));
        }
        debug!("Registered interpreter '{name}'");
        self.factories.insert(name.to_string(), Box::new(factory));
        Ok(())
    }

    /// Creates a new instance of the interpreter registered under `name`.
    pub fn create(&self, name: &str, properties: Properties) -> Result<Arc<dyn Interpreter>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            NotebookError::internal(format!("No interpreter registered as '{name}'"))
        })?;
        Ok(factory(properties))
    }

    /// Returns the registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
