//! pg-notebook - PostgreSQL interpreter for notebook-style execution hosts.
//!
//! A host registers the interpreter explicitly, feeds it paragraphs through a
//! per-instance FIFO queue and gets back a `%table` payload or an error.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod interpreter;
pub mod logging;
pub mod registry;
pub mod scheduler;
