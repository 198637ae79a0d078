//! Configuration management for pg-notebook.
//!
//! Two layers live here: the string-keyed interpreter properties handed over
//! by the host on every call, resolved into a typed [`ConnectionTarget`], and
//! the host settings file (TOML) that carries per-interpreter properties plus
//! timeouts and queue limits.

use crate::error::{NotebookError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// String-keyed interpreter options as supplied by the host.
pub type Properties = HashMap<String, String>;

/// URI prefix for PostgreSQL connection targets.
pub const URI_SCHEME: &str = "jdbc:postgresql://";

/// Recognised property keys, long form first.
const HOST_KEYS: [&str; 2] = ["--host", "-h"];
const PORT_KEYS: [&str; 2] = ["--port", "-P"];
const USER_KEYS: [&str; 2] = ["--user", "-u"];
const PASSWORD_KEYS: [&str; 2] = ["--password", "-p"];

/// Where a query should be sent and as whom.
///
/// Every field defaults to the empty string; nothing is validated at
/// resolution time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
}

impl ConnectionTarget {
    /// Resolves a target from interpreter properties.
    ///
    /// Keys are matched exactly and case-sensitively. Anything else is
    /// logged and otherwise ignored.
    pub fn resolve(properties: &Properties) -> Self {
        let mut target = Self::default();

        for (key, value) in properties {
            let key = key.as_str();
            if HOST_KEYS.contains(&key) {
                target.host = value.clone();
            } else if PASSWORD_KEYS.contains(&key) {
                target.password = value.clone();
            } else if USER_KEYS.contains(&key) {
                target.user = value.clone();
            } else if PORT_KEYS.contains(&key) {
                target.port = value.clone();
            } else {
                info!(key, "Ignoring unrecognised interpreter property");
            }
        }

        target
    }

    /// Builds the connection URI: `jdbc:postgresql://<host>[:<port>]/?user=<user>`.
    ///
    /// The port segment is dropped entirely when the port is empty. The user
    /// is form-encoded so it cannot open new query parameters.
    pub fn connection_uri(&self) -> String {
        let mut uri = String::from(URI_SCHEME);
        uri.push_str(&self.host);
        if !self.port.is_empty() {
            uri.push(':');
            uri.push_str(&self.port);
        }
        uri.push_str("/?user=");
        uri.extend(url::form_urlencoded::byte_serialize(self.user.as_bytes()));
        uri
    }

    /// Rejects hosts and ports that would change the shape of the URI.
    ///
    /// A bracketed IPv6 literal such as `[::1]` is the one host form allowed
    /// to contain `:`.
    pub fn validate(&self) -> Result<()> {
        let delimiter = self.host.chars().find(|c| {
            matches!(c, '/' | '?' | '#' | '@' | ':' | '[' | ']') || c.is_whitespace()
        });
        if let Some(c) = delimiter.filter(|_| !is_ipv6_literal(&self.host)) {
            return Err(NotebookError::config(format!(
                "Invalid character '{c}' in host '{}'",
                self.host
            )));
        }
        if !self.port.chars().all(|c| c.is_ascii_digit()) {
            return Err(NotebookError::config(format!(
                "Invalid port '{}'",
                self.port
            )));
        }
        Ok(())
    }

    /// Returns a display-safe string (no password) for logs.
    pub fn display_string(&self) -> String {
        let host = if self.host.is_empty() {
            "<default host>"
        } else {
            &self.host
        };
        let user = if self.user.is_empty() {
            "<default user>"
        } else {
            &self.user
        };
        if self.port.is_empty() {
            format!("{user} @ {host}")
        } else {
            format!("{user} @ {host}:{}", self.port)
        }
    }
}

fn is_ipv6_literal(host: &str) -> bool {
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .is_some_and(|inner| {
            inner.contains(':')
                && inner.chars().all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.')
        })
}

/// Fills in connection properties from PGHOST, PGPORT, PGUSER and PGPASSWORD.
///
/// A variable is used only when neither spelling of its key is present.
pub fn apply_env_defaults(properties: &mut Properties) {
    let fallbacks = [
        (HOST_KEYS, "PGHOST"),
        (PORT_KEYS, "PGPORT"),
        (USER_KEYS, "PGUSER"),
        (PASSWORD_KEYS, "PGPASSWORD"),
    ];

    for (keys, var) in fallbacks {
        if keys.iter().any(|k| properties.contains_key(*k)) {
            continue;
        }
        if let Ok(value) = std::env::var(var) {
            properties.insert(keys[0].to_string(), value);
        }
    }
}

/// Main configuration structure for the host binary.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Execution settings shared by every interpreter.
    #[serde(default)]
    pub settings: InterpreterSettings,

    /// Properties per registered interpreter name.
    #[serde(default)]
    pub interpreters: HashMap<String, Properties>,
}

/// Execution settings for an interpreter instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterpreterSettings {
    /// Upper bound on connect + execute + read, in milliseconds. 0 disables it.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,

    /// Maximum number of queries waiting in one FIFO queue.
    #[serde(default = "default_max_queue_depth")]
    pub max_queue_depth: usize,
}

fn default_command_timeout_ms() -> u64 {
    600_000
}

fn default_max_queue_depth() -> usize {
    64
}

impl Default for InterpreterSettings {
    fn default() -> Self {
        Self {
            command_timeout_ms: default_command_timeout_ms(),
            max_queue_depth: default_max_queue_depth(),
        }
    }
}

impl InterpreterSettings {
    /// Returns the command timeout, or None when disabled.
    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_ms > 0).then(|| Duration::from_millis(self.command_timeout_ms))
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pg-notebook")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| NotebookError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            NotebookError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Returns the properties configured for an interpreter, or none.
    pub fn properties_for(&self, name: &str) -> Properties {
        self.interpreters.get(name).cloned().unwrap_or_default()
    }
}
