//! Integration tests for pg-notebook.
//!
//! Tests that need a server read DATABASE_URL and skip when it is unset.
//! The connection URI carries no database name, so the server's default
//! database for the user is used.

pub mod connection_test;
pub mod host_test;
pub mod query_test;

use pg_notebook::config::Properties;

/// Builds interpreter properties from DATABASE_URL, using the short keys.
pub fn test_properties() -> Option<Properties> {
    let url = url::Url::parse(&std::env::var("DATABASE_URL").ok()?).ok()?;

    let mut props = Properties::new();
    props.insert("-h".to_string(), url.host_str()?.to_string());
    if let Some(port) = url.port() {
        props.insert("-P".to_string(), port.to_string());
    }
    props.insert("-u".to_string(), url.username().to_string());
    props.insert(
        "-p".to_string(),
        url.password().unwrap_or_default().to_string(),
    );
    Some(props)
}
