//! Connection integration tests.
//!
//! Tests connectivity failures and how they surface to the host.

use pg_notebook::config::{InterpreterSettings, Properties};
use pg_notebook::error::ErrorKind;
use pg_notebook::interpreter::{Code, Interpreter, InterpreterContext, PostgresInterpreter};

fn props(pairs: &[(&str, &str)]) -> Properties {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test(flavor = "current_thread")]
async fn test_unreachable_host_is_error() {
    let interp = PostgresInterpreter::new(
        props(&[
            ("--host", "127.0.0.1"),
            ("--port", "1"),
            ("--user", "testuser"),
            ("--password", "testpass"),
        ]),
        InterpreterSettings::default(),
    );

    let result = interp
        .interpret("SELECT 1", &InterpreterContext::default())
        .await;

    assert_eq!(result.code, Code::Error);
    assert!(!result.message.is_empty());
    assert!(!result.message.starts_with("%table"));
    assert_eq!(result.error_kind, Some(ErrorKind::Connection));
}

#[tokio::test(flavor = "current_thread")]
async fn test_unresolvable_host_is_error() {
    let interp = PostgresInterpreter::new(
        props(&[
            ("-h", "invalid.host.that.does.not.exist.local"),
            ("-u", "testuser"),
            ("-p", "testpass"),
        ]),
        InterpreterSettings {
            command_timeout_ms: 30_000,
            ..Default::default()
        },
    );

    let result = interp
        .interpret("SELECT 1", &InterpreterContext::default())
        .await;

    assert_eq!(result.code, Code::Error);
    assert!(!result.message.is_empty());
}

#[tokio::test]
async fn test_injected_host_rejected_before_connecting() {
    let interp = PostgresInterpreter::new(
        props(&[("-h", "db1/?user=postgres&x="), ("-u", "alice")]),
        InterpreterSettings::default(),
    );

    let result = interp
        .interpret("SELECT 1", &InterpreterContext::default())
        .await;

    assert_eq!(result.code, Code::Error);
    assert_eq!(result.error_kind, Some(ErrorKind::Config));
    assert!(result.message.contains("host"));
}

#[tokio::test]
async fn test_non_numeric_port_rejected() {
    let interp = PostgresInterpreter::new(
        props(&[("-h", "localhost"), ("-P", "five")]),
        InterpreterSettings::default(),
    );

    let result = interp
        .interpret("SELECT 1", &InterpreterContext::default())
        .await;

    assert_eq!(result.code, Code::Error);
    assert_eq!(result.error_kind, Some(ErrorKind::Config));
}
