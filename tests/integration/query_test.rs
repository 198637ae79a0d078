//! Query execution integration tests.
//!
//! Runs real SQL through the interpreter and checks the rendered payload.

use super::test_properties;
use pg_notebook::config::InterpreterSettings;
use pg_notebook::error::ErrorKind;
use pg_notebook::interpreter::{Code, Interpreter, InterpreterContext, PostgresInterpreter};
use pretty_assertions::assert_eq;

fn get_test_interpreter() -> Option<PostgresInterpreter> {
    let props = test_properties()?;
    Some(PostgresInterpreter::new(props, InterpreterSettings::default()))
}

#[tokio::test]
async fn test_select_renders_table() {
    let Some(interp) = get_test_interpreter() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = interp
        .interpret(
            "SELECT * FROM (VALUES (1, 'a'), (2, 'b')) AS t(id, name) ORDER BY id",
            &InterpreterContext::default(),
        )
        .await;

    assert_eq!(result.code, Code::Success);
    assert_eq!(result.message, "%table id\tname\n1\ta\n2\tb\n");
}

#[tokio::test]
async fn test_empty_select_keeps_header() {
    let Some(interp) = get_test_interpreter() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = interp
        .interpret(
            "SELECT 1 AS id, 'x' AS name WHERE false",
            &InterpreterContext::default(),
        )
        .await;

    assert_eq!(result.code, Code::Success);
    assert_eq!(result.message, "%table id\tname\n");
}

#[tokio::test]
async fn test_statement_without_result_set() {
    let Some(interp) = get_test_interpreter() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = interp
        .interpret("SET application_name = 'pg-notebook-test'", &InterpreterContext::default())
        .await;

    assert_eq!(result.code, Code::Success);
    assert_eq!(result.message, "%table ");
}

#[tokio::test]
async fn test_values_use_server_text_form() {
    let Some(interp) = get_test_interpreter() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = interp
        .interpret(
            "SELECT true AS flag, 1.50::numeric AS amount, DATE '2024-01-02' AS day, NULL::int AS missing",
            &InterpreterContext::default(),
        )
        .await;

    assert_eq!(result.code, Code::Success);
    assert_eq!(
        result.message,
        "%table flag\tamount\tday\tmissing\nt\t1.50\t2024-01-02\t\n"
    );
}

#[tokio::test]
async fn test_same_query_twice_is_identical() {
    let Some(interp) = get_test_interpreter() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let query = "SELECT g AS n, g * g AS sq FROM generate_series(1, 5) AS g ORDER BY g";
    let ctx = InterpreterContext::default();
    let first = interp.interpret(query, &ctx).await;
    let second = interp.interpret(query, &ctx).await;

    assert_eq!(first.code, Code::Success);
    assert_eq!(first.message, second.message);
}

#[tokio::test]
async fn test_syntax_error_is_query_error() {
    let Some(interp) = get_test_interpreter() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = interp
        .interpret("SELEC 1", &InterpreterContext::default())
        .await;

    assert_eq!(result.code, Code::Error);
    assert_eq!(result.error_kind, Some(ErrorKind::Query));
    assert!(result.message.contains("syntax error"));
}

#[tokio::test]
async fn test_missing_table_is_query_error() {
    let Some(interp) = get_test_interpreter() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = interp
        .interpret(
            "SELECT * FROM nonexistent_table_xyz",
            &InterpreterContext::default(),
        )
        .await;

    assert_eq!(result.code, Code::Error);
    assert!(result.message.contains("nonexistent_table_xyz"));
}

#[tokio::test]
async fn test_timeout_bounds_slow_query() {
    let Some(props) = test_properties() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let interp = PostgresInterpreter::new(
        props,
        InterpreterSettings {
            command_timeout_ms: 200,
            ..Default::default()
        },
    );

    let result = interp
        .interpret("SELECT pg_sleep(5)", &InterpreterContext::default())
        .await;

    assert_eq!(result.code, Code::Error);
    assert_eq!(result.error_kind, Some(ErrorKind::Timeout));
}

#[tokio::test]
async fn test_repeated_column_name_reads_first_column() {
    let Some(interp) = get_test_interpreter() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = interp
        .interpret("SELECT 1 AS a, 2 AS a", &InterpreterContext::default())
        .await;

    assert_eq!(result.code, Code::Success);
    assert_eq!(result.message, "%table a\ta\n1\t1\n");
}

#[tokio::test]
async fn test_multiple_statements_render_first_result_set() {
    let Some(interp) = get_test_interpreter() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = interp
        .interpret(
            "SET application_name = 'pg-notebook-test'; SELECT 1 AS a; SELECT 2 AS b",
            &InterpreterContext::default(),
        )
        .await;

    assert_eq!(result.code, Code::Success);
    assert_eq!(result.message, "%table a\n1\n");
}

#[tokio::test]
async fn test_multiple_statements_keep_header_of_empty_result_set() {
    let Some(interp) = get_test_interpreter() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = interp
        .interpret(
            "CREATE TEMP TABLE x(a int, b text); SELECT * FROM x",
            &InterpreterContext::default(),
        )
        .await;

    assert_eq!(result.code, Code::Success);
    assert_eq!(result.message, "%table a\tb\n");
}

#[tokio::test]
async fn test_connection_is_closed_after_query_error() {
    let Some(interp) = get_test_interpreter() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let ctx = InterpreterContext::default();

    // A session-level advisory lock outlives the failed transaction, so it is
    // held for exactly as long as the backend that ran the query lives.
    let result = interp
        .interpret("SELECT pg_advisory_lock(72210431); SELECT 1 / 0", &ctx)
        .await;
    assert_eq!(result.code, Code::Error);
    assert_eq!(result.error_kind, Some(ErrorKind::Query));

    let check = "SELECT count(*) AS held FROM pg_locks \
                 WHERE locktype = 'advisory' AND objid = 72210431 AND granted";
    let mut held = String::new();
    for _ in 0..40 {
        held = interp.interpret(check, &ctx).await.message;
        if held == "%table held\n0\n" {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    assert_eq!(held, "%table held\n0\n");
}
