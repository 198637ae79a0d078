//! Host wiring tests: explicit registration plus the FIFO queue.

use super::test_properties;
use pg_notebook::config::{InterpreterSettings, Properties};
use pg_notebook::interpreter::{self, Code, InterpreterContext};
use pg_notebook::registry::InterpreterRegistry;
use pg_notebook::scheduler::SchedulerFactory;
use std::sync::Arc;

fn registry() -> InterpreterRegistry {
    let mut registry = InterpreterRegistry::new();
    interpreter::register(&mut registry, InterpreterSettings::default()).unwrap();
    registry
}

#[tokio::test]
async fn test_registered_interpreter_runs_through_queue() {
    let interp = registry()
        .create(
            "postgresql",
            Properties::from([("-h".to_string(), "127.0.0.1".to_string()), ("-P".to_string(), "1".to_string())]),
        )
        .unwrap();
    let factory = SchedulerFactory::default();
    let scheduler = factory.get_or_create_fifo(Arc::clone(&interp)).unwrap();

    let result = scheduler
        .submit("SELECT 1", InterpreterContext::new("note", "p1"))
        .await
        .unwrap();
    assert_eq!(result.code, Code::Error);
    assert!(!result.message.is_empty());

    factory.shutdown_all().await;
}

#[tokio::test]
async fn test_queued_paragraphs_against_server() {
    let Some(props) = test_properties() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let interp = registry().create("postgresql", props).unwrap();
    let factory = SchedulerFactory::default();
    let scheduler = factory.get_or_create_fifo(Arc::clone(&interp)).unwrap();

    let mut payloads = Vec::new();
    for n in 1..=3 {
        let result = scheduler
            .submit(format!("SELECT {n} AS n"), InterpreterContext::new("note", format!("p{n}")))
            .await
            .unwrap();
        assert_eq!(result.code, Code::Success);
        payloads.push(result.message);
    }

    assert_eq!(payloads, vec!["%table n\n1\n", "%table n\n2\n", "%table n\n3\n"]);
    factory.shutdown_all().await;
}
