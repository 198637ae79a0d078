//! pg-notebook - run SQL paragraphs the way a notebook host would.

use pg_notebook::cli::{Cli, OutputFormat};
use pg_notebook::config::{self, Config};
use pg_notebook::error::{NotebookError, Result};
use pg_notebook::interpreter::{self, InterpreterContext};
use pg_notebook::logging;
use pg_notebook::registry::InterpreterRegistry;
use pg_notebook::scheduler::SchedulerFactory;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    match &cli.log_file {
        Some(path) => logging::init_file_logging(path),
        None => logging::init_stderr_logging(),
    }

    match run(&cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{e}");
            std::process::exit(2);
        }
    }
}

/// Runs every query and prints its payload. Returns false if any query failed.
async fn run(cli: &Cli) -> Result<bool> {
    let output = cli.parse_output_format().map_err(NotebookError::config)?;

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let mut settings = config.settings.clone();
    if let Some(timeout_ms) = cli.timeout_ms {
        settings.command_timeout_ms = timeout_ms;
    }

    let mut registry = InterpreterRegistry::new();
    interpreter::register(&mut registry, settings.clone())?;

    let mut properties = config.properties_for(&cli.interpreter);
    properties.extend(cli.property_overrides()?);
    if cli.pg_env {
        config::apply_env_defaults(&mut properties);
    }

    let queries = cli.resolve_queries()?;

    let interp = registry.create(&cli.interpreter, properties)?;
    interp.open().await;

    let schedulers = SchedulerFactory::new(settings.max_queue_depth);
    let scheduler = schedulers.get_or_create_fifo(interp.clone())?;

    let mut all_succeeded = true;
    for (index, query) in queries.into_iter().enumerate() {
        let context = InterpreterContext::new("cli", format!("paragraph-{}", index + 1));
        let result = scheduler.submit(query, context).await?;
        all_succeeded &= result.is_success();

        match output {
            OutputFormat::Text if result.is_success() => print!("{}", result.message),
            OutputFormat::Text => eprintln!("{}", result.message),
            OutputFormat::Json => {
                let line = serde_json::to_string(&result)
                    .map_err(|e| NotebookError::internal(e.to_string()))?;
                println!("{line}");
            }
        }
    }

    schedulers.shutdown_all().await;
    interp.close().await;

    Ok(all_succeeded)
}
