//! PostgreSQL session implementation.
//!
//! Provides the `PostgresSession` struct that implements the `SqlSession` trait
//! using sqlx. Queries go through the simple query protocol so that every cell
//! arrives in PostgreSQL's text output format.

use crate::config::ConnectionTarget;
use crate::db::{ExecutionOutcome, RawResult, Row, SqlSession};
use crate::error::{NotebookError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use sqlx::{Column as SqlxColumn, Connection, Either, Executor, Row as SqlxRow, Statement};
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info, warn};

/// PostgreSQL session: one connection per `execute` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresSession;

impl PostgresSession {
    /// Creates a new session factory.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SqlSession for PostgresSession {
    async fn execute(&self, target: &ConnectionTarget, query: &str) -> Result<ExecutionOutcome> {
        let options = connect_options(target)?;

        info!("Connect to {}", target.connection_uri());
        let start = Instant::now();
        let mut conn = PgConnection::connect_with(&options)
            .await
            .map_err(map_connection_error)?;
        debug!("Connected in {:?}", start.elapsed());

        // A timeout or panic upstream drops `conn`, which closes the socket.
        let outcome = run_query(&mut conn, query).await;

        if let Err(e) = conn.close().await {
            warn!("Failed to close connection cleanly: {e}");
        }

        outcome
    }
}

/// Turns a connection target into driver options.
///
/// The user is given twice, once in the URI and once explicitly, next to the
/// password.
fn connect_options(target: &ConnectionTarget) -> Result<PgConnectOptions> {
    target.validate()?;

    let uri = target.connection_uri();
    let driver_url = uri.strip_prefix("jdbc:").unwrap_or(&uri);

    let mut options =
        PgConnectOptions::from_str(driver_url).map_err(|e| NotebookError::config(e.to_string()))?;

    // The driver keeps the brackets of an IPv6 literal; the socket address must not.
    if let Some(literal) = ipv6_literal(&target.host) {
        options = options.host(literal);
    }
    if !target.user.is_empty() {
        options = options.username(&target.user);
    }
    Ok(options.password(&target.password))
}

/// Submits the query text and reads the first result set it yields.
async fn run_query(conn: &mut PgConnection, query: &str) -> Result<ExecutionOutcome> {
    let mut header: Option<(Vec<String>, Vec<usize>)> = None;
    let mut rows: Vec<Row> = Vec::new();
    let mut rows_affected = 0;
    let mut result_set_done = false;

    {
        let mut stream = sqlx::raw_sql(query).fetch_many(&mut *conn);
        while let Some(item) = stream.try_next().await.map_err(map_query_error)? {
            match item {
                Either::Left(done) => {
                    rows_affected += done.rows_affected();
                    if header.is_some() {
                        result_set_done = true;
                    }
                }
                Either::Right(row) => {
                    if result_set_done {
                        continue;
                    }
                    let (_, ordinals) = header.get_or_insert_with(|| {
                        let names = column_names(&row);
                        let ordinals = first_ordinals(&names);
                        (names, ordinals)
                    });
                    rows.push(read_row(&row, ordinals)?);
                }
            }
        }
    }

    if let Some((columns, _)) = header {
        debug!("{:?}", columns);
        return Ok(ExecutionOutcome::ResultSet(RawResult::with_data(
            columns, rows,
        )));
    }

    // No rows came back: describe the text to tell an empty result set
    // apart from a statement that has none.
    match describe(conn, query).await {
        Some(columns) => {
            debug!("{:?}", columns);
            Ok(ExecutionOutcome::ResultSet(RawResult::new(columns)))
        }
        None => Ok(ExecutionOutcome::NoResultSet { rows_affected }),
    }
}

/// Returns the columns of the first statement in `query` that has any.
///
/// The whole text is prepared first. The server refuses to prepare more than
/// one command, so multi-statement text is split and each statement is
/// described in order.
async fn describe(conn: &mut PgConnection, query: &str) -> Option<Vec<String>> {
    let statements = match (&mut *conn).prepare(query).await {
        Ok(statement) => return statement_columns(&statement),
        Err(e) => {
            debug!("Could not describe query as one statement: {e}");
            split_statements(query)?
        }
    };

    for statement in statements {
        match (&mut *conn).prepare(statement.as_str()).await {
            Ok(prepared) => {
                if let Some(columns) = statement_columns(&prepared) {
                    return Some(columns);
                }
            }
            Err(e) => debug!("Could not describe '{statement}': {e}"),
        }
    }
    None
}

fn statement_columns(statement: &sqlx::postgres::PgStatement<'_>) -> Option<Vec<String>> {
    let columns: Vec<String> = statement
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    (!columns.is_empty()).then_some(columns)
}

/// Splits multi-statement text into single statements. None when the text
/// holds a single statement or cannot be parsed.
fn split_statements(query: &str) -> Option<Vec<String>> {
    let statements = match Parser::parse_sql(&PostgreSqlDialect {}, query) {
        Ok(statements) => statements,
        Err(e) => {
            debug!("Could not split query: {e}");
            return None;
        }
    };
    (statements.len() > 1).then(|| statements.iter().map(ToString::to_string).collect())
}

/// Returns the inside of a bracketed IPv6 literal.
fn ipv6_literal(host: &str) -> Option<&str> {
    host.strip_prefix('[')?.strip_suffix(']')
}

fn column_names(row: &PgRow) -> Vec<String> {
    row.columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect()
}

/// For each column, the ordinal of the first column sharing its name.
fn first_ordinals(names: &[String]) -> Vec<usize> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| names[..i].iter().position(|n| n == name).unwrap_or(i))
        .collect()
}

/// Reads every cell through its text form, by name: a repeated name reads
/// the first column carrying it. NULL becomes "".
fn read_row(row: &PgRow, ordinals: &[usize]) -> Result<Row> {
    ordinals
        .iter()
        .map(|&ordinal| {
            row.try_get_unchecked::<Option<String>, _>(ordinal)
                .map(Option::unwrap_or_default)
                .map_err(|e| NotebookError::decode(e.to_string()))
        })
        .collect()
}

/// Maps errors raised while opening the connection.
fn map_connection_error(error: sqlx::Error) -> NotebookError {
    match error {
        sqlx::Error::Configuration(e) => NotebookError::config(e.to_string()),
        other => NotebookError::connection(format_driver_error(&other)),
    }
}

/// Maps errors raised while running the query or reading rows.
fn map_query_error(error: sqlx::Error) -> NotebookError {
    match error {
        sqlx::Error::Database(_) => NotebookError::query(format_driver_error(&error)),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            NotebookError::decode(error.to_string())
        }
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_) => {
            NotebookError::connection(error.to_string())
        }
        other => NotebookError::query(other.to_string()),
    }
}

/// Formats a driver error, keeping the server's detail and hint lines.
fn format_driver_error(error: &sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  Detail: ");
            result.push_str(detail);
        }
        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  Hint: ");
            result.push_str(hint);
        }
    }

    result
}
