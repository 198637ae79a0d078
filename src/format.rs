//! Table rendering for notebook output.
//!
//! The host renders any payload starting with [`TABLE_MARKER`] as a table
//! widget: first line is the header, one line per row, tab-separated cells,
//! every line newline-terminated.

use crate::db::{ExecutionOutcome, RawResult};

/// Prefix telling the host to render the payload as a table.
pub const TABLE_MARKER: &str = "%table";

/// Renders column names and rows as tab-separated lines.
///
/// The header line is always present, even with zero rows.
pub fn format_table(raw: &RawResult) -> String {
    let mut out = raw.columns.join("\t");
    out.push('\n');

    for row in &raw.rows {
        out.push_str(&row.join("\t"));
        out.push('\n');
    }

    out
}

/// Renders an execution outcome as a marked table payload.
///
/// A statement without a result set renders as the bare marker plus a space.
pub fn render(outcome: &ExecutionOutcome) -> String {
    let body = outcome.result_set().map(format_table).unwrap_or_default();
    format!("{TABLE_MARKER} {body}")
}
