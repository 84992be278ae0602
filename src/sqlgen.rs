//! `INSERT OR REPLACE` batch generation for copying table rows between
//! SQLite databases.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::record::Record;

/// Rows per statement. Larger batches trip SQLite's statement size limit
/// on the hosted database.
pub const DEFAULT_BATCH_SIZE: usize = 50;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static identifier regex"));

fn check_identifier(kind: &str, name: &str) -> Result<()> {
    if !IDENTIFIER.is_match(name) {
        bail!("Invalid {} name for SQL: {:?}", kind, name);
    }
    Ok(())
}

/// Render one JSON value as a SQL literal.
pub fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        nested => quote(&nested.to_string()),
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Build a single statement covering `rows`. Columns come from the first
/// row; other rows missing a column get `NULL`. Returns `None` for no rows.
pub fn insert_statement(table: &str, rows: &[Record]) -> Result<Option<String>> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };
    check_identifier("table", table)?;
    let columns: Vec<&str> = first.keys().map(String::as_str).collect();
    if columns.is_empty() {
        bail!("Cannot build INSERT for {}: first row has no columns", table);
    }
    for column in &columns {
        check_identifier("column", column)?;
    }

    let values: Vec<String> = rows
        .iter()
        .map(|row| {
            let cells: Vec<String> = columns
                .iter()
                .map(|c| row.get(*c).map(sql_literal).unwrap_or_else(|| "NULL".into()))
                .collect();
            format!("({})", cells.join(", "))
        })
        .collect();

    Ok(Some(format!(
        "INSERT OR REPLACE INTO {} ({}) VALUES {};",
        table,
        columns.join(", "),
        values.join(", ")
    )))
}

/// One statement per `batch_size` rows.
pub fn batch_statements(table: &str, rows: &[Record], batch_size: usize) -> Result<Vec<String>> {
    if batch_size == 0 {
        bail!("batch size must be at least 1");
    }
    let mut statements = Vec::new();
    for chunk in rows.chunks(batch_size) {
        if let Some(sql) = insert_statement(table, chunk)? {
            statements.push(sql);
        }
    }
    Ok(statements)
}
