use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::sqlgen::batch_statements;
use crate::store;

/// Write `INSERT OR REPLACE` batches for a document's records to a SQL file.
pub fn run(file: &str, table: &str, batch_size: usize, output: &str) -> Result<()> {
    let doc = store::read_document(Path::new(file))?;
    let statements = batch_statements(table, &doc.records, batch_size)?;

    if statements.is_empty() {
        println!("No data to export.");
        return Ok(());
    }

    info!(
        "{}: {} rows in {} batches",
        table,
        doc.records.len(),
        statements.len()
    );
    fs::write(output, statements.join("\n\n"))
        .with_context(|| format!("failed to write {}", output))?;
    println!("Wrote {} statements to {}", statements.len(), output);
    Ok(())
}
