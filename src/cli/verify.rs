use anyhow::{bail, Result};
use std::path::Path;
use tracing::info;

use crate::store;
use crate::verify::verify;

/// Check a cleaned file for duplicate or missing ids.
pub fn run(path: &str, pattern: &str) -> Result<()> {
    info!("Checking {}", path);
    let doc = store::read_document(Path::new(path))?;
    let report = verify(&doc.records, pattern);
    report.print();

    if !report.duplicates.is_empty() {
        bail!("{} duplicate id(s) found", report.duplicates.len());
    }
    Ok(())
}
