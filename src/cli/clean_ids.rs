use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::slug;
use crate::store;

/// Replace every record id with a unique slug derived from its name.
pub fn run(input: &str, output: &str) -> Result<()> {
    info!("Reading {}", input);
    let mut doc = store::read_document(Path::new(input))?;

    info!("Processing {} skills", doc.records.len());
    let (records, seen) = slug::apply_to_batch(std::mem::take(&mut doc.records));
    doc.records = records;

    let count = doc.records.len();
    info!("Saving {} cleaned skills to {}", count, output);
    store::write_document(Path::new(output), doc)?;

    println!("Cleaned {} skills into {}", count, output);
    println!("Unique slugs generated: {}", seen.len());
    Ok(())
}
