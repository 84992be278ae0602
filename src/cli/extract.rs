use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::directory::{extract_all, DirectoryClient};
use crate::store;

/// Download the whole plugin directory into a JSON list on disk.
pub async fn run(output: String, config_path: Option<String>) -> Result<()> {
    let config = Config::load_with_path(config_path)?;
    let client = DirectoryClient::new(&config.directory)?;

    info!("Starting full extraction from {}", config.directory.base_url);
    let records = extract_all(
        &client,
        config.directory.page_size,
        config.directory.delay(),
    )
    .await?;

    if records.is_empty() {
        println!("No data extracted.");
        return Ok(());
    }

    let count = records.len();
    store::write_records(Path::new(&output), records)?;
    println!("Successfully saved {} items to {}", count, output);
    Ok(())
}
