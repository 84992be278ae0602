use anyhow::Result;
use tracing::info;

use crate::admin::AdminClient;
use crate::config::Config;
use crate::directory::DirectoryClient;
use crate::transfer::bulk_import;

/// Page through the plugin directory and import each page as it arrives.
pub async fn run(
    api_url: Option<String>,
    token: Option<String>,
    max_records: Option<usize>,
    config_path: Option<String>,
) -> Result<()> {
    let config = Config::load_with_path(config_path)?;
    let source = DirectoryClient::new(&config.directory)?;
    let api_url = api_url.unwrap_or_else(|| config.admin.local_url.clone());
    let sink = AdminClient::new(
        &api_url,
        config.admin.resolve_token(token),
        config.admin.timeout_secs,
    )?;
    let max_records = max_records.unwrap_or(config.directory.max_records);

    info!(
        "Starting bulk import from {} into {}",
        config.directory.base_url,
        sink.base_url()
    );
    let report = bulk_import(
        &source,
        &sink,
        config.directory.page_size,
        max_records,
        config.directory.bulk_delay(),
    )
    .await?;

    println!("\n--- Final Report ---");
    println!("Total Imported: {}", report.imported);
    println!("Total Errors: {}", report.errors);
    println!("Total Received: {}", report.received);
    println!("Bulk import complete!");
    Ok(())
}
