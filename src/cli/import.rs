use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::admin::AdminClient;
use crate::config::Config;
use crate::store;
use crate::transfer::{push_in_chunks, Provenance};

/// Push a JSON document's records into the admin import API.
pub async fn run(
    file: String,
    import_source: String,
    platform: String,
    chunk_size: Option<usize>,
    api_url: Option<String>,
    token: Option<String>,
    config_path: Option<String>,
) -> Result<()> {
    let config = Config::load_with_path(config_path)?;
    let doc = store::read_document(Path::new(&file))?;

    let chunk_size = chunk_size.unwrap_or(config.admin.chunk_size);
    let api_url = api_url.unwrap_or_else(|| config.admin.local_url.clone());
    let client = AdminClient::new(
        &api_url,
        config.admin.resolve_token(token),
        config.admin.timeout_secs,
    )?;

    info!(
        "Loaded {} skills from {}, importing to {} in chunks of {}",
        doc.records.len(),
        file,
        client.base_url(),
        chunk_size
    );

    let report = push_in_chunks(
        &client,
        &doc.records,
        chunk_size,
        Provenance {
            import_source: &import_source,
            platform: &platform,
        },
        config.admin.delay(),
    )
    .await?;

    println!(
        "Import result for {}: {} imported, {} errors ({} of {} received by the API).",
        import_source,
        report.imported,
        report.errors,
        report.received,
        doc.records.len()
    );
    Ok(())
}
