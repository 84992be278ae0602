use anyhow::Result;
use clap::ValueEnum;
use tracing::info;

use crate::admin::AdminClient;
use crate::config::Config;
use crate::transfer::sync_databases;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    /// Local -> Remote
    Push,
    /// Remote -> Local
    Pull,
}

/// Copy all skills between the local and remote admin APIs.
pub async fn run(
    direction: Direction,
    remote_url: String,
    local_url: Option<String>,
    token: Option<String>,
    config_path: Option<String>,
) -> Result<()> {
    let config = Config::load_with_path(config_path)?;
    let token = config.admin.resolve_token(token);
    let timeout = config.admin.timeout_secs;
    let local = AdminClient::new(
        local_url.as_deref().unwrap_or(&config.admin.local_url),
        token.clone(),
        timeout,
    )?;
    let remote = AdminClient::new(&remote_url, token, timeout)?;

    let (from, to, label) = match direction {
        Direction::Push => (&local, &remote, "LOCAL ===> REMOTE"),
        Direction::Pull => (&remote, &local, "REMOTE ===> LOCAL"),
    };
    info!("SYNC {}: {} -> {}", label, from.base_url(), to.base_url());

    let report = sync_databases(
        from,
        to,
        config.admin.chunk_size,
        config.admin.sync_delay(),
    )
    .await?;

    println!(
        "Sync complete: {} transferred, {} errors ({} received by target).",
        report.imported, report.errors, report.received
    );
    Ok(())
}
