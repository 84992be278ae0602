use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use skillsync::cli;
use skillsync::cli::sync::Direction;
use skillsync::sqlgen::DEFAULT_BATCH_SIZE;

#[derive(Parser)]
#[command(name = "skillsync", version)]
#[command(about = "Scrape, clean and sync skill directory records", long_about = None)]
struct Cli {
    /// Path to config file (defaults to ./skillsync.toml or ~/.config/skillsync/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every plugin from the public directory into a JSON file
    Extract {
        #[arg(short = 'o', long, default_value = "claude-plugins.json")]
        output: String,
    },

    /// Replace record ids with unique slugs derived from their names
    CleanIds {
        #[arg(short = 'i', long, default_value = "claude-plugins.json")]
        input: String,

        #[arg(short = 'o', long, default_value = "claude-plugins-clean.json")]
        output: String,
    },

    /// Check a cleaned file for duplicate ids
    Verify {
        #[arg(default_value = "claude-plugins-clean.json")]
        path: String,

        /// Show ids containing this text
        #[arg(long, default_value = "code-review")]
        pattern: String,
    },

    /// Import a JSON file into the admin API in chunks
    Import {
        file: String,

        /// Value stored as each record's import_source
        #[arg(long = "source", default_value = "manual")]
        import_source: String,

        #[arg(long, default_value = "global")]
        platform: String,

        /// Records per request (default: from config)
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Admin API base URL (default: admin.local_url from config)
        #[arg(long)]
        api_url: Option<String>,

        /// Admin token (default: $RALPHY_ADMIN_TOKEN)
        #[arg(long)]
        token: Option<String>,
    },

    /// Stream the public directory straight into the admin API
    Bulk {
        #[arg(long)]
        api_url: Option<String>,

        #[arg(long)]
        token: Option<String>,

        /// Stop once this many records have been requested
        #[arg(long)]
        max_records: Option<usize>,
    },

    /// Copy all skills between the local and a remote admin API
    Sync {
        #[arg(value_enum)]
        direction: Direction,

        /// Remote API URL (e.g. https://api.worker.dev)
        #[arg(long)]
        remote_url: String,

        /// Local API URL (default: admin.local_url from config)
        #[arg(long)]
        local_url: Option<String>,

        /// Admin token, used for both sides
        #[arg(long)]
        token: Option<String>,
    },

    /// Write INSERT OR REPLACE batches for a JSON file's records
    ExportSql {
        file: String,

        #[arg(long, default_value = "skills")]
        table: String,

        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        #[arg(short = 'o', long, default_value = "sync.sql")]
        output: String,
    },

    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { output } => {
            cli::extract::run(output, cli.config).await?;
        }
        Commands::CleanIds { input, output } => {
            cli::clean_ids::run(&input, &output)?;
        }
        Commands::Verify { path, pattern } => {
            cli::verify::run(&path, &pattern)?;
        }
        Commands::Import {
            file,
            import_source,
            platform,
            chunk_size,
            api_url,
            token,
        } => {
            cli::import::run(
                file,
                import_source,
                platform,
                chunk_size,
                api_url,
                token,
                cli.config,
            )
            .await?;
        }
        Commands::Bulk {
            api_url,
            token,
            max_records,
        } => {
            cli::bulk::run(api_url, token, max_records, cli.config).await?;
        }
        Commands::Sync {
            direction,
            remote_url,
            local_url,
            token,
        } => {
            cli::sync::run(direction, remote_url, local_url, token, cli.config).await?;
        }
        Commands::ExportSql {
            file,
            table,
            batch_size,
            output,
        } => {
            cli::export_sql::run(&file, &table, batch_size, &output)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "skillsync", &mut std::io::stdout());
        }
    }

    Ok(())
}
