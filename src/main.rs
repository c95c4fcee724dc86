use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use execdash::config::{DashboardConfig, LogFormat, LoggingConfig};
use execdash::history::{self, PageRequest, PageResult};
use execdash::upstream::UpstreamClient;

#[derive(Parser)]
#[command(
    name = "execdash",
    about = "Dashboard backend for a remote code-execution API",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file (default: $EXECDASH_CONFIG, then /etc/execdash/execdash.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard server
    Serve {
        /// Bind address (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Fetch one page of execution history from the upstream
    History {
        #[arg(long, default_value_t = history::DEFAULT_PAGE, allow_negative_numbers = true)]
        page: i64,

        /// Page size, clamped to 1..=50
        #[arg(long, default_value_t = history::DEFAULT_LIMIT, allow_negative_numbers = true)]
        limit: i64,

        /// Record field to sort on
        #[arg(long, default_value = history::DEFAULT_SORT_FIELD)]
        sort_by: String,

        /// asc or desc
        #[arg(long, default_value = history::DEFAULT_ORDER)]
        order: String,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let resolved = DashboardConfig::resolve(cli.config.as_deref())?;
    init_tracing(&resolved.config.logging);
    resolved.log_summary();
    let mut config = resolved.config;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            tracing::info!(bind = %config.server.bind, "Starting execdash");
            execdash::serve(config).await?;
        }
        Commands::History {
            page,
            limit,
            sort_by,
            order,
            json,
        } => {
            let client = UpstreamClient::new(&config.upstream)?;
            let request = PageRequest {
                page,
                limit,
                sort_by,
                order,
            };
            let records = client.fetch_history().await?;
            let result = history::assemble(records, &request);

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_page(&result);
            }
        }
    }

    Ok(())
}

fn print_page(result: &PageResult) {
    let sort = result
        .sort
        .as_ref()
        .map(|s| format!("{} {}", s.field, s.order))
        .unwrap_or_default();

    println!(
        "\nExecution history -- page {} of {} ({} records, sorted by {})",
        result.page, result.pages, result.total, sort
    );
    if result.items.is_empty() {
        println!("No executions on this page.");
        return;
    }
    println!("{:-<72}", "");
    for record in &result.items {
        println!("{}", serde_json::Value::Object(record.clone()));
    }
    println!();
}
