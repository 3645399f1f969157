//! localfeed: content collection daemon for local-business dashboards

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use localfeed::config::{Config, LogFormat, LogLevel};
use localfeed::pipeline::{
    BatchCollector, CollectOutcome, CollectPipeline, CollectRequest, SyncGate,
};
use localfeed::server::{AppState, HttpServer};
use localfeed::services;
use localfeed::types::CollectionMode;

#[derive(Parser)]
#[command(name = "localfeed")]
#[command(about = "Content collection daemon for local-business dashboards")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Listen address override
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Collect a single URL
    Collect {
        /// The URL to ingest (Markdown-wrapped input is accepted)
        url: String,

        /// Keyword steering the extraction prompt
        #[arg(short, long)]
        keyword: Option<String>,

        /// Group label for the resulting rows
        #[arg(short, long)]
        group: Option<String>,

        /// Collection mode tag
        #[arg(short, long, value_enum)]
        mode: Option<CliMode>,

        /// Target store whose live news should sync
        #[arg(short, long)]
        store: Option<String>,
    },

    /// Search a keyword and collect every resulting URL
    Batch {
        /// The search keyword
        keyword: String,

        /// Group label for the resulting rows
        #[arg(long)]
        group: Option<String>,

        /// Target store whose live news should sync
        #[arg(long)]
        store: Option<String>,
    },

    /// Write a default configuration file
    Init,
}

/// CLI collection mode (mirrors CollectionMode with clap support)
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliMode {
    /// Broad keyword net-search collection
    Net,
    /// Targeted single-store collection
    Store,
    /// Single-URL precision ingestion
    Sniper,
}

impl From<CliMode> for CollectionMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Net => CollectionMode::Net,
            CliMode::Store => CollectionMode::Store,
            CliMode::Sniper => CollectionMode::Sniper,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    setup_logging(&config, cli.verbose)?;

    match cli.command {
        Commands::Serve { listen } => serve(config, listen).await,
        Commands::Collect {
            url,
            keyword,
            group,
            mode,
            store,
        } => {
            collect_one(
                config,
                CollectRequest {
                    url,
                    keyword,
                    group_name: group,
                    collection_mode: mode.map(Into::into),
                    store_id: store,
                },
            )
            .await
        }
        Commands::Batch {
            keyword,
            group,
            store,
        } => batch(config, keyword, group, store).await,
        Commands::Init => init_config(&cli.config),
    }
}

fn setup_logging(config: &Config, verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => match config.logging.level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        },
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false);

    match config.logging.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

/// Wire up the service clients and pipeline from configuration.
fn build_components(config: &Config) -> Result<(Arc<CollectPipeline>, Arc<BatchCollector>, AppState)> {
    let (scrape, genai, store) = services::build_clients(&config.services)?;
    let sync_gate = Arc::new(SyncGate::new());

    let pipeline = Arc::new(CollectPipeline::new(
        config.pipeline.clone(),
        config.services.genai.model_candidates.clone(),
        Arc::clone(&scrape),
        genai,
        Arc::clone(&store),
        sync_gate,
    ));

    let batch = Arc::new(BatchCollector::new(
        Arc::clone(&pipeline),
        scrape,
        config.batch.clone(),
    ));

    let state = AppState {
        pipeline: Arc::clone(&pipeline),
        batch: Arc::clone(&batch),
        store,
    };

    Ok((pipeline, batch, state))
}

async fn serve(mut config: Config, listen: Option<String>) -> Result<()> {
    if let Some(listen) = listen {
        config.http.listen_addr = listen;
    }

    let (_, _, state) = build_components(&config)?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(());
        }
    });

    HttpServer::new(config.http.clone(), state).run(shutdown_rx).await
}

async fn collect_one(config: Config, request: CollectRequest) -> Result<()> {
    let (pipeline, _, _) = build_components(&config)?;

    match pipeline.collect(&request).await? {
        CollectOutcome::Inserted { count, items } => {
            println!("Inserted {} row(s)", count);
            for item in &items {
                println!("  {} [{}]", item.title, item.category);
                println!("    {}", item.content);
                match &item.image_url {
                    Some(url) => println!("    image: {}", url),
                    None => println!("    image: none"),
                }
            }
        }
        CollectOutcome::Duplicate => println!("Already collected, skipped"),
        CollectOutcome::NoContent => println!("No usable content found"),
    }
    Ok(())
}

async fn batch(
    config: Config,
    keyword: String,
    group: Option<String>,
    store: Option<String>,
) -> Result<()> {
    let (_, batch, _) = build_components(&config)?;

    let mode = if store.is_some() {
        CollectionMode::Store
    } else {
        CollectionMode::Net
    };

    let report = batch.run(&keyword, mode, group, store).await?;

    println!("\nBatch Summary");
    println!("=============");
    println!("URLs attempted:   {}", report.attempted);
    println!("Rows inserted:    {}", report.inserted);
    println!("Duplicates:       {}", report.duplicates);
    println!("Empty pages:      {}", report.empty);
    println!("Failures:         {}", report.failures.len());
    for failure in &report.failures {
        println!("  {} -> {}", failure.url, failure.error);
    }
    Ok(())
}

fn init_config(path: &PathBuf) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Config file already exists: {}", path.display());
    }
    let rendered = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, rendered)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
