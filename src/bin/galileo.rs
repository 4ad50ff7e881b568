//! Galileo server and maintenance commands
//!
//! # Usage
//!
//! ```bash
//! # Serve the questions page (reseeds first unless GALILEO_SEED_ON_STARTUP=false)
//! galileo serve
//!
//! # Reload the reference collections from the fixtures directory
//! galileo seed
//!
//! # Run the visualization script once from the command line
//! galileo visualize age bmi
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use galileo::api::{create_router, AppState};
use galileo::database::{DatabaseConfig, DatabaseManager, DocumentStore, InMemoryDocumentStore};
use galileo::{GalileoConfig, SeedLoader, SeedReport, VisualizationTrigger};

#[derive(Parser)]
#[command(name = "galileo")]
#[command(version)]
#[command(about = "Galileo survey visualization server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the questions page and visualization API (default)
    Serve {
        /// Keep documents in memory instead of Postgres
        #[arg(long)]
        memory: bool,
    },

    /// Clear and reload the reference collections from the fixture files
    Seed {
        /// Keep documents in memory instead of Postgres
        #[arg(long)]
        memory: bool,
    },

    /// Run the visualization script once and print the result
    Visualize { variable1: String, variable2: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "galileo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = GalileoConfig::from_env().context("invalid configuration")?;

    match cli.command.unwrap_or(Commands::Serve { memory: false }) {
        Commands::Serve { memory } => serve(config, memory).await,
        Commands::Seed { memory } => seed(config, memory).await,
        Commands::Visualize {
            variable1,
            variable2,
        } => visualize(config, &variable1, &variable2).await,
    }
}

async fn open_store(config: &GalileoConfig, memory: bool) -> anyhow::Result<Arc<dyn DocumentStore>> {
    if memory {
        tracing::info!("Using in-memory document store");
        return Ok(Arc::new(InMemoryDocumentStore::new()));
    }

    let manager = DatabaseManager::new(DatabaseConfig::from_config(config))
        .await
        .context("database connection failed; check DATABASE_URL")?;
    let store = manager
        .document_store()
        .await
        .context("failed to prepare document table")?;
    Ok(Arc::new(store))
}

fn log_report(report: &SeedReport) {
    for load in &report.collections {
        match &load.error {
            None => tracing::info!("  {:<18} {} documents", load.collection, load.inserted),
            Some(e) => tracing::warn!("  {:<18} FAILED: {}", load.collection, e),
        }
    }
}

async fn serve(config: GalileoConfig, memory: bool) -> anyhow::Result<()> {
    tracing::info!("Starting Galileo server");

    let store = open_store(&config, memory).await?;
    if config.seed_on_startup {
        let loader = SeedLoader::new(store, &config.fixtures_dir);
        let report = loader.reload().await;
        log_report(&report);
    } else {
        tracing::info!("Startup seeding disabled (GALILEO_SEED_ON_STARTUP=false)");
    }

    let trigger = Arc::new(
        VisualizationTrigger::with_process_runner(config.visualization.clone())
            .context("cannot determine working directory")?,
    );

    let output_dir = match trigger.locate_script() {
        Ok(script) => {
            tracing::info!("Serving visualization output from {}", script.working_dir.display());
            Some(script.working_dir)
        }
        Err(e) => {
            tracing::warn!("{}; visualization output will not be served", e);
            None
        }
    };

    let state = AppState::new(trigger, config.redirect_delay_ms)
        .context("failed to load page templates")?;
    let app = create_router(state, output_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Port {} is already in use. Set SERVER_PORT to use another port",
                    config.port
                );
            }
            return Err(e).context(format!("failed to bind to {}", addr));
        }
    };

    tracing::info!("Galileo running on http://{}", addr);
    tracing::info!("  /galileo/questions         - questions page");
    tracing::info!("  /api/visualization         - run visualization (POST)");
    tracing::info!("  /api/visualization/status  - output readiness");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn seed(config: GalileoConfig, memory: bool) -> anyhow::Result<()> {
    let store = open_store(&config, memory).await?;
    let loader = SeedLoader::new(store, &config.fixtures_dir);
    loader.check_fixtures_dir()?;

    let report = loader.reload().await;
    log_report(&report);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.all_succeeded() {
        bail!("one or more collections failed to load");
    }
    Ok(())
}

async fn visualize(config: GalileoConfig, variable1: &str, variable2: &str) -> anyhow::Result<()> {
    let trigger = VisualizationTrigger::with_process_runner(config.visualization)
        .context("cannot determine working directory")?;
    let outcome = trigger.generate(variable1, variable2).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
