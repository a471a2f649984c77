use anyhow::{Context, Result};
use catalog_service::prelude::*;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args)]
pub struct ServeArgs {
    /// Configuration file (missing files fall back to defaults)
    #[arg(short, long, value_name = "PATH", default_value = "config.toml")]
    pub config: PathBuf,

    /// Port to listen on, overriding configuration
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Load the demo catalog before serving
    #[arg(long)]
    pub seed: bool,
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    let mut config = Config::load_from(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    if let Some(port) = args.port {
        config.service.port = port;
    }
    if args.seed {
        config.seed_demo_data = true;
    }

    init_tracing(&config)?;

    match config.database.clone() {
        #[cfg(feature = "database")]
        Some(database) => {
            let store = PgStore::connect(&database)
                .await
                .context("Failed to connect to the database")?;
            if database.run_migrations {
                store.migrate().await.context("Failed to run migrations")?;
            }
            run(config, store).await
        }
        #[cfg(not(feature = "database"))]
        Some(_) => {
            println!(
                "{} database configured but this binary was built without the `database` feature, using in-memory storage",
                "Warning:".yellow().bold()
            );
            run(config, MemoryStore::new()).await
        }
        None => {
            tracing::info!("No database configured, using in-memory storage");
            run(config, MemoryStore::new()).await
        }
    }
}

async fn run<S>(config: Config, store: S) -> Result<()>
where
    S: CatalogStore,
{
    let state = AppState::new(config.clone(), store)?;

    if config.seed_demo_data {
        let summary = seed_demo_data(state.store(), state.passwords())
            .await
            .context("Failed to seed demo data")?;
        if summary.books > 0 {
            println!(
                "{} {} books, {} authors, {} categories, {} publishers",
                "Seeded".green().bold(),
                summary.books,
                summary.authors,
                summary.categories,
                summary.publishers
            );
        }
    }

    Server::new(config).serve(app(state)).await?;
    Ok(())
}
