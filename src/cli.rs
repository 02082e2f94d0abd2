//! CLI interface for salary-predictor

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{self, Config};
use crate::currency::format_amount;
use crate::error::ServiceError;
use crate::service::SalaryService;
use crate::store::SqliteObservationStore;

#[derive(Parser)]
#[command(name = "salary-predictor")]
#[command(about = "Salary prediction service backed by linear regression", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "SALARY_PREDICTOR_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the config file)
    #[arg(long, global = true, env = "SALARY_PREDICTOR_DB")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server (default when no command given)
    Serve {
        /// Host to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to bind
        #[arg(short, long)]
        port: Option<u16>,
        /// Load the default observations if the database is empty
        #[arg(long)]
        seed: bool,
    },
    /// Show dataset statistics
    Stats,
    /// List observations ordered by years
    List,
    /// Replace all observations with the default dataset
    Reset,
    /// Delete every observation
    DeleteAll,
    /// Predict a salary from the stored observations
    Predict {
        /// Years of experience
        #[arg(short, long)]
        years: f64,
        /// Job level
        #[arg(short, long)]
        level: i64,
    },
    /// Show the effective configuration
    Config,
}

/// Parse arguments, set up logging and dispatch
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::config_path()?,
    };
    let mut config = Config::load_from(&config_path)?;
    if let Some(db) = cli.database {
        config.storage.database_path = db;
    }

    init_logging(&config.logging.level);

    match cli.command.unwrap_or(Commands::Serve { host: None, port: None, seed: false }) {
        Commands::Serve { host, port, seed } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.storage.seed_on_empty |= seed;
            crate::server::start(&config).await?;
        }
        Commands::Stats => {
            let service = open_service(&config).await?;
            let stats = service.stats().await?;
            let symbol = &config.display.currency_symbol;
            println!("Data points:      {}", stats.data_points);
            println!("Average salary:   {}", format_amount(symbol, stats.average_salary));
            println!("Avg experience:   {:.2} years", stats.avg_experience);
        }
        Commands::List => {
            let service = open_service(&config).await?;
            let rows = service.observations().await?;
            if rows.is_empty() {
                println!("No observations stored.");
            }
            for row in rows {
                println!("#{:<5} {}", row.id, row);
            }
        }
        Commands::Reset => {
            let service = open_service(&config).await?;
            service.reset().await?;
            println!("Defaults loaded ({} observations).", service.stats().await?.data_points);
        }
        Commands::DeleteAll => {
            let service = open_service(&config).await?;
            let count = service.delete_all().await?;
            println!("Deleted all {} data points.", count);
        }
        Commands::Predict { years, level } => {
            let service = open_service(&config).await?;
            service.retrain().await?;
            match service.predict(years, level).await {
                Ok(prediction) => {
                    let symbol = &config.display.currency_symbol;
                    println!("Yearly:  {}", format_amount(symbol, prediction.yearly));
                    println!("Monthly: {}", format_amount(symbol, prediction.monthly));
                }
                Err(ServiceError::ModelNotTrained) => {
                    println!("{}", crate::server::http::NO_DATA_MESSAGE);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Config => {
            config::show_config(&config, &config_path)?;
        }
    }

    Ok(())
}

async fn open_service(config: &Config) -> Result<SalaryService> {
    let store = SqliteObservationStore::new(&config.storage.database_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open database {}",
                config.storage.database_path.display()
            )
        })?;
    Ok(SalaryService::new(store))
}

/// Install the tracing subscriber; RUST_LOG takes precedence over `level`
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
