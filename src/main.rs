use clap::Parser;
use r2d2::Pool;
use std::sync::Arc;
use tracing::{error, info};

mod config;
mod db;
mod error;
mod migration;
mod util;

use crate::config::{AppConfig, CliArgs, Command};
use crate::db::db_pool::DuckDBConnectionManager;
use crate::migration::create_user_addresses::{SchemaChangeStep, TABLE_NAME};
use crate::migration::{Direction, Migration, runner};
use crate::util::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args = CliArgs::parse();

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(args.log_json);
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    init_tracing(config.logging.json);

    info!(
        "Opening DuckDB connection pool on {} (max {} connections)",
        config.database.connection_string, config.database.pool_size
    );
    let db_manager = DuckDBConnectionManager::new(&config.database.connection_string)?;
    let pool = Pool::builder()
        .max_size(config.database.pool_size)
        .build(db_manager)?;

    let step: Arc<dyn Migration> = Arc::new(SchemaChangeStep::create_user_addresses());

    match args.command {
        Command::Up | Command::Down => {
            let direction = if args.command == Command::Up {
                Direction::Up
            } else {
                Direction::Down
            };
            let report = runner::run(pool, step, direction).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Status => {
            let report = runner::status(pool, TABLE_NAME).await?;
            if report.table.is_none() {
                info!("Table {} does not exist", TABLE_NAME);
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
