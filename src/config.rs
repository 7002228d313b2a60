use clap::{Parser, Subcommand};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub connection_string: String,
    pub pool_size: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Apply or revert the UserAddresses schema migration", long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// DuckDB database file, or :memory:
    #[arg(short, long)]
    pub database: Option<String>,

    /// Maximum pooled connections
    #[arg(long)]
    pub pool_size: Option<u32>,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Create the UserAddresses table and its index
    Up,
    /// Drop the UserAddresses table
    Down,
    /// Show the current UserAddresses layout
    Status,
}

impl AppConfig {
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();
        let mut config_builder = Config::builder()
            .set_default("database.connection_string", defaults.database.connection_string)?
            .set_default("database.pool_size", i64::from(defaults.database.pool_size))?
            .set_default("logging.json", defaults.logging.json)?;

        if let Some(config_path) = &args.config {
            config_builder = config_builder.add_source(File::from(config_path.as_path()));
        } else {
            let default_locations = [
                "config.toml",
                "config/config.toml",
                "/etc/user-addresses-migrate/config.toml",
            ];

            for location in default_locations {
                if Path::new(location).exists() {
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        // MIGRATE_DATABASE__CONNECTION_STRING=... and friends
        config_builder = config_builder.add_source(
            Environment::with_prefix("MIGRATE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: AppConfig = config_builder.build()?.try_deserialize()?;

        if let Some(database) = &args.database {
            config.database.connection_string = database.clone();
        }
        if let Some(pool_size) = args.pool_size {
            config.database.pool_size = pool_size;
        }
        if args.log_json {
            config.logging.json = true;
        }

        if config.database.pool_size == 0 {
            return Err(ConfigError::Message(
                "database.pool_size must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                connection_string: "app.duckdb".to_string(),
                pool_size: 2,
            },
            logging: LoggingConfig { json: false },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["user-addresses-migrate"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn parses_subcommands() {
        assert_eq!(args(&["up"]).command, Command::Up);
        assert_eq!(args(&["down"]).command, Command::Down);
        assert_eq!(args(&["status"]).command, Command::Status);
        assert!(CliArgs::try_parse_from(["user-addresses-migrate"]).is_err());
    }

    #[test]
    fn file_values_are_overridden_by_flags() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[database]\nconnection_string = \"from-file.duckdb\"\npool_size = 4\n\n[logging]\njson = false"
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = AppConfig::new(&args(&["--config", &path, "status"])).unwrap();
        assert_eq!(config.database.connection_string, "from-file.duckdb");
        assert_eq!(config.database.pool_size, 4);

        let config = AppConfig::new(&args(&[
            "--config",
            &path,
            "--database",
            ":memory:",
            "--pool-size",
            "1",
            "--log-json",
            "up",
        ]))
        .unwrap();
        assert_eq!(config.database.connection_string, ":memory:");
        assert_eq!(config.database.pool_size, 1);
        assert!(config.logging.json);
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[database]\nconnection_string = \"x.duckdb\"\npool_size = 0").unwrap();
        let path = file.path().to_string_lossy().to_string();

        assert!(AppConfig::new(&args(&["--config", &path, "up"])).is_err());
    }
}
