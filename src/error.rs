use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchemaError>;

/// The one error kind a schema change surfaces to its runner.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Migration task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Invalid schema definition: {0}")]
    InvalidDefinition(String),
}
