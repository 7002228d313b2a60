use crate::db::db_pool::DuckDBConnectionManager;
use crate::db::introspect::{self, SchemaSnapshot, TableLayout};
use crate::error::Result;
use crate::migration::{Direction, Migration};
use chrono::{DateTime, Utc};
use r2d2::Pool;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

pub type DbPool = Pool<DuckDBConnectionManager>;

/// Outcome of one successful run, printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub migration: String,
    pub direction: Direction,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Runs one direction of `migration` on a pooled connection.
///
/// The DuckDB work happens on the blocking pool; the caller waits for the
/// commit or rollback. Errors are returned as-is, nothing is retried.
pub async fn run(
    pool: DbPool,
    migration: Arc<dyn Migration>,
    direction: Direction,
) -> Result<MigrationReport> {
    let started_at = Utc::now();
    info!("Running migration {} ({})", migration.name(), direction);

    let name = migration.name().to_string();
    let result = tokio::task::spawn_blocking(move || -> Result<()> {
        let conn = pool.get()?;
        match direction {
            Direction::Up => migration.apply(&*conn),
            Direction::Down => migration.revert(&*conn),
        }
    })
    .await?;

    if let Err(e) = result {
        error!("Migration {} ({}) failed: {}", name, direction, e);
        return Err(e);
    }

    let finished_at = Utc::now();
    info!(
        "Migration {} ({}) finished in {} ms",
        name,
        direction,
        (finished_at - started_at).num_milliseconds()
    );

    Ok(MigrationReport {
        migration: name,
        direction,
        started_at,
        finished_at,
    })
}

/// What `status` prints: the migrated table, if present, and everything else
/// in the schema.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub table: Option<TableLayout>,
    pub schema: SchemaSnapshot,
}

/// Reads the current catalog entry for `table`.
pub async fn status(pool: DbPool, table: &str) -> Result<StatusReport> {
    let table = table.to_string();
    tokio::task::spawn_blocking(move || -> Result<StatusReport> {
        let conn = pool.get()?;
        Ok(StatusReport {
            table: introspect::describe_table(&conn, &table)?,
            schema: introspect::snapshot(&conn)?,
        })
    })
    .await?
}
