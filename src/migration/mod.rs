pub mod create_user_addresses;
pub mod runner;

use crate::db::engine::SchemaEngine;
use crate::error::Result;
use serde::Serialize;

/// A reversible schema change a runner can drive.
pub trait Migration: Send + Sync {
    fn name(&self) -> &str;

    /// Forward direction. All-or-nothing.
    fn apply(&self, engine: &dyn SchemaEngine) -> Result<()>;

    fn revert(&self, engine: &dyn SchemaEngine) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}
