use crate::db::engine::{SchemaEngine, TransactionGuard};
use crate::db::schema::{ColumnDefinition, DataType, IndexDefinition, TableDefinition};
use crate::error::Result;
use crate::migration::Migration;
use tracing::info;

pub const MIGRATION_NAME: &str = "20210703131819-create-user-address";
pub const TABLE_NAME: &str = "UserAddresses";

/// Creates `UserAddresses` and its `(userId, address)` index, or drops them.
///
/// Holds only the definitions; the engine session is passed in per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaChangeStep {
    pub table: TableDefinition,
    pub index: IndexDefinition,
}

impl SchemaChangeStep {
    pub fn create_user_addresses() -> Self {
        let table = TableDefinition::new(
            TABLE_NAME,
            vec![
                ColumnDefinition::new("id", DataType::Integer)
                    .not_null()
                    .auto_increment()
                    .primary_key(),
                ColumnDefinition::new("address", DataType::String),
                // Nullable: an address row may exist without an owning user
                ColumnDefinition::new("userId", DataType::Integer).references("Users", "id"),
                ColumnDefinition::new("createdAt", DataType::Timestamp).not_null(),
                ColumnDefinition::new("updatedAt", DataType::Timestamp).not_null(),
                ColumnDefinition::new("deletedAt", DataType::Timestamp),
            ],
        );
        let index = IndexDefinition::new(TABLE_NAME, &["userId", "address"]);
        Self { table, index }
    }
}

impl Default for SchemaChangeStep {
    fn default() -> Self {
        Self::create_user_addresses()
    }
}

impl Migration for SchemaChangeStep {
    fn name(&self) -> &str {
        MIGRATION_NAME
    }

    fn apply(&self, engine: &dyn SchemaEngine) -> Result<()> {
        let tx = TransactionGuard::begin(engine)?;
        engine.create_table(&self.table)?;
        engine.create_index(&self.index)?;
        tx.commit()?;
        info!(
            "Created table {} with index {}",
            self.table.name,
            self.index.name()
        );
        Ok(())
    }

    fn revert(&self, engine: &dyn SchemaEngine) -> Result<()> {
        let tx = TransactionGuard::begin(engine)?;
        engine.drop_table(&self.table)?;
        tx.commit()?;
        info!("Dropped table {}", self.table.name);
        Ok(())
    }
}
