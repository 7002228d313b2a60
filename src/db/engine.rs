use crate::db::schema::{IndexDefinition, TableDefinition};
use crate::error::Result;
use duckdb::Connection;
use tracing::{debug, warn};

/// The capability set a schema change needs from a relational engine.
pub trait SchemaEngine {
    fn create_table(&self, table: &TableDefinition) -> Result<()>;
    fn create_index(&self, index: &IndexDefinition) -> Result<()>;
    fn drop_table(&self, table: &TableDefinition) -> Result<()>;

    fn begin(&self) -> Result<()>;
    fn commit(&self) -> Result<()>;
    fn rollback(&self) -> Result<()>;
}

impl SchemaEngine for Connection {
    fn create_table(&self, table: &TableDefinition) -> Result<()> {
        table.validate()?;
        for sql in table.to_create_sequences_sql() {
            debug!("{}", sql);
            self.execute_batch(&sql)?;
        }
        let sql = table.to_create_table_sql();
        debug!("{}", sql);
        self.execute_batch(&sql)?;
        Ok(())
    }

    fn create_index(&self, index: &IndexDefinition) -> Result<()> {
        let sql = index.to_create_index_sql()?;
        debug!("{}", sql);
        self.execute_batch(&sql)?;
        Ok(())
    }

    fn drop_table(&self, table: &TableDefinition) -> Result<()> {
        for sql in table.to_drop_sql() {
            debug!("{}", sql);
            self.execute_batch(&sql)?;
        }
        Ok(())
    }

    fn begin(&self) -> Result<()> {
        self.execute_batch("BEGIN TRANSACTION;")?;
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.execute_batch("COMMIT;")?;
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.execute_batch("ROLLBACK;")?;
        Ok(())
    }
}

/// An open transaction on `engine`. Rolled back on drop unless
/// [`TransactionGuard::commit`] was reached.
pub struct TransactionGuard<'a, E: SchemaEngine + ?Sized> {
    engine: &'a E,
    armed: bool,
}

impl<'a, E: SchemaEngine + ?Sized> TransactionGuard<'a, E> {
    pub fn begin(engine: &'a E) -> Result<Self> {
        engine.begin()?;
        Ok(Self { engine, armed: true })
    }

    /// On a failed commit the guard stays armed and the drop rolls back.
    pub fn commit(mut self) -> Result<()> {
        self.engine.commit()?;
        self.armed = false;
        Ok(())
    }
}

impl<E: SchemaEngine + ?Sized> Drop for TransactionGuard<'_, E> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!("Rolling back schema transaction");
        if let Err(e) = self.engine.rollback() {
            // DuckDB discards a transaction whose commit failed
            warn!("Rollback failed: {}", e);
        }
    }
}
