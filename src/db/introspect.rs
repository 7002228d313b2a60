use crate::error::Result;
use duckdb::{Connection, params};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
    pub name: String,
    pub sql: Option<String>,
}

/// What the catalog says about one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableLayout {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub indexes: Vec<IndexInfo>,
}

/// Names of every user object in the `main` schema, sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaSnapshot {
    pub tables: Vec<String>,
    pub indexes: Vec<String>,
    pub sequences: Vec<String>,
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM duckdb_tables() WHERE schema_name = 'main' AND table_name = ?",
        params![table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn describe_table(conn: &Connection, table: &str) -> Result<Option<TableLayout>> {
    if !table_exists(conn, table)? {
        debug!("Table {} not found", table);
        return Ok(None);
    }

    let mut stmt = conn.prepare(
        "SELECT column_name, data_type, is_nullable FROM duckdb_columns() \
         WHERE schema_name = 'main' AND table_name = ? ORDER BY column_index",
    )?;
    let columns = stmt
        .query_map(params![table], |row| {
            Ok(ColumnInfo {
                name: row.get(0)?,
                data_type: row.get(1)?,
                nullable: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT index_name, sql FROM duckdb_indexes() \
         WHERE schema_name = 'main' AND table_name = ? ORDER BY index_name",
    )?;
    let indexes = stmt
        .query_map(params![table], |row| {
            Ok(IndexInfo {
                name: row.get(0)?,
                sql: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    debug!(
        "Table {} has {} columns and {} indexes",
        table,
        columns.len(),
        indexes.len()
    );

    Ok(Some(TableLayout {
        name: table.to_string(),
        columns,
        indexes,
    }))
}

pub fn snapshot(conn: &Connection) -> Result<SchemaSnapshot> {
    Ok(SchemaSnapshot {
        tables: names(
            conn,
            "SELECT table_name FROM duckdb_tables() WHERE schema_name = 'main' ORDER BY 1",
        )?,
        indexes: names(
            conn,
            "SELECT index_name FROM duckdb_indexes() WHERE schema_name = 'main' ORDER BY 1",
        )?,
        sequences: names(
            conn,
            "SELECT sequence_name FROM duckdb_sequences() WHERE schema_name = 'main' ORDER BY 1",
        )?,
    })
}

fn names(conn: &Connection, sql: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_columns_in_declaration_order() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE \"Books\" (id INTEGER NOT NULL, title VARCHAR);
             CREATE INDEX books_title ON \"Books\" (title);",
        )
        .unwrap();

        let layout = describe_table(&conn, "Books").unwrap().unwrap();
        assert_eq!(
            layout.columns,
            vec![
                ColumnInfo {
                    name: "id".to_string(),
                    data_type: "INTEGER".to_string(),
                    nullable: false,
                },
                ColumnInfo {
                    name: "title".to_string(),
                    data_type: "VARCHAR".to_string(),
                    nullable: true,
                },
            ]
        );
        assert_eq!(layout.indexes.len(), 1);
        assert_eq!(layout.indexes[0].name, "books_title");
    }

    #[test]
    fn missing_table_is_none() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!table_exists(&conn, "Nope").unwrap());
        assert!(describe_table(&conn, "Nope").unwrap().is_none());
    }

    #[test]
    fn snapshot_lists_objects() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE SEQUENCE s1;
             CREATE TABLE b (x INTEGER);
             CREATE TABLE a (x INTEGER);
             CREATE INDEX a_x ON a (x);",
        )
        .unwrap();

        let snap = snapshot(&conn).unwrap();
        assert_eq!(snap.tables, vec!["a", "b"]);
        assert_eq!(snap.indexes, vec!["a_x"]);
        assert_eq!(snap.sequences, vec!["s1"]);
    }
}
