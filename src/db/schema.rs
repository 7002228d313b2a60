use crate::error::{Result, SchemaError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    String,
    Timestamp,
}

impl DataType {
    pub fn to_sql_type(&self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::String => "VARCHAR",
            DataType::Timestamp => "TIMESTAMP",
        }
    }
}

/// Target of a foreign key: `table.column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub auto_increment: bool,
    pub primary_key: bool,
    pub references: Option<ForeignKey>,
}

impl ColumnDefinition {
    /// A plain nullable column.
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            nullable: true,
            auto_increment: false,
            primary_key: false,
            references: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn references(mut self, table: &str, column: &str) -> Self {
        self.references = Some(ForeignKey {
            table: table.to_string(),
            column: column.to_string(),
        });
        self
    }

    /// Column line inside `CREATE TABLE`. `table` names the owning table so
    /// auto-increment columns can point at their sequence.
    pub fn to_sql_definition(&self, table: &str) -> String {
        let mut sql = format!("{} {}", quote_ident(&self.name), self.data_type.to_sql_type());
        if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if self.auto_increment {
            sql.push_str(&format!(
                " DEFAULT nextval({})",
                quote_literal(&sequence_name(table, &self.name))
            ));
        }
        sql
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    pub fn new(name: &str, columns: Vec<ColumnDefinition>) -> Self {
        Self {
            name: name.to_string(),
            columns,
        }
    }

    /// Rejects definitions the engine would only half-understand.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SchemaError::InvalidDefinition("table name is empty".to_string()));
        }
        if self.columns.is_empty() {
            return Err(SchemaError::InvalidDefinition(format!(
                "table {} has no columns",
                self.name
            )));
        }
        for (i, col) in self.columns.iter().enumerate() {
            if col.name.is_empty() {
                return Err(SchemaError::InvalidDefinition(format!(
                    "column {} of table {} has no name",
                    i, self.name
                )));
            }
            if self.columns[..i].iter().any(|c| c.name == col.name) {
                return Err(SchemaError::InvalidDefinition(format!(
                    "duplicate column {} in table {}",
                    col.name, self.name
                )));
            }
            if col.primary_key && col.nullable {
                return Err(SchemaError::InvalidDefinition(format!(
                    "primary key column {}.{} must be NOT NULL",
                    self.name, col.name
                )));
            }
        }
        Ok(())
    }

    /// Names of the sequences backing auto-increment columns.
    pub fn sequence_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|col| col.auto_increment)
            .map(|col| sequence_name(&self.name, &col.name))
            .collect()
    }

    pub fn to_create_sequences_sql(&self) -> Vec<String> {
        self.sequence_names()
            .iter()
            .map(|seq| format!("CREATE SEQUENCE {};", quote_ident(seq)))
            .collect()
    }

    pub fn to_create_table_sql(&self) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|col| col.to_sql_definition(&self.name))
            .collect();

        let pk: Vec<String> = self
            .columns
            .iter()
            .filter(|col| col.primary_key)
            .map(|col| quote_ident(&col.name))
            .collect();
        if !pk.is_empty() {
            lines.push(format!("PRIMARY KEY ({})", pk.join(", ")));
        }

        for col in &self.columns {
            if let Some(fk) = &col.references {
                lines.push(format!(
                    "FOREIGN KEY ({}) REFERENCES {} ({})",
                    quote_ident(&col.name),
                    quote_ident(&fk.table),
                    quote_ident(&fk.column)
                ));
            }
        }

        format!(
            "CREATE TABLE {} (\n    {}\n);",
            quote_ident(&self.name),
            lines.join(",\n    ")
        )
    }

    /// Drops the table, then the sequences it owned.
    pub fn to_drop_sql(&self) -> Vec<String> {
        let mut statements = vec![format!("DROP TABLE {};", quote_ident(&self.name))];
        statements.extend(
            self.sequence_names()
                .iter()
                .map(|seq| format!("DROP SEQUENCE IF EXISTS {};", quote_ident(seq))),
        );
        statements
    }
}

/// Composite index over `columns` of `table`, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub table: String,
    pub columns: Vec<String>,
}

impl IndexDefinition {
    pub fn new(table: &str, columns: &[&str]) -> Self {
        Self {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// `UserAddresses` + `[userId, address]` -> `user_addresses_user_id_address`.
    pub fn name(&self) -> String {
        let mut parts = vec![to_snake_case(&self.table)];
        parts.extend(self.columns.iter().map(|c| to_snake_case(c)));
        parts.join("_")
    }

    pub fn to_create_index_sql(&self) -> Result<String> {
        if self.columns.is_empty() {
            return Err(SchemaError::InvalidDefinition(format!(
                "index on {} has no columns",
                self.table
            )));
        }
        let cols: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        Ok(format!(
            "CREATE INDEX {} ON {} ({});",
            quote_ident(&self.name()),
            quote_ident(&self.table),
            cols.join(", ")
        ))
    }
}

pub fn sequence_name(table: &str, column: &str) -> String {
    format!("{}_{}_seq", table, column)
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample_table() -> TableDefinition {
        TableDefinition::new(
            "Things",
            vec![
                ColumnDefinition::new("id", DataType::Integer)
                    .not_null()
                    .auto_increment()
                    .primary_key(),
                ColumnDefinition::new("ownerId", DataType::Integer).references("Owners", "id"),
                ColumnDefinition::new("seenAt", DataType::Timestamp).not_null(),
            ],
        )
    }

    #[rstest]
    #[case("UserAddresses", "user_addresses")]
    #[case("userId", "user_id")]
    #[case("address", "address")]
    #[case("createdAt", "created_at")]
    #[case("v2Name", "v2_name")]
    fn snake_case_names(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(to_snake_case(input), expected);
    }

    #[test]
    fn index_name_follows_table_and_columns() {
        let index = IndexDefinition::new("UserAddresses", &["userId", "address"]);
        assert_eq!(index.name(), "user_addresses_user_id_address");
        assert_eq!(
            index.to_create_index_sql().unwrap(),
            "CREATE INDEX \"user_addresses_user_id_address\" ON \"UserAddresses\" (\"userId\", \"address\");"
        );
    }

    #[test]
    fn index_without_columns_is_rejected() {
        let index = IndexDefinition::new("UserAddresses", &[]);
        assert!(matches!(
            index.to_create_index_sql(),
            Err(SchemaError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn create_table_sql_carries_constraints() {
        let sql = sample_table().to_create_table_sql();
        assert!(sql.starts_with("CREATE TABLE \"Things\" ("));
        assert!(sql.contains("\"id\" INTEGER NOT NULL DEFAULT nextval('Things_id_seq')"));
        assert!(sql.contains("\"ownerId\" INTEGER,"));
        assert!(sql.contains("\"seenAt\" TIMESTAMP NOT NULL"));
        assert!(sql.contains("PRIMARY KEY (\"id\")"));
        assert!(sql.contains("FOREIGN KEY (\"ownerId\") REFERENCES \"Owners\" (\"id\")"));
    }

    #[test]
    fn sequences_follow_auto_increment_columns() {
        let table = sample_table();
        assert_eq!(table.sequence_names(), vec!["Things_id_seq".to_string()]);
        assert_eq!(
            table.to_drop_sql(),
            vec![
                "DROP TABLE \"Things\";".to_string(),
                "DROP SEQUENCE IF EXISTS \"Things_id_seq\";".to_string(),
            ]
        );
    }

    #[test]
    fn quoting_escapes_embedded_quotes() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn validate_rejects_bad_definitions() {
        assert!(sample_table().validate().is_ok());

        let empty = TableDefinition::new("Empty", vec![]);
        assert!(empty.validate().is_err());

        let dup = TableDefinition::new(
            "Dup",
            vec![
                ColumnDefinition::new("a", DataType::String),
                ColumnDefinition::new("a", DataType::Integer),
            ],
        );
        assert!(dup.validate().is_err());

        let nullable_pk = TableDefinition::new(
            "Pk",
            vec![ColumnDefinition::new("id", DataType::Integer).primary_key()],
        );
        assert!(nullable_pk.validate().is_err());
    }
}
