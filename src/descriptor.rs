//! Entity descriptor model
//!
//! In-memory representation of the canonical schema: tables, columns and
//! their constraint metadata. Descriptors are plain data supplied by the
//! host (built in code or deserialized from a declarative source); the
//! engine never scans a type hierarchy itself.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// PostgreSQL identifiers must start with a letter or underscore and contain
/// only letters, digits, underscores, and dollar signs.
static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_$]*$").unwrap());

/// Errors raised while validating entity metadata.
///
/// Any of these fails the whole pass before DDL is emitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Duplicate table name: {0}")]
    DuplicateTable(String),

    #[error("Duplicate column {column} in table {table}")]
    DuplicateColumn { table: String, column: String },

    #[error("Table {0} declares no columns")]
    NoColumns(String),

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Column {table}.{column} references {target_table}.{target_column}, which is not a primary key or unique column")]
    InvalidReference {
        table: String,
        column: String,
        target_table: String,
        target_column: String,
    },
}

/// Supported column data types, rendered into DDL by [`DataType::as_sql`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Varchar,
    Char,
    Text,
    SmallInt,
    Integer,
    BigInt,
    Real,
    DoublePrecision,
    Numeric,
    Boolean,
    Date,
    Timestamp,
    Bytea,
}

impl DataType {
    /// SQL spelling of the type, without any length qualifier.
    pub fn as_sql(&self) -> &'static str {
        match self {
            DataType::Varchar => "VARCHAR",
            DataType::Char => "CHAR",
            DataType::Text => "TEXT",
            DataType::SmallInt => "SMALLINT",
            DataType::Integer => "INTEGER",
            DataType::BigInt => "BIGINT",
            DataType::Real => "REAL",
            DataType::DoublePrecision => "DOUBLE PRECISION",
            DataType::Numeric => "NUMERIC",
            DataType::Boolean => "BOOLEAN",
            DataType::Date => "DATE",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Bytea => "BYTEA",
        }
    }
}

/// Reference to a column in another table. At most one per column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
}

/// A single column declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: DataType,
    /// Length qualifier; absent means the bare type is emitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyRef>,
}

impl ColumnDescriptor {
    /// A plain column of the given type, no constraints.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            length: None,
            not_null: false,
            unique: false,
            primary_key: false,
            foreign_key: None,
        }
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKeyRef {
            table: table.into(),
            column: column.into(),
        });
        self
    }
}

/// A table declaration: name plus ordered column list.
///
/// Column order is preserved all the way into the generated DDL, so the
/// declaration order is the canonical one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Names of the columns flagged as primary key, in declaration order.
    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Structural validation of a single table: identifier rules, duplicate
    /// columns, empty column list.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        validate_identifier(&self.name)?;

        if self.columns.is_empty() {
            return Err(DescriptorError::NoColumns(self.name.clone()));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            validate_identifier(&column.name)?;
            if let Some(fk) = &column.foreign_key {
                validate_identifier(&fk.table)?;
                validate_identifier(&fk.column)?;
            }
            if !seen.insert(column.name.as_str()) {
                return Err(DescriptorError::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
        }

        Ok(())
    }
}

fn validate_identifier(name: &str) -> Result<(), DescriptorError> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(())
    } else {
        Err(DescriptorError::InvalidIdentifier(name.to_string()))
    }
}

/// Validate a whole descriptor set: per-table structure, table-name
/// uniqueness, and foreign-key references into the declared set.
///
/// A foreign key may target a table outside the set (treated as external);
/// when the target table is declared, the referenced column must exist and
/// carry a PRIMARY KEY or UNIQUE flag.
pub fn validate_tables(tables: &[TableDescriptor]) -> Result<(), DescriptorError> {
    let mut by_name: HashMap<&str, &TableDescriptor> = HashMap::new();
    for table in tables {
        table.validate()?;
        if by_name.insert(table.name.as_str(), table).is_some() {
            return Err(DescriptorError::DuplicateTable(table.name.clone()));
        }
    }

    for table in tables {
        for column in &table.columns {
            let Some(fk) = &column.foreign_key else {
                continue;
            };
            let Some(target) = by_name.get(fk.table.as_str()) else {
                continue;
            };
            let referenceable = target
                .columns
                .iter()
                .any(|c| c.name == fk.column && (c.primary_key || c.unique));
            if !referenceable {
                return Err(DescriptorError::InvalidReference {
                    table: table.name.clone(),
                    column: column.name.clone(),
                    target_table: fk.table.clone(),
                    target_column: fk.column.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Ordered, duplicate-rejecting collection of table descriptors.
///
/// The explicit-registration surface of the engine: the host resolves its
/// entity metadata however it likes (hand-written, generated, or a JSON
/// document) and registers the result here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaRegistry {
    tables: Vec<TableDescriptor>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one table, preserving insertion order.
    pub fn register(&mut self, table: TableDescriptor) -> Result<(), DescriptorError> {
        if self.tables.iter().any(|t| t.name == table.name) {
            return Err(DescriptorError::DuplicateTable(table.name));
        }
        table.validate()?;
        self.tables.push(table);
        Ok(())
    }

    /// Load a registry from a declarative JSON document: an array of table
    /// descriptors. Set-level validation happens when the script is
    /// generated.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_table() -> TableDescriptor {
        TableDescriptor::new(
            "users",
            vec![
                ColumnDescriptor::new("id", DataType::Integer).primary_key(),
                ColumnDescriptor::new("name", DataType::Varchar)
                    .length(64)
                    .not_null(),
                ColumnDescriptor::new("email", DataType::Varchar).length(128).unique(),
            ],
        )
    }

    #[test]
    fn valid_table_passes() {
        assert!(users_table().validate().is_ok());
        assert_eq!(users_table().primary_key_columns(), vec!["id"]);
    }

    #[test]
    fn duplicate_column_rejected() {
        let table = TableDescriptor::new(
            "users",
            vec![
                ColumnDescriptor::new("id", DataType::Integer),
                ColumnDescriptor::new("id", DataType::BigInt),
            ],
        );
        assert_eq!(
            table.validate(),
            Err(DescriptorError::DuplicateColumn {
                table: "users".to_string(),
                column: "id".to_string(),
            })
        );
    }

    #[test]
    fn empty_table_rejected() {
        let table = TableDescriptor::new("users", vec![]);
        assert_eq!(
            table.validate(),
            Err(DescriptorError::NoColumns("users".to_string()))
        );
    }

    #[test]
    fn quote_character_rejected() {
        let table = TableDescriptor::new(
            "users",
            vec![ColumnDescriptor::new("na\"me", DataType::Text)],
        );
        assert_eq!(
            table.validate(),
            Err(DescriptorError::InvalidIdentifier("na\"me".to_string()))
        );
    }

    #[test]
    fn duplicate_table_rejected_across_set() {
        let err = validate_tables(&[users_table(), users_table()]).unwrap_err();
        assert_eq!(err, DescriptorError::DuplicateTable("users".to_string()));
    }

    #[test]
    fn fk_to_declared_non_key_column_rejected() {
        let orders = TableDescriptor::new(
            "orders",
            vec![
                ColumnDescriptor::new("id", DataType::Integer).primary_key(),
                ColumnDescriptor::new("user_name", DataType::Varchar)
                    .length(64)
                    .references("users", "name"),
            ],
        );
        let err = validate_tables(&[users_table(), orders]).unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidReference { .. }));
    }

    #[test]
    fn fk_to_declared_key_column_accepted() {
        let orders = TableDescriptor::new(
            "orders",
            vec![
                ColumnDescriptor::new("id", DataType::Integer).primary_key(),
                ColumnDescriptor::new("user_id", DataType::Integer).references("users", "id"),
            ],
        );
        assert!(validate_tables(&[users_table(), orders]).is_ok());
    }

    #[test]
    fn fk_to_undeclared_table_accepted_as_external() {
        let orders = TableDescriptor::new(
            "orders",
            vec![ColumnDescriptor::new("region_id", DataType::Integer)
                .references("regions", "id")],
        );
        assert!(validate_tables(&[orders]).is_ok());
    }

    #[test]
    fn registry_preserves_order_and_rejects_duplicates() {
        let mut registry = SchemaRegistry::new();
        registry.register(users_table()).unwrap();
        registry
            .register(TableDescriptor::new(
                "orders",
                vec![ColumnDescriptor::new("id", DataType::Integer).primary_key()],
            ))
            .unwrap();

        assert_eq!(registry.tables()[0].name, "users");
        assert_eq!(registry.tables()[1].name, "orders");
        assert!(registry.register(users_table()).is_err());
    }

    #[test]
    fn registry_loads_from_json() {
        let source = r#"[
            {
                "name": "users",
                "columns": [
                    {"name": "id", "dataType": "integer", "primaryKey": true},
                    {"name": "email", "dataType": "varchar", "length": 128, "unique": true}
                ]
            }
        ]"#;

        let registry = SchemaRegistry::from_json(source).unwrap();
        assert_eq!(registry.tables().len(), 1);
        let users = &registry.tables()[0];
        assert_eq!(users.columns[1].length, Some(128));
        assert!(users.columns[1].unique);
        assert!(validate_tables(registry.tables()).is_ok());
    }
}
