//! Canonical DDL generation
//!
//! Turns a validated descriptor set into `CREATE TABLE IF NOT EXISTS`
//! statements, one per table, in the order the caller supplied them. Foreign
//! keys are emitted inline, so the caller is responsible for dependency
//! order.

use sha2::{Digest, Sha256};

use crate::descriptor::{ColumnDescriptor, DescriptorError, TableDescriptor};

/// Quote an identifier (table/column name) safely.
pub fn quote_ident(ident: &str) -> String {
    // PostgreSQL identifier quoting
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// The generated script: one statement per table, insertion-ordered.
#[derive(Debug, Clone)]
pub struct DdlScript {
    statements: Vec<String>,
}

impl DdlScript {
    /// Per-table statements, for individual execution.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// The full script text: table blocks separated by a blank line.
    pub fn text(&self) -> String {
        let mut text = self.statements.join("\n\n");
        text.push('\n');
        text
    }

    /// SHA-256 hex digest of the script text.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Generate the canonical creation script for the given tables.
///
/// The whole set is validated first; no DDL is emitted if any descriptor is
/// malformed.
pub fn generate(tables: &[TableDescriptor]) -> Result<DdlScript, DescriptorError> {
    crate::descriptor::validate_tables(tables)?;

    Ok(DdlScript {
        statements: tables.iter().map(table_ddl).collect(),
    })
}

/// One `CREATE TABLE IF NOT EXISTS` statement. Assumes a validated table.
fn table_ddl(table: &TableDescriptor) -> String {
    let mut clauses: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("    {}", column_ddl(c)))
        .collect();

    let pk_columns = table.primary_key_columns();
    if !pk_columns.is_empty() {
        let quoted: Vec<String> = pk_columns.iter().map(|c| quote_ident(c)).collect();
        clauses.push(format!("    PRIMARY KEY ({})", quoted.join(", ")));
    }

    for column in &table.columns {
        if let Some(fk) = &column.foreign_key {
            clauses.push(format!(
                "    FOREIGN KEY ({}) REFERENCES {}({})",
                quote_ident(&column.name),
                quote_ident(&fk.table),
                quote_ident(&fk.column)
            ));
        }
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
        quote_ident(&table.name),
        clauses.join(",\n")
    )
}

/// Format a single column clause: `"name" TYPE[(len)] [NOT NULL] [UNIQUE]`.
///
/// Shared with the reconciler's ADD COLUMN statements so a column added later
/// is spelled exactly as it would have been at creation.
pub fn column_ddl(column: &ColumnDescriptor) -> String {
    let mut clause = format!(
        "{} {}",
        quote_ident(&column.name),
        column.data_type.as_sql()
    );
    if let Some(length) = column.length {
        clause.push_str(&format!("({})", length));
    }
    if column.not_null {
        clause.push_str(" NOT NULL");
    }
    if column.unique {
        clause.push_str(" UNIQUE");
    }
    clause
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ColumnDescriptor, DataType, TableDescriptor};
    use pretty_assertions::assert_eq;

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
    fn generates_create_table_block() {
        let script = generate(&[users_table()]).unwrap();

        let expected = r#"CREATE TABLE IF NOT EXISTS "users" (
    "id" INTEGER,
    "name" VARCHAR(64) NOT NULL,
    "email" VARCHAR(128) UNIQUE,
    PRIMARY KEY ("id")
);
"#;
        assert_eq!(script.text(), expected);
    }

    #[test]
    fn emits_foreign_key_line() {
        let orders = TableDescriptor::new(
            "line_items",
            vec![
                ColumnDescriptor::new("id", DataType::Integer).primary_key(),
                ColumnDescriptor::new("order_id", DataType::Integer)
                    .not_null()
                    .references("orders", "id"),
            ],
        );

        let script = generate(&[orders]).unwrap();
        assert!(script
            .text()
            .contains("FOREIGN KEY (\"order_id\") REFERENCES \"orders\"(\"id\")"));
    }

    #[test]
    fn composite_primary_key_is_one_clause() {
        let table = TableDescriptor::new(
            "memberships",
            vec![
                ColumnDescriptor::new("user_id", DataType::Integer).primary_key(),
                ColumnDescriptor::new("group_id", DataType::Integer).primary_key(),
            ],
        );

        let script = generate(&[table]).unwrap();
        assert!(script
            .text()
            .contains("PRIMARY KEY (\"user_id\", \"group_id\")"));
        assert_eq!(script.text().matches("PRIMARY KEY").count(), 1);
    }

    #[test]
    fn one_block_per_table_in_caller_order() {
        let orders = TableDescriptor::new(
            "orders",
            vec![ColumnDescriptor::new("id", DataType::Integer).primary_key()],
        );
        let script = generate(&[users_table(), orders]).unwrap();

        assert_eq!(script.statements().len(), 2);
        assert_eq!(script.text().matches("CREATE TABLE IF NOT EXISTS").count(), 2);
        let users_at = script.text().find("\"users\"").unwrap();
        let orders_at = script.text().find("\"orders\"").unwrap();
        assert!(users_at < orders_at);
    }

    #[test]
    fn columns_keep_declared_order() {
        let script = generate(&[users_table()]).unwrap();
        let text = script.text();
        let id_at = text.find("\"id\"").unwrap();
        let name_at = text.find("\"name\"").unwrap();
        let email_at = text.find("\"email\"").unwrap();
        assert!(id_at < name_at && name_at < email_at);
    }

    #[test]
    fn rejects_invalid_descriptors_before_emitting() {
        let err = generate(&[TableDescriptor::new("users", vec![])]).unwrap_err();
        assert_eq!(err, DescriptorError::NoColumns("users".to_string()));
    }

    #[test]
    fn column_clause_formats_every_constraint() {
        let column = ColumnDescriptor::new("email", DataType::Varchar)
            .length(128)
            .not_null()
            .unique();
        assert_eq!(column_ddl(&column), "\"email\" VARCHAR(128) NOT NULL UNIQUE");

        let bare = ColumnDescriptor::new("created_at", DataType::Timestamp);
        assert_eq!(column_ddl(&bare), "\"created_at\" TIMESTAMP");
    }

    #[test]
    fn checksum_is_stable_for_identical_input() {
        let a = generate(&[users_table()]).unwrap();
        let b = generate(&[users_table()]).unwrap();
        assert_eq!(a.checksum(), b.checksum());
        assert_eq!(a.checksum().len(), 64);
    }
}
