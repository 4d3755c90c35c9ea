//! Schema introspection module
//!
//! Reads the live column definitions for the declared tables out of the
//! database catalog. The result is a point-in-time snapshot, discarded after
//! one reconciliation pass.

use crate::db::queries;
use crate::descriptor::TableDescriptor;
use crate::error::SyncError;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// A column as reported by `information_schema.columns`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveColumn {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_maximum_length: Option<i32>,
    pub ordinal_position: i32,
}

/// Live column definitions for every declared table at one point in time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSchema {
    pub schema: String,
    pub captured_at: DateTime<Utc>,
    /// Declared table name to its live columns. A table that does not exist
    /// yet maps to an empty list.
    pub tables: HashMap<String, Vec<LiveColumn>>,
}

impl LiveSchema {
    /// Live columns for one table; empty when the table is absent live.
    pub fn columns(&self, table: &str) -> &[LiveColumn] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Catalog reader for PostgreSQL.
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Fetch live columns for every declared table, one catalog query per
    /// table, filtered by `(table_schema, table_name)`.
    ///
    /// A declared table with no catalog rows is the normal state on a first
    /// run (its CREATE has not been applied yet) and yields an empty entry
    /// rather than an error.
    pub async fn introspect(
        pool: &Pool,
        schema: &str,
        tables: &[TableDescriptor],
    ) -> Result<LiveSchema, SyncError> {
        let client = pool.get().await?;

        let mut live = HashMap::with_capacity(tables.len());
        for table in tables {
            let rows = client
                .query(queries::GET_COLUMNS, &[&schema, &table.name])
                .await?;

            let columns: Vec<LiveColumn> = rows
                .iter()
                .map(|row| LiveColumn {
                    table_name: row.get("table_name"),
                    column_name: row.get("column_name"),
                    data_type: row.get("data_type"),
                    nullable: row.get("nullable"),
                    column_default: row.get("column_default"),
                    character_maximum_length: row.get("character_maximum_length"),
                    ordinal_position: row.get("ordinal_position"),
                })
                .collect();

            debug!(
                table = %table.name,
                live_columns = columns.len(),
                "introspected table"
            );
            live.insert(table.name.clone(), columns);
        }

        Ok(LiveSchema {
            schema: schema.to_string(),
            captured_at: Utc::now(),
            tables: live,
        })
    }
}
