//! Schema reconciliation
//!
//! Diffs the declared column set against the introspected live schema and
//! plans the corrective ALTER statements. Matching is by column name only:
//! declared intent wins for new columns, existing columns are never altered
//! in place.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::ddl;
use crate::descriptor::{ColumnDescriptor, TableDescriptor};
use crate::introspection::{LiveColumn, LiveSchema};

/// Column-level differences for one table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDiff {
    pub table: String,
    /// Declared columns with no live counterpart, in declaration order.
    pub columns_to_add: Vec<ColumnDescriptor>,
    /// Live columns no longer declared, in ordinal order.
    pub columns_to_drop: Vec<LiveColumn>,
}

impl TableDiff {
    pub fn is_empty(&self) -> bool {
        self.columns_to_add.is_empty() && self.columns_to_drop.is_empty()
    }
}

/// Corrective statements for one pass: every ADD before any DROP.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcilePlan {
    pub statements: Vec<String>,
    /// DROP statements withheld because destructive reconciliation was not
    /// opted into.
    pub skipped_drops: Vec<String>,
}

/// Diff every declared table against the live schema.
///
/// Returns only tables with actual differences. A declared table with no
/// live columns does not exist yet; it is left to the CREATE path and
/// produces no diff (ALTER cannot conjure the table).
pub fn diff(tables: &[TableDescriptor], live: &LiveSchema) -> Vec<TableDiff> {
    let mut diffs = Vec::new();

    for table in tables {
        let live_columns = live.columns(&table.name);
        if live_columns.is_empty() {
            debug!(table = %table.name, "table not present live, skipping diff");
            continue;
        }

        let live_names: HashSet<&str> =
            live_columns.iter().map(|c| c.column_name.as_str()).collect();
        let declared_names: HashSet<&str> =
            table.columns.iter().map(|c| c.name.as_str()).collect();

        let columns_to_add: Vec<ColumnDescriptor> = table
            .columns
            .iter()
            .filter(|c| !live_names.contains(c.name.as_str()))
            .cloned()
            .collect();

        let columns_to_drop: Vec<LiveColumn> = live_columns
            .iter()
            .filter(|c| !declared_names.contains(c.column_name.as_str()))
            .cloned()
            .collect();

        let table_diff = TableDiff {
            table: table.name.clone(),
            columns_to_add,
            columns_to_drop,
        };

        if !table_diff.is_empty() {
            debug!(
                table = %table.name,
                add = table_diff.columns_to_add.len(),
                drop = table_diff.columns_to_drop.len(),
                "table diverged from declared schema"
            );
            diffs.push(table_diff);
        }
    }

    diffs
}

/// Turn diffs into executable statements.
///
/// Additions for every table come first, then deletions: adding a column can
/// never fail because of a pending drop, while the reverse is not
/// guaranteed. DROP statements are only emitted when `apply_drops` is set;
/// otherwise they are returned separately so the caller can see what was
/// withheld.
pub fn plan(diffs: &[TableDiff], apply_drops: bool) -> ReconcilePlan {
    let mut statements = Vec::new();
    let mut skipped_drops = Vec::new();

    for diff in diffs {
        for column in &diff.columns_to_add {
            statements.push(format!(
                "ALTER TABLE {} ADD COLUMN {}",
                ddl::quote_ident(&diff.table),
                ddl::column_ddl(column)
            ));
        }
    }

    for diff in diffs {
        for column in &diff.columns_to_drop {
            let statement = format!(
                "ALTER TABLE {} DROP COLUMN {}",
                ddl::quote_ident(&diff.table),
                ddl::quote_ident(&column.column_name)
            );
            if apply_drops {
                statements.push(statement);
            } else {
                warn!(
                    table = %diff.table,
                    column = %column.column_name,
                    "undeclared live column left in place (drops not enabled)"
                );
                skipped_drops.push(statement);
            }
        }
    }

    ReconcilePlan {
        statements,
        skipped_drops,
    }
}
