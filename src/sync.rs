//! Synchronization pipeline
//!
//! One run-to-completion pass: validate descriptors, generate and persist
//! the canonical script, apply it, introspect the live schema, diff, and
//! apply corrective ALTERs. Sequential by design; concurrent passes against
//! the same schema must be serialized by the caller.

use deadpool_postgres::Pool;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::SyncConfig;
use crate::db;
use crate::ddl;
use crate::descriptor::TableDescriptor;
use crate::error::{SyncError, SyncResult};
use crate::introspection::SchemaIntrospector;
use crate::reconcile::{self, TableDiff};

/// Options for one synchronizer instance.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Schema the introspector filters on.
    pub schema: String,
    /// Where the generated script is persisted, overwritten wholesale.
    pub script_path: PathBuf,
    /// Execute DROP COLUMN statements. Off by default.
    pub apply_drops: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        let config = SyncConfig::default();
        Self {
            schema: config.schema,
            script_path: config.script_path,
            apply_drops: config.apply_drops,
        }
    }
}

impl From<SyncConfig> for SyncOptions {
    fn from(config: SyncConfig) -> Self {
        Self {
            schema: config.schema,
            script_path: config.script_path,
            apply_drops: config.apply_drops,
        }
    }
}

/// Outcome of a fully successful pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// The canonical script that was persisted and applied.
    pub script: String,
    /// SHA-256 of the script text.
    pub checksum: String,
    /// Every statement the database accepted, in execution order.
    pub applied: Vec<String>,
    /// Column-level divergence found after the create step.
    pub diffs: Vec<TableDiff>,
    /// DROP statements withheld because `apply_drops` was off.
    pub skipped_drops: Vec<String>,
}

/// Drives one whole pass: generate, create, introspect, reconcile.
pub struct Synchronizer {
    pool: Pool,
    options: SyncOptions,
}

impl Synchronizer {
    pub fn new(pool: Pool, options: SyncOptions) -> Self {
        Self { pool, options }
    }

    /// Run one synchronization pass over the given descriptors.
    ///
    /// Descriptor and connection problems abort immediately. Individual
    /// statement failures do not: the pass runs to completion and a
    /// non-empty failure list is returned as
    /// [`SyncError::Statements`](crate::error::SyncError::Statements).
    pub async fn synchronize(&self, tables: &[TableDescriptor]) -> SyncResult<SyncReport> {
        let script = ddl::generate(tables)?;
        let text = script.text();
        let checksum = script.checksum();

        tokio::fs::write(&self.options.script_path, &text).await?;
        info!(
            path = %self.options.script_path.display(),
            bytes = text.len(),
            checksum = %checksum,
            "schema script written"
        );

        let mut outcome = db::execute_statements(&self.pool, script.statements()).await?;
        debug!(
            created = outcome.applied.len(),
            failed = outcome.failures.len(),
            "create statements executed"
        );

        let live =
            SchemaIntrospector::introspect(&self.pool, &self.options.schema, tables).await?;

        let diffs = reconcile::diff(tables, &live);
        let plan = reconcile::plan(&diffs, self.options.apply_drops);

        let alter_outcome = db::execute_statements(&self.pool, &plan.statements).await?;
        outcome.merge(alter_outcome);

        info!(
            tables = tables.len(),
            diverged = diffs.len(),
            applied = outcome.applied.len(),
            skipped_drops = plan.skipped_drops.len(),
            "synchronization pass finished"
        );

        if !outcome.failures.is_empty() {
            return Err(SyncError::Statements(outcome.failures));
        }

        Ok(SyncReport {
            script: text,
            checksum,
            applied: outcome.applied,
            diffs,
            skipped_drops: plan.skipped_drops,
        })
    }
}
