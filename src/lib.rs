//! schemasync - declarative schema synchronization for PostgreSQL
//!
//! Keeps a live database converged with a declared set of table
//! descriptors:
//!
//! 1. generate canonical `CREATE TABLE IF NOT EXISTS` DDL and persist it to
//!    a well-known path,
//! 2. apply it (idempotent),
//! 3. introspect the live columns from `information_schema`,
//! 4. diff live against declared and apply corrective
//!    `ALTER TABLE ... ADD COLUMN` / `DROP COLUMN` statements.
//!
//! Additions always run before deletions, and DROP COLUMN execution requires
//! an explicit opt-in. Statement failures are collected and surfaced as a
//! structured list instead of aborting the pass.
//!
//! ```no_run
//! use schemasync::{
//!     ColumnDescriptor, DataType, Settings, SyncOptions, Synchronizer, TableDescriptor,
//! };
//!
//! # async fn run() -> Result<(), schemasync::SyncError> {
//! let settings = Settings::load()?;
//! let pool = schemasync::db::connect(&settings.database).await?;
//!
//! let users = TableDescriptor::new(
//!     "users",
//!     vec![
//!         ColumnDescriptor::new("id", DataType::Integer).primary_key(),
//!         ColumnDescriptor::new("email", DataType::Varchar).length(128).unique(),
//!     ],
//! );
//!
//! let synchronizer = Synchronizer::new(pool, SyncOptions::from(settings.sync));
//! let report = synchronizer.synchronize(&[users]).await?;
//! println!("applied {} statements", report.applied.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod ddl;
pub mod descriptor;
pub mod error;
pub mod introspection;
pub mod reconcile;
pub mod sync;

pub use config::{DatabaseConfig, Settings, SyncConfig};
pub use ddl::DdlScript;
pub use descriptor::{
    ColumnDescriptor, DataType, DescriptorError, ForeignKeyRef, SchemaRegistry, TableDescriptor,
};
pub use error::{StatementFailure, SyncError, SyncResult};
pub use introspection::{LiveColumn, LiveSchema, SchemaIntrospector};
pub use reconcile::{ReconcilePlan, TableDiff};
pub use sync::{SyncOptions, SyncReport, Synchronizer};
