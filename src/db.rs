//! Database connection management
//!
//! Pool construction and the statement executor that applies generated DDL.

pub mod queries;

use crate::config::DatabaseConfig;
use crate::error::{StatementFailure, SyncError};
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::{debug, info, warn};

/// Build a connection pool and verify it with a probe query.
pub async fn connect(config: &DatabaseConfig) -> Result<Pool, SyncError> {
    let pool = create_pool(config)?;

    let client = pool.get().await?;
    client.query_one("SELECT 1", &[]).await?;
    drop(client);

    info!(
        database = %config.database,
        host = %config.host,
        "connection pool established"
    );

    Ok(pool)
}

fn create_pool(config: &DatabaseConfig) -> Result<Pool, SyncError> {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.user = Some(config.user.clone());
    cfg.password = Some(config.password.clone());
    cfg.dbname = Some(config.database.clone());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    cfg.create_pool(Some(Runtime::Tokio1), NoTls).map_err(|e| {
        SyncError::Config(crate::config::ConfigError::InvalidValue(format!(
            "Failed to create pool: {}",
            e
        )))
    })
}

/// What happened to a batch of statements.
#[derive(Debug, Default)]
pub struct ExecutionOutcome {
    /// Statements the database accepted, in execution order.
    pub applied: Vec<String>,
    /// Statements the database rejected, with the driver's error text.
    pub failures: Vec<StatementFailure>,
}

impl ExecutionOutcome {
    pub fn merge(&mut self, other: ExecutionOutcome) {
        self.applied.extend(other.applied);
        self.failures.extend(other.failures);
    }
}

/// Execute statements one at a time, collecting failures instead of
/// aborting.
///
/// Checking a connection out of the pool is the only fatal path here; once a
/// session is held, a rejected statement is recorded and the batch continues
/// with the next one.
pub async fn execute_statements(
    pool: &Pool,
    statements: &[String],
) -> Result<ExecutionOutcome, SyncError> {
    let mut outcome = ExecutionOutcome::default();
    if statements.is_empty() {
        return Ok(outcome);
    }

    let client = pool.get().await?;

    for statement in statements {
        match client.execute(statement.as_str(), &[]).await {
            Ok(_) => {
                debug!(statement = %statement, "statement applied");
                outcome.applied.push(statement.clone());
            }
            Err(e) => {
                warn!(statement = %statement, error = %e, "statement failed");
                outcome.failures.push(StatementFailure {
                    statement: statement.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(outcome)
}
