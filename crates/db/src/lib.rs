//! Database layer for the Tidemark migration CLI.
//!
//! This crate provides:
//! - The connection factory and its statement-log hook
//! - The tracking-table storage backend
//! - The runner factory and script discovery
//! - Maintenance routines for the tracking table's own schema

pub mod discovery;
pub mod error;
pub mod inspect;
pub mod logging;
pub mod meta;
pub mod runner;
pub mod storage;

pub use discovery::ScriptDiscovery;
pub use error::{MigratorError, MigratorResult};
pub use meta::{MetaShape, add_timestamps, ensure_current_meta_schema};
pub use runner::{Runner, RunnerArgs, RunnerKind, build_runner};
pub use storage::TrackingTable;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use tidemark_shared::MigratorConfig;

/// Establishes a connection to the database described by the configuration.
///
/// The driver's own statement logging is disabled; statements executed by
/// this crate are traced through [`logging`] instead, which suppresses
/// execution traces before they reach the sink.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(cfg: &MigratorConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(cfg.database.url.clone());
    options
        .max_connections(cfg.database.max_connections)
        .min_connections(cfg.database.min_connections)
        .sqlx_logging(false);

    Database::connect(options).await
}

/// Executes a statement, routing its execution trace through the log hook.
pub(crate) async fn exec<C: ConnectionTrait>(conn: &C, stmt: Statement) -> Result<(), DbErr> {
    logging::trace_statement(&stmt);
    conn.execute(stmt).await?;
    Ok(())
}

/// Runs a query, routing its execution trace through the log hook.
pub(crate) async fn query_all<C: ConnectionTrait>(
    conn: &C,
    stmt: Statement,
) -> Result<Vec<sea_orm::QueryResult>, DbErr> {
    logging::trace_statement(&stmt);
    conn.query_all(stmt).await
}
