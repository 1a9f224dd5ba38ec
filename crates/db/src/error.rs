//! Error types for the migration CLI.

use thiserror::Error;

/// Result type alias using `MigratorError`.
pub type MigratorResult<T> = Result<T, MigratorError>;

/// Errors raised while building a runner or maintaining the tracking table.
#[derive(Debug, Error)]
pub enum MigratorError {
    /// No configuration file and no connection URL were supplied.
    /// The CLI maps this error to exit code 1.
    #[error("Cannot find \"{0}\". Have you run \"tidemark init\"?")]
    MissingConfig(String),

    /// The configuration file exists but could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The tracking table is absent from the database.
    #[error("No tracking table \"{0}\" found")]
    MissingTrackingTable(String),

    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A statement could not be constructed.
    #[error("Query build error: {0}")]
    QueryBuild(String),

    /// A filesystem operation failed (script discovery, config init).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
