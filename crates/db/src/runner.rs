//! Migration-runner factory.
//!
//! Builds the runner for a command invocation: resolves configuration,
//! connects, authenticates, and wires the tracking-table storage backend
//! and script discovery for the requested kind.

use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend};
use tidemark_shared::MigratorConfig;

use crate::discovery::ScriptDiscovery;
use crate::error::{MigratorError, MigratorResult};
use crate::logging::log_line;
use crate::storage::TrackingTable;

/// Selects which tracking table and scripts directory a runner works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerKind {
    /// Schema migrations.
    Migration,
    /// Seed data scripts.
    Seed,
}

impl RunnerKind {
    fn tracking_table(self, cfg: &MigratorConfig) -> TrackingTable {
        let table = match self {
            Self::Migration => &cfg.storage.table_name,
            Self::Seed => &cfg.storage.seed_table_name,
        };
        TrackingTable::new(table, &cfg.storage.column_name)
            .with_schema(cfg.database.schema.clone())
    }

    fn scripts_dir(self, cfg: &MigratorConfig) -> std::path::PathBuf {
        match self {
            Self::Migration => cfg.paths.migrations.clone(),
            Self::Seed => cfg.paths.seeders.clone(),
        }
    }
}

/// Command-line arguments that influence runner construction.
#[derive(Debug, Clone, Default)]
pub struct RunnerArgs {
    /// Connection URL supplied directly on the command line.
    pub url: Option<String>,
}

/// A configured runner: connection, tracking-table storage and script
/// discovery for one command invocation.
#[derive(Debug)]
pub struct Runner {
    db: DatabaseConnection,
    storage: TrackingTable,
    discovery: ScriptDiscovery,
}

impl Runner {
    /// Assembles a runner from its parts. Most callers go through
    /// [`build_runner`] instead.
    #[must_use]
    pub fn new(db: DatabaseConnection, storage: TrackingTable, discovery: ScriptDiscovery) -> Self {
        Self {
            db,
            storage,
            discovery,
        }
    }

    /// Returns the database connection.
    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Returns the tracking-table storage backend.
    #[must_use]
    pub fn storage(&self) -> &TrackingTable {
        &self.storage
    }

    /// Mutable access to the storage backend, used by the reconciler to
    /// enable timestamp mode.
    pub fn storage_mut(&mut self) -> &mut TrackingTable {
        &mut self.storage
    }

    /// Returns the script discovery parameters.
    #[must_use]
    pub fn discovery(&self) -> &ScriptDiscovery {
        &self.discovery
    }

    /// Names of migrations recorded in the tracking table.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracking table cannot be read.
    pub async fn applied(&self) -> MigratorResult<Vec<String>> {
        self.storage.applied(&self.db).await
    }

    /// Discovered scripts that are not yet recorded as applied.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery or the tracking table read fails.
    pub async fn pending(&self) -> MigratorResult<Vec<String>> {
        let applied = self.applied().await?;
        let mut pending = self.discovery.discover()?;
        pending.retain(|name| !applied.contains(name));
        Ok(pending)
    }
}

/// Returns the schema-creation statement required for the configuration,
/// if any. Only the Postgres dialect supports schema namespaces, and the
/// default `public` schema always exists.
fn schema_to_create(backend: DbBackend, schema: Option<&str>) -> Option<String> {
    match (backend, schema) {
        (DbBackend::Postgres, Some(schema)) if schema != "public" => Some(format!(
            "CREATE SCHEMA IF NOT EXISTS \"{}\"",
            schema.replace('"', "\"\"")
        )),
        _ => None,
    }
}

/// Builds a runner for the given kind.
///
/// # Errors
///
/// Fails with [`MigratorError::MissingConfig`] when neither a config file
/// nor a URL is available; no connection is attempted in that case. Other
/// configuration, connection or authentication failures propagate as-is.
pub async fn build_runner(kind: RunnerKind, args: &RunnerArgs) -> MigratorResult<Runner> {
    if args.url.is_none() && !MigratorConfig::file_exists() {
        return Err(MigratorError::MissingConfig(
            MigratorConfig::config_file().display().to_string(),
        ));
    }

    let cfg = MigratorConfig::resolve(args.url.as_deref())?;
    let db = crate::connect(&cfg).await?;

    let storage = kind.tracking_table(&cfg);
    let discovery = ScriptDiscovery::new(kind.scripts_dir(&cfg));

    db.ping().await?;
    log_line("Authenticated");

    if db.get_database_backend() == DbBackend::Postgres {
        if let Some(schema) = storage.schema() {
            log_line(&format!("Schema name: {schema}"));
        }
        if let Some(sql) = schema_to_create(db.get_database_backend(), storage.schema()) {
            db.execute_unprepared(&sql).await?;
        }
    }

    Ok(Runner::new(db, storage, discovery))
}
