//! Tracking-table storage backend.
//!
//! The tracking table records which migrations have been applied. This
//! module owns its descriptor (table, name column, schema, timestamp mode)
//! and the read/write operations against it. Timestamp mode is an explicit
//! field carried with the descriptor, not process-global state.

use chrono::Utc;
use sea_orm::ConnectionTrait;
use sea_orm::sea_query::{Alias, Expr, IntoTableRef, Order, Query, TableRef};

use crate::error::{MigratorError, MigratorResult};

/// Name of the creation timestamp column in the current layout.
pub const CREATED_AT: &str = "createdAt";
/// Name of the update timestamp column in the current layout.
pub const UPDATED_AT: &str = "updatedAt";

/// Descriptor and operations for the tracking table.
#[derive(Debug, Clone)]
pub struct TrackingTable {
    table: String,
    column: String,
    schema: Option<String>,
    timestamps: bool,
}

impl TrackingTable {
    /// Creates a descriptor for the given table and name column.
    #[must_use]
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            schema: None,
            timestamps: false,
        }
    }

    /// Binds the descriptor to a schema namespace (Postgres).
    #[must_use]
    pub fn with_schema(mut self, schema: Option<String>) -> Self {
        self.schema = schema;
        self
    }

    /// Returns the tracking table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the name column.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Returns the configured schema, if any.
    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Returns true when the table carries timestamp columns.
    #[must_use]
    pub fn timestamps(&self) -> bool {
        self.timestamps
    }

    /// Marks the table as carrying timestamp columns. Subsequent writes
    /// will populate them.
    pub fn enable_timestamps(&mut self) {
        self.timestamps = true;
    }

    /// Table reference for the tracking table, schema-qualified when bound.
    #[must_use]
    pub fn table_ref(&self) -> TableRef {
        self.ref_for(&self.table)
    }

    /// Table reference for a sibling table in the same schema.
    pub(crate) fn ref_for(&self, table: &str) -> TableRef {
        match &self.schema {
            Some(schema) => (Alias::new(schema), Alias::new(table)).into_table_ref(),
            None => Alias::new(table).into_table_ref(),
        }
    }

    /// Reads the recorded migration names, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the select fails.
    pub async fn applied<C: ConnectionTrait>(&self, conn: &C) -> MigratorResult<Vec<String>> {
        let mut select = Query::select();
        select
            .column(Alias::new(&self.column))
            .from(self.table_ref())
            .order_by(Alias::new(&self.column), Order::Asc);

        let backend = conn.get_database_backend();
        let rows = crate::query_all(conn, backend.build(&select)).await?;
        rows.iter()
            .map(|row| row.try_get("", &self.column))
            .collect::<Result<Vec<String>, _>>()
            .map_err(MigratorError::from)
    }

    /// Records a migration as applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn log<C: ConnectionTrait>(&self, conn: &C, name: &str) -> MigratorResult<()> {
        let mut insert = Query::insert();
        insert.into_table(self.table_ref());

        if self.timestamps {
            let now = Utc::now().naive_utc();
            insert
                .columns([
                    Alias::new(&self.column),
                    Alias::new(CREATED_AT),
                    Alias::new(UPDATED_AT),
                ])
                .values([Expr::value(name), Expr::value(now), Expr::value(now)])
                .map_err(|e| MigratorError::QueryBuild(e.to_string()))?;
        } else {
            insert
                .columns([Alias::new(&self.column)])
                .values([Expr::value(name)])
                .map_err(|e| MigratorError::QueryBuild(e.to_string()))?;
        }

        let backend = conn.get_database_backend();
        crate::exec(conn, backend.build(&insert)).await?;
        Ok(())
    }

    /// Removes a migration record.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn unlog<C: ConnectionTrait>(&self, conn: &C, name: &str) -> MigratorResult<()> {
        let mut delete = Query::delete();
        delete
            .from_table(self.table_ref())
            .and_where(Expr::col(Alias::new(&self.column)).eq(name));

        let backend = conn.get_database_backend();
        crate::exec(conn, backend.build(&delete)).await?;
        Ok(())
    }
}
