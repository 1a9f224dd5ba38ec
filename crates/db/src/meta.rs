//! Tracking-table schema maintenance.
//!
//! The tracking table has two known layouts: the legacy single-column
//! shape (just the name column) and the current three-column shape with a
//! timestamp pair. The reconciler classifies the live table; the upgrade
//! routine rebuilds a legacy table into the current shape.

use chrono::Utc;
use sea_orm::sea_query::{Alias, ColumnDef, Expr, Order, Query, Table};
use sea_orm::{ConnectionTrait, TransactionTrait};

use crate::error::{MigratorError, MigratorResult};
use crate::inspect;
use crate::logging::log_line;
use crate::runner::Runner;
use crate::storage::{CREATED_AT, TrackingTable, UPDATED_AT};

/// Suffix appended to the tracking table name while rebuilding it.
const BACKUP_SUFFIX: &str = "Backup";

/// Detected layout of the tracking table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaShape {
    /// Single name column.
    Legacy,
    /// Name column plus the timestamp pair.
    Current,
    /// Neither known layout; left untouched.
    Undetermined,
}

/// Classifies a column set against the known tracking-table layouts.
fn classify(columns: &[String], name_column: &str) -> MetaShape {
    if columns.len() == 1 && columns[0] == name_column {
        MetaShape::Legacy
    } else if columns.len() == 3 && columns.iter().any(|c| c == CREATED_AT) {
        MetaShape::Current
    } else {
        MetaShape::Undetermined
    }
}

/// Verifies the tracking table exists and returns its columns.
async fn meta_table_columns<C: ConnectionTrait>(
    conn: &C,
    storage: &TrackingTable,
) -> MigratorResult<Vec<String>> {
    let tables = inspect::list_tables(conn, storage.schema()).await?;
    if !tables.iter().any(|t| t == storage.table()) {
        return Err(MigratorError::MissingTrackingTable(
            storage.table().to_string(),
        ));
    }
    Ok(inspect::table_columns(conn, storage.schema(), storage.table()).await?)
}

/// Reconciles the runner with the live tracking-table layout.
///
/// When the current (timestamped) shape is detected, timestamp mode is
/// enabled on the runner's storage backend so subsequent writes populate
/// the timestamp columns. The legacy shape needs no action, and an
/// unrecognized shape is reported as [`MetaShape::Undetermined`] without
/// touching anything.
///
/// # Errors
///
/// Fails with [`MigratorError::MissingTrackingTable`] when the table does
/// not exist, or if introspection fails.
pub async fn ensure_current_meta_schema(runner: &mut Runner) -> MigratorResult<MetaShape> {
    log_line("Checking tracking-table schema");

    let columns = meta_table_columns(runner.db(), runner.storage()).await?;
    let shape = classify(&columns, runner.storage().column());

    if shape == MetaShape::Current {
        runner.storage_mut().enable_timestamps();
    }
    Ok(shape)
}

/// Upgrades a legacy tracking table to the current timestamped layout.
///
/// No-op when the table already carries a `createdAt` column. Otherwise
/// the table is renamed to a backup, recreated with the timestamp pair,
/// and the recorded rows are copied back with fresh timestamps. The whole
/// rebuild runs inside one transaction; on backends with transactional
/// DDL a failure leaves the original table in place. The backup is
/// dropped before the transaction commits, so no backup table remains
/// visible after success.
///
/// # Errors
///
/// Fails with [`MigratorError::MissingTrackingTable`] when the table does
/// not exist, or if any rebuild step fails.
pub async fn add_timestamps(runner: &mut Runner) -> MigratorResult<()> {
    let columns = meta_table_columns(runner.db(), runner.storage()).await?;
    if columns.iter().any(|c| c == CREATED_AT) {
        return Ok(());
    }

    ensure_current_meta_schema(runner).await?;

    let storage = runner.storage().clone();
    let backend = runner.db().get_database_backend();
    let backup = format!("{}{BACKUP_SUFFIX}", storage.table());

    let txn = runner.db().begin().await?;

    let mut rename = Table::rename();
    rename.table(storage.table_ref(), Alias::new(&backup));
    crate::exec(&txn, backend.build(&rename)).await?;

    let mut select = Query::select();
    select
        .column(Alias::new(storage.column()))
        .from(storage.ref_for(&backup))
        .order_by(Alias::new(storage.column()), Order::Asc);
    let rows = crate::query_all(&txn, backend.build(&select)).await?;
    let names = rows
        .iter()
        .map(|row| row.try_get::<String>("", storage.column()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut create = Table::create();
    create
        .table(storage.table_ref())
        .col(
            ColumnDef::new(Alias::new(storage.column()))
                .string()
                .not_null()
                .unique_key()
                .primary_key(),
        )
        .col(ColumnDef::new(Alias::new(CREATED_AT)).date_time().not_null())
        .col(ColumnDef::new(Alias::new(UPDATED_AT)).date_time().not_null());
    crate::exec(&txn, backend.build(&create)).await?;

    if !names.is_empty() {
        let now = Utc::now().naive_utc();
        let mut insert = Query::insert();
        insert.into_table(storage.table_ref()).columns([
            Alias::new(storage.column()),
            Alias::new(CREATED_AT),
            Alias::new(UPDATED_AT),
        ]);
        for name in &names {
            insert
                .values([Expr::value(name.as_str()), Expr::value(now), Expr::value(now)])
                .map_err(|e| MigratorError::QueryBuild(e.to_string()))?;
        }
        crate::exec(&txn, backend.build(&insert)).await?;
    }

    let mut drop = Table::drop();
    drop.table(storage.ref_for(&backup));
    crate::exec(&txn, backend.build(&drop)).await?;

    txn.commit().await?;

    runner.storage_mut().enable_timestamps();
    log_line(&format!(
        "Upgraded \"{}\" with timestamp columns ({} rows copied)",
        storage.table(),
        names.len()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[rstest]
    #[case(&["name"], MetaShape::Legacy)]
    #[case(&["name", "createdAt", "updatedAt"], MetaShape::Current)]
    #[case(&["createdAt", "updatedAt", "name"], MetaShape::Current)]
    #[case(&["name", "createdAt"], MetaShape::Undetermined)]
    #[case(&["id"], MetaShape::Undetermined)]
    #[case(&["name", "checksum", "applied_at"], MetaShape::Undetermined)]
    #[case(&[], MetaShape::Undetermined)]
    fn test_classify(#[case] columns: &[&str], #[case] expected: MetaShape) {
        assert_eq!(classify(&cols(columns), "name"), expected);
    }

    #[test]
    fn test_classify_uses_configured_name_column() {
        assert_eq!(classify(&cols(&["version"]), "version"), MetaShape::Legacy);
        assert_eq!(classify(&cols(&["version"]), "name"), MetaShape::Undetermined);
    }
}
