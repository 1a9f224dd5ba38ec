//! Schema introspection.
//!
//! Raw, dialect-specific queries for listing tables and describing columns.
//! SQLite keeps its catalog in `sqlite_master` / `PRAGMA table_info`; the
//! server dialects expose `information_schema`.

use sea_orm::{ConnectionTrait, DbBackend, DbErr, Statement};

/// Lists the tables visible in the given schema (or the dialect default).
///
/// # Errors
///
/// Returns an error if the catalog query fails.
pub async fn list_tables<C: ConnectionTrait>(
    conn: &C,
    schema: Option<&str>,
) -> Result<Vec<String>, DbErr> {
    let backend = conn.get_database_backend();
    let stmt = match backend {
        DbBackend::Postgres => Statement::from_sql_and_values(
            backend,
            "SELECT table_name FROM information_schema.tables WHERE table_schema = $1",
            [schema.unwrap_or("public").into()],
        ),
        DbBackend::MySql => Statement::from_string(
            backend,
            "SELECT table_name FROM information_schema.tables WHERE table_schema = DATABASE()",
        ),
        DbBackend::Sqlite => Statement::from_string(
            backend,
            "SELECT name AS table_name FROM sqlite_master WHERE type = 'table'",
        ),
    };

    let rows = crate::query_all(conn, stmt).await?;
    rows.iter()
        .map(|row| row.try_get("", "table_name"))
        .collect()
}

/// Returns the column names of a table.
///
/// # Errors
///
/// Returns an error if the catalog query fails.
pub async fn table_columns<C: ConnectionTrait>(
    conn: &C,
    schema: Option<&str>,
    table: &str,
) -> Result<Vec<String>, DbErr> {
    let backend = conn.get_database_backend();
    let stmt = match backend {
        DbBackend::Postgres => Statement::from_sql_and_values(
            backend,
            "SELECT column_name FROM information_schema.columns \
             WHERE table_schema = $1 AND table_name = $2",
            [schema.unwrap_or("public").into(), table.into()],
        ),
        DbBackend::MySql => Statement::from_sql_and_values(
            backend,
            "SELECT column_name FROM information_schema.columns \
             WHERE table_schema = DATABASE() AND table_name = ?",
            [table.into()],
        ),
        DbBackend::Sqlite => Statement::from_string(
            backend,
            format!(
                "SELECT name AS column_name FROM pragma_table_info('{}')",
                table.replace('\'', "''")
            ),
        ),
    };

    let rows = crate::query_all(conn, stmt).await?;
    rows.iter()
        .map(|row| row.try_get("", "column_name"))
        .collect()
}
