//! Integration tests for tracking-table schema maintenance.

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use tempfile::TempDir;
use tidemark_db::{
    MetaShape, MigratorError, Runner, ScriptDiscovery, TrackingTable, add_timestamps,
    ensure_current_meta_schema, inspect,
};

/// File-backed SQLite database so every pooled connection sees the same data.
async fn sqlite_db(dir: &TempDir) -> DatabaseConnection {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
    Database::connect(&url).await.expect("Failed to open sqlite database")
}

fn meta_runner(db: DatabaseConnection) -> Runner {
    Runner::new(
        db,
        TrackingTable::new("SequelizeMeta", "name"),
        ScriptDiscovery::new("migrations"),
    )
}

async fn create_legacy_table(db: &DatabaseConnection) {
    db.execute_unprepared(
        "CREATE TABLE \"SequelizeMeta\" (\"name\" varchar NOT NULL PRIMARY KEY)",
    )
    .await
    .expect("Failed to create legacy table");
}

async fn create_current_table(db: &DatabaseConnection) {
    db.execute_unprepared(
        "CREATE TABLE \"SequelizeMeta\" (\
         \"name\" varchar NOT NULL PRIMARY KEY, \
         \"createdAt\" datetime NOT NULL, \
         \"updatedAt\" datetime NOT NULL)",
    )
    .await
    .expect("Failed to create current table");
}

async fn count_rows_with_timestamps(db: &DatabaseConnection) -> i64 {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            "SELECT COUNT(*) AS c FROM \"SequelizeMeta\" \
             WHERE \"createdAt\" IS NOT NULL AND \"updatedAt\" IS NOT NULL",
        ))
        .await
        .expect("Count query failed")
        .expect("Count query returned no row");
    row.try_get("", "c").expect("Count column missing")
}

#[tokio::test]
async fn test_reconciler_detects_legacy_shape() {
    let dir = TempDir::new().unwrap();
    let db = sqlite_db(&dir).await;
    create_legacy_table(&db).await;

    let mut runner = meta_runner(db);
    let shape = ensure_current_meta_schema(&mut runner).await.unwrap();

    assert_eq!(shape, MetaShape::Legacy);
    assert!(!runner.storage().timestamps());

    // No mutation: still the single name column.
    let columns = inspect::table_columns(runner.db(), None, "SequelizeMeta")
        .await
        .unwrap();
    assert_eq!(columns, vec!["name"]);
}

#[tokio::test]
async fn test_reconciler_detects_current_shape_and_enables_timestamps() {
    let dir = TempDir::new().unwrap();
    let db = sqlite_db(&dir).await;
    create_current_table(&db).await;

    let mut runner = meta_runner(db);
    let shape = ensure_current_meta_schema(&mut runner).await.unwrap();

    assert_eq!(shape, MetaShape::Current);
    assert!(runner.storage().timestamps());

    let columns = inspect::table_columns(runner.db(), None, "SequelizeMeta")
        .await
        .unwrap();
    assert_eq!(columns.len(), 3);
}

#[tokio::test]
async fn test_reconciler_reports_missing_table() {
    let dir = TempDir::new().unwrap();
    let db = sqlite_db(&dir).await;

    let mut runner = meta_runner(db);
    let err = ensure_current_meta_schema(&mut runner).await.unwrap_err();

    assert!(matches!(err, MigratorError::MissingTrackingTable(ref t) if t == "SequelizeMeta"));
}

#[tokio::test]
async fn test_reconciler_leaves_unknown_shape_alone() {
    let dir = TempDir::new().unwrap();
    let db = sqlite_db(&dir).await;
    db.execute_unprepared(
        "CREATE TABLE \"SequelizeMeta\" (\"name\" varchar NOT NULL, \"checksum\" varchar)",
    )
    .await
    .unwrap();

    let mut runner = meta_runner(db);
    let shape = ensure_current_meta_schema(&mut runner).await.unwrap();

    assert_eq!(shape, MetaShape::Undetermined);
    assert!(!runner.storage().timestamps());
}

#[tokio::test]
async fn test_upgrade_rebuilds_legacy_table_with_timestamps() {
    let dir = TempDir::new().unwrap();
    let db = sqlite_db(&dir).await;
    create_legacy_table(&db).await;
    db.execute_unprepared("INSERT INTO \"SequelizeMeta\" (\"name\") VALUES ('001-init.js')")
        .await
        .unwrap();

    let mut runner = meta_runner(db);
    add_timestamps(&mut runner).await.unwrap();

    // Current shape with the row preserved and timestamps populated.
    let mut columns = inspect::table_columns(runner.db(), None, "SequelizeMeta")
        .await
        .unwrap();
    columns.sort();
    assert_eq!(columns, vec!["createdAt", "name", "updatedAt"]);

    assert_eq!(runner.applied().await.unwrap(), vec!["001-init.js"]);
    assert_eq!(count_rows_with_timestamps(runner.db()).await, 1);

    // The backup table was superseded and dropped.
    let tables = inspect::list_tables(runner.db(), None).await.unwrap();
    assert!(!tables.iter().any(|t| t == "SequelizeMetaBackup"));

    // The storage backend now writes timestamps.
    assert!(runner.storage().timestamps());
}

#[tokio::test]
async fn test_upgrade_is_noop_when_created_at_exists() {
    let dir = TempDir::new().unwrap();
    let db = sqlite_db(&dir).await;
    create_current_table(&db).await;
    db.execute_unprepared(
        "INSERT INTO \"SequelizeMeta\" VALUES \
         ('001-init.js', '2024-01-01 00:00:00', '2024-01-01 00:00:00')",
    )
    .await
    .unwrap();

    let mut runner = meta_runner(db);
    add_timestamps(&mut runner).await.unwrap();

    // No rename, no rebuild: the original row and shape are untouched.
    let tables = inspect::list_tables(runner.db(), None).await.unwrap();
    assert!(!tables.iter().any(|t| t == "SequelizeMetaBackup"));
    assert_eq!(runner.applied().await.unwrap(), vec!["001-init.js"]);
}

#[tokio::test]
async fn test_upgrade_propagates_missing_table() {
    let dir = TempDir::new().unwrap();
    let db = sqlite_db(&dir).await;

    let mut runner = meta_runner(db);
    let err = add_timestamps(&mut runner).await.unwrap_err();

    assert!(matches!(err, MigratorError::MissingTrackingTable(_)));
}

#[tokio::test]
async fn test_upgrade_copies_multiple_rows_in_order() {
    let dir = TempDir::new().unwrap();
    let db = sqlite_db(&dir).await;
    create_legacy_table(&db).await;
    db.execute_unprepared(
        "INSERT INTO \"SequelizeMeta\" (\"name\") VALUES \
         ('002-users.js'), ('001-init.js'), ('003-orders.js')",
    )
    .await
    .unwrap();

    let mut runner = meta_runner(db);
    add_timestamps(&mut runner).await.unwrap();

    assert_eq!(
        runner.applied().await.unwrap(),
        vec!["001-init.js", "002-users.js", "003-orders.js"]
    );
    assert_eq!(count_rows_with_timestamps(runner.db()).await, 3);
}
