//! End-to-end inserts into a throwaway SQLite database file.

use assert_matches::assert_matches;
use serde_json::json;
use sqlx::{AnyConnection, Connection};
use synth_core::types::Record;
use synth_destination::{DestinationInserter, InsertError, SqlInserter};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn row(value: serde_json::Value) -> Record {
    value.as_object().cloned().unwrap()
}

/// A fresh database file with a `users` table. Keep the returned dir alive.
async fn sqlite_destination() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let dsn = format!("sqlite://{}?mode=rwc", dir.path().join("dest.db").display());

    sqlx::any::install_default_drivers();
    let mut conn = AnyConnection::connect(&dsn).await.expect("connect");
    sqlx::query(
        "CREATE TABLE users (
             user_id   INTEGER PRIMARY KEY,
             full_name TEXT NOT NULL DEFAULT '',
             score     REAL,
             active    BOOLEAN,
             tags      TEXT
         )",
    )
    .execute(&mut conn)
    .await
    .expect("create table");
    conn.close().await.expect("close");

    (dir, dsn)
}

async fn count_users(dsn: &str) -> i64 {
    let mut conn = AnyConnection::connect(dsn).await.expect("connect");
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(&mut conn)
        .await
        .expect("count");
    conn.close().await.expect("close");
    count
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inserts_whole_batch() {
    let (_dir, dsn) = sqlite_destination().await;
    let rows = vec![
        row(json!({"user_id": 1, "full_name": "Ana", "score": 9.5, "active": true})),
        row(json!({"user_id": 2, "tags": ["a", "b"]})),
        row(json!({"user_id": 3, "full_name": "Bo", "score": null})),
    ];

    SqlInserter::new()
        .insert_batch(&dsn, "users", &rows)
        .await
        .expect("insert");

    assert_eq!(count_users(&dsn).await, 3);

    let mut conn = AnyConnection::connect(&dsn).await.expect("connect");
    let tags = sqlx::query_scalar::<_, String>("SELECT tags FROM users WHERE user_id = 2")
        .fetch_one(&mut conn)
        .await
        .expect("tags");
    assert_eq!(tags, r#"["a","b"]"#);
}

#[tokio::test]
async fn failing_row_rolls_back_the_batch() {
    let (_dir, dsn) = sqlite_destination().await;
    // Second row repeats the primary key.
    let rows = vec![
        row(json!({"user_id": 1, "full_name": "Ana"})),
        row(json!({"user_id": 1, "full_name": "Dup"})),
    ];

    let result = SqlInserter::new().insert_batch(&dsn, "users", &rows).await;

    assert_matches!(result, Err(InsertError::Database(_)));
    assert_eq!(count_users(&dsn).await, 0);
}

#[tokio::test]
async fn unknown_column_inserts_nothing() {
    let (_dir, dsn) = sqlite_destination().await;
    let rows = vec![
        row(json!({"user_id": 1})),
        row(json!({"user_id": 2, "email": "x@example.com"})),
    ];

    let result = SqlInserter::new().insert_batch(&dsn, "users", &rows).await;

    assert_matches!(result, Err(InsertError::UnknownColumn { column, .. }) if column == "email");
    assert_eq!(count_users(&dsn).await, 0);
}

#[tokio::test]
async fn missing_table_is_reported() {
    let (_dir, dsn) = sqlite_destination().await;
    let rows = vec![row(json!({"id": 1}))];

    let result = SqlInserter::new().insert_batch(&dsn, "orders", &rows).await;
    assert_matches!(result, Err(InsertError::TableNotFound(t)) if t == "orders");
}

#[tokio::test]
async fn empty_batch_never_connects() {
    // The DSN is unsupported, so any connection attempt would fail.
    let result = SqlInserter::new()
        .insert_batch("mssql://nowhere/db", "users", &[])
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn unreachable_destination_is_a_connect_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    // `mode=ro` refuses to create the missing file.
    let dsn = format!("sqlite://{}?mode=ro", dir.path().join("missing.db").display());

    let result = SqlInserter::new()
        .insert_batch(&dsn, "users", &[row(json!({"user_id": 1}))])
        .await;
    assert_matches!(result, Err(InsertError::Connect(_)));
}

#[tokio::test]
async fn describes_table_columns_in_order() {
    let (_dir, dsn) = sqlite_destination().await;

    let columns = SqlInserter::new().describe_table(&dsn, "users").await.unwrap();
    assert_eq!(columns, ["user_id", "full_name", "score", "active", "tags"]);
}

#[tokio::test]
async fn describing_a_missing_table_is_table_not_found() {
    let (_dir, dsn) = sqlite_destination().await;

    let result = SqlInserter::new().describe_table(&dsn, "orders").await;
    assert_matches!(result, Err(InsertError::TableNotFound(t)) if t == "orders");
}
