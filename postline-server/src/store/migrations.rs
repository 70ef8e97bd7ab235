//! Table bootstrap for the database backends
//!
//! Idempotent `CREATE TABLE IF NOT EXISTS` statements, run at startup.
//!
//! Pre-existing tables are kept as they are, so after creating we check that
//! `created_at` is `TIMESTAMPTZ`. Tables made with a plain `TIMESTAMP` column
//! can't be read as UTC instants and are rejected at startup.

use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use sqlx::PgPool;

use super::StoreError;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        id SERIAL PRIMARY KEY,
        title VARCHAR(255) NOT NULL,
        content TEXT NOT NULL,
        published BOOLEAN NOT NULL DEFAULT TRUE,
        rating INTEGER NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        email VARCHAR(255) NOT NULL UNIQUE,
        password VARCHAR(255) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

const TIMESTAMP_COLUMNS: &str = r#"
    SELECT table_name::text AS table_name, data_type::text AS data_type
    FROM information_schema.columns
    WHERE table_schema = current_schema()
      AND table_name IN ('posts', 'users')
      AND column_name = 'created_at'
"#;

const EXPECTED_TIMESTAMP_TYPE: &str = "timestamp with time zone";

/// Reject tables whose `created_at` column is not `TIMESTAMPTZ`
fn check_timestamp_columns(columns: &[(String, String)]) -> Result<(), StoreError> {
    match columns
        .iter()
        .find(|(_, data_type)| data_type != EXPECTED_TIMESTAMP_TYPE)
    {
        Some((table, data_type)) => Err(StoreError::IncompatibleSchema {
            table: table.clone(),
            column: "created_at",
            found: data_type.clone(),
            expected: EXPECTED_TIMESTAMP_TYPE,
        }),
        None => Ok(()),
    }
}

/// Create tables through a sqlx pool
pub async fn run(pool: &PgPool) -> Result<(), StoreError> {
    tracing::info!("Initializing posts and users tables");

    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    let columns: Vec<(String, String)> = sqlx::query_as(TIMESTAMP_COLUMNS)
        .fetch_all(pool)
        .await?;
    check_timestamp_columns(&columns)
}

/// Create tables through a sea-orm connection
pub async fn run_orm(db: &DatabaseConnection) -> Result<(), StoreError> {
    tracing::info!("Initializing posts and users tables");

    for statement in STATEMENTS {
        db.execute_unprepared(statement).await?;
    }

    let rows = db
        .query_all(Statement::from_string(
            DbBackend::Postgres,
            TIMESTAMP_COLUMNS.to_owned(),
        ))
        .await?;
    let columns = rows
        .iter()
        .map(|row| {
            Ok((
                row.try_get::<String>("", "table_name")?,
                row.try_get::<String>("", "data_type")?,
            ))
        })
        .collect::<Result<Vec<_>, sea_orm::DbErr>>()?;
    check_timestamp_columns(&columns)
}
