pub mod database_error;
pub mod database_path;
pub mod helper;
pub mod models;
pub mod repository;
pub mod repository_manager;

use std::{str::FromStr, sync::Arc};

use sqlx::{
    Pool, Sqlite, SqlitePool, migrate,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::database_error::DatabaseError;

/// Connects to the database at `database_url`, creating the file if needed, and runs
/// pending migrations.
pub async fn get_db_pool(database_url: &str) -> Result<Arc<Pool<Sqlite>>, DatabaseError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| DatabaseError::DbError(format!("Failed to run migrations: {}", e)))?;

    tracing::info!("Database ready at {}", database_url);
    Ok(Arc::new(pool))
}

pub async fn setup_test_db() -> SqlitePool {
    // every connection to sqlite::memory: opens a separate database, so the pool is
    // pinned to a single connection that is never recycled
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to connect to the in-memory SQLite database");

    migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}
