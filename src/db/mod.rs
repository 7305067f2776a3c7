use crate::config::Config;
use crate::errors::AppError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub mod queries;


/// Initialize the SQLite connection pool with appropriate options.
///
/// # Arguments
///
/// * `config` - Loaded process configuration (database URL and pool size).
///
/// # Errors
///
/// * `AppError::Database` - If the URL is invalid or the database cannot be opened.
pub async fn init_pool(config: &Config) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(&config.db_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Creates the `tasks` table.
///
/// When `init_path` is given its SQL is executed as-is; otherwise the bundled
/// migrations are applied.
pub async fn init_schema(pool: &SqlitePool, init_path: Option<&Path>) -> Result<(), AppError> {
    match init_path {
        Some(path) => {
            let script = tokio::fs::read_to_string(path).await?;
            sqlx::raw_sql(&script).execute(pool).await?;
            tracing::info!(path = %path.display(), "Schema script executed.");
        }
        None => {
            sqlx::migrate!("./migrations").run(pool).await?;
            tracing::info!("Migrations applied successfully.");
        }
    }

    Ok(())
}
