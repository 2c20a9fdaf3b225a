use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::error::AppError;

const ANONYMOUS_TABLE_KEY: &str = "course_table_id";

/// Small key-value store on SQLite holding the anonymous course table id,
/// the counterpart of the browser's localStorage entry. Read at surface-open
/// time, written when a guest table is created.
#[derive(Clone)]
pub struct LocalStore {
    db: SqlitePool,
}

impl LocalStore {
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .map_err(|e| AppError::Config(format!("migration failed: {}", e)))?;
        Ok(Self { db })
    }

    pub async fn anonymous_table_id(&self) -> Result<Option<String>, AppError> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM local_state WHERE key = ?")
                .bind(ANONYMOUS_TABLE_KEY)
                .fetch_optional(&self.db)
                .await?;
        Ok(value)
    }

    /// Overwrites any previous id; recreating after expiry stores the new one.
    pub async fn set_anonymous_table_id(&self, table_id: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO local_state (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(ANONYMOUS_TABLE_KEY)
        .bind(table_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}
