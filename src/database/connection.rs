use crate::database::models::LevelRow;
use crate::database::query;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the library database at `db_path`, creating the file and any
    /// missing parent folders first.
    pub async fn open(db_path: &Path) -> Result<Self, sqlx::Error> {
        if let Some(folder) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(folder)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(std::path::absolute(db_path)?)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let db = Database { pool };
        db.init_schema().await?;
        log::info!("LIBRARY: opened database at {:?}", db_path);
        Ok(db)
    }

    /// Private in-memory database. A single connection keeps every query on
    /// the same memory instance.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let db = Database { pool };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS level (
                level_id TEXT PRIMARY KEY,
                hash TEXT NOT NULL,
                path TEXT NOT NULL,
                song_name TEXT NOT NULL,
                song_sub_name TEXT NOT NULL DEFAULT '',
                song_author_name TEXT NOT NULL DEFAULT '',
                level_author_name TEXT NOT NULL DEFAULT '',
                bpm REAL NOT NULL DEFAULT 0,
                duration REAL NOT NULL DEFAULT 0,
                preview_start_time REAL NOT NULL DEFAULT 0,
                preview_duration REAL NOT NULL DEFAULT 0,
                cover_file TEXT,
                audio_file TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_level_hash ON level(hash)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Waits for every pooled connection to close.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn clear_all(&self) -> Result<(), sqlx::Error> {
        query::clear_all(&self.pool).await
    }

    pub async fn insert_level(&self, level: &LevelRow) -> Result<String, sqlx::Error> {
        query::insert_level(&self.pool, level).await
    }

    pub async fn get_level(&self, level_id: &str) -> Result<Option<LevelRow>, sqlx::Error> {
        query::get_level(&self.pool, level_id).await
    }

    pub async fn get_level_by_hash(&self, hash: &str) -> Result<Option<LevelRow>, sqlx::Error> {
        query::get_level_by_hash(&self.pool, hash).await
    }

    pub async fn get_all_levels(&self) -> Result<Vec<LevelRow>, sqlx::Error> {
        query::get_all_levels(&self.pool).await
    }

    pub async fn remove_level(&self, level_id: &str) -> Result<bool, sqlx::Error> {
        query::remove_level(&self.pool, level_id).await
    }

    pub async fn count_levels(&self) -> Result<i64, sqlx::Error> {
        query::count_levels(&self.pool).await
    }
}
