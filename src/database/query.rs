//! Raw sqlx query helpers for the level library.

use crate::database::models::LevelRow;
use sqlx::SqlitePool;

const LEVEL_COLUMNS: &str = "level_id, hash, path, song_name, song_sub_name, \
     song_author_name, level_author_name, bpm, duration, preview_start_time, \
     preview_duration, cover_file, audio_file";

/// Clears the level table (used before a rescan).
pub async fn clear_all(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM level").execute(pool).await?;
    Ok(())
}

/// Inserts or updates a level row. Returns its level id.
pub async fn insert_level(pool: &SqlitePool, level: &LevelRow) -> Result<String, sqlx::Error> {
    let existing: Option<String> =
        sqlx::query_scalar("SELECT level_id FROM level WHERE level_id = ?1")
            .bind(&level.level_id)
            .fetch_optional(pool)
            .await?;

    match existing {
        Some(level_id) => {
            sqlx::query(
                "UPDATE level SET hash = ?1, path = ?2, song_name = ?3, song_sub_name = ?4, song_author_name = ?5, level_author_name = ?6, bpm = ?7, duration = ?8, preview_start_time = ?9, preview_duration = ?10, cover_file = ?11, audio_file = ?12 WHERE level_id = ?13"
            )
            .bind(&level.hash)
            .bind(&level.path)
            .bind(&level.song_name)
            .bind(&level.song_sub_name)
            .bind(&level.song_author_name)
            .bind(&level.level_author_name)
            .bind(level.bpm)
            .bind(level.duration)
            .bind(level.preview_start_time)
            .bind(level.preview_duration)
            .bind(&level.cover_file)
            .bind(&level.audio_file)
            .bind(&level_id)
            .execute(pool)
            .await?;
            Ok(level_id)
        }
        None => {
            sqlx::query(
                "INSERT INTO level (level_id, hash, path, song_name, song_sub_name, song_author_name, level_author_name, bpm, duration, preview_start_time, preview_duration, cover_file, audio_file) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            )
            .bind(&level.level_id)
            .bind(&level.hash)
            .bind(&level.path)
            .bind(&level.song_name)
            .bind(&level.song_sub_name)
            .bind(&level.song_author_name)
            .bind(&level.level_author_name)
            .bind(level.bpm)
            .bind(level.duration)
            .bind(level.preview_start_time)
            .bind(level.preview_duration)
            .bind(&level.cover_file)
            .bind(&level.audio_file)
            .execute(pool)
            .await?;
            Ok(level.level_id.clone())
        }
    }
}

pub async fn get_level(pool: &SqlitePool, level_id: &str) -> Result<Option<LevelRow>, sqlx::Error> {
    sqlx::query_as::<_, LevelRow>(&format!(
        "SELECT {} FROM level WHERE level_id = ?1",
        LEVEL_COLUMNS
    ))
    .bind(level_id)
    .fetch_optional(pool)
    .await
}

/// Hashes are compared case-insensitively; catalogs disagree on casing.
pub async fn get_level_by_hash(
    pool: &SqlitePool,
    hash: &str,
) -> Result<Option<LevelRow>, sqlx::Error> {
    sqlx::query_as::<_, LevelRow>(&format!(
        "SELECT {} FROM level WHERE hash = ?1 COLLATE NOCASE LIMIT 1",
        LEVEL_COLUMNS
    ))
    .bind(hash)
    .fetch_optional(pool)
    .await
}

pub async fn get_all_levels(pool: &SqlitePool) -> Result<Vec<LevelRow>, sqlx::Error> {
    sqlx::query_as::<_, LevelRow>(&format!(
        "SELECT {} FROM level ORDER BY song_name, level_id",
        LEVEL_COLUMNS
    ))
    .fetch_all(pool)
    .await
}

/// Returns whether a row was deleted.
pub async fn remove_level(pool: &SqlitePool, level_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM level WHERE level_id = ?1")
        .bind(level_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_levels(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM level")
        .fetch_one(pool)
        .await
}
