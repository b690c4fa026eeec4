use chrono::{DateTime, Utc};
use renshu_core::model::{AchievementId, UnitKey};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{conn, ser, u32_from_i64},
};
use crate::repository::{ProgressRecord, ProgressRepository, StorageError};

fn map_progress_row(row: &sqlx::sqlite::SqliteRow) -> Result<ProgressRecord, StorageError> {
    let unit_key: String = row.try_get("unit_key").map_err(ser)?;
    let achievement_id: Option<String> = row.try_get("achievement_id").map_err(ser)?;
    let points = u32_from_i64("points", row.try_get::<i64, _>("points").map_err(ser)?)?;
    let completed_at: DateTime<Utc> = row.try_get("completed_at").map_err(ser)?;
    let meta: Option<String> = row.try_get("meta").map_err(ser)?;

    Ok(ProgressRecord {
        unit_key: UnitKey::new(unit_key),
        achievement_id: achievement_id.map(AchievementId::new),
        points,
        completed_at,
        meta,
    })
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn try_award(&self, record: &ProgressRecord) -> Result<bool, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO unit_progress (unit_key, achievement_id, points, completed_at, meta)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(unit_key) DO NOTHING
            ",
        )
        .bind(record.unit_key.as_str())
        .bind(record.achievement_id.as_ref().map(AchievementId::as_str))
        .bind(i64::from(record.points))
        .bind(record.completed_at)
        .bind(record.meta.as_deref())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.rows_affected() > 0)
    }

    async fn get_progress(&self, unit_key: &UnitKey) -> Result<ProgressRecord, StorageError> {
        let row = sqlx::query(
            r"
                SELECT unit_key, achievement_id, points, completed_at, meta
                FROM unit_progress
                WHERE unit_key = ?1
            ",
        )
        .bind(unit_key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_progress_row(&row)
    }

    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT unit_key, achievement_id, points, completed_at, meta
                FROM unit_progress
                ORDER BY completed_at DESC, unit_key ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_progress_row(&row)?);
        }
        Ok(out)
    }

    async fn total_xp(&self) -> Result<u64, StorageError> {
        let row = sqlx::query(
            r"
                SELECT COALESCE(SUM(points), 0) AS total
                FROM unit_progress
            ",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        let total: i64 = row.try_get("total").map_err(ser)?;
        u64::try_from(total).map_err(|_| StorageError::Serialization(format!("invalid total: {total}")))
    }
}
