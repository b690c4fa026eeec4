use chrono::{DateTime, Utc};
use renshu_core::model::{SessionSummary, UnitKey};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{conn, ser, u32_from_i64},
};
use crate::repository::{SessionSummaryRepository, StorageError};

fn map_summary_row(row: &sqlx::sqlite::SqliteRow) -> Result<SessionSummary, StorageError> {
    let unit_key: String = row.try_get("unit_key").map_err(ser)?;
    let started_at: DateTime<Utc> = row.try_get("started_at").map_err(ser)?;
    let completed_at: DateTime<Utc> = row.try_get("completed_at").map_err(ser)?;
    let total_items = u32_from_i64(
        "total_items",
        row.try_get::<i64, _>("total_items").map_err(ser)?,
    )?;
    let correct = u32_from_i64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?;
    let incorrect = u32_from_i64(
        "incorrect",
        row.try_get::<i64, _>("incorrect").map_err(ser)?,
    )?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let best_streak = u32_from_i64(
        "best_streak",
        row.try_get::<i64, _>("best_streak").map_err(ser)?,
    )?;

    SessionSummary::from_persisted(
        UnitKey::new(unit_key),
        started_at,
        completed_at,
        total_items,
        correct,
        incorrect,
        score,
        best_streak,
    )
    .map_err(ser)
}

#[async_trait::async_trait]
impl SessionSummaryRepository for SqliteRepository {
    async fn append_summary(&self, summary: &SessionSummary) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO session_summaries (
                    unit_key, started_at, completed_at, total_items,
                    correct, incorrect, score, best_streak
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(summary.unit_key().as_str())
        .bind(summary.started_at())
        .bind(summary.completed_at())
        .bind(i64::from(summary.total_items()))
        .bind(i64::from(summary.correct()))
        .bind(i64::from(summary.incorrect()))
        .bind(i64::from(summary.score()))
        .bind(i64::from(summary.best_streak()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn list_summaries(
        &self,
        unit_key: &UnitKey,
        limit: u32,
    ) -> Result<Vec<SessionSummary>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT unit_key, started_at, completed_at, total_items,
                       correct, incorrect, score, best_streak
                FROM session_summaries
                WHERE unit_key = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(unit_key.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_summary_row(&row)?);
        }
        Ok(out)
    }
}
