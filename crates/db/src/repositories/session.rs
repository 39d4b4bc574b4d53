use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use focal_core::domain::client::ClientId;
use focal_core::domain::session::{PhotographySession, SessionId, SessionStatus};

use super::{
    parse_decimal, parse_status, parse_timestamp, parse_u32_column, parse_uuid, RepositoryError,
    SessionRepository,
};
use crate::DbPool;

const SESSION_COLUMNS: &str = "id,
                client_id,
                session_type,
                title,
                location,
                start_time,
                duration_minutes,
                price,
                status,
                created_at,
                updated_at";

pub struct SqlSessionRepository {
    pool: DbPool,
}

impl SqlSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for SqlSessionRepository {
    async fn insert(&self, session: PhotographySession) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO photography_session (
                id,
                client_id,
                session_type,
                title,
                location,
                start_time,
                duration_minutes,
                price,
                status,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(session.id.0.to_string())
        .bind(session.client_id.0.to_string())
        .bind(&session.session_type)
        .bind(&session.title)
        .bind(session.location.as_deref())
        .bind(session.start_time.to_rfc3339())
        .bind(i64::from(session.duration_minutes))
        .bind(session.price.to_string())
        .bind(session.status.as_str())
        .bind(session.created_at.to_rfc3339())
        .bind(session.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, session: PhotographySession) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE photography_session SET
                client_id = ?,
                session_type = ?,
                title = ?,
                location = ?,
                start_time = ?,
                duration_minutes = ?,
                price = ?,
                status = ?,
                updated_at = ?
             WHERE id = ?",
        )
        .bind(session.client_id.0.to_string())
        .bind(&session.session_type)
        .bind(&session.title)
        .bind(session.location.as_deref())
        .bind(session.start_time.to_rfc3339())
        .bind(i64::from(session.duration_minutes))
        .bind(session.price.to_string())
        .bind(session.status.as_str())
        .bind(session.updated_at.to_rfc3339())
        .bind(session.id.0.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_by_id(
        &self,
        id: &SessionId,
    ) -> Result<Option<PhotographySession>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM photography_session WHERE id = ?"
        ))
        .bind(id.0.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(session_from_row).transpose()
    }

    async fn list(
        &self,
        client_id: Option<&ClientId>,
        status: Option<SessionStatus>,
        limit: u32,
    ) -> Result<Vec<PhotographySession>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS}
             FROM photography_session
             WHERE (?1 IS NULL OR client_id = ?1)
               AND (?2 IS NULL OR status = ?2)
             ORDER BY start_time ASC
             LIMIT ?3"
        ))
        .bind(client_id.map(|value| value.0.to_string()))
        .bind(status.map(|value| value.as_str()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(session_from_row).collect()
    }

    async fn list_blocking_on_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<PhotographySession>, RepositoryError> {
        let day_start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
        let day_end = day_start + Duration::days(1);

        let rows = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS}
             FROM photography_session
             WHERE status != 'CANCELLED'
               AND start_time >= ?
               AND start_time < ?
             ORDER BY start_time ASC"
        ))
        .bind(day_start.to_rfc3339())
        .bind(day_end.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(session_from_row).collect()
    }

    async fn delete(&self, id: &SessionId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM photography_session WHERE id = ?")
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn session_from_row(row: SqliteRow) -> Result<PhotographySession, RepositoryError> {
    Ok(PhotographySession {
        id: SessionId(parse_uuid("id", row.get("id"))?),
        client_id: ClientId(parse_uuid("client_id", row.get("client_id"))?),
        session_type: row.get("session_type"),
        title: row.get("title"),
        location: row.get("location"),
        start_time: parse_timestamp("start_time", row.get("start_time"))?,
        duration_minutes: parse_u32_column("duration_minutes", row.get("duration_minutes"))?,
        price: parse_decimal("price", row.get("price"))?,
        status: parse_status("status", row.get("status"), SessionStatus::parse)?,
        created_at: parse_timestamp("created_at", row.get("created_at"))?,
        updated_at: parse_timestamp("updated_at", row.get("updated_at"))?,
    })
}
