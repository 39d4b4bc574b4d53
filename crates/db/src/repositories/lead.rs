use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use focal_core::domain::client::Client;
use focal_core::domain::lead::{Lead, LeadId, LeadStatus};

use super::{parse_status, parse_timestamp, parse_uuid, LeadRepository, RepositoryError};
use crate::DbPool;

const LEAD_COLUMNS: &str = "id,
                name,
                email,
                phone,
                source,
                notes,
                status,
                created_at,
                updated_at";

pub struct SqlLeadRepository {
    pool: DbPool,
}

impl SqlLeadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadRepository for SqlLeadRepository {
    async fn insert(&self, lead: Lead) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO lead (
                id,
                name,
                email,
                phone,
                source,
                notes,
                status,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(lead.id.0.to_string())
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(lead.phone.as_deref())
        .bind(lead.source.as_deref())
        .bind(lead.notes.as_deref())
        .bind(lead.status.as_str())
        .bind(lead.created_at.to_rfc3339())
        .bind(lead.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, lead: Lead) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE lead SET
                name = ?,
                email = ?,
                phone = ?,
                source = ?,
                notes = ?,
                status = ?,
                updated_at = ?
             WHERE id = ?",
        )
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(lead.phone.as_deref())
        .bind(lead.source.as_deref())
        .bind(lead.notes.as_deref())
        .bind(lead.status.as_str())
        .bind(lead.updated_at.to_rfc3339())
        .bind(lead.id.0.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {LEAD_COLUMNS} FROM lead WHERE id = ?"))
            .bind(id.0.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(lead_from_row).transpose()
    }

    async fn list(
        &self,
        status: Option<LeadStatus>,
        limit: u32,
    ) -> Result<Vec<Lead>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {LEAD_COLUMNS}
             FROM lead
             WHERE (?1 IS NULL OR status = ?1)
             ORDER BY created_at DESC
             LIMIT ?2"
        ))
        .bind(status.map(|value| value.as_str()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(lead_from_row).collect()
    }

    async fn convert(&self, lead: Lead, client: Client) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE lead SET status = ?, updated_at = ? WHERE id = ? AND status != 'CONVERTED'",
        )
        .bind(LeadStatus::Converted.as_str())
        .bind(lead.updated_at.to_rfc3339())
        .bind(lead.id.0.to_string())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(RepositoryError::Decode(format!(
                "lead `{}` was already converted or does not exist",
                lead.id.0
            )));
        }

        sqlx::query(
            "INSERT INTO client (
                id,
                first_name,
                last_name,
                email,
                phone,
                notes,
                status,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(client.id.0.to_string())
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.email)
        .bind(client.phone.as_deref())
        .bind(client.notes.as_deref())
        .bind(client.status.as_str())
        .bind(client.created_at.to_rfc3339())
        .bind(client.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: &LeadId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM lead WHERE id = ?")
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn lead_from_row(row: SqliteRow) -> Result<Lead, RepositoryError> {
    Ok(Lead {
        id: LeadId(parse_uuid("id", row.get("id"))?),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        source: row.get("source"),
        notes: row.get("notes"),
        status: parse_status("status", row.get("status"), LeadStatus::parse)?,
        created_at: parse_timestamp("created_at", row.get("created_at"))?,
        updated_at: parse_timestamp("updated_at", row.get("updated_at"))?,
    })
}
