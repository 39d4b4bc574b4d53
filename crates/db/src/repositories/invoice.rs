use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use focal_core::domain::client::ClientId;
use focal_core::domain::invoice::{Invoice, InvoiceId, InvoiceStatus};
use focal_core::domain::session::SessionId;

use super::{
    parse_date, parse_decimal, parse_status, parse_timestamp, parse_uuid, InvoiceRepository,
    RepositoryError,
};
use crate::DbPool;

const INVOICE_COLUMNS: &str = "id,
                client_id,
                session_id,
                amount,
                description,
                due_date,
                status,
                created_at,
                updated_at";

pub struct SqlInvoiceRepository {
    pool: DbPool,
}

impl SqlInvoiceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvoiceRepository for SqlInvoiceRepository {
    async fn insert(&self, invoice: Invoice) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO invoice (
                id,
                client_id,
                session_id,
                amount,
                description,
                due_date,
                status,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(invoice.id.0.to_string())
        .bind(invoice.client_id.0.to_string())
        .bind(invoice.session_id.as_ref().map(|value| value.0.to_string()))
        .bind(invoice.amount.to_string())
        .bind(invoice.description.as_deref())
        .bind(invoice.due_date.map(|value| value.format("%Y-%m-%d").to_string()))
        .bind(invoice.status.as_str())
        .bind(invoice.created_at.to_rfc3339())
        .bind(invoice.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, invoice: Invoice) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE invoice SET
                client_id = ?,
                session_id = ?,
                amount = ?,
                description = ?,
                due_date = ?,
                status = ?,
                updated_at = ?
             WHERE id = ?",
        )
        .bind(invoice.client_id.0.to_string())
        .bind(invoice.session_id.as_ref().map(|value| value.0.to_string()))
        .bind(invoice.amount.to_string())
        .bind(invoice.description.as_deref())
        .bind(invoice.due_date.map(|value| value.format("%Y-%m-%d").to_string()))
        .bind(invoice.status.as_str())
        .bind(invoice.updated_at.to_rfc3339())
        .bind(invoice.id.0.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {INVOICE_COLUMNS} FROM invoice WHERE id = ?"))
            .bind(id.0.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(invoice_from_row).transpose()
    }

    async fn list(
        &self,
        client_id: Option<&ClientId>,
        status: Option<InvoiceStatus>,
        limit: u32,
    ) -> Result<Vec<Invoice>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {INVOICE_COLUMNS}
             FROM invoice
             WHERE (?1 IS NULL OR client_id = ?1)
               AND (?2 IS NULL OR status = ?2)
             ORDER BY created_at DESC
             LIMIT ?3"
        ))
        .bind(client_id.map(|value| value.0.to_string()))
        .bind(status.map(|value| value.as_str()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(invoice_from_row).collect()
    }

    async fn delete(&self, id: &InvoiceId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM invoice WHERE id = ?")
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn invoice_from_row(row: SqliteRow) -> Result<Invoice, RepositoryError> {
    let session_id = row
        .get::<Option<String>, _>("session_id")
        .map(|value| parse_uuid("session_id", value).map(SessionId))
        .transpose()?;
    let due_date =
        row.get::<Option<String>, _>("due_date").map(|value| parse_date("due_date", value)).transpose()?;

    Ok(Invoice {
        id: InvoiceId(parse_uuid("id", row.get("id"))?),
        client_id: ClientId(parse_uuid("client_id", row.get("client_id"))?),
        session_id,
        amount: parse_decimal("amount", row.get("amount"))?,
        description: row.get("description"),
        due_date,
        status: parse_status("status", row.get("status"), InvoiceStatus::parse)?,
        created_at: parse_timestamp("created_at", row.get("created_at"))?,
        updated_at: parse_timestamp("updated_at", row.get("updated_at"))?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use focal_core::domain::client::{Client, ClientId, ClientStatus};
    use focal_core::domain::invoice::{Invoice, InvoiceId, InvoiceStatus};

    use super::SqlInvoiceRepository;
    use crate::migrations;
    use crate::repositories::{ClientRepository, InvoiceRepository, SqlClientRepository};
    use crate::{connect_with_settings, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn parse_ts(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).expect("valid rfc3339").with_timezone(&Utc)
    }

    async fn seed_client(pool: &DbPool) -> ClientId {
        let client = Client {
            id: ClientId(Uuid::new_v4()),
            first_name: "Maya".to_string(),
            last_name: "Rivera".to_string(),
            email: "maya@example.com".to_string(),
            phone: None,
            notes: None,
            status: ClientStatus::Active,
            created_at: parse_ts("2025-06-01T09:00:00Z"),
            updated_at: parse_ts("2025-06-01T09:00:00Z"),
        };
        let id = client.id.clone();
        SqlClientRepository::new(pool.clone()).insert(client).await.expect("insert client");
        id
    }

    #[tokio::test]
    async fn invoice_round_trip_preserves_amount_and_due_date() {
        let pool = setup_pool().await;
        let client_id = seed_client(&pool).await;
        let repo = SqlInvoiceRepository::new(pool.clone());

        let invoice = Invoice {
            id: InvoiceId(Uuid::new_v4()),
            client_id: client_id.clone(),
            session_id: None,
            amount: Decimal::new(45_075, 2),
            description: Some("Portrait session balance".to_string()),
            due_date: NaiveDate::from_ymd_opt(2025, 8, 1),
            status: InvoiceStatus::Draft,
            created_at: parse_ts("2025-06-01T09:00:00Z"),
            updated_at: parse_ts("2025-06-01T09:00:00Z"),
        };

        repo.insert(invoice.clone()).await.expect("insert invoice");
        let found = repo.find_by_id(&invoice.id).await.expect("find invoice");
        assert_eq!(found, Some(invoice.clone()));

        let mut paid = invoice.clone();
        paid.status = InvoiceStatus::Sent;
        paid.updated_at = parse_ts("2025-06-02T09:00:00Z");
        assert_eq!(repo.update(paid).await.expect("update"), 1);

        let by_status =
            repo.list(Some(&client_id), Some(InvoiceStatus::Sent), 50).await.expect("list");
        assert_eq!(by_status.len(), 1);

        pool.close().await;
    }
}
