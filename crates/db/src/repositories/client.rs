use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use focal_core::domain::client::{Client, ClientId, ClientStatus};

use super::{parse_status, parse_timestamp, parse_uuid, ClientRepository, RepositoryError};
use crate::DbPool;

const CLIENT_COLUMNS: &str = "id,
                first_name,
                last_name,
                email,
                phone,
                notes,
                status,
                created_at,
                updated_at";

pub struct SqlClientRepository {
    pool: DbPool,
}

impl SqlClientRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientRepository for SqlClientRepository {
    async fn insert(&self, client: Client) -> Result<(), RepositoryError> {
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
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, client: Client) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE client SET
                first_name = ?,
                last_name = ?,
                email = ?,
                phone = ?,
                notes = ?,
                status = ?,
                updated_at = ?
             WHERE id = ?",
        )
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.email)
        .bind(client.phone.as_deref())
        .bind(client.notes.as_deref())
        .bind(client.status.as_str())
        .bind(client.updated_at.to_rfc3339())
        .bind(client.id.0.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_by_id(&self, id: &ClientId) -> Result<Option<Client>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {CLIENT_COLUMNS} FROM client WHERE id = ?"))
            .bind(id.0.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(client_from_row).transpose()
    }

    async fn search(
        &self,
        term: Option<&str>,
        status: Option<ClientStatus>,
        limit: u32,
    ) -> Result<Vec<Client>, RepositoryError> {
        let pattern = term.map(|value| format!("%{value}%"));
        let rows = sqlx::query(&format!(
            "SELECT {CLIENT_COLUMNS}
             FROM client
             WHERE (?1 IS NULL OR status = ?1)
               AND (?2 IS NULL
                    OR first_name LIKE ?2
                    OR last_name LIKE ?2
                    OR email LIKE ?2)
             ORDER BY created_at DESC
             LIMIT ?3"
        ))
        .bind(status.map(|value| value.as_str()))
        .bind(pattern.as_deref())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(client_from_row).collect()
    }

    async fn list_active(&self) -> Result<Vec<Client>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {CLIENT_COLUMNS}
             FROM client
             WHERE status = 'ACTIVE'
             ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(client_from_row).collect()
    }

    async fn delete(&self, id: &ClientId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM client WHERE id = ?")
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn client_from_row(row: SqliteRow) -> Result<Client, RepositoryError> {
    Ok(Client {
        id: ClientId(parse_uuid("id", row.get("id"))?),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        notes: row.get("notes"),
        status: parse_status("status", row.get("status"), ClientStatus::parse)?,
        created_at: parse_timestamp("created_at", row.get("created_at"))?,
        updated_at: parse_timestamp("updated_at", row.get("updated_at"))?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use focal_core::domain::client::{Client, ClientId, ClientStatus};

    use super::SqlClientRepository;
    use crate::migrations;
    use crate::repositories::ClientRepository;
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

    fn sample_client(first_name: &str, email: &str) -> Client {
        Client {
            id: ClientId(Uuid::new_v4()),
            first_name: first_name.to_string(),
            last_name: "Rivera".to_string(),
            email: email.to_string(),
            phone: Some("+1-555-0100".to_string()),
            notes: None,
            status: ClientStatus::Active,
            created_at: parse_ts("2025-06-01T09:00:00Z"),
            updated_at: parse_ts("2025-06-01T09:00:00Z"),
        }
    }

    #[tokio::test]
    async fn client_round_trip_and_update() {
        let pool = setup_pool().await;
        let repo = SqlClientRepository::new(pool.clone());

        let client = sample_client("Maya", "maya@example.com");
        repo.insert(client.clone()).await.expect("insert client");

        let found = repo.find_by_id(&client.id).await.expect("find client");
        assert_eq!(found, Some(client.clone()));

        let mut updated = client.clone();
        updated.notes = Some("prefers outdoor shoots".to_string());
        updated.status = ClientStatus::Archived;
        updated.updated_at = parse_ts("2025-06-02T10:00:00Z");

        let affected = repo.update(updated.clone()).await.expect("update client");
        assert_eq!(affected, 1);

        let found_updated = repo.find_by_id(&client.id).await.expect("find updated");
        assert_eq!(found_updated, Some(updated));

        pool.close().await;
    }

    #[tokio::test]
    async fn search_filters_by_term_and_status() {
        let pool = setup_pool().await;
        let repo = SqlClientRepository::new(pool.clone());

        repo.insert(sample_client("Maya", "maya@example.com")).await.expect("insert");
        let mut archived = sample_client("Jordan", "jordan@example.com");
        archived.status = ClientStatus::Archived;
        repo.insert(archived).await.expect("insert");

        let by_term = repo.search(Some("maya"), None, 50).await.expect("search");
        assert_eq!(by_term.len(), 1);
        assert_eq!(by_term[0].first_name, "Maya");

        let by_status =
            repo.search(None, Some(ClientStatus::Archived), 50).await.expect("search");
        assert_eq!(by_status.len(), 1);
        assert_eq!(by_status[0].first_name, "Jordan");

        let active = repo.list_active().await.expect("list active");
        assert_eq!(active.len(), 1);

        pool.close().await;
    }

    #[tokio::test]
    async fn update_and_delete_report_zero_rows_for_unknown_id() {
        let pool = setup_pool().await;
        let repo = SqlClientRepository::new(pool.clone());

        let ghost = sample_client("Nobody", "nobody@example.com");
        assert_eq!(repo.update(ghost.clone()).await.expect("update"), 0);
        assert_eq!(repo.delete(&ghost.id).await.expect("delete"), 0);

        pool.close().await;
    }
}
