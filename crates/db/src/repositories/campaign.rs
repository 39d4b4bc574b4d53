use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use focal_core::domain::client::ClientId;
use focal_core::domain::content::{
    CampaignRecipient, CampaignStatus, EmailCampaign, EmailCampaignId,
};

use super::{
    parse_optional_timestamp, parse_status, parse_timestamp, parse_uuid, EmailCampaignRepository,
    RepositoryError,
};
use crate::DbPool;

const CAMPAIGN_COLUMNS: &str = "id,
                subject,
                body,
                status,
                scheduled_for,
                sent_at,
                created_at,
                updated_at";

pub struct SqlEmailCampaignRepository {
    pool: DbPool,
}

impl SqlEmailCampaignRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailCampaignRepository for SqlEmailCampaignRepository {
    async fn insert(&self, campaign: EmailCampaign) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO email_campaign (
                id,
                subject,
                body,
                status,
                scheduled_for,
                sent_at,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(campaign.id.0.to_string())
        .bind(&campaign.subject)
        .bind(&campaign.body)
        .bind(campaign.status.as_str())
        .bind(campaign.scheduled_for.map(|value| value.to_rfc3339()))
        .bind(campaign.sent_at.map(|value| value.to_rfc3339()))
        .bind(campaign.created_at.to_rfc3339())
        .bind(campaign.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, campaign: EmailCampaign) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE email_campaign SET
                subject = ?,
                body = ?,
                status = ?,
                scheduled_for = ?,
                sent_at = ?,
                updated_at = ?
             WHERE id = ?",
        )
        .bind(&campaign.subject)
        .bind(&campaign.body)
        .bind(campaign.status.as_str())
        .bind(campaign.scheduled_for.map(|value| value.to_rfc3339()))
        .bind(campaign.sent_at.map(|value| value.to_rfc3339()))
        .bind(campaign.updated_at.to_rfc3339())
        .bind(campaign.id.0.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_by_id(
        &self,
        id: &EmailCampaignId,
    ) -> Result<Option<EmailCampaign>, RepositoryError> {
        let row =
            sqlx::query(&format!("SELECT {CAMPAIGN_COLUMNS} FROM email_campaign WHERE id = ?"))
                .bind(id.0.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(campaign_from_row).transpose()
    }

    async fn list(
        &self,
        status: Option<CampaignStatus>,
        limit: u32,
    ) -> Result<Vec<EmailCampaign>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {CAMPAIGN_COLUMNS}
             FROM email_campaign
             WHERE (?1 IS NULL OR status = ?1)
             ORDER BY created_at DESC
             LIMIT ?2"
        ))
        .bind(status.map(|value| value.as_str()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(campaign_from_row).collect()
    }

    async fn mark_sent(
        &self,
        campaign: &EmailCampaign,
        recipients: Vec<CampaignRecipient>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE email_campaign
             SET status = 'SENT', sent_at = ?, updated_at = ?
             WHERE id = ? AND status != 'SENT'",
        )
        .bind(campaign.sent_at.map(|value| value.to_rfc3339()))
        .bind(campaign.updated_at.to_rfc3339())
        .bind(campaign.id.0.to_string())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(RepositoryError::Decode(format!(
                "campaign `{}` was already sent or does not exist",
                campaign.id.0
            )));
        }

        for recipient in &recipients {
            sqlx::query(
                "INSERT INTO campaign_recipient (id, campaign_id, client_id, email, sent_at)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(recipient.id.to_string())
            .bind(recipient.campaign_id.0.to_string())
            .bind(recipient.client_id.0.to_string())
            .bind(&recipient.email)
            .bind(recipient.sent_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_recipients(
        &self,
        campaign_id: &EmailCampaignId,
    ) -> Result<Vec<CampaignRecipient>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, campaign_id, client_id, email, sent_at
             FROM campaign_recipient
             WHERE campaign_id = ?
             ORDER BY email ASC",
        )
        .bind(campaign_id.0.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(recipient_from_row).collect()
    }

    async fn delete(&self, id: &EmailCampaignId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM email_campaign WHERE id = ?")
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn campaign_from_row(row: SqliteRow) -> Result<EmailCampaign, RepositoryError> {
    Ok(EmailCampaign {
        id: EmailCampaignId(parse_uuid("id", row.get("id"))?),
        subject: row.get("subject"),
        body: row.get("body"),
        status: parse_status("status", row.get("status"), CampaignStatus::parse)?,
        scheduled_for: parse_optional_timestamp("scheduled_for", row.get("scheduled_for"))?,
        sent_at: parse_optional_timestamp("sent_at", row.get("sent_at"))?,
        created_at: parse_timestamp("created_at", row.get("created_at"))?,
        updated_at: parse_timestamp("updated_at", row.get("updated_at"))?,
    })
}

fn recipient_from_row(row: SqliteRow) -> Result<CampaignRecipient, RepositoryError> {
    Ok(CampaignRecipient {
        id: parse_uuid("id", row.get("id"))?,
        campaign_id: EmailCampaignId(parse_uuid("campaign_id", row.get("campaign_id"))?),
        client_id: ClientId(parse_uuid("client_id", row.get("client_id"))?),
        email: row.get("email"),
        sent_at: parse_timestamp("sent_at", row.get("sent_at"))?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use focal_core::domain::client::{Client, ClientId, ClientStatus};
    use focal_core::domain::content::{
        CampaignRecipient, CampaignStatus, EmailCampaign, EmailCampaignId,
    };

    use super::SqlEmailCampaignRepository;
    use crate::migrations;
    use crate::repositories::{ClientRepository, EmailCampaignRepository, SqlClientRepository};
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

    fn sample_campaign() -> EmailCampaign {
        EmailCampaign {
            id: EmailCampaignId(Uuid::new_v4()),
            subject: "Mini session weekend".to_string(),
            body: "Hi {{ first_name }}, fall mini sessions are open.".to_string(),
            status: CampaignStatus::Draft,
            scheduled_for: None,
            sent_at: None,
            created_at: parse_ts("2025-06-01T09:00:00Z"),
            updated_at: parse_ts("2025-06-01T09:00:00Z"),
        }
    }

    #[tokio::test]
    async fn mark_sent_flips_status_and_records_recipients_atomically() {
        let pool = setup_pool().await;
        let client_id = seed_client(&pool).await;
        let repo = SqlEmailCampaignRepository::new(pool.clone());

        let mut campaign = sample_campaign();
        repo.insert(campaign.clone()).await.expect("insert campaign");

        campaign.sent_at = Some(parse_ts("2025-06-05T12:00:00Z"));
        campaign.updated_at = parse_ts("2025-06-05T12:00:00Z");
        let recipients = vec![CampaignRecipient {
            id: Uuid::new_v4(),
            campaign_id: campaign.id.clone(),
            client_id: client_id.clone(),
            email: "maya@example.com".to_string(),
            sent_at: parse_ts("2025-06-05T12:00:00Z"),
        }];

        repo.mark_sent(&campaign, recipients.clone()).await.expect("mark sent");

        let stored = repo.find_by_id(&campaign.id).await.expect("find campaign");
        assert_eq!(stored.map(|value| value.status), Some(CampaignStatus::Sent));
        assert_eq!(repo.list_recipients(&campaign.id).await.expect("recipients"), recipients);

        // A second send attempt fails and records nothing further.
        let retry = repo.mark_sent(&campaign, Vec::new()).await;
        assert!(retry.is_err());
        assert_eq!(repo.list_recipients(&campaign.id).await.expect("recipients").len(), 1);

        pool.close().await;
    }

    #[tokio::test]
    async fn recipient_failure_rolls_back_the_status_flip() {
        let pool = setup_pool().await;
        let repo = SqlEmailCampaignRepository::new(pool.clone());

        let mut campaign = sample_campaign();
        repo.insert(campaign.clone()).await.expect("insert campaign");

        campaign.sent_at = Some(parse_ts("2025-06-05T12:00:00Z"));
        campaign.updated_at = parse_ts("2025-06-05T12:00:00Z");

        // client_id does not exist, so the recipient insert violates its
        // foreign key and the transaction must roll back.
        let bad_recipient = CampaignRecipient {
            id: Uuid::new_v4(),
            campaign_id: campaign.id.clone(),
            client_id: ClientId(Uuid::new_v4()),
            email: "ghost@example.com".to_string(),
            sent_at: parse_ts("2025-06-05T12:00:00Z"),
        };

        let result = repo.mark_sent(&campaign, vec![bad_recipient]).await;
        assert!(result.is_err());

        let stored = repo.find_by_id(&campaign.id).await.expect("find campaign");
        assert_eq!(stored.map(|value| value.status), Some(CampaignStatus::Draft));
        assert!(repo.list_recipients(&campaign.id).await.expect("recipients").is_empty());

        pool.close().await;
    }
}
