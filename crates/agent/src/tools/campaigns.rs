use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tera::{Context, Tera};
use tracing::debug;
use uuid::Uuid;

use focal_core::domain::content::{
    CampaignRecipient, CampaignStatus, EmailCampaign, EmailCampaignId,
};
use focal_core::errors::ToolError;
use focal_db::repositories::{ClientRepository, EmailCampaignRepository};

use super::{parse_params, to_json};
use crate::registry::Tool;
use crate::schema::{FieldSpec, ParameterSchema};

pub struct CreateCampaignTool {
    campaigns: Arc<dyn EmailCampaignRepository>,
    schema: ParameterSchema,
}

impl CreateCampaignTool {
    pub fn new(campaigns: Arc<dyn EmailCampaignRepository>) -> Self {
        Self {
            campaigns,
            schema: ParameterSchema::new()
                .field(FieldSpec::string("subject").required().min_len(1).max_len(200))
                .field(
                    FieldSpec::string("body")
                        .required()
                        .min_len(1)
                        .describe("Body template; {{ first_name }} style placeholders allowed"),
                )
                .field(
                    FieldSpec::datetime("scheduled_for")
                        .describe("Schedule the campaign instead of keeping it a draft"),
                ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateCampaignParams {
    subject: String,
    body: String,
    scheduled_for: Option<DateTime<Utc>>,
}

#[async_trait]
impl Tool for CreateCampaignTool {
    fn name(&self) -> &'static str {
        "create_email_campaign"
    }

    fn description(&self) -> &'static str {
        "Create an email campaign draft, optionally scheduled"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: CreateCampaignParams = parse_params(params)?;

        let now = Utc::now();
        let campaign = EmailCampaign {
            id: EmailCampaignId(Uuid::new_v4()),
            subject: params.subject,
            body: params.body,
            status: if params.scheduled_for.is_some() {
                CampaignStatus::Scheduled
            } else {
                CampaignStatus::Draft
            },
            scheduled_for: params.scheduled_for,
            sent_at: None,
            created_at: now,
            updated_at: now,
        };

        self.campaigns.insert(campaign.clone()).await?;
        Ok(json!({"campaign_id": campaign.id.0, "status": campaign.status.as_str()}))
    }
}

pub struct UpdateCampaignTool {
    campaigns: Arc<dyn EmailCampaignRepository>,
    schema: ParameterSchema,
}

impl UpdateCampaignTool {
    pub fn new(campaigns: Arc<dyn EmailCampaignRepository>) -> Self {
        Self {
            campaigns,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("campaign_id").required())
                .field(FieldSpec::string("subject").min_len(1).max_len(200))
                .field(FieldSpec::string("body").min_len(1))
                .field(FieldSpec::datetime("scheduled_for")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateCampaignParams {
    campaign_id: Uuid,
    subject: Option<String>,
    body: Option<String>,
    scheduled_for: Option<DateTime<Utc>>,
}

#[async_trait]
impl Tool for UpdateCampaignTool {
    fn name(&self) -> &'static str {
        "update_email_campaign"
    }

    fn description(&self) -> &'static str {
        "Edit an unsent campaign's subject, body, or schedule"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: UpdateCampaignParams = parse_params(params)?;
        let id = EmailCampaignId(params.campaign_id);

        let Some(mut campaign) = self.campaigns.find_by_id(&id).await? else {
            return Err(ToolError::not_found("campaign", params.campaign_id));
        };
        if campaign.status == CampaignStatus::Sent {
            return Err(ToolError::validation(
                "campaign_id",
                "campaign was already sent and can no longer change",
            ));
        }

        if let Some(subject) = params.subject {
            campaign.subject = subject;
        }
        if let Some(body) = params.body {
            campaign.body = body;
        }
        if let Some(scheduled_for) = params.scheduled_for {
            campaign.scheduled_for = Some(scheduled_for);
            campaign.status = CampaignStatus::Scheduled;
        }
        campaign.updated_at = Utc::now();

        let status = campaign.status.as_str();
        if self.campaigns.update(campaign).await? == 0 {
            return Err(ToolError::not_found("campaign", params.campaign_id));
        }
        Ok(json!({"campaign_id": params.campaign_id, "status": status}))
    }
}

pub struct ReadCampaignsTool {
    campaigns: Arc<dyn EmailCampaignRepository>,
    schema: ParameterSchema,
}

impl ReadCampaignsTool {
    pub fn new(campaigns: Arc<dyn EmailCampaignRepository>) -> Self {
        Self {
            campaigns,
            schema: ParameterSchema::new()
                .field(FieldSpec::enumeration("status", CampaignStatus::VALUES))
                .field(FieldSpec::integer("limit").min(1).max(100).default_value(json!(50))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReadCampaignsParams {
    status: Option<CampaignStatus>,
    limit: u32,
}

#[async_trait]
impl Tool for ReadCampaignsTool {
    fn name(&self) -> &'static str {
        "read_email_campaigns"
    }

    fn description(&self) -> &'static str {
        "List email campaigns, optionally by status"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: ReadCampaignsParams = parse_params(params)?;
        let campaigns = self.campaigns.list(params.status, params.limit).await?;
        Ok(json!({"count": campaigns.len(), "campaigns": to_json(&campaigns)?}))
    }
}

pub struct SendCampaignTool {
    campaigns: Arc<dyn EmailCampaignRepository>,
    clients: Arc<dyn ClientRepository>,
    schema: ParameterSchema,
}

impl SendCampaignTool {
    pub fn new(
        campaigns: Arc<dyn EmailCampaignRepository>,
        clients: Arc<dyn ClientRepository>,
    ) -> Self {
        Self {
            campaigns,
            clients,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("campaign_id").required().describe("Campaign to send")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendCampaignParams {
    campaign_id: Uuid,
}

#[async_trait]
impl Tool for SendCampaignTool {
    fn name(&self) -> &'static str {
        "send_email_campaign"
    }

    fn description(&self) -> &'static str {
        "Send a campaign to every active client, personalizing the body"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: SendCampaignParams = parse_params(params)?;
        let id = EmailCampaignId(params.campaign_id);

        let Some(mut campaign) = self.campaigns.find_by_id(&id).await? else {
            return Err(ToolError::not_found("campaign", params.campaign_id));
        };
        if campaign.status == CampaignStatus::Sent {
            return Err(ToolError::validation("campaign_id", "campaign was already sent"));
        }

        let audience = self.clients.list_active().await?;
        if audience.is_empty() {
            return Err(ToolError::validation(
                "campaign_id",
                "there are no active clients to send to",
            ));
        }

        let now = Utc::now();
        let mut recipients = Vec::with_capacity(audience.len());
        for client in &audience {
            let mut context = Context::new();
            context.insert("first_name", &client.first_name);
            context.insert("last_name", &client.last_name);
            context.insert("full_name", &client.full_name());
            context.insert("email", &client.email);

            let rendered =
                Tera::one_off(&campaign.body, &context, true).map_err(|error| {
                    ToolError::validation("body", format!("template failed to render: {error}"))
                })?;

            // Delivery is a stub: the rendered message is logged, the
            // recipient row is the durable record.
            debug!(
                event_name = "agent.campaign.rendered",
                campaign_id = %campaign.id.0,
                recipient = %client.email,
                body_len = rendered.len(),
                "campaign message rendered"
            );

            recipients.push(CampaignRecipient {
                id: Uuid::new_v4(),
                campaign_id: campaign.id.clone(),
                client_id: client.id.clone(),
                email: client.email.clone(),
                sent_at: now,
            });
        }

        campaign.sent_at = Some(now);
        campaign.updated_at = now;

        let recipient_count = recipients.len();
        self.campaigns.mark_sent(&campaign, recipients).await?;
        Ok(json!({
            "campaign_id": params.campaign_id,
            "status": CampaignStatus::Sent.as_str(),
            "recipients": recipient_count,
        }))
    }
}

pub struct DeleteCampaignTool {
    campaigns: Arc<dyn EmailCampaignRepository>,
    schema: ParameterSchema,
}

impl DeleteCampaignTool {
    pub fn new(campaigns: Arc<dyn EmailCampaignRepository>) -> Self {
        Self {
            campaigns,
            schema: ParameterSchema::new().field(FieldSpec::uuid("campaign_id").required()),
        }
    }
}

#[async_trait]
impl Tool for DeleteCampaignTool {
    fn name(&self) -> &'static str {
        "delete_email_campaign"
    }

    fn description(&self) -> &'static str {
        "Delete a campaign and its recipient records"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: SendCampaignParams = parse_params(params)?;
        let id = EmailCampaignId(params.campaign_id);

        if self.campaigns.delete(&id).await? == 0 {
            return Err(ToolError::not_found("campaign", params.campaign_id));
        }
        Ok(json!({"campaign_id": params.campaign_id, "deleted": true}))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use focal_db::repositories::{
        ClientRepository, EmailCampaignRepository, SqlClientRepository,
        SqlEmailCampaignRepository,
    };
    use focal_db::{connect_with_settings, migrations, DbPool};

    use super::{
        CreateCampaignTool, DeleteCampaignTool, ReadCampaignsTool, SendCampaignTool,
        UpdateCampaignTool,
    };
    use crate::registry::ToolRegistry;
    use crate::tools::clients::CreateClientTool;

    async fn setup() -> (DbPool, ToolRegistry) {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");

        let campaigns: Arc<dyn EmailCampaignRepository> =
            Arc::new(SqlEmailCampaignRepository::new(pool.clone()));
        let clients: Arc<dyn ClientRepository> = Arc::new(SqlClientRepository::new(pool.clone()));

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CreateCampaignTool::new(campaigns.clone()))).expect("register");
        registry.register(Arc::new(UpdateCampaignTool::new(campaigns.clone()))).expect("register");
        registry.register(Arc::new(ReadCampaignsTool::new(campaigns.clone()))).expect("register");
        registry
            .register(Arc::new(SendCampaignTool::new(campaigns.clone(), clients.clone())))
            .expect("register");
        registry.register(Arc::new(DeleteCampaignTool::new(campaigns))).expect("register");
        registry.register(Arc::new(CreateClientTool::new(clients))).expect("register");

        (pool, registry)
    }

    #[tokio::test]
    async fn send_personalizes_per_active_client_and_is_one_shot() {
        let (pool, registry) = setup().await;

        for (first, email) in [("Maya", "maya@example.com"), ("Jordan", "jordan@example.com")] {
            let created = registry
                .dispatch(
                    "create_client",
                    &json!({"first_name": first, "last_name": "Example", "email": email}),
                )
                .await;
            assert_eq!(created["success"], json!(true));
        }

        let campaign = registry
            .dispatch(
                "create_email_campaign",
                &json!({
                    "subject": "Mini session weekend",
                    "body": "Hi {{ first_name }}, fall minis are open."
                }),
            )
            .await;
        let campaign_id = campaign["campaign_id"].as_str().expect("campaign id").to_string();

        let sent = registry
            .dispatch("send_email_campaign", &json!({"campaign_id": campaign_id}))
            .await;
        assert_eq!(sent["success"], json!(true));
        assert_eq!(sent["recipients"], json!(2));

        let resend = registry
            .dispatch("send_email_campaign", &json!({"campaign_id": campaign_id}))
            .await;
        assert_eq!(resend["success"], json!(false));
        assert!(resend["error"].as_str().unwrap_or_default().contains("already sent"));

        let edit = registry
            .dispatch(
                "update_email_campaign",
                &json!({"campaign_id": campaign_id, "subject": "Too late"}),
            )
            .await;
        assert_eq!(edit["success"], json!(false));

        pool.close().await;
    }

    #[tokio::test]
    async fn send_with_no_active_clients_fails_cleanly() {
        let (pool, registry) = setup().await;

        let campaign = registry
            .dispatch(
                "create_email_campaign",
                &json!({"subject": "Quiet month", "body": "Hello"}),
            )
            .await;
        let campaign_id = campaign["campaign_id"].as_str().expect("campaign id").to_string();

        let sent = registry
            .dispatch("send_email_campaign", &json!({"campaign_id": campaign_id}))
            .await;
        assert_eq!(sent["success"], json!(false));
        assert!(sent["error"].as_str().unwrap_or_default().contains("active clients"));

        let listed = registry
            .dispatch("read_email_campaigns", &json!({"status": "DRAFT"}))
            .await;
        assert_eq!(listed["count"], json!(1));

        pool.close().await;
    }

    #[tokio::test]
    async fn scheduling_a_campaign_marks_it_scheduled() {
        let (pool, registry) = setup().await;

        let campaign = registry
            .dispatch(
                "create_email_campaign",
                &json!({
                    "subject": "Holiday minis",
                    "body": "Save the date",
                    "scheduled_for": "2025-11-01T09:00:00Z"
                }),
            )
            .await;

        assert_eq!(campaign["status"], json!("SCHEDULED"));

        pool.close().await;
    }
}
