use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use focal_core::domain::client::{Client, ClientId, ClientStatus};
use focal_core::domain::lead::{Lead, LeadId, LeadStatus};
use focal_core::errors::ToolError;
use focal_db::repositories::LeadRepository;

use super::{parse_params, to_json};
use crate::registry::Tool;
use crate::schema::{FieldSpec, ParameterSchema};

pub struct CreateLeadTool {
    leads: Arc<dyn LeadRepository>,
    schema: ParameterSchema,
}

impl CreateLeadTool {
    pub fn new(leads: Arc<dyn LeadRepository>) -> Self {
        Self {
            leads,
            schema: ParameterSchema::new()
                .field(
                    FieldSpec::string("name")
                        .required()
                        .min_len(1)
                        .max_len(200)
                        .describe("Full name of the prospective client"),
                )
                .field(FieldSpec::email("email").required())
                .field(FieldSpec::string("phone").max_len(40))
                .field(
                    FieldSpec::string("source")
                        .max_len(100)
                        .describe("Where the lead came from, e.g. website or instagram"),
                )
                .field(FieldSpec::string("notes").max_len(2000)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateLeadParams {
    name: String,
    email: String,
    phone: Option<String>,
    source: Option<String>,
    notes: Option<String>,
}

#[async_trait]
impl Tool for CreateLeadTool {
    fn name(&self) -> &'static str {
        "create_lead"
    }

    fn description(&self) -> &'static str {
        "Record a new inbound lead"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: CreateLeadParams = parse_params(params)?;
        let now = Utc::now();
        let lead = Lead {
            id: LeadId(Uuid::new_v4()),
            name: params.name,
            email: params.email,
            phone: params.phone,
            source: params.source,
            notes: params.notes,
            status: LeadStatus::New,
            created_at: now,
            updated_at: now,
        };

        self.leads.insert(lead.clone()).await?;
        Ok(json!({"lead_id": lead.id.0}))
    }
}

pub struct UpdateLeadTool {
    leads: Arc<dyn LeadRepository>,
    schema: ParameterSchema,
}

impl UpdateLeadTool {
    pub fn new(leads: Arc<dyn LeadRepository>) -> Self {
        Self {
            leads,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("lead_id").required())
                .field(FieldSpec::string("name").min_len(1).max_len(200))
                .field(FieldSpec::email("email"))
                .field(FieldSpec::string("phone").max_len(40))
                .field(FieldSpec::string("source").max_len(100))
                .field(FieldSpec::string("notes").max_len(2000))
                .field(FieldSpec::enumeration("status", LeadStatus::VALUES)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateLeadParams {
    lead_id: Uuid,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    source: Option<String>,
    notes: Option<String>,
    status: Option<LeadStatus>,
}

#[async_trait]
impl Tool for UpdateLeadTool {
    fn name(&self) -> &'static str {
        "update_lead"
    }

    fn description(&self) -> &'static str {
        "Update lead details or move it through the pipeline"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: UpdateLeadParams = parse_params(params)?;
        let id = LeadId(params.lead_id);

        let Some(mut lead) = self.leads.find_by_id(&id).await? else {
            return Err(ToolError::not_found("lead", params.lead_id));
        };

        if let Some(status) = params.status {
            if !lead.status.can_transition_to(status) {
                return Err(ToolError::validation(
                    "status",
                    format!(
                        "lead cannot move from {} to {}",
                        lead.status.as_str(),
                        status.as_str()
                    ),
                ));
            }
            lead.status = status;
        }
        if let Some(name) = params.name {
            lead.name = name;
        }
        if let Some(email) = params.email {
            lead.email = email;
        }
        if let Some(phone) = params.phone {
            lead.phone = Some(phone);
        }
        if let Some(source) = params.source {
            lead.source = Some(source);
        }
        if let Some(notes) = params.notes {
            lead.notes = Some(notes);
        }
        lead.updated_at = Utc::now();

        if self.leads.update(lead).await? == 0 {
            return Err(ToolError::not_found("lead", params.lead_id));
        }
        Ok(json!({"lead_id": params.lead_id, "updated": true}))
    }
}

pub struct ReadLeadsTool {
    leads: Arc<dyn LeadRepository>,
    schema: ParameterSchema,
}

impl ReadLeadsTool {
    pub fn new(leads: Arc<dyn LeadRepository>) -> Self {
        Self {
            leads,
            schema: ParameterSchema::new()
                .field(FieldSpec::enumeration("status", LeadStatus::VALUES))
                .field(FieldSpec::integer("limit").min(1).max(100).default_value(json!(50))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReadLeadsParams {
    status: Option<LeadStatus>,
    limit: u32,
}

#[async_trait]
impl Tool for ReadLeadsTool {
    fn name(&self) -> &'static str {
        "read_leads"
    }

    fn description(&self) -> &'static str {
        "List leads, optionally filtered by pipeline status"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: ReadLeadsParams = parse_params(params)?;
        let leads = self.leads.list(params.status, params.limit).await?;
        Ok(json!({"count": leads.len(), "leads": to_json(&leads)?}))
    }
}

pub struct ConvertLeadTool {
    leads: Arc<dyn LeadRepository>,
    schema: ParameterSchema,
}

impl ConvertLeadTool {
    pub fn new(leads: Arc<dyn LeadRepository>) -> Self {
        Self {
            leads,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("lead_id").required().describe("Lead to convert")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConvertLeadParams {
    lead_id: Uuid,
}

#[async_trait]
impl Tool for ConvertLeadTool {
    fn name(&self) -> &'static str {
        "convert_lead_to_client"
    }

    fn description(&self) -> &'static str {
        "Convert a qualified lead into a client record"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: ConvertLeadParams = parse_params(params)?;
        let id = LeadId(params.lead_id);

        let Some(mut lead) = self.leads.find_by_id(&id).await? else {
            return Err(ToolError::not_found("lead", params.lead_id));
        };
        if lead.status == LeadStatus::Converted {
            return Err(ToolError::validation("lead_id", "lead is already converted"));
        }

        let (first_name, last_name) = split_name(&lead.name);
        let now = Utc::now();
        let client = Client {
            id: ClientId(Uuid::new_v4()),
            first_name,
            last_name,
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            notes: lead.notes.clone(),
            status: ClientStatus::Active,
            created_at: now,
            updated_at: now,
        };
        lead.updated_at = now;

        let client_id = client.id.0;
        self.leads.convert(lead, client).await?;
        Ok(json!({"lead_id": params.lead_id, "client_id": client_id}))
    }
}

pub struct DeleteLeadTool {
    leads: Arc<dyn LeadRepository>,
    schema: ParameterSchema,
}

impl DeleteLeadTool {
    pub fn new(leads: Arc<dyn LeadRepository>) -> Self {
        Self {
            leads,
            schema: ParameterSchema::new().field(FieldSpec::uuid("lead_id").required()),
        }
    }
}

#[async_trait]
impl Tool for DeleteLeadTool {
    fn name(&self) -> &'static str {
        "delete_lead"
    }

    fn description(&self) -> &'static str {
        "Delete a lead record"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: ConvertLeadParams = parse_params(params)?;
        let id = LeadId(params.lead_id);

        if self.leads.delete(&id).await? == 0 {
            return Err(ToolError::not_found("lead", params.lead_id));
        }
        Ok(json!({"lead_id": params.lead_id, "deleted": true}))
    }
}

/// "Sam Okafor" -> ("Sam", "Okafor"); single-word names keep the surname
/// empty rather than inventing one.
fn split_name(name: &str) -> (String, String) {
    match name.trim().split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (name.trim().to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use focal_db::repositories::{
        ClientRepository, LeadRepository, SqlClientRepository, SqlLeadRepository,
    };
    use focal_db::{connect_with_settings, migrations, DbPool};

    use super::{
        split_name, ConvertLeadTool, CreateLeadTool, DeleteLeadTool, ReadLeadsTool, UpdateLeadTool,
    };
    use crate::registry::ToolRegistry;

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn registry_for(pool: &DbPool) -> ToolRegistry {
        let leads: Arc<dyn LeadRepository> = Arc::new(SqlLeadRepository::new(pool.clone()));
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CreateLeadTool::new(leads.clone()))).expect("register");
        registry.register(Arc::new(UpdateLeadTool::new(leads.clone()))).expect("register");
        registry.register(Arc::new(ReadLeadsTool::new(leads.clone()))).expect("register");
        registry.register(Arc::new(ConvertLeadTool::new(leads.clone()))).expect("register");
        registry.register(Arc::new(DeleteLeadTool::new(leads))).expect("register");
        registry
    }

    #[test]
    fn split_name_handles_single_and_multi_word_names() {
        assert_eq!(split_name("Sam Okafor"), ("Sam".to_string(), "Okafor".to_string()));
        assert_eq!(
            split_name("Ana Maria Silva"),
            ("Ana".to_string(), "Maria Silva".to_string())
        );
        assert_eq!(split_name("Cher"), ("Cher".to_string(), String::new()));
    }

    #[tokio::test]
    async fn lead_pipeline_create_qualify_convert() {
        let pool = setup_pool().await;
        let registry = registry_for(&pool);

        let created = registry
            .dispatch(
                "create_lead",
                &json!({"name": "Sam Okafor", "email": "sam@example.com", "source": "website"}),
            )
            .await;
        assert_eq!(created["success"], json!(true));
        let lead_id = created["lead_id"].as_str().expect("lead id").to_string();

        let qualified = registry
            .dispatch("update_lead", &json!({"lead_id": lead_id, "status": "QUALIFIED"}))
            .await;
        assert_eq!(qualified["success"], json!(true));

        let converted = registry
            .dispatch("convert_lead_to_client", &json!({"lead_id": lead_id}))
            .await;
        assert_eq!(converted["success"], json!(true));
        let client_id = converted["client_id"].as_str().expect("client id").to_string();

        let clients = SqlClientRepository::new(pool.clone());
        let stored = clients
            .find_by_id(&focal_core::domain::client::ClientId(
                client_id.parse().expect("uuid"),
            ))
            .await
            .expect("find client")
            .expect("client exists");
        assert_eq!(stored.first_name, "Sam");
        assert_eq!(stored.last_name, "Okafor");

        // A second conversion is rejected before storage is touched.
        let again = registry
            .dispatch("convert_lead_to_client", &json!({"lead_id": lead_id}))
            .await;
        assert_eq!(again["success"], json!(false));
        assert!(again["error"].as_str().unwrap_or_default().contains("already converted"));

        pool.close().await;
    }

    #[tokio::test]
    async fn terminal_lead_status_transition_is_rejected() {
        let pool = setup_pool().await;
        let registry = registry_for(&pool);

        let created = registry
            .dispatch("create_lead", &json!({"name": "Lena", "email": "lena@example.com"}))
            .await;
        let lead_id = created["lead_id"].as_str().expect("lead id").to_string();

        registry
            .dispatch("update_lead", &json!({"lead_id": lead_id, "status": "LOST"}))
            .await;
        let revived = registry
            .dispatch("update_lead", &json!({"lead_id": lead_id, "status": "NEW"}))
            .await;

        assert_eq!(revived["success"], json!(false));
        assert!(revived["error"].as_str().unwrap_or_default().contains("status"));

        pool.close().await;
    }
}
