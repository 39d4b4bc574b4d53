use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use focal_core::domain::client::{Client, ClientId, ClientStatus};
use focal_core::errors::ToolError;
use focal_db::repositories::ClientRepository;

use super::{parse_params, to_json};
use crate::registry::Tool;
use crate::schema::{FieldSpec, ParameterSchema};

pub struct CreateClientTool {
    clients: Arc<dyn ClientRepository>,
    schema: ParameterSchema,
}

impl CreateClientTool {
    pub fn new(clients: Arc<dyn ClientRepository>) -> Self {
        Self {
            clients,
            schema: ParameterSchema::new()
                .field(
                    FieldSpec::string("first_name")
                        .required()
                        .min_len(1)
                        .max_len(100)
                        .describe("Client first name"),
                )
                .field(
                    FieldSpec::string("last_name")
                        .required()
                        .min_len(1)
                        .max_len(100)
                        .describe("Client last name"),
                )
                .field(FieldSpec::email("email").required().describe("Contact email address"))
                .field(FieldSpec::string("phone").max_len(40).describe("Contact phone number"))
                .field(FieldSpec::string("notes").max_len(2000).describe("Free-form notes")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateClientParams {
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    notes: Option<String>,
}

#[async_trait]
impl Tool for CreateClientTool {
    fn name(&self) -> &'static str {
        "create_client"
    }

    fn description(&self) -> &'static str {
        "Create a new client record with contact details"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: CreateClientParams = parse_params(params)?;
        let now = Utc::now();
        let client = Client {
            id: ClientId(Uuid::new_v4()),
            first_name: params.first_name,
            last_name: params.last_name,
            email: params.email,
            phone: params.phone,
            notes: params.notes,
            status: ClientStatus::Active,
            created_at: now,
            updated_at: now,
        };

        self.clients.insert(client.clone()).await?;
        Ok(json!({"client_id": client.id.0, "full_name": client.full_name()}))
    }
}

pub struct UpdateClientTool {
    clients: Arc<dyn ClientRepository>,
    schema: ParameterSchema,
}

impl UpdateClientTool {
    pub fn new(clients: Arc<dyn ClientRepository>) -> Self {
        Self {
            clients,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("client_id").required().describe("Client to update"))
                .field(FieldSpec::string("first_name").min_len(1).max_len(100))
                .field(FieldSpec::string("last_name").min_len(1).max_len(100))
                .field(FieldSpec::email("email"))
                .field(FieldSpec::string("phone").max_len(40))
                .field(FieldSpec::string("notes").max_len(2000))
                .field(
                    FieldSpec::enumeration("status", ClientStatus::VALUES)
                        .describe("New client status"),
                ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateClientParams {
    client_id: Uuid,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    notes: Option<String>,
    status: Option<ClientStatus>,
}

#[async_trait]
impl Tool for UpdateClientTool {
    fn name(&self) -> &'static str {
        "update_client"
    }

    fn description(&self) -> &'static str {
        "Update contact details or status of an existing client"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: UpdateClientParams = parse_params(params)?;
        let id = ClientId(params.client_id);

        let Some(mut client) = self.clients.find_by_id(&id).await? else {
            return Err(ToolError::not_found("client", params.client_id));
        };

        if let Some(first_name) = params.first_name {
            client.first_name = first_name;
        }
        if let Some(last_name) = params.last_name {
            client.last_name = last_name;
        }
        if let Some(email) = params.email {
            client.email = email;
        }
        if let Some(phone) = params.phone {
            client.phone = Some(phone);
        }
        if let Some(notes) = params.notes {
            client.notes = Some(notes);
        }
        if let Some(status) = params.status {
            client.status = status;
        }
        client.updated_at = Utc::now();

        if self.clients.update(client).await? == 0 {
            return Err(ToolError::not_found("client", params.client_id));
        }
        Ok(json!({"client_id": params.client_id, "updated": true}))
    }
}

pub struct ReadClientsTool {
    clients: Arc<dyn ClientRepository>,
    schema: ParameterSchema,
}

impl ReadClientsTool {
    pub fn new(clients: Arc<dyn ClientRepository>) -> Self {
        Self {
            clients,
            schema: ParameterSchema::new()
                .field(
                    FieldSpec::string("search_term")
                        .min_len(1)
                        .describe("Matches first name, last name, or email"),
                )
                .field(FieldSpec::enumeration("status", ClientStatus::VALUES))
                .field(
                    FieldSpec::integer("limit")
                        .min(1)
                        .max(100)
                        .default_value(json!(50))
                        .describe("Maximum rows to return"),
                ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReadClientsParams {
    search_term: Option<String>,
    status: Option<ClientStatus>,
    limit: u32,
}

#[async_trait]
impl Tool for ReadClientsTool {
    fn name(&self) -> &'static str {
        "read_clients"
    }

    fn description(&self) -> &'static str {
        "List clients, optionally filtered by a search term or status"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: ReadClientsParams = parse_params(params)?;
        let clients = self
            .clients
            .search(params.search_term.as_deref(), params.status, params.limit)
            .await?;

        Ok(json!({"count": clients.len(), "clients": to_json(&clients)?}))
    }
}

pub struct GetClientTool {
    clients: Arc<dyn ClientRepository>,
    schema: ParameterSchema,
}

impl GetClientTool {
    pub fn new(clients: Arc<dyn ClientRepository>) -> Self {
        Self {
            clients,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("client_id").required().describe("Client to fetch")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GetClientParams {
    client_id: Uuid,
}

#[async_trait]
impl Tool for GetClientTool {
    fn name(&self) -> &'static str {
        "get_client"
    }

    fn description(&self) -> &'static str {
        "Fetch a single client by id"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: GetClientParams = parse_params(params)?;
        let id = ClientId(params.client_id);

        let Some(client) = self.clients.find_by_id(&id).await? else {
            return Err(ToolError::not_found("client", params.client_id));
        };

        Ok(json!({"client": to_json(&client)?}))
    }
}

pub struct DeleteClientTool {
    clients: Arc<dyn ClientRepository>,
    schema: ParameterSchema,
}

impl DeleteClientTool {
    pub fn new(clients: Arc<dyn ClientRepository>) -> Self {
        Self {
            clients,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("client_id").required().describe("Client to delete")),
        }
    }
}

#[async_trait]
impl Tool for DeleteClientTool {
    fn name(&self) -> &'static str {
        "delete_client"
    }

    fn description(&self) -> &'static str {
        "Delete a client record"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: GetClientParams = parse_params(params)?;
        let id = ClientId(params.client_id);

        if self.clients.delete(&id).await? == 0 {
            return Err(ToolError::not_found("client", params.client_id));
        }
        Ok(json!({"client_id": params.client_id, "deleted": true}))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;
    use uuid::Uuid;

    use focal_core::domain::client::{Client, ClientId, ClientStatus};
    use focal_db::repositories::{ClientRepository, RepositoryError, SqlClientRepository};
    use focal_db::{connect_with_settings, migrations, DbPool};

    use super::{CreateClientTool, DeleteClientTool, GetClientTool, ReadClientsTool, UpdateClientTool};
    use crate::registry::ToolRegistry;

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn registry_for(pool: &DbPool) -> ToolRegistry {
        let clients: Arc<dyn ClientRepository> = Arc::new(SqlClientRepository::new(pool.clone()));
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CreateClientTool::new(clients.clone()))).expect("register");
        registry.register(Arc::new(UpdateClientTool::new(clients.clone()))).expect("register");
        registry.register(Arc::new(ReadClientsTool::new(clients.clone()))).expect("register");
        registry.register(Arc::new(GetClientTool::new(clients.clone()))).expect("register");
        registry.register(Arc::new(DeleteClientTool::new(clients))).expect("register");
        registry
    }

    /// Spy repository proving that invalid calls never reach storage.
    #[derive(Default)]
    struct RecordingClientRepository {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ClientRepository for RecordingClientRepository {
        async fn insert(&self, _client: Client) -> Result<(), RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn update(&self, _client: Client) -> Result<u64, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }

        async fn find_by_id(&self, _id: &ClientId) -> Result<Option<Client>, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        async fn search(
            &self,
            _term: Option<&str>,
            _status: Option<ClientStatus>,
            _limit: u32,
        ) -> Result<Vec<Client>, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn list_active(&self) -> Result<Vec<Client>, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn delete(&self, _id: &ClientId) -> Result<u64, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }
    }

    #[tokio::test]
    async fn invalid_create_never_touches_the_repository() {
        let spy = Arc::new(RecordingClientRepository::default());
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(CreateClientTool::new(spy.clone())))
            .expect("register create");

        let envelope = registry
            .dispatch("create_client", &json!({"first_name": "Maya"}))
            .await;

        assert_eq!(envelope["success"], json!(false));
        assert!(envelope["error"].as_str().unwrap_or_default().contains("last_name"));
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn create_then_read_round_trips_fields() {
        let pool = setup_pool().await;
        let registry = registry_for(&pool);

        let created = registry
            .dispatch(
                "create_client",
                &json!({
                    "first_name": "Maya",
                    "last_name": "Rivera",
                    "email": "maya@example.com",
                    "phone": "+1-555-0100"
                }),
            )
            .await;
        assert_eq!(created["success"], json!(true));
        let client_id = created["client_id"].as_str().expect("client id").to_string();

        let listed = registry
            .dispatch("read_clients", &json!({"search_term": "Maya"}))
            .await;
        assert_eq!(listed["success"], json!(true));
        assert_eq!(listed["count"], json!(1));
        assert_eq!(listed["clients"][0]["email"], json!("maya@example.com"));
        assert_eq!(listed["clients"][0]["phone"], json!("+1-555-0100"));

        let fetched = registry.dispatch("get_client", &json!({"client_id": client_id})).await;
        assert_eq!(fetched["success"], json!(true));
        assert_eq!(fetched["client"]["first_name"], json!("Maya"));

        pool.close().await;
    }

    #[tokio::test]
    async fn reads_are_idempotent() {
        let pool = setup_pool().await;
        let registry = registry_for(&pool);

        registry
            .dispatch(
                "create_client",
                &json!({
                    "first_name": "Jordan",
                    "last_name": "Blake",
                    "email": "jordan@example.com"
                }),
            )
            .await;

        let first = registry.dispatch("read_clients", &json!({})).await;
        let second = registry.dispatch("read_clients", &json!({})).await;
        assert_eq!(first, second);

        pool.close().await;
    }

    #[tokio::test]
    async fn update_and_delete_report_not_found_for_unknown_id() {
        let pool = setup_pool().await;
        let registry = registry_for(&pool);
        let ghost = Uuid::new_v4().to_string();

        let updated = registry
            .dispatch(
                "update_client",
                &json!({"client_id": ghost, "notes": "does not matter"}),
            )
            .await;
        assert_eq!(updated["success"], json!(false));
        assert!(updated["error"].as_str().unwrap_or_default().contains("not found"));

        let deleted = registry.dispatch("delete_client", &json!({"client_id": ghost})).await;
        assert_eq!(deleted["success"], json!(false));
        assert!(deleted["error"].as_str().unwrap_or_default().contains("not found"));

        pool.close().await;
    }

    #[tokio::test]
    async fn archive_via_update_filters_out_of_active_search() {
        let pool = setup_pool().await;
        let registry = registry_for(&pool);

        let created = registry
            .dispatch(
                "create_client",
                &json!({
                    "first_name": "Priya",
                    "last_name": "Natarajan",
                    "email": "priya@example.com"
                }),
            )
            .await;
        let client_id = created["client_id"].as_str().expect("client id").to_string();

        let archived = registry
            .dispatch(
                "update_client",
                &json!({"client_id": client_id, "status": "ARCHIVED"}),
            )
            .await;
        assert_eq!(archived["success"], json!(true));

        let active = registry
            .dispatch("read_clients", &json!({"status": "ACTIVE"}))
            .await;
        assert_eq!(active["count"], json!(0));

        pool.close().await;
    }
}
