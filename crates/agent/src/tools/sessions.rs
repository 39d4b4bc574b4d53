use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use focal_core::domain::client::ClientId;
use focal_core::domain::session::{PhotographySession, SessionId, SessionStatus};
use focal_core::errors::ToolError;
use focal_core::scheduling::{available_slots, BookedInterval};
use focal_db::repositories::{ClientRepository, SessionRepository};

use super::{parse_params, to_json};
use crate::registry::Tool;
use crate::schema::{FieldSpec, ParameterSchema};

const MIN_DURATION_MINUTES: i64 = 15;
const MAX_DURATION_MINUTES: i64 = 480;

pub struct CreateSessionTool {
    sessions: Arc<dyn SessionRepository>,
    clients: Arc<dyn ClientRepository>,
    schema: ParameterSchema,
}

impl CreateSessionTool {
    pub fn new(sessions: Arc<dyn SessionRepository>, clients: Arc<dyn ClientRepository>) -> Self {
        Self {
            sessions,
            clients,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("client_id").required().describe("Client being booked"))
                .field(
                    FieldSpec::string("session_type")
                        .required()
                        .min_len(1)
                        .max_len(100)
                        .describe("Kind of shoot, e.g. portrait or wedding"),
                )
                .field(FieldSpec::string("title").required().min_len(1).max_len(200))
                .field(FieldSpec::string("location").max_len(300))
                .field(
                    FieldSpec::datetime("start_time")
                        .required()
                        .describe("Booking start, RFC3339"),
                )
                .field(
                    FieldSpec::integer("duration_minutes")
                        .required()
                        .min(MIN_DURATION_MINUTES)
                        .max(MAX_DURATION_MINUTES),
                )
                .field(FieldSpec::decimal("price").required().describe("Agreed session price")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateSessionParams {
    client_id: Uuid,
    session_type: String,
    title: String,
    location: Option<String>,
    start_time: DateTime<Utc>,
    duration_minutes: u32,
    price: Decimal,
}

#[async_trait]
impl Tool for CreateSessionTool {
    fn name(&self) -> &'static str {
        "create_photography_session"
    }

    fn description(&self) -> &'static str {
        "Book a photography session for a client"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: CreateSessionParams = parse_params(params)?;
        let client_id = ClientId(params.client_id);

        if self.clients.find_by_id(&client_id).await?.is_none() {
            return Err(ToolError::not_found("client", params.client_id));
        }

        let now = Utc::now();
        let session = PhotographySession {
            id: SessionId(Uuid::new_v4()),
            client_id,
            session_type: params.session_type,
            title: params.title,
            location: params.location,
            start_time: params.start_time,
            duration_minutes: params.duration_minutes,
            price: params.price,
            status: SessionStatus::Confirmed,
            created_at: now,
            updated_at: now,
        };

        self.sessions.insert(session.clone()).await?;
        Ok(json!({
            "session_id": session.id.0,
            "status": session.status.as_str(),
            "end_time": session.end_time().to_rfc3339(),
        }))
    }
}

pub struct UpdateSessionTool {
    sessions: Arc<dyn SessionRepository>,
    schema: ParameterSchema,
}

impl UpdateSessionTool {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self {
            sessions,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("session_id").required())
                .field(FieldSpec::string("session_type").min_len(1).max_len(100))
                .field(FieldSpec::string("title").min_len(1).max_len(200))
                .field(FieldSpec::string("location").max_len(300))
                .field(FieldSpec::datetime("start_time"))
                .field(
                    FieldSpec::integer("duration_minutes")
                        .min(MIN_DURATION_MINUTES)
                        .max(MAX_DURATION_MINUTES),
                )
                .field(FieldSpec::decimal("price"))
                .field(
                    FieldSpec::enumeration("status", SessionStatus::VALUES)
                        .describe("New booking status"),
                ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateSessionParams {
    session_id: Uuid,
    session_type: Option<String>,
    title: Option<String>,
    location: Option<String>,
    start_time: Option<DateTime<Utc>>,
    duration_minutes: Option<u32>,
    price: Option<Decimal>,
    status: Option<SessionStatus>,
}

#[async_trait]
impl Tool for UpdateSessionTool {
    fn name(&self) -> &'static str {
        "update_photography_session"
    }

    fn description(&self) -> &'static str {
        "Reschedule, reprice, cancel, or complete a booked session"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: UpdateSessionParams = parse_params(params)?;
        let id = SessionId(params.session_id);

        let Some(mut session) = self.sessions.find_by_id(&id).await? else {
            return Err(ToolError::not_found("session", params.session_id));
        };

        if let Some(status) = params.status {
            if !session.status.can_transition_to(status) {
                return Err(ToolError::validation(
                    "status",
                    format!(
                        "session cannot move from {} to {}",
                        session.status.as_str(),
                        status.as_str()
                    ),
                ));
            }
            session.status = status;
        }
        if let Some(session_type) = params.session_type {
            session.session_type = session_type;
        }
        if let Some(title) = params.title {
            session.title = title;
        }
        if let Some(location) = params.location {
            session.location = Some(location);
        }
        if let Some(start_time) = params.start_time {
            session.start_time = start_time;
        }
        if let Some(duration_minutes) = params.duration_minutes {
            session.duration_minutes = duration_minutes;
        }
        if let Some(price) = params.price {
            session.price = price;
        }
        session.updated_at = Utc::now();

        let status = session.status.as_str();
        if self.sessions.update(session).await? == 0 {
            return Err(ToolError::not_found("session", params.session_id));
        }
        Ok(json!({"session_id": params.session_id, "status": status}))
    }
}

pub struct ReadSessionsTool {
    sessions: Arc<dyn SessionRepository>,
    schema: ParameterSchema,
}

impl ReadSessionsTool {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self {
            sessions,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("client_id").describe("Only this client's bookings"))
                .field(FieldSpec::enumeration("status", SessionStatus::VALUES))
                .field(FieldSpec::integer("limit").min(1).max(100).default_value(json!(50))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReadSessionsParams {
    client_id: Option<Uuid>,
    status: Option<SessionStatus>,
    limit: u32,
}

#[async_trait]
impl Tool for ReadSessionsTool {
    fn name(&self) -> &'static str {
        "read_photography_sessions"
    }

    fn description(&self) -> &'static str {
        "List booked sessions, optionally by client or status"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: ReadSessionsParams = parse_params(params)?;
        let client_id = params.client_id.map(ClientId);
        let sessions =
            self.sessions.list(client_id.as_ref(), params.status, params.limit).await?;

        Ok(json!({"count": sessions.len(), "sessions": to_json(&sessions)?}))
    }
}

pub struct CheckAvailabilityTool {
    sessions: Arc<dyn SessionRepository>,
    schema: ParameterSchema,
}

impl CheckAvailabilityTool {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self {
            sessions,
            schema: ParameterSchema::new()
                .field(FieldSpec::date("date").required().describe("Day to check, YYYY-MM-DD"))
                .field(
                    FieldSpec::integer("duration_minutes")
                        .min(MIN_DURATION_MINUTES)
                        .max(MAX_DURATION_MINUTES)
                        .default_value(json!(60)),
                ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CheckAvailabilityParams {
    date: NaiveDate,
    duration_minutes: u32,
}

#[async_trait]
impl Tool for CheckAvailabilityTool {
    fn name(&self) -> &'static str {
        "check_calendar_availability"
    }

    fn description(&self) -> &'static str {
        "List open hourly booking slots on a given day"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: CheckAvailabilityParams = parse_params(params)?;

        let booked: Vec<BookedInterval> = self
            .sessions
            .list_blocking_on_date(params.date)
            .await?
            .into_iter()
            .map(|session| BookedInterval {
                start: session.start_time,
                duration_minutes: session.duration_minutes,
            })
            .collect();

        let slots = available_slots(params.date, params.duration_minutes, &booked);
        let slots_json: Vec<Value> = slots
            .iter()
            .map(|slot| {
                json!({
                    "start_time": slot.start.to_rfc3339(),
                    "end_time": slot.end.to_rfc3339(),
                })
            })
            .collect();

        Ok(json!({
            "date": params.date.format("%Y-%m-%d").to_string(),
            "duration_minutes": params.duration_minutes,
            "count": slots_json.len(),
            "slots": slots_json,
        }))
    }
}

pub struct DeleteSessionTool {
    sessions: Arc<dyn SessionRepository>,
    schema: ParameterSchema,
}

impl DeleteSessionTool {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self {
            sessions,
            schema: ParameterSchema::new().field(FieldSpec::uuid("session_id").required()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeleteSessionParams {
    session_id: Uuid,
}

#[async_trait]
impl Tool for DeleteSessionTool {
    fn name(&self) -> &'static str {
        "delete_photography_session"
    }

    fn description(&self) -> &'static str {
        "Delete a session record outright"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: DeleteSessionParams = parse_params(params)?;
        let id = SessionId(params.session_id);

        if self.sessions.delete(&id).await? == 0 {
            return Err(ToolError::not_found("session", params.session_id));
        }
        Ok(json!({"session_id": params.session_id, "deleted": true}))
    }
}
