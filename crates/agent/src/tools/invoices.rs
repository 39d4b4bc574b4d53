use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use focal_core::domain::client::ClientId;
use focal_core::domain::invoice::{Invoice, InvoiceId, InvoiceStatus};
use focal_core::domain::session::SessionId;
use focal_core::errors::ToolError;
use focal_db::repositories::{ClientRepository, InvoiceRepository, SessionRepository};

use super::{parse_params, to_json};
use crate::registry::Tool;
use crate::schema::{FieldSpec, ParameterSchema};

pub struct CreateInvoiceTool {
    invoices: Arc<dyn InvoiceRepository>,
    clients: Arc<dyn ClientRepository>,
    sessions: Arc<dyn SessionRepository>,
    schema: ParameterSchema,
}

impl CreateInvoiceTool {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        clients: Arc<dyn ClientRepository>,
        sessions: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            invoices,
            clients,
            sessions,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("client_id").required().describe("Client to bill"))
                .field(FieldSpec::uuid("session_id").describe("Session the invoice covers"))
                .field(FieldSpec::decimal("amount").required().describe("Amount due"))
                .field(FieldSpec::string("description").max_len(500))
                .field(FieldSpec::date("due_date").describe("Payment due date, YYYY-MM-DD")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateInvoiceParams {
    client_id: Uuid,
    session_id: Option<Uuid>,
    amount: Decimal,
    description: Option<String>,
    due_date: Option<NaiveDate>,
}

#[async_trait]
impl Tool for CreateInvoiceTool {
    fn name(&self) -> &'static str {
        "create_invoice"
    }

    fn description(&self) -> &'static str {
        "Create a draft invoice for a client"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: CreateInvoiceParams = parse_params(params)?;
        let client_id = ClientId(params.client_id);

        if self.clients.find_by_id(&client_id).await?.is_none() {
            return Err(ToolError::not_found("client", params.client_id));
        }
        let session_id = match params.session_id {
            Some(raw) => {
                let id = SessionId(raw);
                if self.sessions.find_by_id(&id).await?.is_none() {
                    return Err(ToolError::not_found("session", raw));
                }
                Some(id)
            }
            None => None,
        };

        let now = Utc::now();
        let invoice = Invoice {
            id: InvoiceId(Uuid::new_v4()),
            client_id,
            session_id,
            amount: params.amount,
            description: params.description,
            due_date: params.due_date,
            status: InvoiceStatus::Draft,
            created_at: now,
            updated_at: now,
        };

        self.invoices.insert(invoice.clone()).await?;
        Ok(json!({
            "invoice_id": invoice.id.0,
            "status": invoice.status.as_str(),
            "amount": invoice.amount.to_string(),
        }))
    }
}

pub struct UpdateInvoiceStatusTool {
    invoices: Arc<dyn InvoiceRepository>,
    schema: ParameterSchema,
}

impl UpdateInvoiceStatusTool {
    pub fn new(invoices: Arc<dyn InvoiceRepository>) -> Self {
        Self {
            invoices,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("invoice_id").required())
                .field(
                    FieldSpec::enumeration("status", InvoiceStatus::VALUES)
                        .required()
                        .describe("New invoice status"),
                ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateInvoiceStatusParams {
    invoice_id: Uuid,
    status: InvoiceStatus,
}

#[async_trait]
impl Tool for UpdateInvoiceStatusTool {
    fn name(&self) -> &'static str {
        "update_invoice_status"
    }

    fn description(&self) -> &'static str {
        "Move an invoice through its lifecycle (send, pay, void)"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: UpdateInvoiceStatusParams = parse_params(params)?;
        let id = InvoiceId(params.invoice_id);

        let Some(mut invoice) = self.invoices.find_by_id(&id).await? else {
            return Err(ToolError::not_found("invoice", params.invoice_id));
        };

        if !invoice.status.can_transition_to(params.status) {
            return Err(ToolError::validation(
                "status",
                format!(
                    "invoice cannot move from {} to {}",
                    invoice.status.as_str(),
                    params.status.as_str()
                ),
            ));
        }
        invoice.status = params.status;
        invoice.updated_at = Utc::now();

        if self.invoices.update(invoice).await? == 0 {
            return Err(ToolError::not_found("invoice", params.invoice_id));
        }
        Ok(json!({"invoice_id": params.invoice_id, "status": params.status.as_str()}))
    }
}

pub struct ReadInvoicesTool {
    invoices: Arc<dyn InvoiceRepository>,
    schema: ParameterSchema,
}

impl ReadInvoicesTool {
    pub fn new(invoices: Arc<dyn InvoiceRepository>) -> Self {
        Self {
            invoices,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("client_id"))
                .field(FieldSpec::enumeration("status", InvoiceStatus::VALUES))
                .field(FieldSpec::integer("limit").min(1).max(100).default_value(json!(50))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReadInvoicesParams {
    client_id: Option<Uuid>,
    status: Option<InvoiceStatus>,
    limit: u32,
}

#[async_trait]
impl Tool for ReadInvoicesTool {
    fn name(&self) -> &'static str {
        "read_invoices"
    }

    fn description(&self) -> &'static str {
        "List invoices, optionally by client or status"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: ReadInvoicesParams = parse_params(params)?;
        let client_id = params.client_id.map(ClientId);
        let invoices =
            self.invoices.list(client_id.as_ref(), params.status, params.limit).await?;

        Ok(json!({"count": invoices.len(), "invoices": to_json(&invoices)?}))
    }
}

pub struct DeleteInvoiceTool {
    invoices: Arc<dyn InvoiceRepository>,
    schema: ParameterSchema,
}

impl DeleteInvoiceTool {
    pub fn new(invoices: Arc<dyn InvoiceRepository>) -> Self {
        Self {
            invoices,
            schema: ParameterSchema::new().field(FieldSpec::uuid("invoice_id").required()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeleteInvoiceParams {
    invoice_id: Uuid,
}

#[async_trait]
impl Tool for DeleteInvoiceTool {
    fn name(&self) -> &'static str {
        "delete_invoice"
    }

    fn description(&self) -> &'static str {
        "Delete an invoice record"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: DeleteInvoiceParams = parse_params(params)?;
        let id = InvoiceId(params.invoice_id);

        if self.invoices.delete(&id).await? == 0 {
            return Err(ToolError::not_found("invoice", params.invoice_id));
        }
        Ok(json!({"invoice_id": params.invoice_id, "deleted": true}))
    }
}
