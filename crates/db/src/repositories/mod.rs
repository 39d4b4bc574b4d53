use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use focal_core::domain::client::{Client, ClientId, ClientStatus};
use focal_core::domain::content::{
    BlogPost, BlogPostId, BlogPostStatus, CampaignRecipient, CampaignStatus, EmailCampaign,
    EmailCampaignId,
};
use focal_core::domain::gallery::{DigitalFile, DigitalFileId, Gallery, GalleryId, GalleryStatus};
use focal_core::domain::invoice::{Invoice, InvoiceId, InvoiceStatus};
use focal_core::domain::lead::{Lead, LeadId, LeadStatus};
use focal_core::domain::questionnaire::{
    Question, Questionnaire, QuestionnaireId, QuestionnaireStatus,
};
use focal_core::domain::session::{PhotographySession, SessionId, SessionStatus};
use focal_core::errors::ToolError;

pub mod blog;
pub mod campaign;
pub mod client;
pub mod gallery;
pub mod invoice;
pub mod lead;
pub mod questionnaire;
pub mod session;

pub use blog::SqlBlogPostRepository;
pub use campaign::SqlEmailCampaignRepository;
pub use client::SqlClientRepository;
pub use gallery::SqlGalleryRepository;
pub use invoice::SqlInvoiceRepository;
pub use lead::SqlLeadRepository;
pub use questionnaire::SqlQuestionnaireRepository;
pub use session::SqlSessionRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ToolError {
    fn from(error: RepositoryError) -> Self {
        ToolError::Storage(error.to_string())
    }
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn insert(&self, client: Client) -> Result<(), RepositoryError>;
    /// Full-row overwrite; returns the number of rows affected so callers
    /// can distinguish a missing id from a successful write.
    async fn update(&self, client: Client) -> Result<u64, RepositoryError>;
    async fn find_by_id(&self, id: &ClientId) -> Result<Option<Client>, RepositoryError>;
    async fn search(
        &self,
        term: Option<&str>,
        status: Option<ClientStatus>,
        limit: u32,
    ) -> Result<Vec<Client>, RepositoryError>;
    async fn list_active(&self) -> Result<Vec<Client>, RepositoryError>;
    async fn delete(&self, id: &ClientId) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn insert(&self, lead: Lead) -> Result<(), RepositoryError>;
    async fn update(&self, lead: Lead) -> Result<u64, RepositoryError>;
    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError>;
    async fn list(
        &self,
        status: Option<LeadStatus>,
        limit: u32,
    ) -> Result<Vec<Lead>, RepositoryError>;
    /// Marks the lead converted and inserts the client row in one
    /// transaction.
    async fn convert(&self, lead: Lead, client: Client) -> Result<(), RepositoryError>;
    async fn delete(&self, id: &LeadId) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn insert(&self, session: PhotographySession) -> Result<(), RepositoryError>;
    async fn update(&self, session: PhotographySession) -> Result<u64, RepositoryError>;
    async fn find_by_id(
        &self,
        id: &SessionId,
    ) -> Result<Option<PhotographySession>, RepositoryError>;
    async fn list(
        &self,
        client_id: Option<&ClientId>,
        status: Option<SessionStatus>,
        limit: u32,
    ) -> Result<Vec<PhotographySession>, RepositoryError>;
    /// Non-cancelled sessions whose start falls on `date`, for availability
    /// checks.
    async fn list_blocking_on_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<PhotographySession>, RepositoryError>;
    async fn delete(&self, id: &SessionId) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn insert(&self, invoice: Invoice) -> Result<(), RepositoryError>;
    async fn update(&self, invoice: Invoice) -> Result<u64, RepositoryError>;
    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, RepositoryError>;
    async fn list(
        &self,
        client_id: Option<&ClientId>,
        status: Option<InvoiceStatus>,
        limit: u32,
    ) -> Result<Vec<Invoice>, RepositoryError>;
    async fn delete(&self, id: &InvoiceId) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait GalleryRepository: Send + Sync {
    async fn insert(&self, gallery: Gallery) -> Result<(), RepositoryError>;
    async fn update(&self, gallery: Gallery) -> Result<u64, RepositoryError>;
    async fn find_by_id(&self, id: &GalleryId) -> Result<Option<Gallery>, RepositoryError>;
    async fn list(
        &self,
        client_id: Option<&ClientId>,
        status: Option<GalleryStatus>,
        limit: u32,
    ) -> Result<Vec<Gallery>, RepositoryError>;
    async fn delete(&self, id: &GalleryId) -> Result<u64, RepositoryError>;

    async fn insert_file(&self, file: DigitalFile) -> Result<(), RepositoryError>;
    async fn list_files(&self, gallery_id: &GalleryId)
        -> Result<Vec<DigitalFile>, RepositoryError>;
    async fn delete_file(&self, id: &DigitalFileId) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait BlogPostRepository: Send + Sync {
    async fn insert(&self, post: BlogPost) -> Result<(), RepositoryError>;
    async fn update(&self, post: BlogPost) -> Result<u64, RepositoryError>;
    async fn find_by_id(&self, id: &BlogPostId) -> Result<Option<BlogPost>, RepositoryError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, RepositoryError>;
    async fn search(
        &self,
        term: Option<&str>,
        status: Option<BlogPostStatus>,
        limit: u32,
    ) -> Result<Vec<BlogPost>, RepositoryError>;
    async fn delete(&self, id: &BlogPostId) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait EmailCampaignRepository: Send + Sync {
    async fn insert(&self, campaign: EmailCampaign) -> Result<(), RepositoryError>;
    async fn update(&self, campaign: EmailCampaign) -> Result<u64, RepositoryError>;
    async fn find_by_id(
        &self,
        id: &EmailCampaignId,
    ) -> Result<Option<EmailCampaign>, RepositoryError>;
    async fn list(
        &self,
        status: Option<CampaignStatus>,
        limit: u32,
    ) -> Result<Vec<EmailCampaign>, RepositoryError>;
    /// Flips the campaign to SENT and records every recipient row in one
    /// transaction, so a partial send cannot be observed.
    async fn mark_sent(
        &self,
        campaign: &EmailCampaign,
        recipients: Vec<CampaignRecipient>,
    ) -> Result<(), RepositoryError>;
    async fn list_recipients(
        &self,
        campaign_id: &EmailCampaignId,
    ) -> Result<Vec<CampaignRecipient>, RepositoryError>;
    async fn delete(&self, id: &EmailCampaignId) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait QuestionnaireRepository: Send + Sync {
    /// Inserts the questionnaire and all of its questions in one
    /// transaction.
    async fn create(
        &self,
        questionnaire: Questionnaire,
        questions: Vec<Question>,
    ) -> Result<(), RepositoryError>;
    async fn update(&self, questionnaire: Questionnaire) -> Result<u64, RepositoryError>;
    async fn find_by_id(
        &self,
        id: &QuestionnaireId,
    ) -> Result<Option<Questionnaire>, RepositoryError>;
    async fn list_questions(
        &self,
        id: &QuestionnaireId,
    ) -> Result<Vec<Question>, RepositoryError>;
    async fn list(
        &self,
        client_id: Option<&ClientId>,
        status: Option<QuestionnaireStatus>,
        limit: u32,
    ) -> Result<Vec<Questionnaire>, RepositoryError>;
    async fn delete(&self, id: &QuestionnaireId) -> Result<u64, RepositoryError>;
}

pub(crate) fn parse_uuid(column: &str, value: String) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(&value).map_err(|error| {
        RepositoryError::Decode(format!("invalid uuid in `{column}`: `{value}` ({error})"))
    })
}

pub(crate) fn parse_timestamp(
    column: &str,
    value: String,
) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}

pub(crate) fn parse_optional_timestamp(
    column: &str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    value.map(|timestamp| parse_timestamp(column, timestamp)).transpose()
}

pub(crate) fn parse_date(column: &str, value: String) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|error| {
        RepositoryError::Decode(format!("invalid date in `{column}`: `{value}` ({error})"))
    })
}

pub(crate) fn parse_decimal(column: &str, value: String) -> Result<Decimal, RepositoryError> {
    value.parse::<Decimal>().map_err(|error| {
        RepositoryError::Decode(format!("invalid decimal in `{column}`: `{value}` ({error})"))
    })
}

pub(crate) fn parse_status<T>(
    column: &str,
    value: String,
    parse: fn(&str) -> Option<T>,
) -> Result<T, RepositoryError> {
    parse(&value).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown status in `{column}`: `{value}`"))
    })
}

pub(crate) fn parse_u32_column(column: &str, value: i64) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|_| {
        RepositoryError::Decode(format!(
            "invalid value for `{column}` (expected non-negative u32): {value}"
        ))
    })
}
