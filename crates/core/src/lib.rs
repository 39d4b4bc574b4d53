pub mod config;
pub mod domain;
pub mod errors;
pub mod scheduling;

pub use domain::client::{Client, ClientId, ClientStatus};
pub use domain::content::{
    BlogPost, BlogPostId, BlogPostStatus, CampaignRecipient, CampaignStatus, EmailCampaign,
    EmailCampaignId,
};
pub use domain::gallery::{DigitalFile, DigitalFileId, Gallery, GalleryId, GalleryStatus};
pub use domain::invoice::{Invoice, InvoiceId, InvoiceStatus};
pub use domain::lead::{Lead, LeadId, LeadStatus};
pub use domain::questionnaire::{
    Question, QuestionFieldType, QuestionId, Questionnaire, QuestionnaireId, QuestionnaireStatus,
};
pub use domain::session::{PhotographySession, SessionId, SessionStatus};
pub use errors::ToolError;
pub use scheduling::{available_slots, AvailabilitySlot, BookedInterval};

pub use chrono;
pub use uuid;
