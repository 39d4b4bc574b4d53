use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::client::ClientId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionnaireId(pub Uuid);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionId(pub Uuid);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionnaireStatus {
    Draft,
    Sent,
    Completed,
}

impl QuestionnaireStatus {
    pub const VALUES: &'static [&'static str] = &["DRAFT", "SENT", "COMPLETED"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Sent => "SENT",
            Self::Completed => "COMPLETED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "DRAFT" => Some(Self::Draft),
            "SENT" => Some(Self::Sent),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionFieldType {
    Text,
    Multiline,
    Select,
    Boolean,
}

impl QuestionFieldType {
    pub const VALUES: &'static [&'static str] = &["TEXT", "MULTILINE", "SELECT", "BOOLEAN"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Multiline => "MULTILINE",
            Self::Select => "SELECT",
            Self::Boolean => "BOOLEAN",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "TEXT" => Some(Self::Text),
            "MULTILINE" => Some(Self::Multiline),
            "SELECT" => Some(Self::Select),
            "BOOLEAN" => Some(Self::Boolean),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Questionnaire {
    pub id: QuestionnaireId,
    pub client_id: Option<ClientId>,
    pub title: String,
    pub status: QuestionnaireStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub questionnaire_id: QuestionnaireId,
    pub position: u32,
    pub prompt: String,
    pub field_type: QuestionFieldType,
    pub required: bool,
    /// Choice labels for SELECT questions, empty otherwise.
    pub options: Vec<String>,
}
