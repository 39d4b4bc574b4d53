use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::client::ClientId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub const VALUES: &'static [&'static str] = &["CONFIRMED", "COMPLETED", "CANCELLED"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "CONFIRMED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "CONFIRMED" => Some(Self::Confirmed),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// A confirmed booking can complete or cancel; both end states are
    /// terminal.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Confirmed, Self::Completed) | (Self::Confirmed, Self::Cancelled)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotographySession {
    pub id: SessionId,
    pub client_id: ClientId,
    pub session_type: String,
    pub title: String,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub price: Decimal,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PhotographySession {
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + chrono::Duration::minutes(i64::from(self.duration_minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::SessionStatus;

    #[test]
    fn confirmed_session_can_complete_or_cancel() {
        assert!(SessionStatus::Confirmed.can_transition_to(SessionStatus::Completed));
        assert!(SessionStatus::Confirmed.can_transition_to(SessionStatus::Cancelled));
    }

    #[test]
    fn end_states_are_terminal() {
        assert!(!SessionStatus::Completed.can_transition_to(SessionStatus::Confirmed));
        assert!(!SessionStatus::Cancelled.can_transition_to(SessionStatus::Confirmed));
        assert!(!SessionStatus::Completed.can_transition_to(SessionStatus::Cancelled));
    }
}
