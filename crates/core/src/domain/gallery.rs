use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::client::ClientId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryId(pub Uuid);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalFileId(pub Uuid);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GalleryStatus {
    Draft,
    Published,
    Archived,
}

impl GalleryStatus {
    pub const VALUES: &'static [&'static str] = &["DRAFT", "PUBLISHED", "ARCHIVED"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
            Self::Archived => "ARCHIVED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "DRAFT" => Some(Self::Draft),
            "PUBLISHED" => Some(Self::Published),
            "ARCHIVED" => Some(Self::Archived),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gallery {
    pub id: GalleryId,
    pub client_id: Option<ClientId>,
    pub title: String,
    pub share_token: String,
    pub status: GalleryStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalFile {
    pub id: DigitalFileId,
    pub gallery_id: GalleryId,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
}

const SHARE_TOKEN_LEN: usize = 24;

/// Server-assigned token clients use to open a gallery without signing in.
pub fn generate_share_token() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(SHARE_TOKEN_LEN).map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::generate_share_token;

    #[test]
    fn share_tokens_are_alphanumeric_and_fixed_length() {
        let token = generate_share_token();
        assert_eq!(token.len(), 24);
        assert!(token.chars().all(|ch| ch.is_ascii_alphanumeric()));
    }

    #[test]
    fn share_tokens_do_not_repeat() {
        assert_ne!(generate_share_token(), generate_share_token());
    }
}
