use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ValidationError;

/// Version of the moment schema written alongside every stored record.
pub const SCHEMA_VERSION: u32 = 1;

/// Upper bound on the text carried by one moment, image included.
/// DynamoDB rejects items over 400 KB; the rest is left for attribute names and timestamps.
pub const MAX_MOMENT_BYTES: usize = 350 * 1024;

/// A stored moment. Serialized with the camelCase field names the frontend reads.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Moment {
    /// Written as `_id`, the key the web client reads and deletes by.
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub selected_file: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Payload accepted by `POST /moments`.
///
/// `title` and `message` default to empty strings so that a missing field is
/// reported as a validation failure instead of a JSON decoding failure.
/// Older clients sent `description` instead of `message`.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewMoment {
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "description")]
    pub message: String,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub selected_file: Option<String>,
}

impl NewMoment {
    /// Checks the required fields are present and not blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        if self.message.trim().is_empty() {
            return Err(ValidationError::MissingField("message"));
        }
        let size = self.payload_size();
        if size > MAX_MOMENT_BYTES {
            return Err(ValidationError::TooLarge {
                size,
                limit: MAX_MOMENT_BYTES,
            });
        }
        Ok(())
    }

    fn payload_size(&self) -> usize {
        self.title.len()
            + self.message.len()
            + self.creator.as_ref().map_or(0, String::len)
            + self.tags.iter().flatten().map(String::len).sum::<usize>()
            + self.selected_file.as_ref().map_or(0, String::len)
    }
}

impl Moment {
    /// Validates a payload and stamps it with a fresh id and timestamps.
    pub fn from_new(new: NewMoment) -> Result<Self, ValidationError> {
        new.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            title: new.title,
            message: new.message,
            creator: new.creator.unwrap_or_default(),
            tags: new.tags.unwrap_or_default(),
            // An empty string from the file picker means "no image".
            selected_file: new.selected_file.filter(|s| !s.is_empty()),
            created_at: now,
            updated_at: now,
            schema_version: SCHEMA_VERSION,
        })
    }
}

/// Query string of `GET /moments`. Missing values fall back to the defaults.
#[derive(Deserialize, Debug, Default)]
pub struct ListParams {
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Response body of `GET /moments`.
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MomentsPage {
    pub moments: Vec<Moment>,
    pub total_pages: u64,
    pub current_page: u64,
}
