use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::location::queue_location;

/// A fully collected dining request, written once to the queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SuggestionRequest {
    pub location: String,
    pub cuisine: String,
    pub dining_time: String,
    pub number_of_people: String,
    pub email: String,
    pub timestamp: String,
}

impl SuggestionRequest {
    /// Builds the queued record. Location is rewritten for the queue here and
    /// nowhere else.
    pub fn new(
        location: &str,
        cuisine: &str,
        dining_time: &str,
        number_of_people: &str,
        email: &str,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            location: queue_location(location),
            cuisine: cuisine.to_string(),
            dining_time: dining_time.to_string(),
            number_of_people: number_of_people.to_string(),
            email: email.to_string(),
            timestamp: requested_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }

    pub fn to_body(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// String attributes attached to the queue message alongside the body.
    pub fn message_attributes(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("Cuisine".to_string(), self.cuisine.clone()),
            ("Location".to_string(), self.location.clone()),
            ("Email".to_string(), self.email.clone()),
        ])
    }
}

/// A queued request as read back by the worker. Nothing is guaranteed to be
/// present; scalar fields of any JSON type are rendered as text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PendingSuggestion {
    #[serde(default, deserialize_with = "lenient_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub cuisine: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub dining_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub number_of_people: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub timestamp: Option<String>,
}

impl PendingSuggestion {
    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}
