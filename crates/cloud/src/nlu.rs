use async_trait::async_trait;
use dinebot_core::config::NluSettings;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::connection::{endpoint_url, post_json};
use crate::ServiceError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizeTextRequest {
    pub bot_id: String,
    pub bot_alias_id: String,
    pub locale_id: String,
    pub session_id: String,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NluMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl NluMessage {
    pub fn plain_text(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), content_type: Some("PlainText".to_string()) }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizeTextResponse {
    #[serde(default)]
    pub messages: Vec<NluMessage>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[async_trait]
pub trait NluClient: Send + Sync {
    async fn recognize_text(
        &self,
        request: &RecognizeTextRequest,
    ) -> Result<RecognizeTextResponse, ServiceError>;
}

pub struct HttpNluClient {
    client: Client,
    endpoint: String,
}

impl HttpNluClient {
    pub fn new(client: Client, settings: &NluSettings) -> Self {
        Self { client, endpoint: settings.endpoint.clone() }
    }
}

#[derive(Serialize)]
struct RecognizeTextBody<'a> {
    text: &'a str,
}

#[async_trait]
impl NluClient for HttpNluClient {
    async fn recognize_text(
        &self,
        request: &RecognizeTextRequest,
    ) -> Result<RecognizeTextResponse, ServiceError> {
        let url = endpoint_url(
            &self.endpoint,
            &[
                "bots",
                request.bot_id.as_str(),
                "botAliases",
                request.bot_alias_id.as_str(),
                "botLocales",
                request.locale_id.as_str(),
                "sessions",
                request.session_id.as_str(),
                "text",
            ],
        )?;

        post_json(&self.client, url, &RecognizeTextBody { text: &request.text }).await
    }
}
