use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use dinebot_cloud::{NluClient, RecognizeTextRequest};
use dinebot_core::config::{NluSettings, RouterSettings};
use dinebot_core::{ApplicationError, InterfaceError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};
use uuid::Uuid;

pub const DEFAULT_SESSION_ID: &str = "default-user";
const EMPTY_REPLY_MESSAGE: &str = "Sorry, I didn't understand that. Could you try again?";

/// What the transport knows about the caller, besides the body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatContext {
    pub session_header: Option<String>,
    pub source_ip: Option<String>,
    pub correlation_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub messages: Vec<BotMessage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub unstructured: UnstructuredText,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnstructuredText {
    pub id: String,
    pub text: String,
    pub timestamp: String,
}

impl ChatReply {
    fn unstructured(text: String, now: DateTime<Utc>) -> Self {
        Self {
            messages: vec![BotMessage {
                kind: "unstructured".to_string(),
                unstructured: UnstructuredText {
                    id: Uuid::new_v4().to_string(),
                    text,
                    timestamp: now.to_rfc3339_opts(SecondsFormat::Micros, true),
                },
            }],
        }
    }
}

/// Error payload returned to the chat client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

impl From<&InterfaceError> for ErrorBody {
    fn from(error: &InterfaceError) -> Self {
        Self { code: error.status_code(), message: error.user_message().to_string() }
    }
}

/// Relays chat text to the recognition service.
pub struct MessageRouter {
    nlu: Arc<dyn NluClient>,
    settings: NluSettings,
}

impl MessageRouter {
    pub fn new(nlu: Arc<dyn NluClient>, settings: RouterSettings) -> Self {
        Self { nlu, settings: settings.nlu }
    }

    pub async fn route(
        &self,
        body: &[u8],
        context: &ChatContext,
    ) -> Result<ChatReply, InterfaceError> {
        self.route_at(body, context, Utc::now()).await
    }

    pub async fn route_at(
        &self,
        body: &[u8],
        context: &ChatContext,
        now: DateTime<Utc>,
    ) -> Result<ChatReply, InterfaceError> {
        let correlation_id = context.correlation_id.as_str();
        let bad_request = |message: &str| {
            info!(
                event_name = "router.request.rejected",
                correlation_id = %correlation_id,
                reason = message,
                "chat request rejected"
            );
            InterfaceError::bad_request(message, correlation_id)
        };

        if body.is_empty() {
            return Err(bad_request("Missing request body"));
        }
        let payload: Value =
            serde_json::from_slice(body).map_err(|_| bad_request("Invalid JSON in request body"))?;
        let text = last_message_text(&payload).map_err(bad_request)?;
        let session_id = session_key(&payload, context);

        debug!(
            event_name = "router.nlu.request",
            correlation_id = %correlation_id,
            session_id = %session_id,
            text_len = text.len(),
            "forwarding chat text"
        );

        let request = RecognizeTextRequest {
            bot_id: self.settings.bot_id.clone(),
            bot_alias_id: self.settings.bot_alias_id.clone(),
            locale_id: self.settings.locale_id.clone(),
            session_id,
            text,
        };
        let response = self.nlu.recognize_text(&request).await.map_err(|source| {
            error!(
                event_name = "router.nlu.failed",
                correlation_id = %correlation_id,
                error = %source,
                "recognition service call failed"
            );
            ApplicationError::Integration(source.to_string()).into_interface(correlation_id)
        })?;

        let reply = if response.messages.is_empty() {
            EMPTY_REPLY_MESSAGE.to_string()
        } else {
            response
                .messages
                .iter()
                .map(|message| message.content.as_deref().unwrap_or_default())
                .collect::<Vec<_>>()
                .join(" ")
        };

        info!(
            event_name = "router.nlu.reply",
            correlation_id = %correlation_id,
            fragments = response.messages.len(),
            "relaying recognition reply"
        );
        Ok(ChatReply::unstructured(reply, now))
    }
}

/// Text of the last message, accepting `{unstructured: {text}}` or `{text}`.
fn last_message_text(payload: &Value) -> Result<String, &'static str> {
    let last = payload
        .get("messages")
        .and_then(Value::as_array)
        .and_then(|messages| messages.last())
        .ok_or("Missing or empty messages array")?;

    let text = if let Some(unstructured) = last.get("unstructured") {
        unstructured.get("text")
    } else if let Some(text) = last.get("text") {
        Some(text)
    } else {
        return Err("Message has no text content");
    };

    match text.and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        _ => Err("Empty message text"),
    }
}

/// Body `sessionId`, then the session header, then the caller address.
fn session_key(payload: &Value, context: &ChatContext) -> String {
    if let Some(session_id) = payload.get("sessionId").and_then(Value::as_str) {
        return session_id.to_string();
    }
    if let Some(header) = context.session_header.as_deref().filter(|value| !value.is_empty()) {
        return header.to_string();
    }
    if let Some(ip) = context.source_ip.as_deref().filter(|value| !value.is_empty()) {
        return ip.replace('.', "-");
    }
    DEFAULT_SESSION_ID.to_string()
}
