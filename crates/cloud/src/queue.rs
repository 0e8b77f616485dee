use std::collections::BTreeMap;

use async_trait::async_trait;
use dinebot_core::config::QueueSettings;
use dinebot_core::SuggestionRequest;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::connection::post_target;
use crate::ServiceError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    pub body: String,
    pub attributes: BTreeMap<String, String>,
}

impl TryFrom<&SuggestionRequest> for OutboundMessage {
    type Error = serde_json::Error;

    fn try_from(request: &SuggestionRequest) -> Result<Self, Self::Error> {
        Ok(Self { body: request.to_body()?, attributes: request.message_attributes() })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub body: String,
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Returns the id the queue assigned to the message.
    async fn send(&self, message: OutboundMessage) -> Result<String, ServiceError>;
    /// Takes at most one visible message without waiting.
    async fn receive_one(&self) -> Result<Option<QueueMessage>, ServiceError>;
    async fn delete(&self, receipt_handle: &str) -> Result<(), ServiceError>;
}

pub struct HttpMessageQueue {
    client: Client,
    endpoint: String,
    queue_url: String,
}

impl HttpMessageQueue {
    pub fn new(client: Client, settings: &QueueSettings) -> Self {
        Self { client, endpoint: settings.endpoint.clone(), queue_url: settings.url.clone() }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct StringAttribute<'a> {
    data_type: &'static str,
    string_value: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendMessageInput<'a> {
    queue_url: &'a str,
    message_body: &'a str,
    message_attributes: BTreeMap<&'a str, StringAttribute<'a>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SendMessageOutput {
    #[serde(default)]
    message_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ReceiveMessageInput<'a> {
    queue_url: &'a str,
    max_number_of_messages: u8,
    wait_time_seconds: u8,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReceiveMessageOutput {
    #[serde(default)]
    messages: Vec<ReceivedMessage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReceivedMessage {
    message_id: String,
    receipt_handle: String,
    #[serde(default)]
    body: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DeleteMessageInput<'a> {
    queue_url: &'a str,
    receipt_handle: &'a str,
}

#[async_trait]
impl MessageQueue for HttpMessageQueue {
    async fn send(&self, message: OutboundMessage) -> Result<String, ServiceError> {
        let input = SendMessageInput {
            queue_url: &self.queue_url,
            message_body: &message.body,
            message_attributes: message
                .attributes
                .iter()
                .map(|(name, value)| {
                    (name.as_str(), StringAttribute { data_type: "String", string_value: value })
                })
                .collect(),
        };

        let output: SendMessageOutput =
            post_target(&self.client, &self.endpoint, "AmazonSQS.SendMessage", &input).await?;
        output
            .message_id
            .ok_or_else(|| ServiceError::Decode("send response carried no MessageId".to_string()))
    }

    async fn receive_one(&self) -> Result<Option<QueueMessage>, ServiceError> {
        let input = ReceiveMessageInput {
            queue_url: &self.queue_url,
            max_number_of_messages: 1,
            wait_time_seconds: 0,
        };

        let output: ReceiveMessageOutput =
            post_target(&self.client, &self.endpoint, "AmazonSQS.ReceiveMessage", &input).await?;
        Ok(output.messages.into_iter().next().map(|message| QueueMessage {
            message_id: message.message_id,
            receipt_handle: message.receipt_handle,
            body: message.body,
        }))
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), ServiceError> {
        let input = DeleteMessageInput { queue_url: &self.queue_url, receipt_handle };
        let _: serde_json::Value =
            post_target(&self.client, &self.endpoint, "AmazonSQS.DeleteMessage", &input).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{ReceiveMessageOutput, SendMessageInput, StringAttribute};

    #[test]
    fn send_input_encodes_string_attributes() {
        let input = SendMessageInput {
            queue_url: "https://queue.example.com/1/requests",
            message_body: "{}",
            message_attributes: BTreeMap::from([(
                "Cuisine",
                StringAttribute { data_type: "String", string_value: "italian" },
            )]),
        };
        let encoded = serde_json::to_value(&input).expect("encode");

        assert_eq!(encoded["QueueUrl"], "https://queue.example.com/1/requests");
        assert_eq!(encoded["MessageAttributes"]["Cuisine"]["DataType"], "String");
        assert_eq!(encoded["MessageAttributes"]["Cuisine"]["StringValue"], "italian");
    }

    #[test]
    fn empty_receive_has_no_messages() {
        let output: ReceiveMessageOutput = serde_json::from_str("{}").expect("decode");
        assert!(output.messages.is_empty());
    }
}
