use async_trait::async_trait;
use dinebot_core::config::EmailSettings;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::connection::{endpoint_url, post_json};
use crate::ServiceError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body_text: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), ServiceError>;
}

pub struct HttpEmailSender {
    client: Client,
    endpoint: String,
    source_address: String,
}

impl HttpEmailSender {
    pub fn new(client: Client, settings: &EmailSettings) -> Self {
        Self {
            client,
            endpoint: settings.endpoint.clone(),
            source_address: settings.source_address.clone(),
        }
    }
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "Data")]
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TextBody<'a> {
    text: Content<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SimpleMessage<'a> {
    subject: Content<'a>,
    body: TextBody<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct EmailContent<'a> {
    simple: SimpleMessage<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Destination<'a> {
    to_addresses: [&'a str; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailInput<'a> {
    from_email_address: &'a str,
    destination: Destination<'a>,
    content: EmailContent<'a>,
}

#[derive(Deserialize)]
struct SendEmailOutput {}

impl<'a> SendEmailInput<'a> {
    fn new(source_address: &'a str, email: &'a OutboundEmail) -> Self {
        Self {
            from_email_address: source_address,
            destination: Destination { to_addresses: [email.to.as_str()] },
            content: EmailContent {
                simple: SimpleMessage {
                    subject: Content { data: &email.subject },
                    body: TextBody { text: Content { data: &email.body_text } },
                },
            },
        }
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, email: &OutboundEmail) -> Result<(), ServiceError> {
        let url = endpoint_url(&self.endpoint, &["v2", "email", "outbound-emails"])?;
        let input = SendEmailInput::new(&self.source_address, email);
        let _: SendEmailOutput = post_json(&self.client, url, &input).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{OutboundEmail, SendEmailInput};

    #[test]
    fn send_input_wraps_plain_text_body() {
        let email = OutboundEmail {
            to: "diner@example.com".to_string(),
            subject: "Your Italian Dining Suggestions in manhattan".to_string(),
            body_text: "Hello!".to_string(),
        };

        assert_eq!(
            serde_json::to_value(SendEmailInput::new("bot@example.com", &email)).expect("encode"),
            json!({
                "FromEmailAddress": "bot@example.com",
                "Destination": {"ToAddresses": ["diner@example.com"]},
                "Content": {
                    "Simple": {
                        "Subject": {"Data": "Your Italian Dining Suggestions in manhattan"},
                        "Body": {"Text": {"Data": "Hello!"}}
                    }
                }
            })
        );
    }
}
