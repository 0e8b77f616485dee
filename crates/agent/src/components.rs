use std::sync::Arc;

use dinebot_cloud::{
    http_client, HttpEmailSender, HttpMessageQueue, HttpNluClient, HttpRestaurantStore,
    HttpSearchIndex, ServiceError,
};
use dinebot_core::config::{AppConfig, ConfigError};
use serde::Serialize;
use tracing::{info, warn};

use crate::{DialogFulfillmentHandler, MessageRouter, SuggestionWorker};

/// Readiness of one component, as reported by health checks and `doctor`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComponentStatus {
    pub name: &'static str,
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ComponentStatus {
    fn from_result<T>(name: &'static str, result: &Result<T, ConfigError>) -> Self {
        match result {
            Ok(_) => Self { name, configured: true, detail: None },
            Err(error) => Self { name, configured: false, detail: Some(error.to_string()) },
        }
    }
}

/// Which components the configuration can run, without building anything.
pub fn component_statuses(config: &AppConfig) -> Vec<ComponentStatus> {
    vec![
        ComponentStatus::from_result("router", &config.router_settings()),
        ComponentStatus::from_result("fulfillment", &config.fulfillment_settings()),
        ComponentStatus::from_result("worker", &config.worker_settings()),
    ]
}

/// HTTP-backed components. A component whose settings are incomplete is left
/// out rather than failing the whole process.
#[derive(Clone, Default)]
pub struct Components {
    pub router: Option<Arc<MessageRouter>>,
    pub fulfillment: Option<Arc<DialogFulfillmentHandler>>,
    pub worker: Option<Arc<SuggestionWorker>>,
}

impl Components {
    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        let client = http_client(config.http.timeout_secs)?;
        let mut components = Self::default();

        match config.router_settings() {
            Ok(settings) => {
                let nlu = Arc::new(HttpNluClient::new(client.clone(), &settings.nlu));
                components.router = Some(Arc::new(MessageRouter::new(nlu, settings)));
            }
            Err(error) => disabled("router", &error),
        }

        match config.fulfillment_settings() {
            Ok(settings) => {
                let queue = Arc::new(HttpMessageQueue::new(client.clone(), &settings.queue));
                components.fulfillment = Some(Arc::new(DialogFulfillmentHandler::new(queue)));
            }
            Err(error) => disabled("fulfillment", &error),
        }

        match config.worker_settings() {
            Ok(settings) => {
                components.worker = Some(Arc::new(SuggestionWorker::new(
                    Arc::new(HttpMessageQueue::new(client.clone(), &settings.queue)),
                    Arc::new(HttpSearchIndex::new(client.clone(), &settings.search)),
                    Arc::new(HttpRestaurantStore::new(client.clone(), &settings.store)),
                    Arc::new(HttpEmailSender::new(client, &settings.email)),
                )));
            }
            Err(error) => disabled("worker", &error),
        }

        info!(
            event_name = "system.components.built",
            correlation_id = "bootstrap",
            router = components.router.is_some(),
            fulfillment = components.fulfillment.is_some(),
            worker = components.worker.is_some(),
            "service components assembled"
        );
        Ok(components)
    }
}

fn disabled(component: &'static str, error: &ConfigError) {
    warn!(
        event_name = "system.components.disabled",
        correlation_id = "bootstrap",
        component,
        reason = %error,
        "component disabled by incomplete configuration"
    );
}

#[cfg(test)]
mod tests {
    use dinebot_core::config::AppConfig;

    use super::{component_statuses, Components};

    #[test]
    fn statuses_name_the_missing_setting() {
        let mut config = AppConfig::default();
        config.queue.url = Some("https://sqs.us-east-1.amazonaws.com/123/dining".to_string());

        let statuses = component_statuses(&config);

        assert!(!statuses[0].configured);
        assert!(statuses[0].detail.as_deref().is_some_and(|detail| detail.contains("nlu.bot_id")));
        assert!(statuses[1].configured);
        assert!(!statuses[2].configured);
    }

    #[test]
    fn builds_only_configured_components() {
        let mut config = AppConfig::default();
        config.nlu.bot_id = Some("BOT".to_string());
        config.nlu.bot_alias_id = Some("ALIAS".to_string());

        let components = Components::from_config(&config).expect("client builds");

        assert!(components.router.is_some());
        assert!(components.fulfillment.is_none());
        assert!(components.worker.is_none());
    }
}
