use dinebot_agent::Components;
use dinebot_cloud::ServiceError;
use dinebot_core::config::{AppConfig, ConfigError, LoadOptions};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub components: Components,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] ServiceError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        region = %config.cloud.region,
        "starting application bootstrap"
    );

    let components = Components::from_config(&config).map_err(BootstrapError::HttpClient)?;

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        "application bootstrap complete"
    );
    Ok(Application { config, components })
}

#[cfg(test)]
mod tests {
    use dinebot_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    #[tokio::test]
    async fn bootstrap_rejects_invalid_endpoint_override() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                queue_url: Some("ftp://queue.invalid/dining".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("error").to_string();
        assert!(message.contains("queue.url"), "unexpected error: {message}");
    }

    #[tokio::test]
    async fn bootstrap_wires_every_component_with_complete_settings() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                nlu_bot_id: Some("BOT".to_string()),
                nlu_bot_alias_id: Some("ALIAS".to_string()),
                queue_url: Some("https://sqs.us-east-1.amazonaws.com/1/dining".to_string()),
                store_table: Some("yelp-restaurants".to_string()),
                search_endpoint: Some("search.example.com".to_string()),
                email_source_address: Some("concierge@example.com".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap should succeed");

        assert!(app.components.router.is_some());
        assert!(app.components.fulfillment.is_some());
        assert!(app.components.worker.is_some());
    }
}
