use dinebot_agent::{ChatContext, Components};
use serde_json::json;

use crate::commands::{load_config, runtime, CommandResult};

const COMMAND: &str = "chat";

pub fn run(text: &str, session_id: Option<&str>) -> CommandResult {
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(result) => return result,
    };
    if let Err(error) = config.router_settings() {
        return CommandResult::failure(COMMAND, "config_missing", error.to_string(), 2);
    }

    let mut body = json!({"messages": [{"text": text}]});
    if let Some(session_id) = session_id {
        body["sessionId"] = json!(session_id);
    }
    let context = ChatContext { correlation_id: "cli".to_string(), ..ChatContext::default() };

    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let components = Components::from_config(&config)
            .map_err(|error| ("http_client", error.to_string(), 3u8))?;
        let router = components
            .router
            .ok_or(("config_missing", "router is not configured".to_string(), 2u8))?;
        router.route(body.to_string().as_bytes(), &context).await.map_err(|error| {
            if error.status_code() == 400 {
                ("bad_request", error.user_message().to_string(), 4u8)
            } else {
                ("service_unavailable", error.to_string(), 5u8)
            }
        })
    });

    match result {
        Ok(reply) => {
            let text = reply
                .messages
                .first()
                .map(|message| message.unstructured.text.clone())
                .unwrap_or_default();
            CommandResult::success_with_data(COMMAND, text, serde_json::to_value(&reply).ok())
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(COMMAND, error_class, message, exit_code)
        }
    }
}
