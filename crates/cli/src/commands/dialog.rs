use std::fs;
use std::path::Path;

use anyhow::Context;
use dinebot_agent::Components;
use dinebot_core::CodeHookEvent;

use crate::commands::{load_config, runtime, CommandResult};

const COMMAND: &str = "dialog";

pub fn run(path: &Path) -> CommandResult {
    let event = match read_event(path) {
        Ok(event) => event,
        Err(error) => return CommandResult::failure(COMMAND, "input", format!("{error:#}"), 2),
    };

    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(result) => return result,
    };
    if let Err(error) = config.fulfillment_settings() {
        return CommandResult::failure(COMMAND, "config_missing", error.to_string(), 2);
    }

    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let components = Components::from_config(&config)
            .map_err(|error| ("http_client", error.to_string(), 3u8))?;
        let handler = components
            .fulfillment
            .ok_or(("config_missing", "fulfillment is not configured".to_string(), 2u8))?;
        Ok::<_, (&'static str, String, u8)>(handler.handle(event).await)
    });

    match result {
        Ok(response) => CommandResult::success_with_data(
            COMMAND,
            format!("{:?}", response.session_state.dialog_action.kind),
            serde_json::to_value(&response).ok(),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(COMMAND, error_class, message, exit_code)
        }
    }
}

fn read_event(path: &Path) -> anyhow::Result<CodeHookEvent> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read event file `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("`{}` is not a code-hook event", path.display()))
}
