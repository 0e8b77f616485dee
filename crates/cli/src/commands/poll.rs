use dinebot_agent::Components;
use tracing::debug;

use crate::commands::{load_config, runtime, CommandResult};

const COMMAND: &str = "poll";

pub fn run() -> CommandResult {
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(result) => return result,
    };
    if let Err(error) = config.worker_settings() {
        return CommandResult::failure(COMMAND, "config_missing", error.to_string(), 2);
    }

    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let components = Components::from_config(&config)
            .map_err(|error| ("http_client", error.to_string(), 3u8))?;
        let worker = components
            .worker
            .ok_or(("config_missing", "worker is not configured".to_string(), 2u8))?;
        worker.run_once().await.map_err(|error| ("worker", error.to_string(), 4u8))
    });

    match result {
        Ok(outcome) => {
            debug!(
                event_name = "cli.poll.completed",
                correlation_id = "cli",
                status = %outcome.status(),
                "worker invocation finished"
            );
            CommandResult::success_with_data(
                COMMAND,
                outcome.status(),
                serde_json::to_value(outcome.report()).ok(),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(COMMAND, error_class, message, exit_code)
        }
    }
}
