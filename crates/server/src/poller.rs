use std::sync::Arc;
use std::time::Duration;

use dinebot_agent::SuggestionWorker;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Runs one worker invocation per tick until the task is aborted.
pub fn spawn(worker: Arc<SuggestionWorker>, every: Duration) -> JoinHandle<()> {
    info!(
        event_name = "worker.poller.start",
        correlation_id = "poller",
        interval_secs = every.as_secs(),
        "background suggestion poller started"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match worker.run_once().await {
                Ok(outcome) => info!(
                    event_name = "worker.poller.tick",
                    correlation_id = "poller",
                    status = %outcome.status(),
                    "worker invocation finished"
                ),
                Err(source) => error!(
                    event_name = "worker.poller.failed",
                    correlation_id = "poller",
                    error = %source,
                    "worker invocation failed"
                ),
            }
        }
    })
}
