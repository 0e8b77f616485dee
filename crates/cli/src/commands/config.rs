use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dinebot_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key: &str, env_keys: &[&str]| {
        field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    let mut push = |key: &str, value: &str, env_keys: &[&str]| {
        lines.push(render_line(key, value, source(key, env_keys)));
    };

    push("cloud.region", &config.cloud.region, &["DINEBOT_CLOUD_REGION", "AWS_REGION"]);
    push("nlu.bot_id", or_unset(&config.nlu.bot_id), &["DINEBOT_NLU_BOT_ID", "LEX_BOT_ID"]);
    push(
        "nlu.bot_alias_id",
        or_unset(&config.nlu.bot_alias_id),
        &["DINEBOT_NLU_BOT_ALIAS_ID", "LEX_BOT_ALIAS_ID"],
    );
    push("nlu.locale_id", &config.nlu.locale_id, &["DINEBOT_NLU_LOCALE_ID", "LEX_LOCALE_ID"]);
    push("queue.url", or_unset(&config.queue.url), &[
        "DINEBOT_QUEUE_URL",
        "SQS_QUEUE_URL",
        "QUEUE_URL",
    ]);
    push("store.table", or_unset(&config.store.table), &["DINEBOT_STORE_TABLE", "DYNAMODB_TABLE"]);
    push("search.endpoint", or_unset(&config.search.endpoint), &[
        "DINEBOT_SEARCH_ENDPOINT",
        "OPENSEARCH_ENDPOINT",
    ]);
    push("search.index", &config.search.index, &["DINEBOT_SEARCH_INDEX"]);
    push("email.source_address", or_unset(&config.email.source_address), &[
        "DINEBOT_EMAIL_SOURCE_ADDRESS",
        "SES_SOURCE_EMAIL",
    ]);
    push("http.timeout_secs", &config.http.timeout_secs.to_string(), &[
        "DINEBOT_HTTP_TIMEOUT_SECS",
    ]);
    push("server.bind_address", &config.server.bind_address, &["DINEBOT_SERVER_BIND_ADDRESS"]);
    push("server.port", &config.server.port.to_string(), &["DINEBOT_SERVER_PORT"]);
    push("server.worker_poll_secs", &config.server.worker_poll_secs.to_string(), &[
        "DINEBOT_SERVER_WORKER_POLL_SECS",
    ]);
    push("logging.level", &config.logging.level, &["DINEBOT_LOGGING_LEVEL", "DINEBOT_LOG_LEVEL"]);
    push("logging.format", &format!("{:?}", config.logging.format), &[
        "DINEBOT_LOGGING_FORMAT",
        "DINEBOT_LOG_FORMAT",
    ]);

    lines.push("resolved service endpoints:".to_string());
    lines.push(resolved_line("nlu", config.nlu_settings().map(|settings| settings.endpoint)));
    lines.push(resolved_line("queue", config.queue_settings().map(|settings| settings.endpoint)));
    lines.push(resolved_line("store", config.store_settings().map(|settings| settings.endpoint)));
    lines.push(resolved_line(
        "search",
        config
            .search_settings()
            .map(|settings| format!("{}/{}", settings.endpoint, settings.index)),
    ));
    lines.push(resolved_line("email", config.email_settings().map(|settings| settings.endpoint)));

    lines.join("\n")
}

fn or_unset(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("<unset>")
}

fn resolved_line<E: std::fmt::Display>(name: &str, endpoint: Result<String, E>) -> String {
    match endpoint {
        Ok(endpoint) => format!("- {name} -> {endpoint}"),
        Err(error) => format!("- {name} -> <unavailable: {error}>"),
    }
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("dinebot.toml"), PathBuf::from("config/dinebot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()))
    {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
