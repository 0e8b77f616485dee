use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use dinebot_cli::commands::{chat, config, dialog, doctor, poll};
use serde_json::{json, Value};

const QUEUE_URL: &str = "http://127.0.0.1:9/000000000000/dining-requests";

#[test]
fn poll_reports_missing_worker_settings() {
    with_env(&[("DINEBOT_QUEUE_URL", QUEUE_URL)], || {
        let result = poll::run();
        assert_eq!(result.exit_code, 2, "expected missing-setting failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "poll");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_missing");
        assert!(payload["message"].as_str().unwrap_or("").contains("store.table"));
    });
}

#[test]
fn invalid_config_is_reported_as_validation_failure() {
    with_env(&[("DINEBOT_HTTP_TIMEOUT_SECS", "900")], || {
        let result = poll::run();
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn chat_rejects_blank_text_before_calling_the_service() {
    with_env(&[("LEX_BOT_ID", "BOT"), ("LEX_BOT_ALIAS_ID", "ALIAS")], || {
        let result = chat::run("   ", Some("operator"));
        assert_eq!(result.exit_code, 4, "expected bad request failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "chat");
        assert_eq!(payload["error_class"], "bad_request");
        assert_eq!(payload["message"], "Empty message text");
    });
}

#[test]
fn chat_requires_bot_identifiers() {
    with_env(&[], || {
        let result = chat::run("hello", None);
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_missing");
        assert!(payload["message"].as_str().unwrap_or("").contains("nlu.bot_id"));
    });
}

#[test]
fn dialog_answers_greeting_event_from_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("greeting.json");
    fs::write(
        &path,
        json!({
            "invocationSource": "FulfillmentCodeHook",
            "sessionState": {
                "sessionAttributes": {"source": "cli"},
                "intent": {"name": "GreetingIntent"}
            }
        })
        .to_string(),
    )
    .expect("write event");

    with_env(&[("SQS_QUEUE_URL", QUEUE_URL)], || {
        let result = dialog::run(&path);
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "dialog");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["message"], "Close");
        assert_eq!(payload["data"]["sessionState"]["intent"]["state"], "Fulfilled");
        assert_eq!(payload["data"]["sessionState"]["sessionAttributes"]["source"], "cli");
    });
}

#[test]
fn dialog_reports_unreadable_event_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("broken.json");
    fs::write(&path, "{\"sessionState\": 5}").expect("write event");

    with_env(&[("DINEBOT_QUEUE_URL", QUEUE_URL)], || {
        let result = dialog::run(&path);
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "input");
        assert!(payload["message"].as_str().unwrap_or("").contains("broken.json"));
    });
}

#[test]
fn doctor_lists_component_readiness() {
    with_env(&[("DINEBOT_QUEUE_URL", QUEUE_URL)], || {
        let output = doctor::run(true);
        let report: Value = serde_json::from_str(&output).expect("doctor json");

        assert_eq!(report["overall_status"], "fail");
        let checks = report["checks"].as_array().expect("checks");
        let status_of = |name: &str| {
            checks
                .iter()
                .find(|check| check["name"] == name)
                .map(|check| check["status"].clone())
                .unwrap_or(Value::Null)
        };
        assert_eq!(status_of("config_validation"), "pass");
        assert_eq!(status_of("router"), "fail");
        assert_eq!(status_of("fulfillment"), "pass");
        assert_eq!(status_of("worker"), "fail");
    });
}

#[test]
fn config_attributes_legacy_environment_names() {
    with_env(&[("LEX_BOT_ID", "BOT"), ("OPENSEARCH_ENDPOINT", "search.example.com")], || {
        let output = config::run();

        assert!(output.contains("- nlu.bot_id = BOT (source: env (LEX_BOT_ID))"), "{output}");
        assert!(output.contains("- search.index = restaurants (source: default)"), "{output}");
        assert!(output.contains("- search -> https://search.example.com/restaurants"), "{output}");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "AWS_REGION",
        "DINEBOT_CLOUD_REGION",
        "DINEBOT_NLU_BOT_ID",
        "DINEBOT_NLU_BOT_ALIAS_ID",
        "DINEBOT_NLU_LOCALE_ID",
        "DINEBOT_NLU_ENDPOINT",
        "LEX_BOT_ID",
        "LEX_BOT_ALIAS_ID",
        "LEX_LOCALE_ID",
        "DINEBOT_QUEUE_URL",
        "DINEBOT_QUEUE_ENDPOINT",
        "SQS_QUEUE_URL",
        "QUEUE_URL",
        "DINEBOT_STORE_TABLE",
        "DINEBOT_STORE_ENDPOINT",
        "DYNAMODB_TABLE",
        "DINEBOT_SEARCH_ENDPOINT",
        "DINEBOT_SEARCH_INDEX",
        "OPENSEARCH_ENDPOINT",
        "DINEBOT_EMAIL_SOURCE_ADDRESS",
        "DINEBOT_EMAIL_ENDPOINT",
        "SES_SOURCE_EMAIL",
        "DINEBOT_HTTP_TIMEOUT_SECS",
        "DINEBOT_SERVER_BIND_ADDRESS",
        "DINEBOT_SERVER_PORT",
        "DINEBOT_SERVER_WORKER_POLL_SECS",
        "DINEBOT_LOGGING_LEVEL",
        "DINEBOT_LOGGING_FORMAT",
        "DINEBOT_LOG_LEVEL",
        "DINEBOT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
