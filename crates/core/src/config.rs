use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub cloud: CloudConfig,
    pub nlu: NluConfig,
    pub queue: QueueConfig,
    pub store: StoreConfig,
    pub search: SearchConfig,
    pub email: EmailConfig,
    pub http: HttpConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CloudConfig {
    pub region: String,
}

#[derive(Clone, Debug)]
pub struct NluConfig {
    pub bot_id: Option<String>,
    pub bot_alias_id: Option<String>,
    pub locale_id: String,
    pub endpoint: Option<String>,
}

#[derive(Clone, Debug)]
pub struct QueueConfig {
    pub url: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub table: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub endpoint: Option<String>,
    pub index: String,
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub source_address: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub worker_poll_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub region: Option<String>,
    pub log_level: Option<String>,
    pub nlu_bot_id: Option<String>,
    pub nlu_bot_alias_id: Option<String>,
    pub nlu_endpoint: Option<String>,
    pub queue_url: Option<String>,
    pub queue_endpoint: Option<String>,
    pub store_table: Option<String>,
    pub store_endpoint: Option<String>,
    pub search_endpoint: Option<String>,
    pub email_source_address: Option<String>,
    pub email_endpoint: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("`{key}` is required (set `{env}`)")]
    MissingSetting { key: &'static str, env: &'static str },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cloud: CloudConfig { region: "us-east-1".to_string() },
            nlu: NluConfig {
                bot_id: None,
                bot_alias_id: None,
                locale_id: "en_US".to_string(),
                endpoint: None,
            },
            queue: QueueConfig { url: None, endpoint: None },
            store: StoreConfig { table: None, endpoint: None },
            search: SearchConfig { endpoint: None, index: "restaurants".to_string() },
            email: EmailConfig { source_address: None, endpoint: None },
            http: HttpConfig { timeout_secs: 30 },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                worker_poll_secs: 0,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

/// Connection details for the intent-recognition runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NluSettings {
    pub endpoint: String,
    pub bot_id: String,
    pub bot_alias_id: String,
    pub locale_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueSettings {
    pub endpoint: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreSettings {
    pub endpoint: String,
    pub table: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchSettings {
    pub endpoint: String,
    pub index: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailSettings {
    pub endpoint: String,
    pub source_address: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouterSettings {
    pub nlu: NluSettings,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FulfillmentSettings {
    pub queue: QueueSettings,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerSettings {
    pub queue: QueueSettings,
    pub store: StoreSettings,
    pub search: SearchSettings,
    pub email: EmailSettings,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("dinebot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(cloud) = patch.cloud {
            if let Some(region) = cloud.region {
                self.cloud.region = region;
            }
        }

        if let Some(nlu) = patch.nlu {
            if nlu.bot_id.is_some() {
                self.nlu.bot_id = nlu.bot_id;
            }
            if nlu.bot_alias_id.is_some() {
                self.nlu.bot_alias_id = nlu.bot_alias_id;
            }
            if let Some(locale_id) = nlu.locale_id {
                self.nlu.locale_id = locale_id;
            }
            if nlu.endpoint.is_some() {
                self.nlu.endpoint = nlu.endpoint;
            }
        }

        if let Some(queue) = patch.queue {
            if queue.url.is_some() {
                self.queue.url = queue.url;
            }
            if queue.endpoint.is_some() {
                self.queue.endpoint = queue.endpoint;
            }
        }

        if let Some(store) = patch.store {
            if store.table.is_some() {
                self.store.table = store.table;
            }
            if store.endpoint.is_some() {
                self.store.endpoint = store.endpoint;
            }
        }

        if let Some(search) = patch.search {
            if search.endpoint.is_some() {
                self.search.endpoint = search.endpoint;
            }
            if let Some(index) = search.index {
                self.search.index = index;
            }
        }

        if let Some(email) = patch.email {
            if email.source_address.is_some() {
                self.email.source_address = email.source_address;
            }
            if email.endpoint.is_some() {
                self.email.endpoint = email.endpoint;
            }
        }

        if let Some(http) = patch.http {
            if let Some(timeout_secs) = http.timeout_secs {
                self.http.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(worker_poll_secs) = server.worker_poll_secs {
                self.server.worker_poll_secs = worker_poll_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("DINEBOT_CLOUD_REGION").or_else(|| read_env("AWS_REGION")) {
            self.cloud.region = value;
        }

        if let Some(value) = read_env("DINEBOT_NLU_BOT_ID").or_else(|| read_env("LEX_BOT_ID")) {
            self.nlu.bot_id = Some(value);
        }
        let bot_alias_id =
            read_env("DINEBOT_NLU_BOT_ALIAS_ID").or_else(|| read_env("LEX_BOT_ALIAS_ID"));
        if let Some(value) = bot_alias_id {
            self.nlu.bot_alias_id = Some(value);
        }
        let locale_id = read_env("DINEBOT_NLU_LOCALE_ID").or_else(|| read_env("LEX_LOCALE_ID"));
        if let Some(value) = locale_id {
            self.nlu.locale_id = value;
        }
        if let Some(value) = read_env("DINEBOT_NLU_ENDPOINT") {
            self.nlu.endpoint = Some(value);
        }

        let queue_url = read_env("DINEBOT_QUEUE_URL")
            .or_else(|| read_env("SQS_QUEUE_URL"))
            .or_else(|| read_env("QUEUE_URL"));
        if let Some(value) = queue_url {
            self.queue.url = Some(value);
        }
        if let Some(value) = read_env("DINEBOT_QUEUE_ENDPOINT") {
            self.queue.endpoint = Some(value);
        }

        if let Some(value) = read_env("DINEBOT_STORE_TABLE").or_else(|| read_env("DYNAMODB_TABLE"))
        {
            self.store.table = Some(value);
        }
        if let Some(value) = read_env("DINEBOT_STORE_ENDPOINT") {
            self.store.endpoint = Some(value);
        }

        let search_endpoint =
            read_env("DINEBOT_SEARCH_ENDPOINT").or_else(|| read_env("OPENSEARCH_ENDPOINT"));
        if let Some(value) = search_endpoint {
            self.search.endpoint = Some(value);
        }
        if let Some(value) = read_env("DINEBOT_SEARCH_INDEX") {
            self.search.index = value;
        }

        let source_address =
            read_env("DINEBOT_EMAIL_SOURCE_ADDRESS").or_else(|| read_env("SES_SOURCE_EMAIL"));
        if let Some(value) = source_address {
            self.email.source_address = Some(value);
        }
        if let Some(value) = read_env("DINEBOT_EMAIL_ENDPOINT") {
            self.email.endpoint = Some(value);
        }

        if let Some(value) = read_env("DINEBOT_HTTP_TIMEOUT_SECS") {
            self.http.timeout_secs = parse_u64("DINEBOT_HTTP_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("DINEBOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("DINEBOT_SERVER_PORT") {
            self.server.port = parse_u16("DINEBOT_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("DINEBOT_SERVER_WORKER_POLL_SECS") {
            self.server.worker_poll_secs = parse_u64("DINEBOT_SERVER_WORKER_POLL_SECS", &value)?;
        }

        let log_level =
            read_env("DINEBOT_LOGGING_LEVEL").or_else(|| read_env("DINEBOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("DINEBOT_LOGGING_FORMAT").or_else(|| read_env("DINEBOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(region) = overrides.region {
            self.cloud.region = region;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if overrides.nlu_bot_id.is_some() {
            self.nlu.bot_id = overrides.nlu_bot_id;
        }
        if overrides.nlu_bot_alias_id.is_some() {
            self.nlu.bot_alias_id = overrides.nlu_bot_alias_id;
        }
        if overrides.nlu_endpoint.is_some() {
            self.nlu.endpoint = overrides.nlu_endpoint;
        }
        if overrides.queue_url.is_some() {
            self.queue.url = overrides.queue_url;
        }
        if overrides.queue_endpoint.is_some() {
            self.queue.endpoint = overrides.queue_endpoint;
        }
        if overrides.store_table.is_some() {
            self.store.table = overrides.store_table;
        }
        if overrides.store_endpoint.is_some() {
            self.store.endpoint = overrides.store_endpoint;
        }
        if overrides.search_endpoint.is_some() {
            self.search.endpoint = overrides.search_endpoint;
        }
        if overrides.email_source_address.is_some() {
            self.email.source_address = overrides.email_source_address;
        }
        if overrides.email_endpoint.is_some() {
            self.email.endpoint = overrides.email_endpoint;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_cloud(&self.cloud)?;
        validate_endpoints(self)?;
        validate_http(&self.http)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }

    pub fn nlu_settings(&self) -> Result<NluSettings, ConfigError> {
        Ok(NluSettings {
            endpoint: self.nlu.endpoint.clone().unwrap_or_else(|| {
                format!("https://runtime-v2-lex.{}.amazonaws.com", self.cloud.region)
            }),
            bot_id: required(&self.nlu.bot_id, "nlu.bot_id", "DINEBOT_NLU_BOT_ID")?,
            bot_alias_id: required(
                &self.nlu.bot_alias_id,
                "nlu.bot_alias_id",
                "DINEBOT_NLU_BOT_ALIAS_ID",
            )?,
            locale_id: self.nlu.locale_id.clone(),
        })
    }

    pub fn queue_settings(&self) -> Result<QueueSettings, ConfigError> {
        Ok(QueueSettings {
            endpoint: self
                .queue
                .endpoint
                .clone()
                .unwrap_or_else(|| format!("https://sqs.{}.amazonaws.com", self.cloud.region)),
            url: required(&self.queue.url, "queue.url", "DINEBOT_QUEUE_URL")?,
        })
    }

    pub fn store_settings(&self) -> Result<StoreSettings, ConfigError> {
        Ok(StoreSettings {
            endpoint: self
                .store
                .endpoint
                .clone()
                .unwrap_or_else(|| format!("https://dynamodb.{}.amazonaws.com", self.cloud.region)),
            table: required(&self.store.table, "store.table", "DINEBOT_STORE_TABLE")?,
        })
    }

    pub fn search_settings(&self) -> Result<SearchSettings, ConfigError> {
        let endpoint =
            required(&self.search.endpoint, "search.endpoint", "DINEBOT_SEARCH_ENDPOINT")?;
        Ok(SearchSettings {
            endpoint: normalize_search_endpoint(&endpoint),
            index: self.search.index.clone(),
        })
    }

    pub fn email_settings(&self) -> Result<EmailSettings, ConfigError> {
        Ok(EmailSettings {
            endpoint: self
                .email
                .endpoint
                .clone()
                .unwrap_or_else(|| format!("https://email.{}.amazonaws.com", self.cloud.region)),
            source_address: required(
                &self.email.source_address,
                "email.source_address",
                "DINEBOT_EMAIL_SOURCE_ADDRESS",
            )?,
        })
    }

    pub fn router_settings(&self) -> Result<RouterSettings, ConfigError> {
        Ok(RouterSettings { nlu: self.nlu_settings()? })
    }

    pub fn fulfillment_settings(&self) -> Result<FulfillmentSettings, ConfigError> {
        Ok(FulfillmentSettings { queue: self.queue_settings()? })
    }

    pub fn worker_settings(&self) -> Result<WorkerSettings, ConfigError> {
        Ok(WorkerSettings {
            queue: self.queue_settings()?,
            store: self.store_settings()?,
            search: self.search_settings()?,
            email: self.email_settings()?,
        })
    }
}

fn required(
    value: &Option<String>,
    key: &'static str,
    env: &'static str,
) -> Result<String, ConfigError> {
    value
        .as_ref()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::MissingSetting { key, env })
}

/// Search domains are often configured as a bare host; requests always go over https.
fn normalize_search_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("dinebot.toml"), PathBuf::from("config/dinebot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_cloud(cloud: &CloudConfig) -> Result<(), ConfigError> {
    if cloud.region.trim().is_empty() {
        return Err(ConfigError::Validation("cloud.region must not be empty".to_string()));
    }
    Ok(())
}

fn validate_endpoints(config: &AppConfig) -> Result<(), ConfigError> {
    let overrides = [
        ("nlu.endpoint", &config.nlu.endpoint),
        ("queue.endpoint", &config.queue.endpoint),
        ("store.endpoint", &config.store.endpoint),
        ("email.endpoint", &config.email.endpoint),
        ("queue.url", &config.queue.url),
    ];

    for (key, value) in overrides {
        if let Some(url) = value {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Validation(format!(
                    "{key} must start with http:// or https://"
                )));
            }
        }
    }

    if config.search.index.trim().is_empty() {
        return Err(ConfigError::Validation("search.index must not be empty".to_string()));
    }

    Ok(())
}

fn validate_http(http: &HttpConfig) -> Result<(), ConfigError> {
    if http.timeout_secs == 0 || http.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "http.timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    cloud: Option<CloudPatch>,
    nlu: Option<NluPatch>,
    queue: Option<QueuePatch>,
    store: Option<StorePatch>,
    search: Option<SearchPatch>,
    email: Option<EmailPatch>,
    http: Option<HttpPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CloudPatch {
    region: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NluPatch {
    bot_id: Option<String>,
    bot_alias_id: Option<String>,
    locale_id: Option<String>,
    endpoint: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct QueuePatch {
    url: Option<String>,
    endpoint: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StorePatch {
    table: Option<String>,
    endpoint: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    endpoint: Option<String>,
    index: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EmailPatch {
    source_address: Option<String>,
    endpoint: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HttpPatch {
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    worker_poll_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
