use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::notification::Priority;

/// Largest batch the Expo push endpoint accepts in one request
pub const EXPO_MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub otel: OtelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u32,
}

/// Push gateway settings
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Batch endpoint URL
    #[serde(default = "default_gateway_url")]
    pub url: String,
    /// Maximum tokens per gateway request (provider-imposed ceiling)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Upper bound for a single gateway call in seconds
    #[serde(default = "default_gateway_timeout")]
    pub timeout_seconds: u64,
    /// Number of batches allowed in flight at once (1 = sequential)
    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,
    /// Optional bearer token for authenticated push access
    #[serde(default)]
    pub access_token: Option<String>,
    /// Android notification channel attached to every message
    #[serde(default = "default_channel_id")]
    pub channel_id: String,
}

/// Dispatcher wiring and message defaults
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Where users, tokens and preferences are read from: "postgres" or "memory"
    #[serde(default = "default_backend")]
    pub store_backend: String,
    /// Where deferred jobs are written: "postgres" or "memory"
    #[serde(default = "default_backend")]
    pub queue_backend: String,
    #[serde(default = "default_priority")]
    pub default_priority: Priority,
    #[serde(default = "default_sound")]
    pub default_sound: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_database_url() -> String {
    "postgres://localhost:5432/campus".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_connect_timeout() -> u32 {
    5
}

fn default_idle_timeout() -> u32 {
    300 // 5 minutes
}

fn default_gateway_url() -> String {
    "https://exp.host/--/api/v2/push/send".to_string()
}

fn default_batch_size() -> usize {
    EXPO_MAX_BATCH_SIZE
}

fn default_gateway_timeout() -> u64 {
    10
}

fn default_max_concurrent_batches() -> usize {
    1
}

fn default_channel_id() -> String {
    "default".to_string()
}

fn default_backend() -> String {
    "postgres".to_string()
}

fn default_priority() -> Priority {
    Priority::High
}

fn default_sound() -> String {
    "default".to_string()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "campus-push-dispatch".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8082)?
            .set_default("gateway.batch_size", EXPO_MAX_BATCH_SIZE as i64)?
            .set_default("gateway.timeout_seconds", 10)?
            .set_default("gateway.max_concurrent_batches", 1)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Double underscore separates sections from keys that contain underscores:
            // SERVER__PORT, DATABASE__URL, GATEWAY__BATCH_SIZE, DISPATCH__STORE_BACKEND, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(","),
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the dispatcher cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.batch_size == 0 || self.gateway.batch_size > EXPO_MAX_BATCH_SIZE {
            return Err(ConfigError::Message(format!(
                "gateway.batch_size must be between 1 and {}, got {}",
                EXPO_MAX_BATCH_SIZE, self.gateway.batch_size
            )));
        }
        if self.gateway.max_concurrent_batches == 0 {
            return Err(ConfigError::Message(
                "gateway.max_concurrent_batches must be at least 1".to_string(),
            ));
        }
        if self.gateway.timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "gateway.timeout_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Whether any component needs a PostgreSQL connection.
    pub fn requires_postgres(&self) -> bool {
        self.dispatch.store_backend == "postgres" || self.dispatch.queue_backend == "postgres"
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            pool_size: default_pool_size(),
            connect_timeout_seconds: default_connect_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            batch_size: default_batch_size(),
            timeout_seconds: default_gateway_timeout(),
            max_concurrent_batches: default_max_concurrent_batches(),
            access_token: None,
            channel_id: default_channel_id(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            store_backend: default_backend(),
            queue_backend: default_backend(),
            default_priority: default_priority(),
            default_sound: default_sound(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}
