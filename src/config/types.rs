use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::storage::StorageConfig;

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: remote API endpoint, OAuth provider, storage,
/// and logging.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
pub struct ConfigV1 {
    pub api: ApiConfig,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The remote authorization server, consumed as an opaque HTTP/JSON endpoint.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. "https://backend.example.com".
    pub base_url: String,
    /// Per-request timeout for login/signup/exchange calls.
    #[serde(default = "default_timeout_in_ms")]
    pub timeout_in_ms: u64,
}

fn default_timeout_in_ms() -> u64 {
    10_000
}

/// The third-party OAuth provider whose linkage the popup flow completes.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct ProviderConfig {
    /// Provider name, e.g. "tiktok". Drives the callback endpoint path,
    /// the linked-key slots, and the inter-window message type.
    pub name: String,
    /// Where a completed authorization lands the user.
    #[serde(default = "default_dashboard_path")]
    pub dashboard_path: String,
    /// Where logout redirects by default.
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

fn default_dashboard_path() -> String {
    "/dashboard".to_string()
}

fn default_login_path() -> String {
    "/auth/login".to_string()
}

/// Load config from "config.yaml" in the current directory, with
/// AUTHKEEPER_* environment variables taking precedence.
pub fn load_config() -> ConfigV1 {
    let figment = Figment::new()
        .merge(Yaml::file("./config.yaml"))
        .merge(Env::prefixed("AUTHKEEPER_").split("__"));
    let config = match figment.extract::<Config>() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };
    match config {
        Config::ConfigV1(c) => c,
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema).unwrap());
}
