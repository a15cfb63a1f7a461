//! Configuration module for the call bridge
//!
//! Configuration comes from .env files, environment variables and an optional
//! YAML file. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Example
//! ```rust,no_run
//! use call_bridge::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable base
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

mod env;
mod yaml;

pub use yaml::YamlConfig;

use crate::core::realtime::{
    DEFAULT_INSTRUCTIONS, DEFAULT_TEMPERATURE, OPENAI_REALTIME_URL, OpenAIRealtimeModel,
    OpenAIRealtimeVoice,
};
use env::EnvConfig;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5050;
const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 2000;

/// Sampling temperatures accepted by the realtime service.
const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = 0.6..=1.2;

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Built once at startup and shared with every call through
/// [`crate::state::AppState`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    /// Credential for the realtime AI endpoint (required)
    pub openai_api_key: String,
    /// Realtime WebSocket endpoint, without query string
    pub realtime_url: String,
    /// Realtime model name sent as the `model` query parameter
    pub realtime_model: String,

    // Assistant persona
    pub voice: String,
    pub instructions: String,
    pub temperature: f64,

    /// Maximum time either relay waits for a frame before ending the call.
    /// `None` waits forever.
    pub idle_timeout_seconds: Option<u64>,
    /// How long the surviving relay gets to shut down after the other exits
    pub shutdown_grace_ms: u64,
}

/// Zeroize the credential when the configuration is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        self.openai_api_key.zeroize();
    }
}

impl ServerConfig {
    /// Load configuration from environment variables only
    ///
    /// # Errors
    /// Returns an error if the API key is missing, a numeric variable cannot
    /// be parsed, or validation fails.
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        let env = EnvConfig::load()?;
        Self::merge(env, YamlConfig::default())
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if the YAML file cannot be read or is malformed, or
    /// if the merged configuration fails validation.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn Error>> {
        let yaml_config = YamlConfig::from_file(path)?;
        let env = EnvConfig::load()?;
        Self::merge(env, yaml_config)
    }

    fn merge(env: EnvConfig, yaml: YamlConfig) -> Result<Self, Box<dyn Error>> {
        let server = yaml.server.unwrap_or_default();
        let openai = yaml.openai.unwrap_or_default();
        let assistant = yaml.assistant.unwrap_or_default();
        let relay = yaml.relay.unwrap_or_default();
        let tls_yaml = server.tls.unwrap_or_default();

        let openai_api_key = openai
            .api_key
            .filter(|key| !key.trim().is_empty())
            .or(env.openai_api_key)
            .ok_or("Missing OpenAI API key. Set OPENAI_API_KEY or openai.api_key in the config file.")?;

        let tls = validate_tls(
            tls_yaml.cert_path.or(env.tls_cert_path),
            tls_yaml.key_path.or(env.tls_key_path),
        )?;

        let temperature = assistant
            .temperature
            .or(env.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE);
        validate_temperature(temperature)?;

        Ok(Self {
            host: server
                .host
                .or(env.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: server.port.or(env.port).unwrap_or(DEFAULT_PORT),
            tls,
            openai_api_key,
            realtime_url: openai
                .realtime_url
                .or(env.realtime_url)
                .unwrap_or_else(|| OPENAI_REALTIME_URL.to_string()),
            realtime_model: openai
                .model
                .or(env.realtime_model)
                .unwrap_or_else(|| OpenAIRealtimeModel::default().to_string()),
            voice: assistant
                .voice
                .or(env.voice)
                .unwrap_or_else(|| OpenAIRealtimeVoice::default().to_string()),
            instructions: assistant
                .instructions
                .or(env.instructions)
                .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
            temperature,
            idle_timeout_seconds: relay.idle_timeout_seconds.or(env.idle_timeout_seconds),
            shutdown_grace_ms: relay
                .shutdown_grace_ms
                .or(env.shutdown_grace_ms)
                .unwrap_or(DEFAULT_SHUTDOWN_GRACE_MS),
        })
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Longest the call may go without a frame from either side, if configured.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_seconds
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

fn validate_tls(
    cert_path: Option<PathBuf>,
    key_path: Option<PathBuf>,
) -> Result<Option<TlsConfig>, Box<dyn Error>> {
    match (cert_path, key_path) {
        (Some(cert_path), Some(key_path)) => Ok(Some(TlsConfig {
            cert_path,
            key_path,
        })),
        (None, None) => Ok(None),
        _ => Err("TLS requires both a certificate path and a key path".into()),
    }
}

fn validate_temperature(temperature: f64) -> Result<(), Box<dyn Error>> {
    if TEMPERATURE_RANGE.contains(&temperature) {
        Ok(())
    } else {
        Err(format!(
            "Temperature {temperature} is outside the supported range {}..={}",
            TEMPERATURE_RANGE.start(),
            TEMPERATURE_RANGE.end()
        )
        .into())
    }
}
