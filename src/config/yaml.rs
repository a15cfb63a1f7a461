use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present in
/// the file take priority over environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 5050
///   tls:
///     cert_path: "/etc/call-bridge/cert.pem"
///     key_path: "/etc/call-bridge/key.pem"
///
/// openai:
///   api_key: "sk-..."
///   realtime_url: "wss://api.openai.com/v1/realtime"
///   model: "gpt-4o-realtime-preview-2024-10-01"
///
/// assistant:
///   voice: "alloy"
///   instructions: "You are a helpful assistant."
///   temperature: 0.8
///
/// relay:
///   idle_timeout_seconds: 120
///   shutdown_grace_ms: 2000
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub openai: Option<OpenAIYaml>,
    pub assistant: Option<AssistantYaml>,
    pub relay: Option<RelayYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
}

/// Realtime endpoint settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OpenAIYaml {
    pub api_key: Option<String>,
    pub realtime_url: Option<String>,
    pub model: Option<String>,
}

/// Assistant persona from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AssistantYaml {
    pub voice: Option<String>,
    pub instructions: Option<String>,
    pub temperature: Option<f64>,
}

/// Relay tuning from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RelayYaml {
    pub idle_timeout_seconds: Option<u64>,
    pub shutdown_grace_ms: Option<u64>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;
        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))?;
        Ok(config)
    }
}
