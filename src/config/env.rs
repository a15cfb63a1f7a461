use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::str::FromStr;

/// Raw configuration values read from the process environment.
///
/// Every field is optional here; defaults and validation are applied when
/// the values are merged in [`super::ServerConfig`].
#[derive(Debug, Default)]
pub(super) struct EnvConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
    pub openai_api_key: Option<String>,
    pub realtime_url: Option<String>,
    pub realtime_model: Option<String>,
    pub voice: Option<String>,
    pub instructions: Option<String>,
    pub temperature: Option<f64>,
    pub idle_timeout_seconds: Option<u64>,
    pub shutdown_grace_ms: Option<u64>,
}

impl EnvConfig {
    pub fn load() -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            host: var("HOST"),
            port: parse_var("PORT")?,
            tls_cert_path: var("TLS_CERT_PATH").map(PathBuf::from),
            tls_key_path: var("TLS_KEY_PATH").map(PathBuf::from),
            openai_api_key: var("OPENAI_API_KEY"),
            realtime_url: var("OPENAI_REALTIME_URL"),
            realtime_model: var("OPENAI_REALTIME_MODEL"),
            voice: var("ASSISTANT_VOICE"),
            instructions: var("ASSISTANT_INSTRUCTIONS"),
            temperature: parse_var("ASSISTANT_TEMPERATURE")?,
            idle_timeout_seconds: parse_var("RELAY_IDLE_TIMEOUT_SECONDS")?,
            shutdown_grace_ms: parse_var("RELAY_SHUTDOWN_GRACE_MS")?,
        })
    }
}

/// Read a variable, treating empty or whitespace-only values as unset.
fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T>(name: &str) -> Result<Option<T>, Box<dyn Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {name} ('{raw}'): {e}").into()),
        None => Ok(None),
    }
}
