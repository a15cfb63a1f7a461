//! Realtime session connection and bootstrap.
//!
//! A call opens exactly one realtime session. The connection is authenticated
//! with a bearer token plus the protocol version header, and the first frame
//! written to it is always the `session.update` built from [`RealtimeSettings`].

use std::fmt;

use http::HeaderValue;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tracing::{debug, info, warn};
use url::Url;

use super::config::{
    Modality, OPENAI_BETA_HEADER, OpenAIRealtimeAudioFormat, OpenAIRealtimeModel,
    OpenAIRealtimeVoice,
};
use super::messages::{ClientEvent, SessionConfig, TurnDetection};
use crate::config::ServerConfig;
use crate::core::transport::{FrameSink, RealtimeSink, RealtimeSource, split_realtime_stream};
use crate::errors::{BridgeError, BridgeResult};

/// Everything needed to open and configure one realtime session.
///
/// Derived from [`ServerConfig`] once per call so the credential is only
/// cloned into the connect request.
#[derive(Clone)]
pub struct RealtimeSettings {
    pub api_key: String,
    pub url: String,
    pub model: String,
    pub voice: String,
    pub instructions: String,
    pub temperature: f64,
}

impl fmt::Debug for RealtimeSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeSettings")
            .field("api_key", &"[REDACTED]")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl Drop for RealtimeSettings {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        self.api_key.zeroize();
    }
}

impl RealtimeSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        if OpenAIRealtimeModel::parse(&config.realtime_model).is_none() {
            warn!(
                model = %config.realtime_model,
                "Unknown realtime model, passing it through unchanged"
            );
        }
        if OpenAIRealtimeVoice::parse(&config.voice).is_none() {
            warn!(voice = %config.voice, "Unknown assistant voice, passing it through unchanged");
        }

        Self {
            api_key: config.openai_api_key.clone(),
            url: config.realtime_url.clone(),
            model: config.realtime_model.clone(),
            voice: config.voice.clone(),
            instructions: config.instructions.clone(),
            temperature: config.temperature,
        }
    }

    /// Endpoint URL with the model selected through the query string.
    pub fn endpoint(&self) -> BridgeResult<Url> {
        Url::parse_with_params(&self.url, &[("model", self.model.as_str())]).map_err(|e| {
            BridgeError::Configuration(format!("Invalid realtime URL '{}': {e}", self.url))
        })
    }

    /// Session configuration sent before any caller audio.
    ///
    /// Both directions use G.711 u-law so telephony payloads pass through
    /// without transcoding.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            turn_detection: Some(TurnDetection::ServerVad),
            input_audio_format: Some(OpenAIRealtimeAudioFormat::G711Ulaw),
            output_audio_format: Some(OpenAIRealtimeAudioFormat::G711Ulaw),
            voice: Some(self.voice.clone()),
            instructions: Some(self.instructions.clone()),
            modalities: Some(vec![Modality::Text, Modality::Audio]),
            temperature: Some(self.temperature),
        }
    }
}

/// Open the realtime WebSocket and split it into relay halves.
pub async fn connect_realtime(
    settings: &RealtimeSettings,
) -> BridgeResult<(RealtimeSource, RealtimeSink)> {
    let endpoint = settings.endpoint()?;

    let mut request = endpoint.as_str().into_client_request().map_err(|e| {
        BridgeError::Configuration(format!("Invalid realtime websocket request: {e}"))
    })?;
    let auth_value = HeaderValue::from_str(&format!("Bearer {}", settings.api_key))
        .map_err(|e| BridgeError::Configuration(format!("Invalid realtime auth header: {e}")))?;
    request.headers_mut().insert("Authorization", auth_value);
    request
        .headers_mut()
        .insert("OpenAI-Beta", HeaderValue::from_static(OPENAI_BETA_HEADER));

    debug!(host = ?endpoint.host_str(), model = %settings.model, "Connecting to realtime endpoint");

    let (stream, _response) = connect_async(request)
        .await
        .map_err(|e| BridgeError::Connection(format!("Realtime connect failed: {e}")))?;

    info!("Connected to realtime endpoint");
    Ok(split_realtime_stream(stream))
}

/// Send the `session.update` bootstrap frame.
///
/// Must complete before the relays start; a failure here ends the call.
pub async fn initialize_session<S>(sink: &mut S, settings: &RealtimeSettings) -> BridgeResult<()>
where
    S: FrameSink + ?Sized,
{
    let event = ClientEvent::SessionUpdate {
        session: settings.session_config(),
    };
    let json = serde_json::to_string(&event).map_err(|e| BridgeError::Encode(e.to_string()))?;

    debug!("Sending session update: {}", json);
    sink.send_text(json).await
}
