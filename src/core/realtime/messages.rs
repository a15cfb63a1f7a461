//! Realtime session WebSocket message types.
//!
//! All events are JSON-encoded text frames tagged by their `type` field.
//!
//! Client events (sent to the AI session):
//! - session.update - Bootstrap the session configuration
//! - input_audio_buffer.append - Append caller audio to the input buffer
//!
//! Server events (received from the AI session) that the bridge names:
//! - response.audio.delta - Synthesized audio chunk
//! - error, rate_limits.updated, input_audio_buffer.committed,
//!   input_audio_buffer.speech_started, input_audio_buffer.speech_stopped,
//!   session.created, response.done, response.content.done - logged only
//!
//! Every other server event type decodes to [`ServerEvent::Unhandled`].

use serde::{Deserialize, Serialize};

use super::config::{Modality, OpenAIRealtimeAudioFormat};

// =============================================================================
// Session Configuration
// =============================================================================

/// Session configuration sent in the bootstrap `session.update`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionConfig {
    /// Turn detection configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,

    /// Input audio format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<OpenAIRealtimeAudioFormat>,

    /// Output audio format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<OpenAIRealtimeAudioFormat>,

    /// Voice for audio output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// System instructions for the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Response modalities
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<Modality>>,

    /// Temperature for response generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Turn detection configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum TurnDetection {
    /// Server-side voice activity detection with the service defaults
    #[serde(rename = "server_vad")]
    ServerVad,
}

// =============================================================================
// Client Events (sent to server)
// =============================================================================

/// Client events sent to the realtime session.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Update session configuration
    #[serde(rename = "session.update")]
    SessionUpdate {
        /// Session configuration
        session: SessionConfig,
    },

    /// Append audio to input buffer
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend {
        /// Base64-encoded audio, forwarded exactly as the caller side sent it
        audio: String,
    },
}

impl ClientEvent {
    /// Wrap an already base64-encoded payload in an append command.
    pub fn audio_append(payload: impl Into<String>) -> Self {
        ClientEvent::InputAudioBufferAppend {
            audio: payload.into(),
        }
    }
}

// =============================================================================
// Server Events (received from server)
// =============================================================================

/// Server events received from the realtime session.
///
/// Only the fields the bridge reads are modelled; everything else in a
/// payload is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Error occurred
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        error: ApiError,
    },

    /// Rate limits updated
    #[serde(rename = "rate_limits.updated")]
    RateLimitsUpdated,

    /// Audio buffer committed
    #[serde(rename = "input_audio_buffer.committed")]
    InputAudioBufferCommitted,

    /// VAD detected speech
    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted,

    /// VAD detected silence
    #[serde(rename = "input_audio_buffer.speech_stopped")]
    SpeechStopped,

    /// Session created
    #[serde(rename = "session.created")]
    SessionCreated,

    /// Response done
    #[serde(rename = "response.done")]
    ResponseDone,

    /// Response content done
    #[serde(rename = "response.content.done")]
    ResponseContentDone,

    /// Audio data chunk
    #[serde(rename = "response.audio.delta")]
    AudioDelta {
        /// Base64-encoded audio delta. Absent deltas are skipped.
        #[serde(default)]
        delta: Option<String>,
        /// Assistant item the audio belongs to
        #[serde(default)]
        item_id: Option<String>,
    },

    /// Any event type the bridge does not act on
    #[serde(other)]
    Unhandled,
}

impl ServerEvent {
    /// Wire name of the event, or `"unhandled"` for unknown types.
    pub fn event_type(&self) -> &'static str {
        match self {
            ServerEvent::Error { .. } => "error",
            ServerEvent::RateLimitsUpdated => "rate_limits.updated",
            ServerEvent::InputAudioBufferCommitted => "input_audio_buffer.committed",
            ServerEvent::SpeechStarted => "input_audio_buffer.speech_started",
            ServerEvent::SpeechStopped => "input_audio_buffer.speech_stopped",
            ServerEvent::SessionCreated => "session.created",
            ServerEvent::ResponseDone => "response.done",
            ServerEvent::ResponseContentDone => "response.content.done",
            ServerEvent::AudioDelta { .. } => "response.audio.delta",
            ServerEvent::Unhandled => "unhandled",
        }
    }

    /// Whether the event is one of the diagnostic kinds that get logged.
    pub fn is_loggable(&self) -> bool {
        !matches!(
            self,
            ServerEvent::AudioDelta { .. } | ServerEvent::Unhandled
        )
    }
}

/// API error information.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiError {
    /// Error type
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error code
    pub code: Option<String>,
    /// Error message
    pub message: String,
}
