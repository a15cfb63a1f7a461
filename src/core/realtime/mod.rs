//! Realtime AI voice session.
//!
//! The bridge speaks a small slice of the realtime protocol: it bootstraps the
//! session once, appends caller audio to the input buffer, and consumes
//! synthesized audio deltas. Audio is G.711 u-law at 8kHz in both directions,
//! matching the telephony stream byte for byte.

pub mod client;
pub mod config;
pub mod messages;

pub use client::{RealtimeSettings, connect_realtime, initialize_session};
pub use config::{
    DEFAULT_INSTRUCTIONS, DEFAULT_TEMPERATURE, Modality, OPENAI_BETA_HEADER, OPENAI_REALTIME_URL,
    OpenAIRealtimeAudioFormat, OpenAIRealtimeModel, OpenAIRealtimeVoice,
};
pub use messages::{ApiError, ClientEvent, ServerEvent, SessionConfig, TurnDetection};
