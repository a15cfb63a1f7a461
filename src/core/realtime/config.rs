//! Realtime session configuration types.
//!
//! This module contains the fixed vocabulary used to bootstrap a realtime
//! session for a phone call:
//! - Model selection
//! - Voice selection
//! - Audio format configuration
//! - Output modalities
//! - Default assistant persona

use serde::Serialize;

/// Realtime API WebSocket endpoint.
pub const OPENAI_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// Protocol version header value required at connect time.
pub const OPENAI_BETA_HEADER: &str = "realtime=v1";

/// Default sampling temperature for assistant responses.
pub const DEFAULT_TEMPERATURE: f64 = 0.8;

/// Default system instructions defining the assistant persona.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful and bubbly AI assistant who loves to chat about \
anything the user is interested in and is prepared to offer them facts. \
You have a penchant for dad jokes, owl jokes, and rickrolling – subtly. \
Always stay positive, but work in a joke when appropriate.";

// =============================================================================
// Models
// =============================================================================

/// Known realtime models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenAIRealtimeModel {
    /// GPT-4o Realtime Preview model
    Gpt4oRealtimePreview,
    /// GPT-4o Realtime Preview 2024-10-01
    #[default]
    Gpt4oRealtimePreview20241001,
    /// GPT-4o Realtime Preview 2024-12-17
    Gpt4oRealtimePreview20241217,
    /// GPT-4o Mini Realtime Preview
    Gpt4oMiniRealtimePreview,
}

impl OpenAIRealtimeModel {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpt4oRealtimePreview => "gpt-4o-realtime-preview",
            Self::Gpt4oRealtimePreview20241001 => "gpt-4o-realtime-preview-2024-10-01",
            Self::Gpt4oRealtimePreview20241217 => "gpt-4o-realtime-preview-2024-12-17",
            Self::Gpt4oMiniRealtimePreview => "gpt-4o-mini-realtime-preview",
        }
    }

    /// Parse a known model name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gpt-4o-realtime-preview" => Some(Self::Gpt4oRealtimePreview),
            "gpt-4o-realtime-preview-2024-10-01" => Some(Self::Gpt4oRealtimePreview20241001),
            "gpt-4o-realtime-preview-2024-12-17" => Some(Self::Gpt4oRealtimePreview20241217),
            "gpt-4o-mini-realtime-preview" => Some(Self::Gpt4oMiniRealtimePreview),
            _ => None,
        }
    }
}

impl std::fmt::Display for OpenAIRealtimeModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Voices
// =============================================================================

/// Available assistant voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenAIRealtimeVoice {
    /// Alloy voice (default)
    #[default]
    Alloy,
    Ash,
    Ballad,
    Coral,
    Echo,
    Sage,
    Shimmer,
    Verse,
}

impl OpenAIRealtimeVoice {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Ash => "ash",
            Self::Ballad => "ballad",
            Self::Coral => "coral",
            Self::Echo => "echo",
            Self::Sage => "sage",
            Self::Shimmer => "shimmer",
            Self::Verse => "verse",
        }
    }

    /// Parse a voice name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "alloy" => Some(Self::Alloy),
            "ash" => Some(Self::Ash),
            "ballad" => Some(Self::Ballad),
            "coral" => Some(Self::Coral),
            "echo" => Some(Self::Echo),
            "sage" => Some(Self::Sage),
            "shimmer" => Some(Self::Shimmer),
            "verse" => Some(Self::Verse),
            _ => None,
        }
    }
}

impl std::fmt::Display for OpenAIRealtimeVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Audio Formats
// =============================================================================

/// Audio encoding of both legs of the session. Phone audio is G.711 u-law
/// end to end, so no other encoding is ever negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum OpenAIRealtimeAudioFormat {
    /// G.711 u-law (8-bit, 8kHz)
    #[default]
    #[serde(rename = "g711_ulaw")]
    G711Ulaw,
}

// =============================================================================
// Modalities
// =============================================================================

/// Output modalities for a realtime session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Audio,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model() {
        assert_eq!(
            OpenAIRealtimeModel::default().as_str(),
            "gpt-4o-realtime-preview-2024-10-01"
        );
    }

    #[test]
    fn test_model_parse() {
        assert_eq!(
            OpenAIRealtimeModel::parse("GPT-4o-mini-realtime-preview"),
            Some(OpenAIRealtimeModel::Gpt4oMiniRealtimePreview)
        );
        assert_eq!(OpenAIRealtimeModel::parse("gpt-5-voice"), None);
    }

    #[test]
    fn test_voice_parse() {
        assert_eq!(
            OpenAIRealtimeVoice::parse("SHIMMER"),
            Some(OpenAIRealtimeVoice::Shimmer)
        );
        assert_eq!(OpenAIRealtimeVoice::parse("unknown"), None);
        assert_eq!(OpenAIRealtimeVoice::default().to_string(), "alloy");
    }

    #[test]
    fn test_telephony_audio_format() {
        let format = OpenAIRealtimeAudioFormat::default();
        assert_eq!(format, OpenAIRealtimeAudioFormat::G711Ulaw);
        assert_eq!(
            serde_json::to_string(&format).unwrap(),
            "\"g711_ulaw\""
        );
    }

    #[test]
    fn test_modality_serialization() {
        let json = serde_json::to_string(&[Modality::Text, Modality::Audio]).unwrap();
        assert_eq!(json, r#"["text","audio"]"#);
    }
}
