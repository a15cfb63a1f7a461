//! Telephony media stream message types.
//!
//! Inbound frames are JSON objects tagged by their `event` field. Only `start`
//! and `media` carry anything the bridge needs; `connected`, `mark`, `stop`,
//! `dtmf` and future events decode to [`TelephonyEvent::Unhandled`].

use serde::{Deserialize, Deserializer, Serialize};

/// Event received from the telephony media stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyEvent {
    /// Stream metadata, sent once when the media stream begins
    Start { start: StreamStart },

    /// One chunk of caller audio
    Media { media: MediaPayload },

    /// Any event the bridge does not act on
    #[serde(other)]
    Unhandled,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamStart {
    #[serde(rename = "streamSid")]
    pub stream_sid: String,
}

/// Caller audio chunk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaPayload {
    /// Milliseconds since the stream started
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub timestamp: Option<u64>,
    /// Base64-encoded G.711 u-law audio
    pub payload: String,
}

/// The provider sends timestamps as decimal strings; accept JSON numbers as
/// well. Fractional values are truncated toward zero.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Integer(u64),
        Float(f64),
        Text(String),
    }

    fn truncate(value: f64) -> Option<u64> {
        (value.is_finite() && value >= 0.0).then(|| value.trunc() as u64)
    }

    let timestamp = match Option::<RawTimestamp>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(RawTimestamp::Integer(value)) => Some(value),
        Some(RawTimestamp::Float(value)) => truncate(value),
        Some(RawTimestamp::Text(text)) => {
            let text = text.trim();
            text.parse::<u64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(truncate))
        }
    };
    timestamp
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom("timestamp is not a non-negative number"))
}

/// Outbound media frame played back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaFrame {
    event: &'static str,
    #[serde(rename = "streamSid")]
    pub stream_sid: Option<String>,
    pub media: OutboundMedia,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMedia {
    pub payload: String,
}

impl MediaFrame {
    pub fn new(stream_sid: Option<String>, payload: impl Into<String>) -> Self {
        Self {
            event: "media",
            stream_sid,
            media: OutboundMedia {
                payload: payload.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_event() {
        let json = r#"{
            "event": "start",
            "sequenceNumber": "1",
            "start": {
                "streamSid": "MZ18ad3ab5a668481ce02b83e7395059f0",
                "accountSid": "AC123",
                "callSid": "CA123",
                "tracks": ["inbound"],
                "mediaFormat": {"encoding": "audio/x-mulaw", "sampleRate": 8000, "channels": 1}
            },
            "streamSid": "MZ18ad3ab5a668481ce02b83e7395059f0"
        }"#;
        let event: TelephonyEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            TelephonyEvent::Start {
                start: StreamStart {
                    stream_sid: "MZ18ad3ab5a668481ce02b83e7395059f0".to_string()
                }
            }
        );
    }

    #[test]
    fn test_media_event_with_string_timestamp() {
        let json = r#"{
            "event": "media",
            "sequenceNumber": "3",
            "media": {"track": "inbound", "chunk": "1", "timestamp": "5", "payload": "no+JhoaJjpzS"},
            "streamSid": "MZ1"
        }"#;
        match serde_json::from_str::<TelephonyEvent>(json).unwrap() {
            TelephonyEvent::Media { media } => {
                assert_eq!(media.timestamp, Some(5));
                assert_eq!(media.payload, "no+JhoaJjpzS");
            }
            other => panic!("Wrong event type: {other:?}"),
        }
    }

    #[test]
    fn test_media_event_with_integer_timestamp() {
        let json = r#"{"event": "media", "media": {"timestamp": 1200, "payload": "QQ=="}}"#;
        match serde_json::from_str::<TelephonyEvent>(json).unwrap() {
            TelephonyEvent::Media { media } => assert_eq!(media.timestamp, Some(1200)),
            other => panic!("Wrong event type: {other:?}"),
        }
    }

    #[test]
    fn test_media_event_without_timestamp() {
        let json = r#"{"event": "media", "media": {"payload": "QQ=="}}"#;
        match serde_json::from_str::<TelephonyEvent>(json).unwrap() {
            TelephonyEvent::Media { media } => assert_eq!(media.timestamp, None),
            other => panic!("Wrong event type: {other:?}"),
        }
    }

    #[test]
    fn test_media_event_with_float_timestamp() {
        for json in [
            r#"{"event": "media", "media": {"timestamp": 20.0, "payload": "QQ=="}}"#,
            r#"{"event": "media", "media": {"timestamp": 20.7, "payload": "QQ=="}}"#,
            r#"{"event": "media", "media": {"timestamp": "20.0", "payload": "QQ=="}}"#,
        ] {
            match serde_json::from_str::<TelephonyEvent>(json).unwrap() {
                TelephonyEvent::Media { media } => assert_eq!(media.timestamp, Some(20)),
                other => panic!("Expected media event, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_negative_timestamp_is_rejected() {
        let json = r#"{"event": "media", "media": {"timestamp": -20.0, "payload": "QQ=="}}"#;
        assert!(serde_json::from_str::<TelephonyEvent>(json).is_err());
    }

    #[test]
    fn test_non_numeric_timestamp_is_rejected() {
        let json = r#"{"event": "media", "media": {"timestamp": "soon", "payload": "QQ=="}}"#;
        assert!(serde_json::from_str::<TelephonyEvent>(json).is_err());
    }

    #[test]
    fn test_other_events_are_unhandled() {
        for json in [
            r#"{"event": "connected", "protocol": "Call", "version": "1.0.0"}"#,
            r#"{"event": "mark", "mark": {"name": "reply"}}"#,
            r#"{"event": "stop", "stop": {"callSid": "CA123"}}"#,
        ] {
            let event: TelephonyEvent = serde_json::from_str(json).unwrap();
            assert_eq!(event, TelephonyEvent::Unhandled);
        }
    }

    #[test]
    fn test_media_frame_serialization() {
        let frame = MediaFrame::new(Some("SID123".to_string()), "QQ==");
        assert_eq!(
            serde_json::to_string(&frame).unwrap(),
            r#"{"event":"media","streamSid":"SID123","media":{"payload":"QQ=="}}"#
        );
    }

    #[test]
    fn test_media_frame_without_stream_sid() {
        let frame = MediaFrame::new(None, "QQ==");
        assert_eq!(
            serde_json::to_string(&frame).unwrap(),
            r#"{"event":"media","streamSid":null,"media":{"payload":"QQ=="}}"#
        );
    }
}
