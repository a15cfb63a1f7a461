//! Telephony media stream vocabulary.

pub mod messages;

pub use messages::{MediaFrame, MediaPayload, StreamStart, TelephonyEvent};
