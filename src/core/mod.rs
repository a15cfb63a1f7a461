pub mod realtime;
pub mod relay;
pub mod session;
pub mod telephony;
pub mod transport;

// Re-export commonly used types for convenience
pub use relay::{
    RelayDirection, RelayExit, RelayOptions, SessionSummary, bridge_call, inbound_relay,
    outbound_relay, run_call_session, translate_call_event, translate_realtime_event,
};
pub use session::{CallSession, CallState};
pub use transport::{FrameSink, FrameSource};
