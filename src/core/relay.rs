//! Bidirectional call relay.
//!
//! A call is two loops sharing one [`CallSession`]:
//!
//! ```text
//!   caller ──media──▶ inbound_relay ──input_audio_buffer.append──▶ realtime
//!   caller ◀──media── outbound_relay ◀──response.audio.delta────── realtime
//! ```
//!
//! [`run_call_session`] starts both loops and waits for whichever finishes
//! first. The other loop is then cancelled and given a bounded grace period
//! to close its sink before it is aborted. Every loop closes the sink it owns
//! on the way out, so neither socket outlives the call.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info, trace, warn};

use super::realtime::{ClientEvent, RealtimeSettings, ServerEvent, initialize_session};
use super::session::{CallSession, CallState};
use super::telephony::{MediaFrame, TelephonyEvent};
use super::transport::{FrameSink, FrameSource};
use crate::config::ServerConfig;
use crate::errors::{BridgeError, BridgeResult};

const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Timing knobs for one call.
#[derive(Debug, Clone, Copy)]
pub struct RelayOptions {
    /// Longest the whole call may go without a frame from either side.
    /// `None` waits forever.
    pub idle_timeout: Option<Duration>,
    /// Time the surviving loop gets to finish after it is cancelled
    pub shutdown_grace: Duration,
}

impl RelayOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            idle_timeout: config.idle_timeout(),
            shutdown_grace: config.shutdown_grace(),
        }
    }
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            idle_timeout: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayDirection {
    /// Caller audio to the realtime session
    Inbound,
    /// Synthesized audio back to the caller
    Outbound,
}

impl fmt::Display for RelayDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayDirection::Inbound => write!(f, "call->realtime"),
            RelayDirection::Outbound => write!(f, "realtime->call"),
        }
    }
}

/// Why a relay loop stopped.
#[derive(Debug)]
pub enum RelayExit {
    /// The source connection closed
    PeerClosed,
    /// The other loop finished first
    Cancelled,
    /// A read, decode or write failed
    Failed(BridgeError),
    /// The loop ignored cancellation past the grace period
    Aborted,
}

impl RelayExit {
    pub fn is_failure(&self) -> bool {
        matches!(self, RelayExit::Failed(_) | RelayExit::Aborted)
    }

    fn from_join(result: Result<RelayExit, JoinError>) -> Self {
        result.unwrap_or_else(|e| RelayExit::Failed(BridgeError::Task(e.to_string())))
    }
}

impl fmt::Display for RelayExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayExit::PeerClosed => write!(f, "peer closed"),
            RelayExit::Cancelled => write!(f, "cancelled"),
            RelayExit::Failed(e) => write!(f, "failed: {e}"),
            RelayExit::Aborted => write!(f, "aborted"),
        }
    }
}

/// Outcome of a finished call.
#[derive(Debug)]
pub struct SessionSummary {
    pub call_id: String,
    /// Loop that finished first and ended the call
    pub first: RelayDirection,
    pub first_exit: RelayExit,
    pub other_exit: RelayExit,
}

// =============================================================================
// Translation
// =============================================================================

/// Apply a telephony event to the session and build the command to forward.
///
/// `start` records the stream sid. `media` records the timestamp and yields
/// an append command while the realtime side is open. Nothing else touches
/// the session.
pub fn translate_call_event(event: TelephonyEvent, session: &CallSession) -> Option<ClientEvent> {
    match event {
        TelephonyEvent::Start { start } => {
            info!(stream_sid = %start.stream_sid, "Incoming stream has started");
            session.set_stream_sid(start.stream_sid);
            None
        }
        TelephonyEvent::Media { media } => {
            if let Some(timestamp) = media.timestamp {
                session.observe_media_timestamp(timestamp);
            }
            if session.is_realtime_open() {
                Some(ClientEvent::audio_append(media.payload))
            } else {
                trace!("Realtime session closed, dropping caller audio");
                None
            }
        }
        TelephonyEvent::Unhandled => None,
    }
}

/// Turn a realtime event into a media frame for the caller, if it carries audio.
///
/// The delta is already base64 G.711 u-law, the same encoding the caller
/// side plays, so it is forwarded without being decoded.
pub fn translate_realtime_event(event: ServerEvent, session: &CallSession) -> Option<MediaFrame> {
    match event {
        ServerEvent::AudioDelta {
            delta: Some(delta),
            item_id,
        } => {
            if let Some(item_id) = item_id {
                session.set_last_assistant_item(item_id);
            }
            Some(MediaFrame::new(session.stream_sid(), delta))
        }
        ServerEvent::AudioDelta { delta: None, .. } => {
            debug!("Audio delta without payload, skipping");
            None
        }
        _ => None,
    }
}

// =============================================================================
// Relay loops
// =============================================================================

/// Receive the next frame, failing once the call as a whole has been quiet
/// for `idle_timeout`.
///
/// The idle clock is shared by both loops, so a silent realtime side does
/// not time out while the caller keeps streaming.
async fn recv_frame<S>(
    source: &mut S,
    session: &CallSession,
    idle_timeout: Option<Duration>,
) -> BridgeResult<Option<String>>
where
    S: FrameSource + ?Sized,
{
    let frame = match idle_timeout {
        Some(limit) => {
            let mut recv = source.recv_text();
            loop {
                let remaining = limit.saturating_sub(session.idle_for());
                if remaining.is_zero() {
                    return Err(BridgeError::Timeout(limit));
                }
                // On expiry, re-check: the other loop may have seen a frame
                if let Ok(frame) = tokio::time::timeout(remaining, &mut recv).await {
                    break frame;
                }
            }
        }
        None => source.recv_text().await,
    };
    if let Ok(Some(_)) = &frame {
        session.touch();
    }
    frame
}

async fn close_sink<K>(sink: &mut K, direction: RelayDirection)
where
    K: FrameSink + ?Sized,
{
    if let Err(e) = sink.close().await {
        debug!(%direction, "Error closing sink: {}", e);
    }
}

/// Forward caller audio to the realtime session until either side goes away.
///
/// Owns the realtime sink and closes it before returning.
pub async fn inbound_relay<S, K>(
    mut call_source: S,
    mut realtime_sink: K,
    session: Arc<CallSession>,
    cancel: CancellationToken,
    idle_timeout: Option<Duration>,
) -> RelayExit
where
    S: FrameSource,
    K: FrameSink,
{
    let mut forwarded: u64 = 0;

    let exit = loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => break RelayExit::Cancelled,
            frame = recv_frame(&mut call_source, &session, idle_timeout) => frame,
        };

        let text = match frame {
            Ok(Some(text)) => text,
            Ok(None) => break RelayExit::PeerClosed,
            Err(e) => break RelayExit::Failed(e),
        };
        if text.trim().is_empty() {
            continue;
        }

        let event = match serde_json::from_str::<TelephonyEvent>(&text) {
            Ok(event) => event,
            Err(e) => break RelayExit::Failed(e.into()),
        };
        if matches!(event, TelephonyEvent::Unhandled) {
            trace!("Ignoring telephony event: {}", text);
        }

        let Some(command) = translate_call_event(event, &session) else {
            continue;
        };
        let json = match serde_json::to_string(&command) {
            Ok(json) => json,
            Err(e) => break RelayExit::Failed(BridgeError::Encode(e.to_string())),
        };
        if let Err(e) = realtime_sink.send_text(json).await {
            break RelayExit::Failed(e);
        }
        forwarded += 1;
    };

    close_sink(&mut realtime_sink, RelayDirection::Inbound).await;
    debug!(forwarded, %exit, "Inbound relay stopped");
    exit
}

/// Forward synthesized audio to the caller until either side goes away.
///
/// Owns the call sink and closes it before returning. The session is marked
/// realtime-closed as soon as this loop stops reading.
pub async fn outbound_relay<S, K>(
    mut realtime_source: S,
    mut call_sink: K,
    session: Arc<CallSession>,
    cancel: CancellationToken,
    idle_timeout: Option<Duration>,
) -> RelayExit
where
    S: FrameSource,
    K: FrameSink,
{
    let mut forwarded: u64 = 0;

    let exit = loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => break RelayExit::Cancelled,
            frame = recv_frame(&mut realtime_source, &session, idle_timeout) => frame,
        };

        let text = match frame {
            Ok(Some(text)) => text,
            Ok(None) => break RelayExit::PeerClosed,
            Err(e) => break RelayExit::Failed(e),
        };

        let event = match serde_json::from_str::<ServerEvent>(&text) {
            Ok(event) => event,
            Err(e) => break RelayExit::Failed(e.into()),
        };

        match &event {
            ServerEvent::Error { error } => {
                warn!(
                    error_type = %error.error_type,
                    code = ?error.code,
                    "Realtime error event: {}", error.message
                );
            }
            event if event.is_loggable() => {
                info!(event_type = event.event_type(), "Received event: {}", text);
            }
            _ => {}
        }

        let Some(frame) = translate_realtime_event(event, &session) else {
            continue;
        };
        let json = match serde_json::to_string(&frame) {
            Ok(json) => json,
            Err(e) => break RelayExit::Failed(BridgeError::Encode(e.to_string())),
        };
        if let Err(e) = call_sink.send_text(json).await {
            break RelayExit::Failed(e);
        }
        forwarded += 1;
    };

    session.mark_realtime_closed();
    close_sink(&mut call_sink, RelayDirection::Outbound).await;
    debug!(forwarded, %exit, "Outbound relay stopped");
    exit
}

// =============================================================================
// Session driver
// =============================================================================

/// Run both relay loops for one call and tear the call down when either ends.
///
/// The session must already be configured on the realtime side.
pub async fn run_call_session<CS, CK, AS, AK>(
    call: (CS, CK),
    realtime: (AS, AK),
    session: Arc<CallSession>,
    options: RelayOptions,
) -> SessionSummary
where
    CS: FrameSource + 'static,
    CK: FrameSink + 'static,
    AS: FrameSource + 'static,
    AK: FrameSink + 'static,
{
    let (call_source, call_sink) = call;
    let (realtime_source, realtime_sink) = realtime;

    session.set_state(CallState::Active);
    let token = CancellationToken::new();

    let mut inbound: JoinHandle<RelayExit> = tokio::spawn(
        inbound_relay(
            call_source,
            realtime_sink,
            session.clone(),
            token.child_token(),
            options.idle_timeout,
        )
        .instrument(Span::current()),
    );
    let mut outbound: JoinHandle<RelayExit> = tokio::spawn(
        outbound_relay(
            realtime_source,
            call_sink,
            session.clone(),
            token.child_token(),
            options.idle_timeout,
        )
        .instrument(Span::current()),
    );

    let (first, first_result) = tokio::select! {
        result = &mut inbound => (RelayDirection::Inbound, result),
        result = &mut outbound => (RelayDirection::Outbound, result),
    };
    let first_exit = RelayExit::from_join(first_result);
    session.set_state(CallState::Terminated);
    info!(%first, exit = %first_exit, "Relay finished, tearing down call");

    token.cancel();
    let loser = match first {
        RelayDirection::Inbound => &mut outbound,
        RelayDirection::Outbound => &mut inbound,
    };
    let other_exit = match tokio::time::timeout(options.shutdown_grace, &mut *loser).await {
        Ok(result) => RelayExit::from_join(result),
        Err(_) => {
            warn!(
                grace = ?options.shutdown_grace,
                "Relay did not stop within grace period, aborting"
            );
            loser.abort();
            RelayExit::Aborted
        }
    };

    SessionSummary {
        call_id: session.call_id().to_string(),
        first,
        first_exit,
        other_exit,
    }
}

/// Configure the realtime session, then relay the call until it ends.
///
/// If the `session.update` cannot be sent the call never becomes active:
/// both sinks are closed and the error is returned.
pub async fn bridge_call<CS, CK, AS, AK>(
    call: (CS, CK),
    realtime: (AS, AK),
    session: Arc<CallSession>,
    settings: &RealtimeSettings,
    options: RelayOptions,
) -> BridgeResult<SessionSummary>
where
    CS: FrameSource + 'static,
    CK: FrameSink + 'static,
    AS: FrameSource + 'static,
    AK: FrameSink + 'static,
{
    let (call_source, mut call_sink) = call;
    let (realtime_source, mut realtime_sink) = realtime;

    if let Err(e) = initialize_session(&mut realtime_sink, settings).await {
        error!("Failed to initialize realtime session: {}", e);
        session.set_state(CallState::Terminated);
        close_sink(&mut realtime_sink, RelayDirection::Inbound).await;
        close_sink(&mut call_sink, RelayDirection::Outbound).await;
        return Err(e);
    }
    info!("Realtime session configured");

    Ok(run_call_session(
        (call_source, call_sink),
        (realtime_source, realtime_sink),
        session,
        options,
    )
    .await)
}
