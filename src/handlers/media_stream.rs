//! Media stream WebSocket handler
//!
//! The telephony provider opens one WebSocket per call. Each accepted socket
//! gets its own realtime session and [`CallSession`]; nothing is shared with
//! other calls except the read-only configuration in [`AppState`].

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use tracing::{Instrument, error, info, info_span, warn};

use crate::core::realtime::{RealtimeSettings, connect_realtime};
use crate::core::relay::{RelayOptions, bridge_call};
use crate::core::session::{CallSession, CallState};
use crate::core::transport::{FrameSink, split_call_socket};
use crate::state::AppState;

/// Maximum WebSocket frame size (1 MB)
const MAX_WS_FRAME_SIZE: usize = 1024 * 1024;

/// Maximum WebSocket message size (1 MB)
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// Upgrade the telephony request to a media stream WebSocket.
pub async fn media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("Media stream connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_media_stream(socket, state))
}

async fn handle_media_stream(socket: WebSocket, state: Arc<AppState>) {
    let session = Arc::new(CallSession::new());
    let span = info_span!("call", call_id = %session.call_id());

    run_call(socket, state, session).instrument(span).await
}

async fn run_call(socket: WebSocket, state: Arc<AppState>, session: Arc<CallSession>) {
    let _guard = state.track_call();
    info!(
        active_calls = state.active_calls(),
        "Client connected, state {}",
        session.state()
    );

    let (call_source, mut call_sink) = split_call_socket(socket);
    let settings = RealtimeSettings::from_config(&state.config);
    let options = RelayOptions::from_config(&state.config);

    let (realtime_source, realtime_sink) = match connect_realtime(&settings).await {
        Ok(halves) => halves,
        Err(e) => {
            error!("Failed to connect to realtime endpoint: {}", e);
            session.set_state(CallState::Terminated);
            if let Err(e) = call_sink.close().await {
                warn!("Error closing call socket: {}", e);
            }
            return;
        }
    };

    match bridge_call(
        (call_source, call_sink),
        (realtime_source, realtime_sink),
        session.clone(),
        &settings,
        options,
    )
    .await
    {
        Ok(summary) => {
            let failed = summary.first_exit.is_failure() || summary.other_exit.is_failure();
            if failed {
                warn!(
                    first = %summary.first,
                    first_exit = %summary.first_exit,
                    other_exit = %summary.other_exit,
                    "Call ended with errors"
                );
            } else {
                info!(
                    first = %summary.first,
                    first_exit = %summary.first_exit,
                    other_exit = %summary.other_exit,
                    latest_media_timestamp = session.latest_media_timestamp(),
                    "Call ended"
                );
            }
        }
        Err(e) => {
            warn!("Call ended before relaying audio: {}", e);
        }
    }
}
