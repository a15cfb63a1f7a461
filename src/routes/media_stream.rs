//! Media stream WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::media_stream::media_stream_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the media stream router
///
/// # Endpoint
///
/// `GET /media-stream` - WebSocket upgrade, one call per connection
///
/// # Protocol
///
/// The telephony provider sends JSON text frames tagged by `event`:
/// - `start` carries the `streamSid` used to tag audio sent back
/// - `media` carries base64 G.711 u-law caller audio
///
/// The server sends assistant audio back as
///
/// ```json
/// {"event": "media", "streamSid": "MZ...", "media": {"payload": "..."}}
/// ```
pub fn create_media_stream_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/media-stream", get(media_stream_handler))
        .layer(TraceLayer::new_for_http())
}
