pub mod api;
pub mod media_stream;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// Full application router with state attached.
pub fn create_app(state: Arc<AppState>) -> Router {
    api::create_api_router()
        .merge(media_stream::create_media_stream_router())
        .with_state(state)
}
