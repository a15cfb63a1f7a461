use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: &'static str,
}

/// Liveness check for the call bridge.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "Twilio Media Stream Server is running!",
    })
}
