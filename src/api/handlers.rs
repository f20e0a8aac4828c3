//! HTTP request handlers

use super::types::{ErrorResponse, HealthResponse, WebhookResponse};
use super::AppState;
use crate::telegram::Update;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/telegram/webhook", post(telegram_webhook))
        .route("/health", get(health))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Webhook
// ============================================================

/// Accept one Bot API update. Anything that is not a text message or a
/// button press is acknowledged and dropped so Telegram does not resend it.
async fn telegram_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, AppError> {
    if let Some(expected) = state.webhook_secret.as_deref() {
        let provided = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            tracing::warn!("Webhook call with missing or wrong secret");
            return Err(AppError::Unauthorized);
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!(error = %e, "Undecodable update");
            return Ok(Json(WebhookResponse { ok: true }));
        }
    };

    let update_id = update.update_id;
    let Some(event) = update.into_inbound() else {
        tracing::debug!(update_id, "Unsupported update kind");
        return Ok(Json(WebhookResponse { ok: true }));
    };

    // A non-2xx answer makes Telegram redeliver the update
    state.dispatcher.dispatch(event).await.map_err(|e| {
        tracing::error!(update_id, error = %e, "Failed to dispatch update");
        AppError::Unavailable(e)
    })?;

    Ok(Json(WebhookResponse { ok: true }))
}

// ============================================================
// Service Info
// ============================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn get_version() -> &'static str {
    concat!("brew-guide ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    Unauthorized,
    Unavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Invalid webhook secret".to_string()),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
