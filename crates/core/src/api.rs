use axum::extract::State;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::Settings;
use crate::types::*;

pub struct AppState {
    pub settings: Arc<Settings>,
}

pub fn router(settings: Arc<Settings>) -> Router {
    let cors = cors_layer(&settings.cors_allowed_origins);
    let state = Arc::new(AppState { settings });

    Router::new()
        // Status
        .route("/", get(root))
        .route("/health", get(health))
        // TODO: WebSocket voice streaming, voice loop and memory routes mount here.
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Credentials are always allowed. With no configured origins every request
/// origin is echoed back; a literal `*` is not valid alongside credentials.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        let allowed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) if value != "*" => Some(value),
                _ => {
                    warn!(%origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

// ============================================================================
// Status
// ============================================================================

async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::online())
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(HealthReport::healthy(
        &state.settings.mem0_api_url,
        &state.settings.user_id,
    ))
}
