//! Axum routes for the RecipeBox API.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        DefaultBodyLimit, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use recipebox_core::RecipeId;

use crate::{error::GatewayError, state::AppState};

pub mod media;
pub mod profiles;
pub mod recipes;

// ── Router ────────────────────────────────────────────────────────────────────

/// Largest accepted JSON body. A draft at every field's maximum length,
/// with every character escaped, stays well below this.
pub const JSON_BODY_LIMIT: usize = 256 * 1024;

/// Build the application router over `state`.
///
/// JSON bodies are capped at [`JSON_BODY_LIMIT`]; only the two raw upload
/// routes use the configured upload limit.
pub fn create_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.catalog.max_upload_bytes());
    Router::new()
        .route("/health", get(health))
        .route("/api/recipes", get(recipes::list_recipes).post(recipes::create_recipe))
        .route(
            "/api/recipes/{id}",
            get(recipes::get_recipe).put(recipes::update_recipe).delete(recipes::delete_recipe),
        )
        .route("/api/recipes/{id}/image", put(recipes::upload_image).layer(upload_limit))
        .route(
            "/api/recipes/{id}/favorite",
            put(recipes::add_favorite).delete(recipes::remove_favorite),
        )
        .route("/api/me", get(profiles::get_me).put(profiles::update_me))
        .route("/api/me/avatar", put(profiles::upload_avatar).layer(upload_limit))
        .route("/api/me/tags", get(profiles::list_tags).post(profiles::add_tag))
        .route("/api/me/tags/{tag}", delete(profiles::remove_tag))
        .route("/api/users/{uid}", get(profiles::public_profile))
        .route("/api/users/{uid}/recipes", get(profiles::public_recipes))
        .route("/media/{*key}", get(media::serve_media))
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// `GET /health`: liveness probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

// ── Extraction helpers ────────────────────────────────────────────────────────

/// Unwrap a JSON body, turning axum's rejection into a JSON error.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, GatewayError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(GatewayError::PayloadTooLarge { max: JSON_BODY_LIMIT })
        }
        Err(rejection) => Err(GatewayError::InvalidRequest(rejection.body_text())),
    }
}

/// Unwrap a query string the same way.
pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, GatewayError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| GatewayError::InvalidRequest(rejection.body_text()))
}

/// Unwrap path parameters the same way.
pub(crate) fn path_param<T>(path: Result<Path<T>, PathRejection>) -> Result<T, GatewayError> {
    path.map(|Path(value)| value)
        .map_err(|rejection| GatewayError::InvalidRequest(rejection.body_text()))
}

pub(crate) fn parse_recipe_id(raw: &str) -> Result<RecipeId, GatewayError> {
    raw.parse()
        .map_err(|_| GatewayError::InvalidRequest(format!("'{raw}' is not a recipe id")))
}
