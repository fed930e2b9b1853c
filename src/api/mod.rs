//! REST API endpoints.
//!
//! Axum-based JSON API exposing the dashboard views for players, clubs,
//! brawlers and head-to-head comparisons.

pub mod routes;
pub mod state;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::fetch::FetchError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Fetch(FetchError::Validation { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Fetch(FetchError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Fetch(FetchError::RateLimited { .. }) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Fetch(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Fetch(e) => e.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = match &self {
            ApiError::Fetch(FetchError::RateLimited {
                retry_after_secs, ..
            }) => *retry_after_secs,
            _ => None,
        };

        let message = match &self {
            ApiError::Fetch(e) => e.user_message(),
        };
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

/// Add the `#` a URL path segment cannot carry.
pub fn path_tag(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('#') {
        trimmed.to_string()
    } else {
        format!("#{}", trimmed)
    }
}

/// CORS for the configured origin; `*` allows any.
pub fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }

    let layer = CorsLayer::new().allow_methods([Method::GET]);
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(e) => {
            warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
            layer
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/players/:tag", get(routes::players::player))
        .route(
            "/api/players/:tag/battlelog",
            get(routes::players::battle_log),
        )
        .route("/api/clubs", get(routes::clubs::featured_clubs))
        .route("/api/clubs/:tag", get(routes::clubs::club))
        .route("/api/clubs/:tag/members", get(routes::clubs::club_members))
        .route("/api/brawlers", get(routes::brawlers::list_brawlers))
        .route("/api/brawlers/:id", get(routes::brawlers::brawler))
        .route("/api/compare", get(routes::compare::compare))
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
