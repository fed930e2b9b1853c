pub mod brawlers;
pub mod clubs;
pub mod compare;
pub mod players;

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::util::ServiceExt;

    use crate::api::build_router;
    use crate::api::state::AppState;
    use crate::dashboard::Dashboard;
    use crate::fetch::{ApiClient, MockTransport, ResponseCache, RetryPolicy, Transport};

    pub fn dashboard(mock: MockTransport) -> Dashboard {
        let api = ApiClient::new(
            Arc::new(mock) as Arc<dyn Transport>,
            ResponseCache::new(Duration::from_secs(60)),
        )
        .with_retry_policy(RetryPolicy::none());
        Dashboard::new(Arc::new(api))
    }

    pub fn app(dashboard: Dashboard) -> axum::Router {
        build_router(AppState::new(dashboard), "*")
    }

    pub async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        (status, json)
    }
}
