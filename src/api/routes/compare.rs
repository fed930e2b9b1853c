use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::path_tag;
use crate::api::state::AppState;
use crate::dashboard::ComparisonView;

#[derive(Debug, Deserialize)]
pub struct CompareParams {
    pub a: String,
    pub b: String,
    /// Request an AI summary.
    #[serde(default)]
    pub ai: bool,
}

/// Always 200: failures are reported per section of the view.
pub async fn compare(
    State(state): State<AppState>,
    Query(params): Query<CompareParams>,
) -> Json<ComparisonView> {
    let view = state
        .dashboard
        .compare(&path_tag(&params.a), &path_tag(&params.b), params.ai)
        .await;
    Json(view)
}

#[cfg(test)]
mod tests {
    use crate::api::routes::test_support::{app, dashboard, get_json};
    use crate::fetch::MockTransport;
    use axum::http::StatusCode;

    fn player(tag: &str, name: &str, trophies: u32) -> String {
        format!(
            r#"{{"tag": "{}", "name": "{}", "trophies": {}, "highestTrophies": {}}}"#,
            tag, name, trophies, trophies
        )
    }

    #[tokio::test]
    async fn test_compare_with_one_missing_player() {
        let mock = MockTransport::new()
            .respond("/players/%23AAA111", 200, &player("#AAA111", "Spoony", 30000))
            .respond("/players/%23AAA111/battlelog", 200, r#"{"items": []}"#);

        let (status, json) = get_json(
            app(dashboard(mock)),
            "/api/compare?a=AAA111&b=%23ZZZ999&ai=true",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["first"]["status"], "ready");
        assert_eq!(json["second"]["status"], "unavailable");
        assert_eq!(json["second"]["code"], "NOT_FOUND");
        assert!(json["head_to_head"].is_null());
        assert_eq!(json["summary"]["code"], "MISSING_PLAYER_DATA");
    }

    #[tokio::test]
    async fn test_compare_head_to_head() {
        let mock = MockTransport::new()
            .respond("/players/%23AAA111", 200, &player("#AAA111", "Spoony", 30000))
            .respond("/players/%23AAA111/battlelog", 200, r#"{"items": []}"#)
            .respond("/players/%23BBB222", 200, &player("#BBB222", "Bolt", 20000))
            .respond("/players/%23BBB222/battlelog", 200, r#"{"items": []}"#);

        let (status, json) = get_json(app(dashboard(mock)), "/api/compare?a=AAA111&b=BBB222").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["head_to_head"][0]["trophies"], 30000);
        assert_eq!(json["head_to_head"][1]["name"], "Bolt");
        assert!(json["summary"].is_null());
    }

    #[tokio::test]
    async fn test_compare_requires_both_tags() {
        let mock = MockTransport::new();
        let resp = tower::util::ServiceExt::oneshot(
            app(dashboard(mock)),
            axum::http::Request::builder()
                .uri("/api/compare?a=AAA111")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
