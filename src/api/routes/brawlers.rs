use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::dashboard::BrawlerOverview;
use crate::models::BrawlerInfo;

#[derive(Debug, Serialize)]
pub struct BrawlersResponse {
    pub brawlers: Vec<BrawlerInfo>,
    pub total: usize,
}

pub async fn list_brawlers(
    State(state): State<AppState>,
) -> Result<Json<BrawlersResponse>, ApiError> {
    let brawlers = state.dashboard.api().brawlers().await?;
    Ok(Json(BrawlersResponse {
        total: brawlers.len(),
        brawlers,
    }))
}

pub async fn brawler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BrawlerOverview>, ApiError> {
    let overview = state.dashboard.brawler_overview(&id).await?;
    Ok(Json(overview))
}
