use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::{path_tag, ApiError};
use crate::config::FeaturedClub;
use crate::dashboard::ClubOverview;
use crate::models::ClubMember;

#[derive(Debug, Serialize)]
pub struct FeaturedClubsResponse {
    pub clubs: Vec<FeaturedClub>,
}

pub async fn featured_clubs(State(state): State<AppState>) -> Json<FeaturedClubsResponse> {
    Json(FeaturedClubsResponse {
        clubs: state.dashboard.featured_clubs().to_vec(),
    })
}

pub async fn club(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<ClubOverview>, ApiError> {
    let overview = state.dashboard.club_overview(&path_tag(&tag)).await?;
    Ok(Json(overview))
}

#[derive(Debug, Serialize)]
pub struct ClubMembersResponse {
    pub tag: String,
    pub members: Vec<ClubMember>,
}

pub async fn club_members(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<ClubMembersResponse>, ApiError> {
    let tag = path_tag(&tag);
    let members = state.dashboard.club_members(&tag).await?;
    Ok(Json(ClubMembersResponse { tag, members }))
}
