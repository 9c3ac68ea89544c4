use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use volleygoals_shared::auth::AuthUser;
use volleygoals_shared::error::Result;
use volleygoals_shared::filter::{TeamFilter, TeamMemberFilter};
use volleygoals_shared::models::{now, Team};
use volleygoals_shared::pagination::PageResponse;

use crate::models::{AddTeamMemberRequest, TeamMemberListItem, TeamMemberResponse};
use crate::service::TeamService;

// GET /teams
pub async fn list_teams(
    State(service): State<Arc<TeamService>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<PageResponse<Team>>> {
    let filter = TeamFilter::from_query(&query)?;
    let page = service.list_teams(&user, &filter).await?;
    Ok(Json(page.into_response()?))
}

// GET /teams/:teamId/members
pub async fn list_team_members(
    State(service): State<Arc<TeamService>>,
    Extension(user): Extension<AuthUser>,
    Path(team_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<PageResponse<TeamMemberListItem>>> {
    let filter = TeamMemberFilter::from_query(&query)?;
    let page = service.list_members(&user, &team_id, &filter).await?;
    Ok(Json(page.into_response()?))
}

// POST /teams/:teamId/members
pub async fn add_team_member(
    State(service): State<Arc<TeamService>>,
    Extension(user): Extension<AuthUser>,
    Path(team_id): Path<String>,
    payload: std::result::Result<Json<AddTeamMemberRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamMemberResponse>)> {
    let Json(request) = payload?;
    let team_member = service.add_member(&user, &team_id, request, now()).await?;
    Ok((StatusCode::CREATED, Json(TeamMemberResponse { team_member })))
}
