use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use volleygoals_shared::auth::AuthUser;
use volleygoals_shared::error::Result;
use volleygoals_shared::filter::TeamInviteFilter;
use volleygoals_shared::models::{now, Invite};
use volleygoals_shared::pagination::PageResponse;

use crate::models::{
    CompleteInviteRequest, CompleteInviteResponse, CreateInviteRequest, InviteResponse,
};
use crate::orchestrator::InviteOrchestrator;

// POST /invites
pub async fn create_invite(
    State(orchestrator): State<Arc<InviteOrchestrator>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<CreateInviteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InviteResponse>)> {
    let Json(request) = payload?;
    let invite = orchestrator.create_invite(&user, request, now()).await?;
    Ok((StatusCode::CREATED, Json(InviteResponse { invite })))
}

// GET /invites/:id - the id segment carries the invite token
pub async fn get_invite(
    State(orchestrator): State<Arc<InviteOrchestrator>>,
    Path(token): Path<String>,
) -> Result<Json<InviteResponse>> {
    let invite = orchestrator.get_invite(&token, now()).await?;
    Ok(Json(InviteResponse { invite }))
}

// POST /invites/complete
pub async fn complete_invite(
    State(orchestrator): State<Arc<InviteOrchestrator>>,
    payload: std::result::Result<Json<CompleteInviteRequest>, JsonRejection>,
) -> Result<Json<CompleteInviteResponse>> {
    let Json(request) = payload?;
    let response = orchestrator.complete_invite(request, now()).await?;
    Ok(Json(response))
}

// DELETE /invites/:id
pub async fn revoke_invite(
    State(orchestrator): State<Arc<InviteOrchestrator>>,
    Extension(user): Extension<AuthUser>,
    Path(invite_id): Path<String>,
) -> Result<Json<InviteResponse>> {
    let invite = orchestrator.revoke_invite(&user, &invite_id, now()).await?;
    Ok(Json(InviteResponse { invite }))
}

// POST /invites/:id/resend
pub async fn resend_invite(
    State(orchestrator): State<Arc<InviteOrchestrator>>,
    Extension(user): Extension<AuthUser>,
    Path(invite_id): Path<String>,
) -> Result<Json<InviteResponse>> {
    let invite = orchestrator.resend_invite(&user, &invite_id, now()).await?;
    Ok(Json(InviteResponse { invite }))
}

// GET /teams/:teamId/invites
pub async fn list_team_invites(
    State(orchestrator): State<Arc<InviteOrchestrator>>,
    Extension(user): Extension<AuthUser>,
    Path(team_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<PageResponse<Invite>>> {
    let filter = TeamInviteFilter::from_query(&query)?;
    let page = orchestrator
        .list_team_invites(&user, &team_id, &filter)
        .await?;
    tracing::debug!(team_id = %team_id, count = page.count(), "Listed team invites");
    Ok(Json(page.into_response()?))
}
