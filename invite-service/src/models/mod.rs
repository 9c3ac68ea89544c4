use serde::{Deserialize, Serialize};

use volleygoals_shared::models::{Invite, TeamMember, TeamRole};

fn default_send_email() -> bool {
    true
}

// Request DTOs
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteRequest {
    pub team_id: String,
    pub email: String,
    pub role: TeamRole,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "default_send_email")]
    pub send_email: bool,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CompleteInviteRequest {
    pub token: String,
    #[serde(default)]
    pub email: Option<String>,
    pub accepted: bool,
}

// Response DTOs
#[derive(Serialize, Debug, Clone)]
pub struct InviteResponse {
    pub invite: Invite,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CompleteInviteResponse {
    pub invite: Invite,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<TeamMember>,
    pub user_created: bool,
    /// Only present when an account was created for this completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
}
