use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use volleygoals_shared::models::{DirectoryUser, MemberStatus, TeamMember, TeamRole};

// Request DTOs
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AddTeamMemberRequest {
    pub user_id: String,
    pub role: TeamRole,
}

// Response DTOs
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberResponse {
    pub team_member: TeamMember,
}

/// A membership joined with the member's directory profile.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberListItem {
    pub id: String,
    pub user_id: String,
    pub role: TeamRole,
    pub status: MemberStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// `None` when the account no longer exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<DateTime<Utc>>,
}

impl TeamMemberListItem {
    pub fn new(member: TeamMember, user: Option<DirectoryUser>) -> Self {
        Self {
            id: member.id,
            user_id: member.user_id,
            role: member.role,
            status: member.status,
            name: user.as_ref().and_then(|u| u.name.clone()),
            email: user.as_ref().map(|u| u.email.clone()),
            user_enabled: user.as_ref().map(|u| u.enabled),
            joined_at: member.joined_at,
        }
    }
}
