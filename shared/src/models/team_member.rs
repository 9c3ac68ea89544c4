use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TeamRole;
use crate::store::query::{SortValue, Sortable};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Left,
    Removed,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Left => "left",
            MemberStatus::Removed => "removed",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub role: TeamRole,
    pub status: MemberStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_at: Option<DateTime<Utc>>,
}

impl TeamMember {
    /// An active membership that starts at `now`.
    pub fn new_active(team_id: &str, user_id: &str, role: TeamRole, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            team_id: team_id.to_string(),
            user_id: user_id.to_string(),
            role,
            status: MemberStatus::Active,
            created_at: now,
            updated_at: now,
            joined_at: Some(now),
            left_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}

impl Sortable for TeamMember {
    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "joinedat" => Some(SortValue::time(self.joined_at)),
            "createdat" => Some(SortValue::time(Some(self.created_at))),
            "role" => Some(SortValue::text(self.role.as_str())),
            "status" => Some(SortValue::text(self.status.as_str())),
            "userid" => Some(SortValue::text(&self.user_id)),
            _ => None,
        }
    }
}
