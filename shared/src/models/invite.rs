use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TeamRole;
use crate::store::query::{SortValue, Sortable};

/// Days an invite stays acceptable after creation.
pub const INVITE_TTL_DAYS: i64 = 7;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Declined,
    Revoked,
    Expired,
}

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "pending",
            InviteStatus::Accepted => "accepted",
            InviteStatus::Declined => "declined",
            InviteStatus::Revoked => "revoked",
            InviteStatus::Expired => "expired",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub id: String,
    pub team_id: String,
    pub email: String,
    pub role: TeamRole,
    pub status: InviteStatus,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub invited_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declined_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_by: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declined_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_resent_at: Option<DateTime<Utc>>,
}

impl Invite {
    /// A fresh pending invite expiring `INVITE_TTL_DAYS` after `now`.
    pub fn new_pending(
        team_id: &str,
        email: &str,
        role: TeamRole,
        token: &str,
        invited_by: &str,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            team_id: team_id.to_string(),
            email: email.to_string(),
            role,
            status: InviteStatus::Pending,
            token: token.to_string(),
            message,
            invited_by: invited_by.to_string(),
            accepted_by: None,
            declined_by: None,
            revoked_by: None,
            expires_at: now + Duration::days(INVITE_TTL_DAYS),
            created_at: now,
            updated_at: now,
            accepted_at: None,
            declined_at: None,
            revoked_at: None,
            last_resent_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == InviteStatus::Pending
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

impl Sortable for Invite {
    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "email" => Some(SortValue::text(&self.email)),
            "status" => Some(SortValue::text(self.status.as_str())),
            "role" => Some(SortValue::text(self.role.as_str())),
            "createdat" => Some(SortValue::time(Some(self.created_at))),
            "expiresat" => Some(SortValue::time(Some(self.expires_at))),
            _ => None,
        }
    }
}
