use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ServiceError;

pub mod invite;
pub mod team;
pub mod team_member;
pub mod user;

pub use invite::{Invite, InviteStatus, INVITE_TTL_DAYS};
pub use team::{Team, TeamStatus};
pub use team_member::{MemberStatus, TeamMember};
pub use user::{DirectoryUser, ProvisionedUser};

/// Role a person holds on a team, shared by invites and memberships.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Admin,
    Trainer,
    Member,
}

impl TeamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Admin => "admin",
            TeamRole::Trainer => "trainer",
            TeamRole::Member => "member",
        }
    }

    /// Admins and trainers manage invites and members of their team.
    pub fn can_manage_team(&self) -> bool {
        matches!(self, TeamRole::Admin | TeamRole::Trainer)
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamRole {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(TeamRole::Admin),
            "trainer" => Ok(TeamRole::Trainer),
            "member" => Ok(TeamRole::Member),
            other => Err(ServiceError::Validation(format!("Unknown role '{}'", other))),
        }
    }
}

// Helper function to get the current timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Canonical form of an email address: trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
