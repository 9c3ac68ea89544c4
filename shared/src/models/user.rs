use serde::{Deserialize, Serialize};

/// A user account as known to the identity directory.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    /// Stable subject identifier
    pub sub: String,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub enabled: bool,
}

impl DirectoryUser {
    /// Display name, falling back to the email address.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

/// A freshly created account and its one-time temporary password.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvisionedUser {
    pub user: DirectoryUser,
    pub temporary_password: String,
}
