//! Outbound templated email.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

pub mod ses;

pub const DEFAULT_PERSONAL_MESSAGE: &str = "Welcome to the team!";
/// Inviter name used when the inviter can no longer be resolved.
pub const FALLBACK_INVITER_NAME: &str = "A team admin";

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send_templated_email(&self, to: &str, template: &str, data: &Value) -> Result<()>;
}

/// Template data of the team invitation email.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InvitationEmail {
    pub inviter_name: String,
    pub team_name: String,
    pub accept_link: String,
    /// Rendered as text by the template
    pub expiry_days: String,
    pub personal_message: String,
}

impl InvitationEmail {
    pub fn new(
        inviter_name: &str,
        team_name: &str,
        accept_link: String,
        expiry_days: i64,
        personal_message: Option<&str>,
    ) -> Self {
        let personal_message = personal_message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_PERSONAL_MESSAGE);

        Self {
            inviter_name: inviter_name.to_string(),
            team_name: team_name.to_string(),
            accept_link,
            expiry_days: expiry_days.max(0).to_string(),
            personal_message: personal_message.to_string(),
        }
    }

    pub fn template_data(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_data_shape() {
        let email = InvitationEmail::new(
            "Coach Carla",
            "Beach Eagles",
            "https://app/accept-invite?token=t".to_string(),
            7,
            None,
        );
        assert_eq!(
            email.template_data().unwrap(),
            json!({
                "inviterName": "Coach Carla",
                "teamName": "Beach Eagles",
                "acceptLink": "https://app/accept-invite?token=t",
                "expiryDays": "7",
                "personalMessage": "Welcome to the team!"
            })
        );
    }

    #[test]
    fn test_personal_message_is_kept() {
        let email = InvitationEmail::new("a", "b", String::new(), -2, Some(" See you Monday "));
        assert_eq!(email.personal_message, "See you Monday");
        assert_eq!(email.expiry_days, "0");
    }
}
