//! Environment-driven settings shared by the service binaries.

use std::env;

const DEFAULT_INVITES_TABLE: &str = "invites";
const DEFAULT_INVITE_TOKENS_TABLE: &str = "invite-tokens";
const DEFAULT_TEAMS_TABLE: &str = "teams";
const DEFAULT_TEAM_MEMBERS_TABLE: &str = "team-members";
const DEFAULT_MAIL_SENDER: &str = "noreply@volleygoals.com";
const DEFAULT_INVITE_TEMPLATE: &str = "team-invite";
const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:5173";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub invites_table: String,
    pub invite_tokens_table: String,
    pub teams_table: String,
    pub team_members_table: String,
    pub user_pool_id: String,
    pub mail_sender: String,
    pub invite_template_name: String,
    pub frontend_base_url: String,
    /// Serve routes without the `/Prod` stage prefix
    pub remove_base_path: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            invites_table: DEFAULT_INVITES_TABLE.to_string(),
            invite_tokens_table: DEFAULT_INVITE_TOKENS_TABLE.to_string(),
            teams_table: DEFAULT_TEAMS_TABLE.to_string(),
            team_members_table: DEFAULT_TEAM_MEMBERS_TABLE.to_string(),
            user_pool_id: String::new(),
            mail_sender: DEFAULT_MAIL_SENDER.to_string(),
            invite_template_name: DEFAULT_INVITE_TEMPLATE.to_string(),
            frontend_base_url: DEFAULT_FRONTEND_BASE_URL.to_string(),
            remove_base_path: false,
        }
    }
}

fn var_or(name: &str, default: String) -> String {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            invites_table: var_or("INVITES_TABLE", defaults.invites_table),
            invite_tokens_table: var_or("INVITE_TOKENS_TABLE", defaults.invite_tokens_table),
            teams_table: var_or("TEAMS_TABLE", defaults.teams_table),
            team_members_table: var_or("TEAM_MEMBERS_TABLE", defaults.team_members_table),
            user_pool_id: var_or("COGNITO_USER_POOL_ID", defaults.user_pool_id),
            mail_sender: var_or("MAIL_SENDER", defaults.mail_sender),
            invite_template_name: var_or("INVITE_TEMPLATE_NAME", defaults.invite_template_name),
            frontend_base_url: var_or("FRONTEND_BASE_URL", defaults.frontend_base_url)
                .trim_end_matches('/')
                .to_string(),
            remove_base_path: env::var("REMOVE_BASE_PATH")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
        };

        if config.user_pool_id.is_empty() {
            tracing::warn!("COGNITO_USER_POOL_ID is not set; directory calls will fail");
        }
        config
    }

    /// Route prefix: `/Prod` behind API Gateway, empty when removed.
    pub fn route_prefix(&self) -> &'static str {
        if self.remove_base_path {
            ""
        } else {
            "/Prod"
        }
    }

    /// Link an invitee follows to accept or decline.
    pub fn accept_link(&self, token: &str) -> String {
        format!("{}/accept-invite?token={}", self.frontend_base_url, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        temp_env::with_vars_unset(
            [
                "INVITES_TABLE",
                "INVITE_TOKENS_TABLE",
                "TEAMS_TABLE",
                "TEAM_MEMBERS_TABLE",
                "FRONTEND_BASE_URL",
                "REMOVE_BASE_PATH",
            ],
            || {
                let config = AppConfig::from_env();
                assert_eq!(config.invites_table, "invites");
                assert_eq!(config.invite_tokens_table, "invite-tokens");
                assert_eq!(config.route_prefix(), "/Prod");
            },
        );
    }

    #[test]
    fn test_reads_environment() {
        temp_env::with_vars(
            [
                ("INVITES_TABLE", Some("dev-invites")),
                ("FRONTEND_BASE_URL", Some("https://app.example.com/")),
                ("REMOVE_BASE_PATH", Some("TRUE")),
                ("MAIL_SENDER", Some("  ")),
            ],
            || {
                let config = AppConfig::from_env();
                assert_eq!(config.invites_table, "dev-invites");
                assert_eq!(config.mail_sender, "noreply@volleygoals.com");
                assert_eq!(config.route_prefix(), "");
                assert_eq!(
                    config.accept_link("abc"),
                    "https://app.example.com/accept-invite?token=abc"
                );
            },
        );
    }
}
