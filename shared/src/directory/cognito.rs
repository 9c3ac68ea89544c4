use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cognitoidentityprovider::types::{AttributeType, MessageActionType, UserType};
use aws_sdk_cognitoidentityprovider::Client;

use super::{generate_temporary_password, Directory, TEMPORARY_PASSWORD_LENGTH};
use crate::error::{map_directory_error, Result, ServiceError};
use crate::models::{DirectoryUser, ProvisionedUser};

/// Cognito user pool backed directory.
#[derive(Clone)]
pub struct CognitoDirectory {
    client: Client,
    user_pool_id: String,
}

impl CognitoDirectory {
    pub async fn new(user_pool_id: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::with_client(Client::new(&config), user_pool_id)
    }

    pub fn with_client(client: Client, user_pool_id: &str) -> Self {
        Self {
            client,
            user_pool_id: user_pool_id.to_string(),
        }
    }

    async fn find_one(&self, filter: String) -> Result<Option<DirectoryUser>> {
        let response = self
            .client
            .list_users()
            .user_pool_id(&self.user_pool_id)
            .filter(filter)
            .limit(1)
            .send()
            .await
            .map_err(|e| map_directory_error("list_users", e))?;

        Ok(response.users().first().map(to_directory_user))
    }
}

fn attribute(name: &str, value: &str) -> Result<AttributeType> {
    AttributeType::builder()
        .name(name)
        .value(value)
        .build()
        .map_err(|e| map_directory_error("build_attribute", e))
}

fn to_directory_user(user: &UserType) -> DirectoryUser {
    let lookup = |name: &str| {
        user.attributes()
            .iter()
            .find(|a| a.name() == name)
            .and_then(|a| a.value())
            .map(str::to_string)
    };

    DirectoryUser {
        sub: lookup("sub").unwrap_or_default(),
        username: user.username().unwrap_or_default().to_string(),
        email: lookup("email").unwrap_or_default(),
        name: lookup("name"),
        enabled: user.enabled(),
    }
}

// Cognito filter strings quote values with double quotes
fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[async_trait]
impl Directory for CognitoDirectory {
    async fn create_user(&self, email: &str) -> Result<ProvisionedUser> {
        let temporary_password = generate_temporary_password(TEMPORARY_PASSWORD_LENGTH);

        let response = self
            .client
            .admin_create_user()
            .user_pool_id(&self.user_pool_id)
            .username(email)
            .temporary_password(&temporary_password)
            .message_action(MessageActionType::Suppress)
            .user_attributes(attribute("email", email)?)
            .user_attributes(attribute("email_verified", "true")?)
            .send()
            .await
            .map_err(|e| map_directory_error("admin_create_user", e))?;

        let user = response.user().map(to_directory_user).ok_or_else(|| {
            ServiceError::InternalError("Directory returned no user after creation".into())
        })?;

        tracing::info!(sub = %user.sub, "Directory user created");
        Ok(ProvisionedUser {
            user,
            temporary_password,
        })
    }

    async fn delete_user(&self, username: &str) -> Result<()> {
        self.client
            .admin_delete_user()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .send()
            .await
            .map_err(|e| map_directory_error("admin_delete_user", e))?;
        Ok(())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<DirectoryUser>> {
        self.find_one(format!("email = \"{}\"", quote(email))).await
    }

    async fn get_user_by_sub(&self, sub: &str) -> Result<Option<DirectoryUser>> {
        self.find_one(format!("sub = \"{}\"", quote(sub))).await
    }

    async fn add_to_group(&self, username: &str, group: &str) -> Result<()> {
        self.client
            .admin_add_user_to_group()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .group_name(group)
            .send()
            .await
            .map_err(|e| map_directory_error("admin_add_user_to_group", e))?;
        Ok(())
    }
}
