use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::directory::ADMINS_GROUP;
use crate::error::{Result, ServiceError};
use crate::store::team_members::TeamMemberRepository;

// Claims of a Cognito ID token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(
        rename = "cognito:username",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cognito_username: Option<String>,
    #[serde(rename = "cognito:groups", default, skip_serializing_if = "Vec::is_empty")]
    pub cognito_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub iss: String,
    #[serde(default)]
    pub aud: String,
    #[serde(rename = "token_use", default, skip_serializing_if = "Option::is_none")]
    pub token_use: Option<String>,
    #[serde(default)]
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
}

/// The authenticated caller, inserted into request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub sub: String,
    pub username: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub groups: Vec<String>,
}

impl AuthUser {
    pub fn is_global_admin(&self) -> bool {
        self.groups.iter().any(|g| g == ADMINS_GROUP)
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims
                .cognito_username
                .unwrap_or_else(|| claims.sub.clone()),
            sub: claims.sub,
            email: claims.email,
            name: claims.name,
            groups: claims.cognito_groups,
        }
    }
}

/// Passes global admins and active admins/trainers of `team_id`.
pub async fn require_team_manager(
    user: &AuthUser,
    members: &TeamMemberRepository,
    team_id: &str,
) -> Result<()> {
    if user.is_global_admin() {
        return Ok(());
    }

    match members.active_role(team_id, &user.sub).await? {
        Some(role) if role.can_manage_team() => Ok(()),
        role => {
            tracing::warn!(
                sub = %user.sub,
                team_id = %team_id,
                role = ?role,
                "Caller may not manage team"
            );
            Err(ServiceError::Forbidden(format!(
                "Not allowed to manage team {}",
                team_id
            )))
        }
    }
}

// JWT decoder without verification - API Gateway already validated the token
pub fn decode_jwt_payload(token: &str) -> Result<Claims> {
    tracing::debug!("Decoding JWT payload");

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::warn!("Invalid JWT format: expected 3 parts, got {}", parts.len());
        return Err(ServiceError::Unauthorized("Invalid JWT format".into()));
    }

    let payload_data = URL_SAFE_NO_PAD.decode(parts[1]).map_err(|err| {
        tracing::warn!("Failed to base64 decode JWT payload: {:?}", err);
        ServiceError::Unauthorized("Could not decode JWT payload".into())
    })?;

    let claims = serde_json::from_slice::<Claims>(&payload_data).map_err(|err| {
        tracing::warn!("Failed to parse JWT claims: {:?}", err);
        ServiceError::Unauthorized("Could not parse JWT claims".into())
    })?;

    tracing::debug!(sub = %claims.sub, groups = ?claims.cognito_groups, "JWT claims parsed");
    Ok(claims)
}

fn bearer_token(request: &Request) -> Result<&str> {
    let header = request
        .headers()
        .get("authorization")
        .ok_or_else(|| ServiceError::Unauthorized("Missing authorization header".into()))?;

    let value = header.to_str().map_err(|err| {
        tracing::warn!("Invalid authorization header format: {:?}", err);
        ServiceError::Unauthorized("Invalid authorization header format".into())
    })?;

    value.strip_prefix("Bearer ").ok_or_else(|| {
        ServiceError::Unauthorized("Invalid authorization format. Expected 'Bearer <token>'".into())
    })
}

// Auth middleware shared by both services
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    tracing::info!(
        "Auth middleware: method={:?}, path={:?}",
        request.method(),
        request.uri().path()
    );

    let claims = match bearer_token(&request).and_then(decode_jwt_payload) {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };

    let user = AuthUser::from(claims);
    tracing::info!(sub = %user.sub, "Authenticated user");
    request.extensions_mut().insert(user);

    let response = next.run(request).await;
    tracing::info!("Handler response status: {:?}", response.status());
    response
}
