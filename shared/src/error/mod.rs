use aws_sdk_dynamodb::error::SdkError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::pagination::CursorError;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("A pending invite already exists for token {token}")]
    InviteExists { token: String },

    #[error("User is already a member of team {0}")]
    AlreadyMember(String),

    #[error("Invite expired")]
    InviteExpired,

    #[error("Invite token does not match the invite")]
    InvalidInviteToken,

    #[error("Invite {0} is no longer pending")]
    InviteNotPending(String),

    #[error("Conditional write rejected: {0}")]
    ConditionFailed(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ServiceError {
    /// Stable machine-readable code returned to callers.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "bad_request",
            ServiceError::InvalidLimit(_) => "invalid_limit",
            ServiceError::InvalidCursor(_) => "invalid_cursor",
            ServiceError::Unauthorized(_) => "unauthorized",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::InviteExists { .. } => "invite_exists",
            ServiceError::AlreadyMember(_) => "user_already_member",
            ServiceError::InviteExpired => "invite_expired",
            ServiceError::InvalidInviteToken => "invalid_invite_token",
            ServiceError::InviteNotPending(_) => "invite_already_completed",
            ServiceError::ConditionFailed(_) => "conflict",
            ServiceError::InternalError(_) => "internal_server_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_)
            | ServiceError::InvalidLimit(_)
            | ServiceError::InvalidCursor(_)
            | ServiceError::InvalidInviteToken => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_)
            | ServiceError::InviteExists { .. }
            | ServiceError::AlreadyMember(_)
            | ServiceError::InviteNotPending(_)
            | ServiceError::ConditionFailed(_) => StatusCode::CONFLICT,
            ServiceError::InviteExpired => StatusCode::GONE,
            ServiceError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(rename = "inviteToken", skip_serializing_if = "Option::is_none")]
    pub invite_token: Option<String>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Collaborator detail stays in the logs
            ServiceError::InternalError(detail) => {
                tracing::error!(code = self.code(), detail = %detail, "Request failed");
                "Internal server error".to_string()
            }
            ServiceError::ConditionFailed(detail) => {
                tracing::warn!(code = self.code(), detail = %detail, "Conditional write lost");
                "The resource was modified concurrently".to_string()
            }
            other => {
                tracing::warn!(code = other.code(), "Request rejected: {}", other);
                other.to_string()
            }
        };
        let invite_token = match &self {
            ServiceError::InviteExists { token } => Some(token.clone()),
            _ => None,
        };

        let body = ErrorBody {
            error: self.code(),
            message,
            invite_token,
        };
        (status, Json(body)).into_response()
    }
}

// Malformed request bodies get the same error shape as every other client error
impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::Validation(rejection.body_text())
    }
}

// Helper function to map general DynamoDB errors
pub fn map_dynamo_error<E>(operation: &str, err: SdkError<E>) -> ServiceError {
    ServiceError::InternalError(format!("DynamoDB {} error: {}", operation, err))
}

pub fn map_directory_error(operation: &str, err: impl std::fmt::Display) -> ServiceError {
    ServiceError::InternalError(format!("Directory {} error: {}", operation, err))
}

pub fn map_mail_error(operation: &str, err: impl std::fmt::Display) -> ServiceError {
    ServiceError::InternalError(format!("Mail {} error: {}", operation, err))
}

impl From<serde_dynamo::Error> for ServiceError {
    fn from(err: serde_dynamo::Error) -> Self {
        ServiceError::InternalError(format!("DynamoDB serialization error: {}", err))
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::InternalError(format!("JSON serialization error: {}", err))
    }
}

impl From<CursorError> for ServiceError {
    fn from(err: CursorError) -> Self {
        ServiceError::InvalidCursor(err.to_string())
    }
}
