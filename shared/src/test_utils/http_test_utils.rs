use axum::body::{to_bytes, Body};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::Claims;

/// Helper function to extract JSON from an Axum response
pub async fn response_to_json(response: axum::response::Response) -> Value {
    let body = response.into_body();
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Mints an unverified-signature JWT shaped like a Cognito ID token
pub fn create_jwt_token(user_id: &str, groups: &[&str]) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("System time is before Unix epoch")
        .as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        cognito_username: Some(user_id.to_string()),
        cognito_groups: groups.iter().map(|g| g.to_string()).collect(),
        email: Some(format!("{}@example.com", user_id)),
        name: None,
        iss: "https://cognito-idp.eu-central-1.amazonaws.com/eu-central-1_test".to_string(),
        aud: "volleygoals-test-client".to_string(),
        token_use: Some("id".to_string()),
        exp: now + 3600,
        iat: now - 100,
    };

    // API Gateway verifies the real RS256 signature; tests only need the shape
    let secret = "test_secret_key_for_jwt_encoding_in_tests";
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to create JWT")
}

/// Helper function to create an authorization header with a bearer token
pub fn create_auth_header(user_id: &str, groups: &[&str]) -> (String, String) {
    let token = create_jwt_token(user_id, groups);
    ("authorization".to_string(), format!("Bearer {}", token))
}

/// Builds a request, authenticated as `user_id` unless it is `None`
pub fn create_test_request(
    method: &str,
    path: &str,
    user: Option<(&str, &[&str])>,
    body: Option<Value>,
) -> http::Request<Body> {
    let mut builder = http::Request::builder().method(method).uri(path);

    if let Some((user_id, groups)) = user {
        let (auth_key, auth_value) = create_auth_header(user_id, groups);
        builder = builder.header(auth_key, auth_value);
    }

    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }

    match body {
        Some(json_body) => builder.body(Body::from(json_body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
