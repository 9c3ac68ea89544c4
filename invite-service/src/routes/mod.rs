use axum::{
    extract::Request,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::health;
use crate::handlers::invite_handlers::{
    complete_invite, create_invite, get_invite, list_team_invites, resend_invite, revoke_invite,
};
use crate::orchestrator::InviteOrchestrator;
use volleygoals_shared::auth::auth_middleware;
use volleygoals_shared::config::AppConfig;
use volleygoals_shared::directory::cognito::CognitoDirectory;
use volleygoals_shared::mail::ses::SesMailer;
use volleygoals_shared::store::dynamo::DynamoRecordStore;

/// Creates a router backed by DynamoDB, Cognito and SES
pub async fn create_router(config: AppConfig) -> Router {
    tracing::info!("Creating router with AWS collaborators");

    let store = Arc::new(DynamoRecordStore::new().await);
    let directory = Arc::new(CognitoDirectory::new(&config.user_pool_id).await);
    let mailer = Arc::new(SesMailer::new(&config.mail_sender).await);

    let prefix = config.route_prefix();
    tracing::info!("Using API route prefix: {}", prefix);

    let orchestrator = Arc::new(InviteOrchestrator::new(store, directory, mailer, config));
    create_router_with_orchestrator(orchestrator, prefix)
}

/// Creates a router around an already wired orchestrator
pub fn create_router_with_orchestrator(
    orchestrator: Arc<InviteOrchestrator>,
    prefix: &str,
) -> Router {
    tracing::info!("Setting up API routes with prefix: {}", prefix);

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Logging middleware to trace all requests
    async fn logging_middleware(
        req: Request,
        next: axum::middleware::Next,
    ) -> impl axum::response::IntoResponse {
        tracing::info!(
            "Router received request: method={}, uri={}",
            req.method(),
            req.uri()
        );
        next.run(req).await
    }

    // `/invites/:id` is an invite id for DELETE and resend, a token for GET.
    // Both routers must use the same parameter name for the shared path.
    let protected_routes = Router::new()
        .route("/invites", post(create_invite))
        .route("/invites/:id", delete(revoke_invite))
        .route("/invites/:id/resend", post(resend_invite))
        .route("/teams/:teamId/invites", get(list_team_invites))
        .route_layer(middleware::from_fn(auth_middleware));

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/invites/complete", post(complete_invite))
        .route("/invites/:id", get(get_invite));

    let api_routes = protected_routes
        .merge(public_routes)
        .with_state(orchestrator);

    let router = if prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(prefix, api_routes)
    };
    let router = router
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware));

    // Add a fallback handler for 404s
    router.fallback(|req: Request| async move {
        tracing::warn!("No route matched for: {} {}", req.method(), req.uri());
        (
            axum::http::StatusCode::NOT_FOUND,
            "The requested resource was not found".to_string(),
        )
    })
}
