use axum::{extract::Request, middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::health;
use crate::handlers::team_handlers::{add_team_member, list_team_members, list_teams};
use crate::service::TeamService;
use volleygoals_shared::auth::auth_middleware;
use volleygoals_shared::config::AppConfig;
use volleygoals_shared::directory::cognito::CognitoDirectory;
use volleygoals_shared::store::dynamo::DynamoRecordStore;

/// Creates a router backed by DynamoDB and Cognito
pub async fn create_router(config: AppConfig) -> Router {
    tracing::info!("Creating router with AWS collaborators");

    let store = Arc::new(DynamoRecordStore::new().await);
    let directory = Arc::new(CognitoDirectory::new(&config.user_pool_id).await);

    let prefix = config.route_prefix();
    tracing::info!("Using API route prefix: {}", prefix);

    create_router_with_service(Arc::new(TeamService::new(store, directory, &config)), prefix)
}

/// Creates a router around an already wired service
pub fn create_router_with_service(service: Arc<TeamService>, prefix: &str) -> Router {
    tracing::info!("Setting up API routes with prefix: {}", prefix);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

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

    let api_routes = Router::new()
        .route("/teams", get(list_teams))
        .route(
            "/teams/:teamId/members",
            get(list_team_members).post(add_team_member),
        )
        .route_layer(middleware::from_fn(auth_middleware))
        .route("/health", get(health))
        .with_state(service);

    let router = if prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(prefix, api_routes)
    };
    let router = router
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware));

    router.fallback(|req: Request| async move {
        tracing::warn!("No route matched for: {} {}", req.method(), req.uri());
        (
            axum::http::StatusCode::NOT_FOUND,
            "The requested resource was not found".to_string(),
        )
    })
}
