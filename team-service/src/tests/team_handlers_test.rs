use axum::{http::StatusCode, Router};
use chrono::{Duration, Utc};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tower::ServiceExt;

use crate::routes::create_router_with_service;
use crate::service::TeamService;
use volleygoals_shared::config::AppConfig;
use volleygoals_shared::models::{Team, TeamMember, TeamRole, TeamStatus};
use volleygoals_shared::test_utils::http_test_utils::{create_test_request, response_to_json};
use volleygoals_shared::test_utils::mock_directory::MockDirectory;
use volleygoals_shared::test_utils::mock_record_store::MockRecordStore;
use volleygoals_shared::test_utils::test_logging::init_test_logging;

const ADMINS: &[&str] = &["ADMINS"];
const USERS: &[&str] = &["USERS"];

// Helper to set up the app with `teams` teams; team-00 is coached by "coach"
fn create_test_app(teams: usize) -> (Router, Arc<MockDirectory>) {
    init_test_logging();
    let config = AppConfig::default();
    let store = Arc::new(MockRecordStore::new());
    let directory = Arc::new(MockDirectory::new());
    let start = Utc::now() - Duration::days(60);

    for i in 0..teams {
        let created = start + Duration::days(i as i64);
        let team = Team {
            id: format!("team-{:02}", i),
            name: format!("Team {:02}", i),
            status: TeamStatus::Active,
            created_at: created,
            updated_at: created,
            deleted_at: None,
        };
        store.insert(&config.teams_table, serde_json::to_value(&team).unwrap());
    }
    store.insert(
        &config.team_members_table,
        serde_json::to_value(TeamMember::new_active(
            "team-00",
            "coach",
            TeamRole::Trainer,
            start,
        ))
        .unwrap(),
    );
    directory.add_user("coach", "coach@example.com", Some("Coach"));

    let service = Arc::new(TeamService::new(store, directory.clone(), &config));
    (create_router_with_service(service, ""), directory)
}

#[tokio::test]
async fn test_team_pages_do_not_overlap() {
    let (app, _directory) = create_test_app(30);

    let response = app
        .clone()
        .oneshot(create_test_request(
            "GET",
            "/teams?limit=10",
            Some(("root", ADMINS)),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = response_to_json(response).await;
    assert_eq!(first["count"], 10);
    assert_eq!(first["hasMore"], true);
    let token = first["nextToken"].as_str().unwrap().to_string();
    assert!(!token.is_empty());

    let response = app
        .oneshot(create_test_request(
            "GET",
            &format!("/teams?limit=10&next_token={}", token),
            Some(("root", ADMINS)),
            None,
        ))
        .await
        .unwrap();
    let second = response_to_json(response).await;
    assert_eq!(second["count"], 10);

    let ids = |page: &serde_json::Value| -> HashSet<String> {
        page["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|team| team["id"].as_str().unwrap().to_string())
            .collect()
    };
    assert!(ids(&first).is_disjoint(&ids(&second)));
}

#[tokio::test]
async fn test_team_listing_is_admin_only() {
    let (app, _directory) = create_test_app(3);

    let response = app
        .clone()
        .oneshot(create_test_request("GET", "/teams", Some(("coach", USERS)), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response_to_json(response).await["error"], "forbidden");

    let response = app
        .oneshot(create_test_request("GET", "/teams", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_team_name_filter_and_sort() {
    let (app, _directory) = create_test_app(12);

    let response = app
        .oneshot(create_test_request(
            "GET",
            "/teams?name=Team%201&sortBy=createdAt&sortOrder=desc",
            Some(("root", ADMINS)),
            None,
        ))
        .await
        .unwrap();
    let body = response_to_json(response).await;
    let names: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|team| team["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Team 11", "Team 10"]);
}

#[tokio::test]
async fn test_add_and_list_members() {
    let (app, directory) = create_test_app(1);
    directory.add_user("player", "player@example.com", Some("Pia"));

    let add = || {
        create_test_request(
            "POST",
            "/teams/team-00/members",
            Some(("coach", USERS)),
            Some(json!({"userId": "player", "role": "member"})),
        )
    };

    let response = app.clone().oneshot(add()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_to_json(response).await;
    assert_eq!(body["teamMember"]["userId"], "player");
    assert_eq!(body["teamMember"]["status"], "active");

    let response = app.clone().oneshot(add()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        response_to_json(response).await["error"],
        "user_already_member"
    );

    let response = app
        .oneshot(create_test_request(
            "GET",
            "/teams/team-00/members?role=member",
            Some(("coach", USERS)),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_to_json(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["items"][0]["name"], "Pia");
    assert_eq!(body["items"][0]["email"], "player@example.com");
}

#[tokio::test]
async fn test_add_member_rejects_bad_body() {
    let (app, _directory) = create_test_app(1);

    let response = app
        .oneshot(create_test_request(
            "POST",
            "/teams/team-00/members",
            Some(("coach", USERS)),
            Some(json!({"userId": "player", "role": "captain"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
