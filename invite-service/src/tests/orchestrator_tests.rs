use chrono::{Duration, Utc};
use std::collections::HashMap;

use volleygoals_shared::auth::AuthUser;
use volleygoals_shared::directory::Directory;
use volleygoals_shared::error::ServiceError;
use volleygoals_shared::filter::TeamInviteFilter;
use volleygoals_shared::models::{InviteStatus, TeamMember, TeamRole};
use volleygoals_shared::test_utils::mock_directory::DirectoryOperation;
use volleygoals_shared::test_utils::mock_record_store::StoreOperation;

use super::harness::{Harness, TEAM_ID};

#[tokio::test]
async fn test_create_sends_invitation_email() {
    let harness = Harness::new();
    let now = Utc::now();
    let mut request = Harness::request("ann@example.com", TeamRole::Trainer, true);
    request.message = Some("  See you at practice  ".to_string());

    let invite = harness
        .orchestrator
        .create_invite(&Harness::coach(), request, now)
        .await
        .unwrap();

    assert_eq!(invite.status, InviteStatus::Pending);
    assert_eq!(invite.expires_at, now + Duration::days(7));
    assert_eq!(invite.invited_by, "coach-1");
    assert_eq!(invite.message.as_deref(), Some("See you at practice"));

    let sent = harness.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ann@example.com");
    assert_eq!(sent[0].template, harness.config.invite_template_name);
    assert_eq!(sent[0].data["inviterName"], "Coach Carla");
    assert_eq!(sent[0].data["teamName"], "Beach Eagles");
    assert_eq!(sent[0].data["expiryDays"], "7");
    assert_eq!(sent[0].data["personalMessage"], "See you at practice");
    assert_eq!(
        sent[0].data["acceptLink"],
        format!(
            "https://app.volleygoals.test/accept-invite?token={}",
            invite.token
        )
    );
}

#[tokio::test]
async fn test_duplicate_pending_invite_conflicts() {
    let harness = Harness::new();
    let now = Utc::now();
    let first = harness.invite_at("ann@example.com", now).await;

    let err = harness
        .orchestrator
        .create_invite(
            &Harness::coach(),
            Harness::request("ANN@example.com", TeamRole::Member, false),
            now,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InviteExists { ref token } if *token == first.token));
    assert_eq!(harness.store.count(&harness.config.invites_table), 1);

    // A different role is a different invite
    harness
        .orchestrator
        .create_invite(
            &Harness::coach(),
            Harness::request("ann@example.com", TeamRole::Trainer, false),
            now,
        )
        .await
        .unwrap();
    assert_eq!(harness.store.count(&harness.config.invites_table), 2);
}

#[tokio::test]
async fn test_lapsed_pending_invite_is_replaced() {
    let harness = Harness::new();
    let now = Utc::now();
    let old = harness
        .invite_at("ann@example.com", now - Duration::days(10))
        .await;

    let fresh = harness.invite_at("ann@example.com", now).await;

    assert_eq!(fresh.token, old.token);
    assert_ne!(fresh.id, old.id);
    assert_eq!(
        harness.stored_invite(&old.id).await.status,
        InviteStatus::Expired
    );
    let pending = harness
        .invites()
        .find_pending_by_token(&fresh.token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pending.id, fresh.id);
}

#[tokio::test]
async fn test_only_team_managers_may_invite() {
    let harness = Harness::new();
    let now = Utc::now();
    harness
        .store
        .insert(
            &harness.config.team_members_table,
            serde_json::to_value(TeamMember::new_active(
                TEAM_ID,
                "outsider",
                TeamRole::Member,
                now,
            ))
            .unwrap(),
        );

    let err = harness
        .orchestrator
        .create_invite(
            &Harness::outsider(),
            Harness::request("ann@example.com", TeamRole::Member, false),
            now,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
    assert_eq!(harness.store.count(&harness.config.invites_table), 0);

    // Global admins need no membership
    harness
        .orchestrator
        .create_invite(
            &Harness::global_admin(),
            Harness::request("ann@example.com", TeamRole::Admin, true),
            now,
        )
        .await
        .unwrap();
    assert_eq!(harness.mailer.sent()[0].data["inviterName"], "Root");
}

#[tokio::test]
async fn test_invalid_email_is_rejected() {
    let harness = Harness::new();
    let err = harness
        .orchestrator
        .create_invite(
            &Harness::coach(),
            Harness::request("   ", TeamRole::Member, false),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_active_member_cannot_be_invited() {
    let harness = Harness::new();
    let err = harness
        .orchestrator
        .create_invite(
            &Harness::coach(),
            Harness::request("coach@example.com", TeamRole::Admin, false),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyMember(ref team) if team == TEAM_ID));
    assert_eq!(harness.store.count(&harness.config.invites_table), 0);
}

#[tokio::test]
async fn test_mail_failure_deletes_invite_and_allows_retry() {
    let harness = Harness::new();
    let now = Utc::now();
    harness.mailer.set_error_mode(true);

    let err = harness
        .orchestrator
        .create_invite(
            &Harness::coach(),
            Harness::request("ann@example.com", TeamRole::Member, true),
            now,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InternalError(_)));
    assert_eq!(harness.store.count(&harness.config.invites_table), 0);

    harness.mailer.set_error_mode(false);
    harness
        .orchestrator
        .create_invite(
            &Harness::coach(),
            Harness::request("ann@example.com", TeamRole::Member, true),
            now,
        )
        .await
        .unwrap();
    assert_eq!(harness.store.count(&harness.config.invites_table), 1);
    assert_eq!(harness.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_inviter_missing_from_directory_deletes_invite() {
    let harness = Harness::new();
    let admin = AuthUser {
        sub: "ghost-admin".to_string(),
        username: "ghost-admin".to_string(),
        email: Some("ghost@example.com".to_string()),
        name: Some("Ghost".to_string()),
        groups: vec!["ADMINS".to_string()],
    };

    let err = harness
        .orchestrator
        .create_invite(
            &admin,
            Harness::request("ann@example.com", TeamRole::Member, true),
            Utc::now(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(harness.store.count(&harness.config.invites_table), 0);
    assert!(harness.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_missing_team_deletes_invite() {
    let harness = Harness::new();
    let mut request = Harness::request("ann@example.com", TeamRole::Member, false);
    request.team_id = "ghost-team".to_string();

    let err = harness
        .orchestrator
        .create_invite(&Harness::global_admin(), request, Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(harness.store.count(&harness.config.invites_table), 0);
}

#[tokio::test]
async fn test_failed_cleanup_keeps_original_error() {
    let harness = Harness::new();
    harness
        .store
        .fail_on(StoreOperation::Get, &harness.config.teams_table);
    harness
        .store
        .fail_on(StoreOperation::Delete, &harness.config.invites_table);

    let err = harness
        .orchestrator
        .create_invite(
            &Harness::coach(),
            Harness::request("ann@example.com", TeamRole::Member, false),
            Utc::now(),
        )
        .await
        .unwrap_err();

    match err {
        ServiceError::InternalError(detail) => assert!(detail.contains("Get on teams")),
        other => panic!("unexpected error: {:?}", other),
    }
    // The orphan is left behind and reported through the compensation event
    assert_eq!(harness.store.count(&harness.config.invites_table), 1);
}

#[tokio::test]
async fn test_directory_outage_fails_before_persisting() {
    let harness = Harness::new();
    harness.directory.fail_on(DirectoryOperation::GetUser);

    let result = harness
        .orchestrator
        .create_invite(
            &Harness::coach(),
            Harness::request("ann@example.com", TeamRole::Member, false),
            Utc::now(),
        )
        .await;

    assert!(matches!(result, Err(ServiceError::InternalError(_))));
    assert_eq!(harness.store.count(&harness.config.invites_table), 0);
}

#[tokio::test]
async fn test_revoke_then_reinvite() {
    let harness = Harness::new();
    let now = Utc::now();
    let invite = harness.invite_at("ann@example.com", now).await;

    let err = harness
        .orchestrator
        .revoke_invite(&Harness::outsider(), &invite.id, now)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let revoked = harness
        .orchestrator
        .revoke_invite(&Harness::coach(), &invite.id, now)
        .await
        .unwrap();
    assert_eq!(revoked.status, InviteStatus::Revoked);

    let err = harness
        .orchestrator
        .revoke_invite(&Harness::coach(), &invite.id, now)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InviteNotPending(_)));

    let err = harness
        .orchestrator
        .get_invite(&invite.token, now)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let again = harness.invite_at("ann@example.com", now).await;
    assert_eq!(again.token, invite.token);
    assert_eq!(
        harness
            .orchestrator
            .get_invite(&invite.token, now)
            .await
            .unwrap()
            .id,
        again.id
    );
}

#[tokio::test]
async fn test_revoke_unknown_invite_is_not_found() {
    let harness = Harness::new();
    let err = harness
        .orchestrator
        .revoke_invite(&Harness::coach(), "missing", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_resend_keeps_token_and_records_time() {
    let harness = Harness::new();
    let created = Utc::now() - Duration::days(2);
    let invite = harness.invite_at("ann@example.com", created).await;
    let now = Utc::now();

    let resent = harness
        .orchestrator
        .resend_invite(&Harness::coach(), &invite.id, now)
        .await
        .unwrap();

    assert_eq!(resent.token, invite.token);
    assert_eq!(resent.status, InviteStatus::Pending);
    assert_eq!(resent.last_resent_at, Some(now));
    assert_eq!(
        harness.stored_invite(&invite.id).await.last_resent_at,
        Some(now)
    );

    let sent = harness.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].data["inviterName"], "Coach Carla");
    assert_eq!(sent[0].data["expiryDays"], "4");
}

#[tokio::test]
async fn test_resend_falls_back_to_generic_inviter() {
    let harness = Harness::new();
    let now = Utc::now();
    let invite = harness
        .orchestrator
        .create_invite(
            &Harness::global_admin(),
            Harness::request("ann@example.com", TeamRole::Member, false),
            now,
        )
        .await
        .unwrap();
    harness.directory.delete_user("root@example.com").await.unwrap();

    harness
        .orchestrator
        .resend_invite(&Harness::coach(), &invite.id, now)
        .await
        .unwrap();
    assert_eq!(harness.mailer.sent()[0].data["inviterName"], "A team admin");
}

#[tokio::test]
async fn test_resend_sends_nothing_when_record_write_fails() {
    let harness = Harness::new();
    let now = Utc::now();
    let invite = harness.invite_at("ann@example.com", now).await;
    harness
        .store
        .fail_on(StoreOperation::Put, &harness.config.invites_table);

    let err = harness
        .orchestrator
        .resend_invite(&Harness::coach(), &invite.id, now)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InternalError(_)));
    assert!(harness.mailer.sent().is_empty());
    assert_eq!(harness.stored_invite(&invite.id).await.last_resent_at, None);
}

#[tokio::test]
async fn test_resend_of_lapsed_invite_expires_it() {
    let harness = Harness::new();
    let now = Utc::now();
    let invite = harness
        .invite_at("ann@example.com", now - Duration::days(8))
        .await;

    let err = harness
        .orchestrator
        .resend_invite(&Harness::coach(), &invite.id, now)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InviteExpired));
    assert!(harness.mailer.sent().is_empty());
    assert_eq!(
        harness.stored_invite(&invite.id).await.status,
        InviteStatus::Expired
    );
}

#[tokio::test]
async fn test_list_team_invites_filters_by_status() {
    let harness = Harness::new();
    let now = Utc::now();
    let ann = harness.invite_at("ann@example.com", now).await;
    harness.invite_at("bob@example.com", now).await;
    harness
        .orchestrator
        .revoke_invite(&Harness::coach(), &ann.id, now)
        .await
        .unwrap();

    let query = HashMap::from([
        ("status".to_string(), "pending".to_string()),
        ("sortBy".to_string(), "email".to_string()),
    ]);
    let filter = TeamInviteFilter::from_query(&query).unwrap();
    let page = harness
        .orchestrator
        .list_team_invites(&Harness::coach(), TEAM_ID, &filter)
        .await
        .unwrap();

    assert_eq!(page.count(), 1);
    assert_eq!(page.items[0].email, "bob@example.com");
    assert!(!page.has_more);

    let err = harness
        .orchestrator
        .list_team_invites(&Harness::outsider(), TEAM_ID, &filter)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}
