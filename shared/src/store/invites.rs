use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::query::{list_collection, CollectionSelector};
use super::{id_key, PageRequest, PutCondition, RecordStore};
use crate::error::{Result, ServiceError};
use crate::filter::{Condition, TeamInviteFilter};
use crate::models::{Invite, InviteStatus};
use crate::pagination::Page;

pub const TOKEN_INDEX: &str = "tokenIndex";
pub const TEAM_ID_INDEX: &str = "teamIdIndex";

/// Record in the token table naming the invite that currently holds a token.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct TokenGuard {
    /// The invite token itself
    id: String,
    invite_id: String,
    team_id: String,
    claimed_at: DateTime<Utc>,
}

impl TokenGuard {
    fn for_invite(invite: &Invite) -> Self {
        Self {
            id: invite.token.clone(),
            invite_id: invite.id.clone(),
            team_id: invite.team_id.clone(),
            claimed_at: invite.created_at,
        }
    }
}

/// Typed access to invite records and their token guards.
#[derive(Clone)]
pub struct InviteRepository {
    store: Arc<dyn RecordStore>,
    table: String,
    tokens_table: String,
}

impl InviteRepository {
    pub fn new(store: Arc<dyn RecordStore>, table: &str, tokens_table: &str) -> Self {
        Self {
            store,
            table: table.to_string(),
            tokens_table: tokens_table.to_string(),
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Invite>> {
        match self.store.get(&self.table, id_key(id)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Every invite ever issued under `token`, oldest first.
    ///
    /// No limit is set: the store applies a limit before the filter, which
    /// could hide the one matching record.
    pub async fn find_by_token(&self, token: &str) -> Result<Vec<Invite>> {
        let request = PageRequest::query(
            &self.table,
            TOKEN_INDEX,
            vec![Condition::equals("token", token)],
        );
        let page = self.store.fetch_page(request).await?;

        let mut invites = Vec::with_capacity(page.items.len());
        for item in page.items {
            let invite: Invite = serde_json::from_value(item)?;
            invites.push(invite);
        }
        invites.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(invites)
    }

    pub async fn find_pending_by_token(&self, token: &str) -> Result<Option<Invite>> {
        Ok(self
            .find_by_token(token)
            .await?
            .into_iter()
            .find(Invite::is_pending))
    }

    /// Persists a new pending invite after claiming its token.
    ///
    /// Fails with `InviteExists` when another pending invite holds the token.
    pub async fn create(&self, invite: &Invite) -> Result<()> {
        self.claim_token(invite).await?;

        let item = serde_json::to_value(invite)?;
        self.store
            .put(&self.table, item, PutCondition::IfAbsent)
            .await
            .map_err(|err| match err {
                ServiceError::ConditionFailed(_) => {
                    ServiceError::Conflict(format!("Invite {} already exists", invite.id))
                }
                other => other,
            })?;

        tracing::info!(
            invite_id = %invite.id,
            team_id = %invite.team_id,
            role = %invite.role,
            "Invite persisted"
        );
        Ok(())
    }

    async fn claim_token(&self, invite: &Invite) -> Result<()> {
        let guard = serde_json::to_value(TokenGuard::for_invite(invite))?;
        let exists = || ServiceError::InviteExists {
            token: invite.token.clone(),
        };

        match self
            .store
            .put(&self.tokens_table, guard.clone(), PutCondition::IfAbsent)
            .await
        {
            Ok(()) => return Ok(()),
            Err(ServiceError::ConditionFailed(_)) => {}
            Err(other) => return Err(other),
        }

        let holder: TokenGuard = match self
            .store
            .get(&self.tokens_table, id_key(&invite.token))
            .await?
        {
            Some(value) => serde_json::from_value(value)?,
            None => return Err(exists()),
        };

        if let Some(current) = self.get(&holder.invite_id).await? {
            if current.is_pending() {
                return Err(exists());
            }
        }

        tracing::debug!(
            stale_invite_id = %holder.invite_id,
            invite_id = %invite.id,
            "Taking over stale token guard"
        );

        // Only wins if nobody else took the guard over in the meantime
        self.store
            .put(
                &self.tokens_table,
                guard,
                PutCondition::attribute_equals("inviteId", holder.invite_id),
            )
            .await
            .map_err(|err| match err {
                ServiceError::ConditionFailed(_) => exists(),
                other => other,
            })
    }

    /// Writes a changed invite only if the stored copy is still pending.
    ///
    /// Used for every status transition and for resend bookkeeping; a lost
    /// race surfaces as `InviteNotPending`.
    pub async fn update_pending(&self, invite: &Invite) -> Result<()> {
        let item = serde_json::to_value(invite)?;
        self.store
            .put(
                &self.table,
                item,
                PutCondition::attribute_equals("status", InviteStatus::Pending.as_str()),
            )
            .await
            .map_err(|err| match err {
                ServiceError::ConditionFailed(_) => ServiceError::InviteNotPending(invite.id.clone()),
                other => other,
            })
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(&self.table, id_key(id)).await
    }

    pub async fn list_for_team(
        &self,
        team_id: &str,
        filter: &TeamInviteFilter,
    ) -> Result<Page<Invite>> {
        let selector = CollectionSelector::index(
            &self.table,
            TEAM_ID_INDEX,
            vec![Condition::equals("teamId", team_id)],
        );
        list_collection(self.store.as_ref(), selector, filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TeamRole;
    use crate::test_utils::mock_record_store::MockRecordStore;
    use chrono::Duration;

    fn repository(store: Arc<MockRecordStore>) -> InviteRepository {
        InviteRepository::new(store, "invites", "invite-tokens")
    }

    fn invite(token: &str, created_at: DateTime<Utc>) -> Invite {
        Invite::new_pending(
            "team-1",
            "ann@example.com",
            TeamRole::Member,
            token,
            "coach",
            None,
            created_at,
        )
    }

    #[tokio::test]
    async fn test_second_pending_invite_for_token_is_rejected() {
        let store = Arc::new(MockRecordStore::new());
        let repo = repository(store.clone());
        let now = Utc::now();

        repo.create(&invite("tok", now)).await.unwrap();
        let err = repo.create(&invite("tok", now)).await.unwrap_err();

        assert!(matches!(err, ServiceError::InviteExists { ref token } if token == "tok"));
        assert_eq!(store.count("invites"), 1);
    }

    #[tokio::test]
    async fn test_stale_guard_is_taken_over() {
        let store = Arc::new(MockRecordStore::new());
        let repo = repository(store.clone());
        let now = Utc::now();

        let mut first = invite("tok", now - Duration::days(1));
        repo.create(&first).await.unwrap();
        first.status = InviteStatus::Accepted;
        repo.update_pending(&first).await.unwrap();

        let second = invite("tok", now);
        repo.create(&second).await.unwrap();

        assert_eq!(repo.find_by_token("tok").await.unwrap().len(), 2);
        let pending = repo.find_pending_by_token("tok").await.unwrap().unwrap();
        assert_eq!(pending.id, second.id);
    }

    #[tokio::test]
    async fn test_guard_of_deleted_invite_is_stale() {
        let store = Arc::new(MockRecordStore::new());
        let repo = repository(store.clone());

        let first = invite("tok", Utc::now());
        repo.create(&first).await.unwrap();
        repo.delete(&first.id).await.unwrap();

        repo.create(&invite("tok", Utc::now())).await.unwrap();
        assert_eq!(store.count("invites"), 1);
    }

    #[tokio::test]
    async fn test_update_pending_rejects_completed_invite() {
        let store = Arc::new(MockRecordStore::new());
        let repo = repository(store);

        let mut stored = invite("tok", Utc::now());
        repo.create(&stored).await.unwrap();
        stored.status = InviteStatus::Revoked;
        repo.update_pending(&stored).await.unwrap();

        stored.status = InviteStatus::Accepted;
        let err = repo.update_pending(&stored).await.unwrap_err();
        assert!(matches!(err, ServiceError::InviteNotPending(ref id) if *id == stored.id));
        assert_eq!(
            repo.get(&stored.id).await.unwrap().unwrap().status,
            InviteStatus::Revoked
        );
    }
}
