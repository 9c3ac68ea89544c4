use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::query::{list_collection, CollectionSelector};
use super::{PageRequest, PutCondition, RecordStore};
use crate::error::Result;
use crate::filter::{Condition, Expression, TeamMemberFilter};
use crate::models::{MemberStatus, TeamMember, TeamRole};
use crate::pagination::Page;

pub const TEAM_ID_INDEX: &str = "teamIdIndex";
pub const TEAM_USER_INDEX: &str = "teamUserIdIndex";

#[derive(Clone)]
pub struct TeamMemberRepository {
    store: Arc<dyn RecordStore>,
    table: String,
}

impl TeamMemberRepository {
    pub fn new(store: Arc<dyn RecordStore>, table: &str) -> Self {
        Self {
            store,
            table: table.to_string(),
        }
    }

    /// The active membership of `user_id` on `team_id`, if any.
    pub async fn get_active(&self, team_id: &str, user_id: &str) -> Result<Option<TeamMember>> {
        let request = PageRequest::query(
            &self.table,
            TEAM_USER_INDEX,
            vec![
                Condition::equals("teamId", team_id),
                Condition::equals("userId", user_id),
            ],
        )
        .with_filter(
            Expression::new()
                .and(Condition::equals("status", MemberStatus::Active.as_str()))
                .into_option(),
        );

        let page = self.store.fetch_page(request).await?;
        match page.items.into_iter().next() {
            Some(item) => Ok(Some(serde_json::from_value(item)?)),
            None => Ok(None),
        }
    }

    /// Role of the user's active membership, `None` for non-members.
    pub async fn active_role(&self, team_id: &str, user_id: &str) -> Result<Option<TeamRole>> {
        Ok(self
            .get_active(team_id, user_id)
            .await?
            .map(|member| member.role))
    }

    pub async fn create(&self, member: &TeamMember) -> Result<()> {
        let item = serde_json::to_value(member)?;
        self.store
            .put(&self.table, item, PutCondition::IfAbsent)
            .await?;
        tracing::info!(
            member_id = %member.id,
            team_id = %member.team_id,
            user_id = %member.user_id,
            role = %member.role,
            "Team member created"
        );
        Ok(())
    }

    /// Returns the existing active membership or creates one.
    ///
    /// The boolean reports whether a record was created.
    pub async fn ensure_active(
        &self,
        team_id: &str,
        user_id: &str,
        role: TeamRole,
        now: DateTime<Utc>,
    ) -> Result<(TeamMember, bool)> {
        if let Some(existing) = self.get_active(team_id, user_id).await? {
            tracing::info!(
                member_id = %existing.id,
                team_id = %team_id,
                "User already has an active membership"
            );
            return Ok((existing, false));
        }

        let member = TeamMember::new_active(team_id, user_id, role, now);
        self.create(&member).await?;
        Ok((member, true))
    }

    pub async fn list_for_team(
        &self,
        team_id: &str,
        filter: &TeamMemberFilter,
    ) -> Result<Page<TeamMember>> {
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
    use crate::test_utils::mock_record_store::MockRecordStore;

    #[tokio::test]
    async fn test_ensure_active_is_idempotent() {
        let store = Arc::new(MockRecordStore::new());
        let repo = TeamMemberRepository::new(store.clone(), "team-members");
        let now = Utc::now();

        let (first, created) = repo
            .ensure_active("team-1", "user-1", TeamRole::Member, now)
            .await
            .unwrap();
        assert!(created);

        let (second, created) = repo
            .ensure_active("team-1", "user-1", TeamRole::Admin, now)
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.role, TeamRole::Member);
        assert_eq!(store.count("team-members"), 1);
    }

    #[tokio::test]
    async fn test_left_membership_is_not_active() {
        let store = Arc::new(MockRecordStore::new());
        let repo = TeamMemberRepository::new(store, "team-members");

        let mut member = TeamMember::new_active("team-1", "user-1", TeamRole::Trainer, Utc::now());
        member.status = MemberStatus::Left;
        repo.create(&member).await.unwrap();

        assert!(repo.get_active("team-1", "user-1").await.unwrap().is_none());
        assert_eq!(repo.active_role("team-1", "user-1").await.unwrap(), None);
    }
}
