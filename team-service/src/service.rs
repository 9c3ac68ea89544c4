use std::sync::Arc;

use chrono::{DateTime, Utc};

use volleygoals_shared::auth::{require_team_manager, AuthUser};
use volleygoals_shared::config::AppConfig;
use volleygoals_shared::directory::Directory;
use volleygoals_shared::error::{Result, ServiceError};
use volleygoals_shared::filter::{TeamFilter, TeamMemberFilter};
use volleygoals_shared::models::{Team, TeamMember};
use volleygoals_shared::pagination::Page;
use volleygoals_shared::store::team_members::TeamMemberRepository;
use volleygoals_shared::store::teams::TeamRepository;
use volleygoals_shared::store::RecordStore;

use crate::models::{AddTeamMemberRequest, TeamMemberListItem};

/// Team and membership queries plus direct member addition.
pub struct TeamService {
    teams: TeamRepository,
    members: TeamMemberRepository,
    directory: Arc<dyn Directory>,
}

impl TeamService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        directory: Arc<dyn Directory>,
        config: &AppConfig,
    ) -> Self {
        Self {
            teams: TeamRepository::new(store.clone(), &config.teams_table),
            members: TeamMemberRepository::new(store, &config.team_members_table),
            directory,
        }
    }

    pub async fn list_teams(&self, actor: &AuthUser, filter: &TeamFilter) -> Result<Page<Team>> {
        if !actor.is_global_admin() {
            return Err(ServiceError::Forbidden(
                "Only administrators may list teams".into(),
            ));
        }
        self.teams.list(filter).await
    }

    pub async fn list_members(
        &self,
        actor: &AuthUser,
        team_id: &str,
        filter: &TeamMemberFilter,
    ) -> Result<Page<TeamMemberListItem>> {
        require_team_manager(actor, &self.members, team_id).await?;
        let page = self.members.list_for_team(team_id, filter).await?;

        let mut profiles = Vec::with_capacity(page.count());
        for member in &page.items {
            profiles.push(self.directory.get_user_by_sub(&member.user_id).await?);
        }
        let mut profiles = profiles.into_iter();
        Ok(page.map(|member| TeamMemberListItem::new(member, profiles.next().flatten())))
    }

    /// Adds `request.user_id` to the team without an invite.
    ///
    /// The active-membership check and the insert are separate calls, so two
    /// concurrent additions of the same user can both succeed.
    pub async fn add_member(
        &self,
        actor: &AuthUser,
        team_id: &str,
        request: AddTeamMemberRequest,
        now: DateTime<Utc>,
    ) -> Result<TeamMember> {
        require_team_manager(actor, &self.members, team_id).await?;

        if self.teams.get(team_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("Team {} not found", team_id)));
        }
        let user = self
            .directory
            .get_user_by_sub(&request.user_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("User {} not found", request.user_id))
            })?;

        if self.members.get_active(team_id, &user.sub).await?.is_some() {
            return Err(ServiceError::AlreadyMember(team_id.to_string()));
        }

        let member = TeamMember::new_active(team_id, &user.sub, request.role, now);
        self.members.create(&member).await?;
        tracing::info!(
            team_id = %team_id,
            user_id = %user.sub,
            added_by = %actor.sub,
            "Member added directly"
        );
        Ok(member)
    }
}
