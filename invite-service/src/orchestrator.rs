use std::sync::Arc;

use chrono::{DateTime, Utc};

use volleygoals_shared::auth::{require_team_manager, AuthUser};
use volleygoals_shared::config::AppConfig;
use volleygoals_shared::directory::Directory;
use volleygoals_shared::error::{Result, ServiceError};
use volleygoals_shared::filter::TeamInviteFilter;
use volleygoals_shared::mail::{InvitationEmail, Mailer, FALLBACK_INVITER_NAME};
use volleygoals_shared::models::{normalize_email, Invite};
use volleygoals_shared::pagination::Page;
use volleygoals_shared::store::invites::InviteRepository;
use volleygoals_shared::store::team_members::TeamMemberRepository;
use volleygoals_shared::store::teams::TeamRepository;
use volleygoals_shared::store::RecordStore;

use crate::compensation::CompensationOutcome;
use crate::lifecycle::InviteLifecycle;
use crate::models::{CompleteInviteRequest, CompleteInviteResponse, CreateInviteRequest};
use crate::token::invite_token;

/// Sequences each invite request across store, directory and mailer.
///
/// Compensating deletes happen here and only here. They are best-effort:
/// the error that triggered them is what the caller sees.
pub struct InviteOrchestrator {
    lifecycle: InviteLifecycle,
    invites: InviteRepository,
    members: TeamMemberRepository,
    teams: TeamRepository,
    directory: Arc<dyn Directory>,
    mailer: Arc<dyn Mailer>,
    config: AppConfig,
}

impl InviteOrchestrator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        directory: Arc<dyn Directory>,
        mailer: Arc<dyn Mailer>,
        config: AppConfig,
    ) -> Self {
        let invites = InviteRepository::new(
            store.clone(),
            &config.invites_table,
            &config.invite_tokens_table,
        );
        let members = TeamMemberRepository::new(store.clone(), &config.team_members_table);
        let teams = TeamRepository::new(store, &config.teams_table);
        let lifecycle = InviteLifecycle::new(invites.clone(), members.clone(), directory.clone());

        Self {
            lifecycle,
            invites,
            members,
            teams,
            directory,
            mailer,
            config,
        }
    }

    pub async fn create_invite(
        &self,
        actor: &AuthUser,
        request: CreateInviteRequest,
        now: DateTime<Utc>,
    ) -> Result<Invite> {
        let team_id = request.team_id.trim();
        if team_id.is_empty() {
            return Err(ServiceError::Validation("teamId is required".into()));
        }
        require_team_manager(actor, &self.members, team_id).await?;

        let email = normalize_email(&request.email);
        if email.is_empty() || !email.contains('@') {
            return Err(ServiceError::Validation(format!(
                "Invalid email address '{}'",
                request.email
            )));
        }

        let token = invite_token(team_id, &email, request.role);
        self.ensure_token_available(&token, now).await?;
        self.ensure_not_member(team_id, &email).await?;

        let message = request
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        let invite = self
            .lifecycle
            .create(team_id, &email, request.role, &token, &actor.sub, message, now)
            .await?;

        let notified: Result<()> = async {
            let inviter_name = self.inviter_name(actor).await?;
            let team_name = self.team_name(&invite.team_id).await?;
            if request.send_email {
                self.send_invitation(&invite, &inviter_name, &team_name, now)
                    .await?;
            }
            Ok(())
        }
        .await;

        if let Err(err) = notified {
            let cleanup = self.invites.delete(&invite.id).await;
            CompensationOutcome::from_result("delete_invite", &invite.id, cleanup).emit();
            return Err(err);
        }

        tracing::info!(
            invite_id = %invite.id,
            team_id = %invite.team_id,
            send_email = request.send_email,
            "Invite created"
        );
        Ok(invite)
    }

    /// Rejects a token held by a live pending invite; expires a lapsed one.
    async fn ensure_token_available(&self, token: &str, now: DateTime<Utc>) -> Result<()> {
        let Some(pending) = self.invites.find_pending_by_token(token).await? else {
            return Ok(());
        };

        if !pending.is_expired_at(now) {
            return Err(ServiceError::InviteExists {
                token: token.to_string(),
            });
        }

        match self.lifecycle.expire(pending, now).await {
            Ok(_) | Err(ServiceError::InviteNotPending(_)) => Ok(()),
            Err(other) => Err(other),
        }
    }

    async fn ensure_not_member(&self, team_id: &str, email: &str) -> Result<()> {
        let Some(user) = self.directory.get_user_by_email(email).await? else {
            return Ok(());
        };
        if self.members.get_active(team_id, &user.sub).await?.is_some() {
            return Err(ServiceError::AlreadyMember(team_id.to_string()));
        }
        Ok(())
    }

    /// The inviter must have a directory account.
    async fn inviter_name(&self, actor: &AuthUser) -> Result<String> {
        self.directory
            .get_user_by_sub(&actor.sub)
            .await?
            .map(|user| user.display_name().to_string())
            .ok_or_else(|| ServiceError::NotFound(format!("Inviter {} not found", actor.sub)))
    }

    async fn team_name(&self, team_id: &str) -> Result<String> {
        self.teams
            .get(team_id)
            .await?
            .map(|team| team.name)
            .ok_or_else(|| ServiceError::NotFound(format!("Team {} not found", team_id)))
    }

    async fn send_invitation(
        &self,
        invite: &Invite,
        inviter_name: &str,
        team_name: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let email = InvitationEmail::new(
            inviter_name,
            team_name,
            self.config.accept_link(&invite.token),
            (invite.expires_at - now).num_days(),
            invite.message.as_deref(),
        );
        self.mailer
            .send_templated_email(
                &invite.email,
                &self.config.invite_template_name,
                &email.template_data()?,
            )
            .await?;

        tracing::info!(invite_id = %invite.id, "Invitation email sent");
        Ok(())
    }

    async fn load_managed(&self, actor: &AuthUser, invite_id: &str) -> Result<Invite> {
        let invite = self
            .invites
            .get(invite_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invite {} not found", invite_id)))?;
        require_team_manager(actor, &self.members, &invite.team_id).await?;
        Ok(invite)
    }

    pub async fn revoke_invite(
        &self,
        actor: &AuthUser,
        invite_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Invite> {
        let invite = self.load_managed(actor, invite_id).await?;
        self.lifecycle.revoke(invite, &actor.sub, now).await
    }

    /// Sends the invitation again for a pending, unexpired invite.
    ///
    /// The resend is recorded before the mail goes out, so a lost
    /// conditional write sends nothing.
    pub async fn resend_invite(
        &self,
        actor: &AuthUser,
        invite_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Invite> {
        let invite = self.load_managed(actor, invite_id).await?;
        if !invite.is_pending() {
            return Err(ServiceError::InviteNotPending(invite.id));
        }
        if invite.is_expired_at(now) {
            self.lifecycle.expire(invite, now).await?;
            return Err(ServiceError::InviteExpired);
        }

        let inviter_name = match self.directory.get_user_by_sub(&invite.invited_by).await? {
            Some(user) => user.display_name().to_string(),
            None => FALLBACK_INVITER_NAME.to_string(),
        };
        let team_name = self.team_name(&invite.team_id).await?;

        let invite = self.lifecycle.mark_resent(invite, now).await?;
        self.send_invitation(&invite, &inviter_name, &team_name, now)
            .await?;
        Ok(invite)
    }

    pub async fn get_invite(&self, token: &str, now: DateTime<Utc>) -> Result<Invite> {
        self.lifecycle.fetch_and_validate(token, now).await
    }

    pub async fn complete_invite(
        &self,
        request: CompleteInviteRequest,
        now: DateTime<Utc>,
    ) -> Result<CompleteInviteResponse> {
        self.lifecycle.complete(&request, now).await
    }

    pub async fn list_team_invites(
        &self,
        actor: &AuthUser,
        team_id: &str,
        filter: &TeamInviteFilter,
    ) -> Result<Page<Invite>> {
        require_team_manager(actor, &self.members, team_id).await?;
        self.invites.list_for_team(team_id, filter).await
    }
}
