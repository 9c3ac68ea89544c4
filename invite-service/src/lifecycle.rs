use std::sync::Arc;

use chrono::{DateTime, Utc};

use volleygoals_shared::directory::{Directory, USERS_GROUP};
use volleygoals_shared::error::{Result, ServiceError};
use volleygoals_shared::models::{
    normalize_email, DirectoryUser, Invite, InviteStatus, TeamMember, TeamRole,
};
use volleygoals_shared::store::invites::InviteRepository;
use volleygoals_shared::store::team_members::TeamMemberRepository;

use crate::compensation::CompensationOutcome;
use crate::models::{CompleteInviteRequest, CompleteInviteResponse};
use crate::token::token_matches;

/// Drives invites through `pending -> {accepted, declined, revoked, expired}`.
///
/// Every transition is a conditional write on `status = pending`, so a
/// terminal invite is never moved again. Collaborator errors are returned
/// unchanged.
#[derive(Clone)]
pub struct InviteLifecycle {
    invites: InviteRepository,
    members: TeamMemberRepository,
    directory: Arc<dyn Directory>,
}

impl InviteLifecycle {
    pub fn new(
        invites: InviteRepository,
        members: TeamMemberRepository,
        directory: Arc<dyn Directory>,
    ) -> Self {
        Self {
            invites,
            members,
            directory,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        team_id: &str,
        email: &str,
        role: TeamRole,
        token: &str,
        invited_by: &str,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Invite> {
        let invite = Invite::new_pending(team_id, email, role, token, invited_by, message, now);
        self.invites.create(&invite).await?;
        Ok(invite)
    }

    /// Loads the pending invite for `token` and checks it is still usable.
    ///
    /// An invite found past its expiry is moved to `expired` before
    /// `InviteExpired` is returned; later lookups of that token keep
    /// returning `InviteExpired` until a new invite is issued.
    pub async fn fetch_and_validate(&self, token: &str, now: DateTime<Utc>) -> Result<Invite> {
        let issued = self.invites.find_by_token(token).await?;

        let invite = match issued.iter().rev().find(|invite| invite.is_pending()) {
            Some(pending) => pending.clone(),
            None => {
                return match issued.last() {
                    Some(latest) if latest.status == InviteStatus::Expired => {
                        Err(ServiceError::InviteExpired)
                    }
                    _ => Err(ServiceError::NotFound("Invite not found".into())),
                };
            }
        };

        if invite.is_expired_at(now) {
            match self.expire(invite, now).await {
                Ok(_) | Err(ServiceError::InviteNotPending(_)) => {}
                Err(other) => return Err(other),
            }
            return Err(ServiceError::InviteExpired);
        }

        if !token_matches(token, &invite) {
            tracing::warn!(invite_id = %invite.id, "Invite token does not recompute");
            return Err(ServiceError::InvalidInviteToken);
        }

        Ok(invite)
    }

    /// Accepts or declines the invite behind `request.token`.
    ///
    /// An account is only created when the invitee has none and accepts; if
    /// anything fails after that the account is deleted again.
    pub async fn complete(
        &self,
        request: &CompleteInviteRequest,
        now: DateTime<Utc>,
    ) -> Result<CompleteInviteResponse> {
        let invite = self.fetch_and_validate(&request.token, now).await?;

        if let Some(email) = request.email.as_deref() {
            if normalize_email(email) != invite.email {
                return Err(ServiceError::Validation(
                    "Email does not match the invite".into(),
                ));
            }
        }

        let existing = self.directory.get_user_by_email(&invite.email).await?;

        match (existing, request.accepted) {
            (Some(user), true) => {
                let (invite, member) = self.accept(invite, &user, now).await?;
                Ok(CompleteInviteResponse {
                    invite,
                    member: Some(member),
                    user_created: false,
                    temporary_password: None,
                })
            }
            (user, false) => {
                let invite = self
                    .decline(invite, user.as_ref().map(|u| u.sub.as_str()), now)
                    .await?;
                Ok(CompleteInviteResponse {
                    invite,
                    member: None,
                    user_created: false,
                    temporary_password: None,
                })
            }
            (None, true) => self.accept_with_new_account(invite, now).await,
        }
    }

    async fn accept_with_new_account(
        &self,
        invite: Invite,
        now: DateTime<Utc>,
    ) -> Result<CompleteInviteResponse> {
        let provisioned = self.directory.create_user(&invite.email).await?;
        let user = provisioned.user;
        tracing::info!(sub = %user.sub, invite_id = %invite.id, "Created account for invitee");

        let result: Result<(Invite, TeamMember)> = async {
            self.directory
                .add_to_group(&user.username, USERS_GROUP)
                .await?;
            self.accept(invite, &user, now).await
        }
        .await;

        match result {
            Ok((invite, member)) => Ok(CompleteInviteResponse {
                invite,
                member: Some(member),
                user_created: true,
                temporary_password: Some(provisioned.temporary_password),
            }),
            Err(err) => {
                let cleanup = self.directory.delete_user(&user.username).await;
                CompensationOutcome::from_result("delete_user", &user.sub, cleanup).emit();
                Err(err)
            }
        }
    }

    async fn accept(
        &self,
        mut invite: Invite,
        user: &DirectoryUser,
        now: DateTime<Utc>,
    ) -> Result<(Invite, TeamMember)> {
        invite.status = InviteStatus::Accepted;
        invite.accepted_by = Some(user.sub.clone());
        invite.accepted_at = Some(now);
        invite.updated_at = now;
        self.invites.update_pending(&invite).await?;

        let (member, _) = self
            .members
            .ensure_active(&invite.team_id, &user.sub, invite.role, now)
            .await?;

        tracing::info!(
            invite_id = %invite.id,
            team_id = %invite.team_id,
            user_id = %user.sub,
            "Invite accepted"
        );
        Ok((invite, member))
    }

    async fn decline(
        &self,
        mut invite: Invite,
        user_sub: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Invite> {
        invite.status = InviteStatus::Declined;
        invite.declined_by = user_sub.map(str::to_string);
        invite.declined_at = Some(now);
        invite.updated_at = now;
        self.invites.update_pending(&invite).await?;

        tracing::info!(invite_id = %invite.id, "Invite declined");
        Ok(invite)
    }

    pub async fn revoke(
        &self,
        mut invite: Invite,
        revoked_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Invite> {
        if !invite.is_pending() {
            return Err(ServiceError::InviteNotPending(invite.id));
        }
        invite.status = InviteStatus::Revoked;
        invite.revoked_by = Some(revoked_by.to_string());
        invite.revoked_at = Some(now);
        invite.updated_at = now;
        self.invites.update_pending(&invite).await?;

        tracing::info!(invite_id = %invite.id, revoked_by = %revoked_by, "Invite revoked");
        Ok(invite)
    }

    pub async fn expire(&self, mut invite: Invite, now: DateTime<Utc>) -> Result<Invite> {
        invite.status = InviteStatus::Expired;
        invite.updated_at = now;
        self.invites.update_pending(&invite).await?;

        tracing::info!(invite_id = %invite.id, expires_at = %invite.expires_at, "Invite expired");
        Ok(invite)
    }

    /// Records a resend; status and token stay as they are.
    pub async fn mark_resent(&self, mut invite: Invite, now: DateTime<Utc>) -> Result<Invite> {
        if !invite.is_pending() {
            return Err(ServiceError::InviteNotPending(invite.id));
        }
        if invite.is_expired_at(now) {
            return Err(ServiceError::InviteExpired);
        }
        invite.last_resent_at = Some(now);
        invite.updated_at = now;
        self.invites.update_pending(&invite).await?;
        Ok(invite)
    }
}
