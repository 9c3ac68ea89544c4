//! Deterministic invite tokens.
//!
//! A token is not a secret: it identifies the (team, email, role) triple an
//! invite was issued for, so re-inviting the same person with the same role
//! yields the same token.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};

use volleygoals_shared::models::{Invite, TeamRole};

pub fn invite_token(team_id: &str, email: &str, role: TeamRole) -> String {
    let mut hasher = Sha256::new();
    hasher.update(team_id.as_bytes());
    hasher.update(b"|");
    hasher.update(email.as_bytes());
    hasher.update(b"|");
    hasher.update(role.as_str().as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// True when `token` recomputes from the invite's own fields.
pub fn token_matches(token: &str, invite: &Invite) -> bool {
    invite_token(&invite.team_id, &invite.email, invite.role) == token
}
