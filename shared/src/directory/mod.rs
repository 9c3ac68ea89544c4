//! Identity directory: user accounts and group membership.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::Result;
use crate::models::{DirectoryUser, ProvisionedUser};

pub mod cognito;

/// Group every self-service account belongs to.
pub const USERS_GROUP: &str = "USERS";
/// Group granting global administration rights.
pub const ADMINS_GROUP: &str = "ADMINS";

pub const TEMPORARY_PASSWORD_LENGTH: usize = 12;

#[async_trait]
pub trait Directory: Send + Sync + 'static {
    /// Creates an account for `email` with a generated temporary password
    async fn create_user(&self, email: &str) -> Result<ProvisionedUser>;

    async fn delete_user(&self, username: &str) -> Result<()>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<DirectoryUser>>;

    async fn get_user_by_sub(&self, sub: &str) -> Result<Option<DirectoryUser>>;

    async fn add_to_group(&self, username: &str, group: &str) -> Result<()>;
}

const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#$%^&*-_=+";

/// Random password holding at least one upper, lower, digit and symbol.
pub fn generate_temporary_password(length: usize) -> String {
    let mut rng = rand::thread_rng();
    let classes = [UPPER, LOWER, DIGITS, SYMBOLS];
    let length = length.max(classes.len());

    let mut chars: Vec<u8> = classes
        .iter()
        .map(|class| class[rng.gen_range(0..class.len())])
        .collect();

    let all: Vec<u8> = classes.concat();
    while chars.len() < length {
        chars.push(all[rng.gen_range(0..all.len())]);
    }
    chars.shuffle(&mut rng);

    chars.into_iter().map(char::from).collect()
}
