use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::directory::{generate_temporary_password, Directory, TEMPORARY_PASSWORD_LENGTH};
use crate::error::{Result, ServiceError};
use crate::models::{normalize_email, DirectoryUser, ProvisionedUser};

/// Directory operations that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirectoryOperation {
    CreateUser,
    DeleteUser,
    GetUser,
    AddToGroup,
}

/// In-memory identity directory for testing
#[derive(Default)]
pub struct MockDirectory {
    // username -> (user, groups)
    users: Mutex<BTreeMap<String, (DirectoryUser, Vec<String>)>>,
    failures: Mutex<HashSet<DirectoryOperation>>,
    deleted: Mutex<Vec<String>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an existing account and returns it
    pub fn add_user(&self, sub: &str, email: &str, name: Option<&str>) -> DirectoryUser {
        let user = DirectoryUser {
            sub: sub.to_string(),
            username: normalize_email(email),
            email: normalize_email(email),
            name: name.map(str::to_string),
            enabled: true,
        };
        self.users
            .lock()
            .unwrap()
            .insert(user.username.clone(), (user.clone(), Vec::new()));
        user
    }

    pub fn fail_on(&self, operation: DirectoryOperation) {
        self.failures.lock().unwrap().insert(operation);
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn groups_of(&self, username: &str) -> Vec<String> {
        self.users
            .lock()
            .unwrap()
            .get(username)
            .map(|(_, groups)| groups.clone())
            .unwrap_or_default()
    }

    /// Usernames deleted so far, in order
    pub fn deleted_users(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    fn check_failure(&self, operation: DirectoryOperation) -> Result<()> {
        if self.failures.lock().unwrap().contains(&operation) {
            return Err(ServiceError::InternalError(format!(
                "Mock: directory {:?} failed",
                operation
            )));
        }
        Ok(())
    }

    fn find(&self, predicate: impl Fn(&DirectoryUser) -> bool) -> Option<DirectoryUser> {
        self.users
            .lock()
            .unwrap()
            .values()
            .map(|(user, _)| user)
            .find(|user| predicate(user))
            .cloned()
    }

    fn update(&self, username: &str, f: impl FnOnce(&mut (DirectoryUser, Vec<String>))) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        let entry = users
            .get_mut(username)
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", username)))?;
        f(entry);
        Ok(())
    }
}

#[async_trait]
impl Directory for MockDirectory {
    async fn create_user(&self, email: &str) -> Result<ProvisionedUser> {
        self.check_failure(DirectoryOperation::CreateUser)?;
        let email = normalize_email(email);
        if self.find(|u| u.email == email).is_some() {
            return Err(ServiceError::Conflict(format!("User {} exists", email)));
        }

        let user = DirectoryUser {
            sub: Uuid::new_v4().to_string(),
            username: email.clone(),
            email,
            name: None,
            enabled: true,
        };
        self.users
            .lock()
            .unwrap()
            .insert(user.username.clone(), (user.clone(), Vec::new()));

        Ok(ProvisionedUser {
            user,
            temporary_password: generate_temporary_password(TEMPORARY_PASSWORD_LENGTH),
        })
    }

    async fn delete_user(&self, username: &str) -> Result<()> {
        self.check_failure(DirectoryOperation::DeleteUser)?;
        self.users.lock().unwrap().remove(username);
        self.deleted.lock().unwrap().push(username.to_string());
        Ok(())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<DirectoryUser>> {
        self.check_failure(DirectoryOperation::GetUser)?;
        let email = normalize_email(email);
        Ok(self.find(|u| u.email == email))
    }

    async fn get_user_by_sub(&self, sub: &str) -> Result<Option<DirectoryUser>> {
        self.check_failure(DirectoryOperation::GetUser)?;
        Ok(self.find(|u| u.sub == sub))
    }

    async fn add_to_group(&self, username: &str, group: &str) -> Result<()> {
        self.check_failure(DirectoryOperation::AddToGroup)?;
        self.update(username, |(_, groups)| {
            if !groups.iter().any(|g| g == group) {
                groups.push(group.to_string());
            }
        })
    }
}
