use crate::core_auth::error::AuthError;
use crate::core_auth::permissions::{Permission, Permissions};
use log::debug;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct UserRecord {
    username: String,
    password: String,
    root: PathBuf,
    permissions: Permissions,
}

impl UserRecord {
    pub fn new(username: &str, password: &str, root: PathBuf, permissions: Permissions) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            root,
            permissions,
        }
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }

    pub fn get_root(&self) -> &PathBuf {
        &self.root
    }

    pub fn get_permissions(&self) -> &Permissions {
        &self.permissions
    }

    fn password_matches(&self, password: &str) -> bool {
        self.password == password
    }
}

/// Maps usernames to their records and answers login and permission queries.
///
/// Records are added once at startup and never mutated afterwards, so the
/// authorizer is shared between sessions behind a plain `Arc`.
#[derive(Debug, Default)]
pub struct Authorizer {
    users: HashMap<String, Arc<UserRecord>>,
}

impl Authorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&mut self, record: UserRecord) -> Result<(), AuthError> {
        if record.username.is_empty() {
            return Err(AuthError::EmptyUsername);
        }
        if self.users.contains_key(&record.username) {
            return Err(AuthError::DuplicateUser(record.username));
        }
        debug!(
            "Registered user {} with permissions {:?} rooted at {:?}",
            record.username,
            record.permissions.to_string(),
            record.root
        );
        self.users.insert(record.username.clone(), Arc::new(record));
        Ok(())
    }

    pub fn lookup(&self, username: &str) -> Option<Arc<UserRecord>> {
        self.users.get(username).cloned()
    }

    /// Returns true only when both the username and the password match exactly.
    pub fn check(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .map(|user| user.password_matches(password))
            .unwrap_or(false)
    }

    pub fn permissions(&self, username: &str) -> Option<&Permissions> {
        self.users.get(username).map(|user| &user.permissions)
    }

    pub fn has_perm(&self, username: &str, perm: Permission) -> bool {
        self.permissions(username)
            .map(|perms| perms.has(perm))
            .unwrap_or(false)
    }
}
