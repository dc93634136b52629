//! Authorization source facade
//!
//! [`AuthSource`] opens the document store and wires the membership and
//! assignment adapters onto it together with the credential hasher. It also
//! owns the user lifecycle, which neither adapter covers: users are items
//! only, never sections.

use crate::adapters::{
    AssignmentAdapter, Credentials, MembershipAdapter, RelationAdapter, SourceAdapter,
};
use crate::config::AuthConfig;
use crate::db_operations::{DocumentStore, SledStore};
use crate::error::{AuthError, AuthResult};
use crate::model::{Entity, User};
use crate::security::CredentialHasher;
use log::{info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Store, adapters and hasher for one authorization database
#[derive(Clone)]
pub struct AuthSource {
    store: Arc<dyn DocumentStore>,
    membership: MembershipAdapter,
    assignment: AssignmentAdapter,
    hasher: CredentialHasher,
}

impl AuthSource {
    /// Open the sled store described by `config` and wire both adapters
    pub fn open(config: &AuthConfig) -> AuthResult<Self> {
        config.validate()?;
        let store = SledStore::open(&config.storage)?;
        Self::with_store(Arc::new(store), config)
    }

    /// Wire both adapters onto an existing store
    pub fn with_store(store: Arc<dyn DocumentStore>, config: &AuthConfig) -> AuthResult<Self> {
        let membership = RelationAdapter::new(Arc::clone(&store), config.membership.clone())?;
        let assignment = RelationAdapter::new(Arc::clone(&store), config.assignment.clone())?;
        let hasher = CredentialHasher::new(&config.hasher)?;

        Ok(Self {
            store,
            membership,
            assignment,
            hasher,
        })
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn membership(&self) -> &MembershipAdapter {
        &self.membership
    }

    pub fn assignment(&self) -> &AssignmentAdapter {
        &self.assignment
    }

    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    // ========== User Lifecycle ==========

    /// Create a user with no groups. Fails if the name is taken.
    pub fn register_user(&self, username: &str, password: &str) -> AuthResult<User> {
        if self.membership.get_item(username)?.is_some() {
            return Err(AuthError::duplicate(User::DOC_TYPE, username));
        }
        let user = User::create(username, password, Vec::new(), &self.hasher)?;
        let saved = self.membership.save_item(&user)?;
        info!("Registered user '{}'", username);
        Ok(saved)
    }

    pub fn find_user(&self, username: &str) -> AuthResult<Option<User>> {
        self.membership.get_item(username)
    }

    /// Check a password. Unknown users and lookup failures are rejected.
    #[must_use]
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        match self.find_user(username) {
            Ok(Some(user)) => user.authenticate(password, &self.hasher),
            Ok(None) => false,
            Err(e) => {
                warn!("Authentication lookup for '{}' failed: {}", username, e);
                false
            }
        }
    }

    /// Replace a user's password. Returns `false` for unknown users.
    pub fn change_password(&self, username: &str, password: &str) -> AuthResult<bool> {
        let Some(mut user) = self.find_user(username)? else {
            return Ok(false);
        };
        user.set_password(password, &self.hasher)?;
        self.membership.save_item(&user)?;
        info!("Changed password for '{}'", username);
        Ok(true)
    }

    /// Delete a user. Returns `false` for unknown users.
    pub fn delete_user(&self, username: &str) -> AuthResult<bool> {
        self.membership.delete_item(username)
    }

    // ========== Authorization Lookups ==========

    /// Groups the user belongs to, from the user's embedded snapshots
    #[must_use]
    pub fn user_groups(&self, username: &str) -> BTreeSet<String> {
        self.membership
            .find_sections(&Credentials::identifier(username))
    }

    /// Union of the permissions of every group the user belongs to.
    ///
    /// Permissions are read from the current group documents, not from the
    /// group snapshots embedded in the user.
    #[must_use]
    pub fn user_permissions(&self, username: &str) -> BTreeSet<String> {
        self.user_groups(username)
            .iter()
            .flat_map(|group| {
                self.assignment
                    .find_sections(&Credentials::identifier(group.as_str()))
            })
            .collect()
    }

    #[must_use]
    pub fn user_has_permission(&self, username: &str, permission: &str) -> bool {
        self.user_permissions(username).contains(permission)
    }
}
