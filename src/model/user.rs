use super::entity::{DocMeta, Entity, Holds};
use super::group::Group;
use crate::error::AuthResult;
use crate::security::CredentialHasher;
use serde::{Deserialize, Serialize};

/// A user account. Group membership is stored as snapshots of the group
/// documents at the time the user was last saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub meta: DocMeta,
    pub username: String,
    /// PHC-format password hash; `None` for accounts that cannot log in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl User {
    /// Create an unsaved user with a hashed password.
    pub fn create(
        username: impl Into<String>,
        password: &str,
        groups: Vec<Group>,
        hasher: &CredentialHasher,
    ) -> AuthResult<Self> {
        Ok(Self {
            meta: DocMeta::default(),
            username: username.into(),
            password: Some(hasher.hash(password, None)?),
            groups,
        })
    }

    /// Check a plaintext password against the stored hash
    pub fn authenticate(&self, password: &str, hasher: &CredentialHasher) -> bool {
        self.password
            .as_deref()
            .map(|hash| hasher.verify(hash, password))
            .unwrap_or(false)
    }

    /// Replace the stored hash. The document still has to be saved.
    pub fn set_password(&mut self, password: &str, hasher: &CredentialHasher) -> AuthResult<()> {
        self.password = Some(hasher.hash(password, None)?);
        Ok(())
    }

    /// Names of the embedded groups, in embedding order
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }
}

impl Entity for User {
    const DOC_TYPE: &'static str = "user";
    const NAME_FIELD: &'static str = "username";

    fn new_named(name: &str) -> Self {
        Self {
            meta: DocMeta::default(),
            username: name.to_string(),
            password: None,
            groups: Vec::new(),
        }
    }

    fn name(&self) -> &str {
        &self.username
    }

    fn set_name(&mut self, name: String) {
        self.username = name;
    }

    fn meta(&self) -> &DocMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocMeta {
        &mut self.meta
    }
}

impl Holds<Group> for User {
    const RELATION_FIELD: &'static str = "groups";

    fn relations(&self) -> &[Group] {
        &self.groups
    }

    fn relations_mut(&mut self) -> &mut Vec<Group> {
        &mut self.groups
    }
}
