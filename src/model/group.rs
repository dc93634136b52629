use super::entity::{DocMeta, Entity, Holds};
use super::permission::Permission;
use serde::{Deserialize, Serialize};

/// A named group of users, carrying snapshots of the permissions assigned
/// to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(flatten)]
    pub meta: DocMeta,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: DocMeta::default(),
            name: name.into(),
            permissions: Vec::new(),
        }
    }

    /// Names of the embedded permissions, in embedding order
    pub fn permission_names(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(|p| p.name.as_str())
    }
}

impl Entity for Group {
    const DOC_TYPE: &'static str = "group";
    const NAME_FIELD: &'static str = "name";

    fn new_named(name: &str) -> Self {
        Self::new(name)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn meta(&self) -> &DocMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocMeta {
        &mut self.meta
    }
}

impl Holds<Permission> for Group {
    const RELATION_FIELD: &'static str = "permissions";

    fn relations(&self) -> &[Permission] {
        &self.permissions
    }

    fn relations_mut(&mut self) -> &mut Vec<Permission> {
        &mut self.permissions
    }
}
