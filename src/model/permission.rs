use super::entity::{DocMeta, Entity};
use serde::{Deserialize, Serialize};

/// A named permission. Permissions are the leaf of the hierarchy and embed
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(flatten)]
    pub meta: DocMeta,
    pub name: String,
}

impl Permission {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: DocMeta::default(),
            name: name.into(),
        }
    }
}

impl Entity for Permission {
    const DOC_TYPE: &'static str = "permission";
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
