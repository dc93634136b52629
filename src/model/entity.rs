//! Entity traits shared by users, groups and permissions.
//!
//! Every entity is a named document. Entities that embed copies of another
//! entity implement [`Holds`] for that entity; the embedded copy is a
//! snapshot taken when it was added, not a live reference.

use crate::error::{AuthError, AuthResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field carrying the entity type tag on stored documents
pub const DOC_TYPE_FIELD: &str = "doc_type";

/// Store-assigned identity of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<u64>,
}

impl DocMeta {
    /// True until the document has been saved once
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

/// A named document type known to the store.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Tag written to `doc_type` on every stored document
    const DOC_TYPE: &'static str;
    /// Serialized field holding the display name
    const NAME_FIELD: &'static str;

    /// A fresh, unsaved entity with an empty relation list
    fn new_named(name: &str) -> Self;

    fn name(&self) -> &str;

    fn set_name(&mut self, name: String);

    fn meta(&self) -> &DocMeta;

    fn meta_mut(&mut self) -> &mut DocMeta;

    /// Copy suitable for embedding inside another document.
    ///
    /// The revision is dropped; an embedded copy is never saved on its own.
    fn snapshot(&self) -> Self {
        let mut copy = self.clone();
        copy.meta_mut().rev = None;
        copy
    }

    /// Encode as a store document tagged with [`Entity::DOC_TYPE`]
    fn to_document(&self) -> AuthResult<Value> {
        let mut doc = serde_json::to_value(self)?;
        match doc.as_object_mut() {
            Some(map) => {
                map.insert(
                    DOC_TYPE_FIELD.to_string(),
                    Value::String(Self::DOC_TYPE.to_string()),
                );
                Ok(doc)
            }
            None => Err(AuthError::Serialization(format!(
                "{} did not serialize to an object",
                Self::DOC_TYPE
            ))),
        }
    }

    /// Decode a store document, rejecting documents of another type
    fn from_document(doc: Value) -> AuthResult<Self> {
        if let Some(tag) = doc.get(DOC_TYPE_FIELD).and_then(Value::as_str) {
            if tag != Self::DOC_TYPE {
                return Err(AuthError::Serialization(format!(
                    "expected {} document, found {}",
                    Self::DOC_TYPE,
                    tag
                )));
            }
        }
        Ok(serde_json::from_value(doc)?)
    }
}

/// An entity embedding snapshots of `S` in an ordered list.
pub trait Holds<S: Entity>: Entity {
    /// Serialized field holding the embedded list
    const RELATION_FIELD: &'static str;

    fn relations(&self) -> &[S];

    fn relations_mut(&mut self) -> &mut Vec<S>;

    /// Whether an embedded entry carries the given name
    fn holds(&self, section: &str) -> bool {
        self.relations().iter().any(|s| s.name() == section)
    }

    /// Remove every embedded entry with this name; returns how many were removed
    fn detach(&mut self, section: &str) -> usize {
        let list = self.relations_mut();
        let before = list.len();
        list.retain(|s| s.name() != section);
        before - list.len()
    }
}
