//! Document store
//!
//! The adapters reach storage only through [`DocumentStore`]: exact-key and
//! full-scan queries against named views, single and bulk saves, and
//! deletes. There are no joins and no cross-document transactions.
//! [`SledStore`] is the embedded implementation.

pub mod core;
pub mod error_utils;
mod view_operations;

#[cfg(test)]
mod tests;

pub use self::core::SledStore;
pub use error_utils::ErrorUtils;

use crate::error::AuthResult;
use crate::model::DOC_TYPE_FIELD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// How a view derives index keys from a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewKey {
    /// The string value of a top-level field
    Field(String),
    /// The string value of `field` on every element of the array at `list`
    Embedded { list: String, field: String },
}

/// A secondary index over documents of a single type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDefinition {
    pub name: String,
    /// Only documents tagged with this `doc_type` are indexed
    pub doc_type: String,
    pub key: ViewKey,
}

impl ViewDefinition {
    /// View keyed on a top-level field
    pub fn by_field(name: &str, doc_type: &str, field: &str) -> Self {
        Self {
            name: name.to_string(),
            doc_type: doc_type.to_string(),
            key: ViewKey::Field(field.to_string()),
        }
    }

    /// View keyed on a field of each embedded element
    pub fn by_embedded(name: &str, doc_type: &str, list: &str, field: &str) -> Self {
        Self {
            name: name.to_string(),
            doc_type: doc_type.to_string(),
            key: ViewKey::Embedded {
                list: list.to_string(),
                field: field.to_string(),
            },
        }
    }

    /// Keys this view emits for `doc`. Documents of another type emit none;
    /// repeated keys within one document collapse to one.
    pub fn emit(&self, doc: &Value) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        if doc.get(DOC_TYPE_FIELD).and_then(Value::as_str) != Some(self.doc_type.as_str()) {
            return keys;
        }

        match &self.key {
            ViewKey::Field(field) => {
                if let Some(key) = doc.get(field).and_then(Value::as_str) {
                    keys.insert(key.to_string());
                }
            }
            ViewKey::Embedded { list, field } => {
                if let Some(entries) = doc.get(list).and_then(Value::as_array) {
                    keys.extend(
                        entries
                            .iter()
                            .filter_map(|entry| entry.get(field).and_then(Value::as_str))
                            .map(str::to_string),
                    );
                }
            }
        }
        keys
    }
}

/// Capabilities the adapters require from a document store.
///
/// Documents are JSON objects carrying `_id`, `_rev` and `doc_type`. A save
/// without `_id` creates a document; a save with `_id` must carry the current
/// `_rev` or fail with a conflict. Implementations never retry.
pub trait DocumentStore: Send + Sync {
    /// Register a view, (re)building its index from stored documents
    fn define_view(&self, view: ViewDefinition) -> AuthResult<()>;

    /// Documents whose view key equals `key`
    fn query(&self, view: &str, key: &str) -> AuthResult<Vec<Value>>;

    /// Every document indexed by the view, each at most once
    fn scan(&self, view: &str) -> AuthResult<Vec<Value>>;

    /// Create or update one document, returning it with its new `_id`/`_rev`
    fn save(&self, doc: Value) -> AuthResult<Value>;

    /// Save every document, one result per input in order.
    ///
    /// Not transactional: a failure leaves the other documents saved.
    fn bulk_save(&self, docs: Vec<Value>) -> Vec<AuthResult<Value>> {
        docs.into_iter().map(|doc| self.save(doc)).collect()
    }

    /// Delete a document at its current revision
    fn delete(&self, doc: &Value) -> AuthResult<()>;
}
