use super::error_utils::ErrorUtils;
use super::{DocumentStore, ViewDefinition};
use crate::config::StorageConfig;
use crate::error::{AuthError, AuthResult};
use serde_json::Value;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use sled::Transactional;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Field holding the document id
pub const ID_FIELD: &str = "_id";
/// Field holding the document revision
pub const REV_FIELD: &str = "_rev";

/// Embedded document store on top of sled.
///
/// Documents live in the `documents` tree keyed by id. Every defined view
/// keeps its entries in the shared `view_index` tree. A document and its
/// index entries are written in one sled transaction; separate documents
/// are never written atomically together.
#[derive(Clone)]
pub struct SledStore {
    /// The underlying sled database instance
    db: sled::Db,
    pub(crate) documents_tree: sled::Tree,
    pub(crate) view_index_tree: sled::Tree,
    pub(crate) views: Arc<RwLock<HashMap<String, ViewDefinition>>>,
    flush_on_write: bool,
}

impl SledStore {
    /// Wrap an opened sled database
    pub fn new(db: sled::Db) -> AuthResult<Self> {
        let documents_tree = db
            .open_tree("documents")
            .map_err(ErrorUtils::from_sled_error("open_tree"))?;
        let view_index_tree = db
            .open_tree("view_index")
            .map_err(ErrorUtils::from_sled_error("open_tree"))?;

        Ok(Self {
            db,
            documents_tree,
            view_index_tree,
            views: Arc::new(RwLock::new(HashMap::new())),
            flush_on_write: true,
        })
    }

    /// Open the database described by `config`
    pub fn open(config: &StorageConfig) -> AuthResult<Self> {
        let mut sled_config = sled::Config::new().temporary(config.temporary);
        if !config.temporary {
            sled_config = sled_config.path(&config.path);
        }
        let db = sled_config
            .open()
            .map_err(ErrorUtils::from_sled_error("open"))?;
        log::info!(
            "Opened document store{}",
            if config.temporary {
                " (temporary)".to_string()
            } else {
                format!(" at {}", config.path.display())
            }
        );
        Ok(Self::new(db)?.with_flush_on_write(config.flush_on_write))
    }

    /// Throwaway store removed when dropped
    pub fn temporary() -> AuthResult<Self> {
        Self::open(&StorageConfig::temporary())
    }

    pub fn with_flush_on_write(mut self, flush_on_write: bool) -> Self {
        self.flush_on_write = flush_on_write;
        self
    }

    /// Fetch a document by id
    pub fn get(&self, id: &str) -> AuthResult<Option<Value>> {
        match self.documents_tree.get(id.as_bytes()) {
            Ok(Some(bytes)) => {
                let doc = serde_json::from_slice(&bytes)
                    .map_err(ErrorUtils::from_deserialization_error("document"))?;
                Ok(Some(doc))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(ErrorUtils::database_error("retrieve", e)),
        }
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents_tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents_tree.is_empty()
    }

    pub(crate) fn flush_if_configured(&self) -> AuthResult<()> {
        if self.flush_on_write {
            self.db
                .flush()
                .map_err(ErrorUtils::from_sled_error("flush"))?;
        }
        Ok(())
    }

    pub(crate) fn view_snapshot(&self) -> AuthResult<Vec<ViewDefinition>> {
        let views = self
            .views
            .read()
            .map_err(|_| ErrorUtils::lock_error("views"))?;
        Ok(views.values().cloned().collect())
    }

    /// Write one document and its index entries without flushing
    fn save_document(&self, mut doc: Value) -> AuthResult<Value> {
        let map = doc
            .as_object_mut()
            .ok_or_else(|| ErrorUtils::invalid_document("expected a JSON object"))?;

        let supplied_rev = match map.get(REV_FIELD) {
            None | Some(Value::Null) => None,
            Some(rev) => Some(
                rev.as_u64()
                    .ok_or_else(|| ErrorUtils::invalid_document("_rev must be an unsigned integer"))?,
            ),
        };
        let id = match map.get(ID_FIELD) {
            None | Some(Value::Null) => Uuid::new_v4().to_string(),
            Some(Value::String(id)) => id.clone(),
            Some(_) => return Err(ErrorUtils::invalid_document("_id must be a string")),
        };
        map.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        map.insert(REV_FIELD.to_string(), Value::from(supplied_rev.unwrap_or(0) + 1));

        let bytes =
            serde_json::to_vec(&doc).map_err(ErrorUtils::from_serialization_error("document"))?;
        let views = self.view_snapshot()?;
        let new_entries = super::view_operations::index_entries(&views, &doc, &id);

        (&self.documents_tree, &self.view_index_tree)
            .transaction(|(docs, index)| {
                let previous = docs.get(id.as_bytes())?;
                let stored = match (previous, supplied_rev) {
                    (None, None) => None,
                    (None, Some(_)) => return abort(AuthError::DocumentMissing { id: id.clone() }),
                    (Some(_), None) => return abort(AuthError::Conflict { id: id.clone() }),
                    (Some(bytes), Some(expected)) => {
                        let stored = decode_stored(&bytes)?;
                        if stored.get(REV_FIELD).and_then(Value::as_u64) != Some(expected) {
                            return abort(AuthError::Conflict { id: id.clone() });
                        }
                        Some(stored)
                    }
                };

                if let Some(stored) = &stored {
                    for entry in super::view_operations::index_entries(&views, stored, &id) {
                        index.remove(entry)?;
                    }
                }
                for entry in &new_entries {
                    index.insert(entry.as_slice(), Vec::<u8>::new())?;
                }
                docs.insert(id.as_bytes(), bytes.as_slice())?;
                Ok(())
            })
            .map_err(from_transaction_error)?;

        Ok(doc)
    }
}

impl DocumentStore for SledStore {
    fn define_view(&self, view: ViewDefinition) -> AuthResult<()> {
        self.rebuild_view(view)
    }

    fn query(&self, view: &str, key: &str) -> AuthResult<Vec<Value>> {
        self.query_view(view, key)
    }

    fn scan(&self, view: &str) -> AuthResult<Vec<Value>> {
        self.scan_view(view)
    }

    fn save(&self, doc: Value) -> AuthResult<Value> {
        let saved = self.save_document(doc)?;
        self.flush_if_configured()?;
        Ok(saved)
    }

    fn bulk_save(&self, docs: Vec<Value>) -> Vec<AuthResult<Value>> {
        let mut results: Vec<AuthResult<Value>> =
            docs.into_iter().map(|doc| self.save_document(doc)).collect();

        // A failed flush means none of the writes can be reported as durable.
        if let Err(e) = self.flush_if_configured() {
            let reason = e.to_string();
            for result in results.iter_mut().filter(|r| r.is_ok()) {
                *result = Err(AuthError::Store(reason.clone()));
            }
        }
        results
    }

    fn delete(&self, doc: &Value) -> AuthResult<()> {
        let id = doc
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::DocumentMissing {
                id: "<unsaved>".to_string(),
            })?
            .to_string();
        let expected = doc.get(REV_FIELD).and_then(Value::as_u64);
        let views = self.view_snapshot()?;

        (&self.documents_tree, &self.view_index_tree)
            .transaction(|(docs, index)| {
                let Some(bytes) = docs.get(id.as_bytes())? else {
                    return abort(AuthError::DocumentMissing { id: id.clone() });
                };
                let stored = decode_stored(&bytes)?;
                if stored.get(REV_FIELD).and_then(Value::as_u64) != expected {
                    return abort(AuthError::Conflict { id: id.clone() });
                }
                for entry in super::view_operations::index_entries(&views, &stored, &id) {
                    index.remove(entry)?;
                }
                docs.remove(id.as_bytes())?;
                Ok(())
            })
            .map_err(from_transaction_error)?;

        self.flush_if_configured()
    }
}

fn abort<T>(error: AuthError) -> ConflictableTransactionResult<T, AuthError> {
    Err(ConflictableTransactionError::Abort(error))
}

fn decode_stored(bytes: &[u8]) -> ConflictableTransactionResult<Value, AuthError> {
    serde_json::from_slice(bytes).map_err(|e| {
        ConflictableTransactionError::Abort(ErrorUtils::deserialization_error("document", e))
    })
}

fn from_transaction_error(error: TransactionError<AuthError>) -> AuthError {
    match error {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => ErrorUtils::database_error("transaction", e),
    }
}
