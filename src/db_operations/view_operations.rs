use super::core::SledStore;
use super::error_utils::ErrorUtils;
use super::ViewDefinition;
use crate::error::{AuthError, AuthResult};
use serde_json::Value;
use std::collections::HashSet;

/// Separates view name, key and document id inside an index entry
const SEPARATOR: u8 = 0;

/// `view \0 key \0 id`
fn index_entry(view: &str, key: &str, id: &str) -> Vec<u8> {
    let mut entry = index_prefix(view, Some(key));
    entry.extend_from_slice(id.as_bytes());
    entry
}

/// `view \0` or `view \0 key \0`
fn index_prefix(view: &str, key: Option<&str>) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(view.len() + key.map_or(0, str::len) + 2);
    prefix.extend_from_slice(view.as_bytes());
    prefix.push(SEPARATOR);
    if let Some(key) = key {
        prefix.extend_from_slice(key.as_bytes());
        prefix.push(SEPARATOR);
    }
    prefix
}

fn id_from_entry(entry: &[u8]) -> Option<String> {
    let start = entry.iter().rposition(|b| *b == SEPARATOR)? + 1;
    String::from_utf8(entry[start..].to_vec()).ok()
}

/// Every index entry `doc` contributes across `views`.
///
/// Keys containing the separator byte are not indexed.
pub(super) fn index_entries(views: &[ViewDefinition], doc: &Value, id: &str) -> Vec<Vec<u8>> {
    views
        .iter()
        .flat_map(|view| {
            view.emit(doc)
                .into_iter()
                .filter(|key| !key.as_bytes().contains(&SEPARATOR))
                .map(move |key| index_entry(&view.name, &key, id))
        })
        .collect()
}

impl SledStore {
    /// Register `view` and rebuild its index from every stored document
    pub(crate) fn rebuild_view(&self, view: ViewDefinition) -> AuthResult<()> {
        {
            let mut views = self
                .views
                .write()
                .map_err(|_| ErrorUtils::lock_error("views"))?;
            if let Some(existing) = views.get(&view.name) {
                if existing != &view {
                    log::warn!("Redefining view '{}'", view.name);
                }
            }
            views.insert(view.name.clone(), view.clone());
        }

        let mut batch = sled::Batch::default();
        for result in self.view_index_tree.scan_prefix(index_prefix(&view.name, None)) {
            let (entry, _) = result.map_err(ErrorUtils::from_sled_error("view scan"))?;
            batch.remove(entry);
        }

        let mut indexed = 0usize;
        for result in self.documents_tree.iter() {
            let (id, bytes) = result.map_err(ErrorUtils::from_sled_error("document scan"))?;
            let doc: Value = serde_json::from_slice(&bytes)
                .map_err(ErrorUtils::from_deserialization_error("document"))?;
            let id = String::from_utf8_lossy(&id).to_string();
            for entry in index_entries(std::slice::from_ref(&view), &doc, &id) {
                batch.insert(entry, Vec::<u8>::new());
                indexed += 1;
            }
        }

        self.view_index_tree
            .apply_batch(batch)
            .map_err(ErrorUtils::from_sled_error("apply_batch"))?;
        self.flush_if_configured()?;
        log::debug!("View '{}' indexed {} entries", view.name, indexed);
        Ok(())
    }

    fn ensure_view(&self, view: &str) -> AuthResult<()> {
        let views = self
            .views
            .read()
            .map_err(|_| ErrorUtils::lock_error("views"))?;
        if views.contains_key(view) {
            Ok(())
        } else {
            Err(AuthError::UnknownView(view.to_string()))
        }
    }

    /// Documents indexed under `key`, ordered by id
    pub(crate) fn query_view(&self, view: &str, key: &str) -> AuthResult<Vec<Value>> {
        self.ensure_view(view)?;
        if key.as_bytes().contains(&SEPARATOR) {
            return Ok(Vec::new());
        }
        self.collect_documents(&index_prefix(view, Some(key)))
    }

    /// Every document in the view, ordered by key then id, without repeats
    pub(crate) fn scan_view(&self, view: &str) -> AuthResult<Vec<Value>> {
        self.ensure_view(view)?;
        self.collect_documents(&index_prefix(view, None))
    }

    fn collect_documents(&self, prefix: &[u8]) -> AuthResult<Vec<Value>> {
        let mut seen = HashSet::new();
        let mut docs = Vec::new();
        for result in self.view_index_tree.scan_prefix(prefix) {
            let (entry, _) = result.map_err(ErrorUtils::from_sled_error("view scan"))?;
            let Some(id) = id_from_entry(&entry) else {
                continue;
            };
            if !seen.insert(id.clone()) {
                continue;
            }
            // Stale entry left by an interrupted rebuild.
            match self.get(&id)? {
                Some(doc) => docs.push(doc),
                None => log::warn!("View entry points at missing document {}", id),
            }
        }
        Ok(docs)
    }
}
