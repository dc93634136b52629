//! Generic section/item relationship adapter.
//!
//! Items embed snapshots of the sections they belong to; sections keep no
//! list of their items. Every mutation therefore rewrites item documents,
//! and reverse lookups (section -> items) go through the items-by-section
//! view instead of walking every item.
//!
//! Multi-document operations are not atomic. Each of them is idempotent, so
//! a caller that sees a partial failure converges by issuing the same call
//! again.

use super::binding::{RelationBinding, RenamePolicy};
use super::{Credentials, SourceAdapter};
use crate::db_operations::DocumentStore;
use crate::error::{AuthError, AuthResult, BulkFailure};
use crate::model::{Entity, Holds};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;
use std::sync::Arc;

/// Relationship adapter between sections `S` and items `I`.
pub struct RelationAdapter<S, I> {
    store: Arc<dyn DocumentStore>,
    binding: RelationBinding,
    _entities: PhantomData<fn() -> (S, I)>,
}

impl<S, I> Clone for RelationAdapter<S, I> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            binding: self.binding.clone(),
            _entities: PhantomData,
        }
    }
}

impl<S: Entity, I: Holds<S>> RelationAdapter<S, I> {
    /// Validate `binding` against `S` and `I` and register its views.
    pub fn new(store: Arc<dyn DocumentStore>, binding: RelationBinding) -> AuthResult<Self> {
        binding.validate_for::<S, I>()?;
        for view in binding.view_definitions() {
            store.define_view(view)?;
        }
        debug!(
            "Relation adapter ready: {} in {}",
            binding.item_entity, binding.section_entity
        );

        Ok(Self {
            store,
            binding,
            _entities: PhantomData,
        })
    }

    pub fn binding(&self) -> &RelationBinding {
        &self.binding
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// First section document with this name
    pub fn get_section(&self, name: &str) -> AuthResult<Option<S>> {
        self.first_match(&self.binding.section_list_view, name)
    }

    /// First item document with this name
    pub fn get_item(&self, name: &str) -> AuthResult<Option<I>> {
        self.first_match(&self.binding.item_list_view, name)
    }

    /// Persist a new or modified item document
    pub fn save_item(&self, item: &I) -> AuthResult<I> {
        I::from_document(self.store.save(item.to_document()?)?)
    }

    fn first_match<T: Entity>(&self, view: &str, key: &str) -> AuthResult<Option<T>> {
        self.store
            .query(view, key)?
            .into_iter()
            .next()
            .map(T::from_document)
            .transpose()
    }

    fn items_holding(&self, section: &str) -> AuthResult<Vec<I>> {
        self.store
            .query(&self.binding.items_by_section_view, section)?
            .into_iter()
            .map(I::from_document)
            .collect()
    }

    /// Bulk-save `items`; every document is attempted before failures are
    /// reported.
    fn persist_items(&self, items: Vec<I>) -> AuthResult<usize> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut names = Vec::with_capacity(items.len());
        let mut docs = Vec::with_capacity(items.len());
        for item in &items {
            names.push(item.name().to_string());
            docs.push(item.to_document()?);
        }

        let attempted = docs.len();
        let failures: Vec<BulkFailure> = names
            .into_iter()
            .zip(self.store.bulk_save(docs))
            .filter_map(|(name, result)| {
                result.err().map(|e| BulkFailure {
                    name,
                    reason: e.to_string(),
                })
            })
            .collect();

        if failures.is_empty() {
            Ok(attempted)
        } else {
            warn!(
                "Saved {} of {} {} document(s); failed: {:?}",
                attempted - failures.len(),
                attempted,
                I::DOC_TYPE,
                failures.iter().map(|f| f.name.as_str()).collect::<Vec<_>>()
            );
            Err(AuthError::BulkSave {
                attempted,
                failures,
            })
        }
    }

    fn resolve(&self, credentials: &Credentials<I>) -> AuthResult<Option<I>> {
        if let Some(item) = &credentials.item {
            return Ok(Some(item.clone()));
        }
        match &credentials.identifier {
            Some(name) => self.get_item(name),
            None => Ok(None),
        }
    }

    /// Rewrite embedded copies of `old` in every holder to `renamed`.
    fn cascade_rename(&self, old: &str, renamed: &S) -> AuthResult<usize> {
        let snapshot = renamed.snapshot();
        let mut holders = self.items_holding(old)?;
        for item in holders.iter_mut() {
            replace_embedded(item.relations_mut(), old, &snapshot);
        }
        self.persist_items(holders)
    }
}

/// Replace entries named `old` (and stale entries already carrying the new
/// name) with one copy of `replacement` at the first such position.
fn replace_embedded<S: Entity>(list: &mut Vec<S>, old: &str, replacement: &S) {
    let mut replaced = false;
    let mut updated = Vec::with_capacity(list.len());
    for entry in list.drain(..) {
        if entry.name() == old || entry.name() == replacement.name() {
            if !replaced {
                updated.push(replacement.clone());
                replaced = true;
            }
        } else {
            updated.push(entry);
        }
    }
    *list = updated;
}

impl<S: Entity, I: Holds<S>> SourceAdapter for RelationAdapter<S, I> {
    type Item = I;

    fn find_sections(&self, credentials: &Credentials<I>) -> BTreeSet<String> {
        match self.resolve(credentials) {
            Ok(Some(item)) => item
                .relations()
                .iter()
                .map(|s| s.name().to_string())
                .collect(),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!(
                    "Could not resolve {} for section lookup, denying: {}",
                    I::DOC_TYPE,
                    e
                );
                BTreeSet::new()
            }
        }
    }

    fn section_exists(&self, section: &str) -> AuthResult<bool> {
        Ok(!self
            .store
            .query(&self.binding.section_list_view, section)?
            .is_empty())
    }

    fn get_all_sections(&self) -> AuthResult<BTreeMap<String, BTreeSet<String>>> {
        let mut sections = BTreeMap::new();
        for doc in self.store.scan(&self.binding.section_list_view)? {
            let section = S::from_document(doc)?;
            let items = self.get_section_items(section.name())?;
            sections.insert(section.name().to_string(), items);
        }
        Ok(sections)
    }

    fn get_section_items(&self, section: &str) -> AuthResult<BTreeSet<String>> {
        Ok(self
            .items_holding(section)?
            .iter()
            .map(|item| item.name().to_string())
            .collect())
    }

    fn item_is_included(&self, section: &str, item: &str) -> bool {
        match self.get_item(item) {
            Ok(Some(item)) => item.holds(section),
            Ok(None) => false,
            Err(e) => {
                warn!(
                    "Could not resolve {} '{}', denying: {}",
                    I::DOC_TYPE,
                    item,
                    e
                );
                false
            }
        }
    }

    fn include_items(&self, section: &str, items: &[&str]) -> AuthResult<usize> {
        let Some(section_doc) = self.get_section(section)? else {
            debug!("{} '{}' does not exist, nothing to include", S::DOC_TYPE, section);
            return Ok(0);
        };
        let snapshot = section_doc.snapshot();

        let mut pending: Vec<I> = Vec::new();
        for name in items {
            if pending.iter().any(|item| item.name() == *name) {
                continue;
            }
            let Some(mut item) = self.get_item(name)? else {
                debug!("Skipping unknown {} '{}'", I::DOC_TYPE, name);
                continue;
            };
            if item.holds(section) {
                continue;
            }
            item.relations_mut().push(snapshot.clone());
            pending.push(item);
        }

        let saved = self.persist_items(pending)?;
        if saved > 0 {
            info!(
                "Included {} {}(s) in {} '{}'",
                saved,
                I::DOC_TYPE,
                S::DOC_TYPE,
                section
            );
        }
        Ok(saved)
    }

    fn exclude_items(&self, section: &str, items: &[&str]) -> AuthResult<usize> {
        let mut pending: Vec<I> = Vec::new();
        for name in items {
            if pending.iter().any(|item| item.name() == *name) {
                continue;
            }
            let Some(mut item) = self.get_item(name)? else {
                continue;
            };
            if item.detach(section) > 0 {
                pending.push(item);
            }
        }

        let saved = self.persist_items(pending)?;
        if saved > 0 {
            info!(
                "Excluded {} {}(s) from {} '{}'",
                saved,
                I::DOC_TYPE,
                S::DOC_TYPE,
                section
            );
        }
        Ok(saved)
    }

    fn create_section(&self, section: &str) -> AuthResult<()> {
        if self.section_exists(section)? {
            return Err(AuthError::duplicate(S::DOC_TYPE, section));
        }
        self.store.save(S::new_named(section).to_document()?)?;
        info!("Created {} '{}'", S::DOC_TYPE, section);
        Ok(())
    }

    fn edit_section(&self, section: &str, new_section: &str) -> AuthResult<()> {
        if section == new_section {
            return Ok(());
        }
        let Some(mut doc) = self.get_section(section)? else {
            debug!("{} '{}' does not exist, nothing to rename", S::DOC_TYPE, section);
            return Ok(());
        };
        if self.section_exists(new_section)? {
            return Err(AuthError::duplicate(S::DOC_TYPE, new_section));
        }

        doc.set_name(new_section.to_string());
        match self.binding.rename_policy {
            RenamePolicy::Lazy => {
                debug!(
                    "Embedded copies of {} '{}' keep the old name until re-saved",
                    S::DOC_TYPE,
                    section
                );
            }
            RenamePolicy::Cascade => {
                // Holders are rewritten before the section document, so a
                // repeated call still finds the section under its old name.
                let updated = self.cascade_rename(section, &doc)?;
                debug!("Refreshed {} embedded copies of '{}'", updated, new_section);
            }
        }

        self.store.save(doc.to_document()?)?;
        info!("Renamed {} '{}' to '{}'", S::DOC_TYPE, section, new_section);
        Ok(())
    }

    fn delete_section(&self, section: &str) -> AuthResult<()> {
        let Some(doc) = self.get_section(section)? else {
            debug!("{} '{}' does not exist, nothing to delete", S::DOC_TYPE, section);
            return Ok(());
        };

        let holders: Vec<I> = self
            .items_holding(section)?
            .into_iter()
            .filter_map(|mut item| (item.detach(section) > 0).then_some(item))
            .collect();
        // The section document stays until every holder is detached, so a
        // repeated call can finish the cascade.
        let detached = self.persist_items(holders)?;

        self.store.delete(&doc.to_document()?)?;
        info!(
            "Deleted {} '{}' and detached it from {} {}(s)",
            S::DOC_TYPE,
            section,
            detached,
            I::DOC_TYPE
        );
        Ok(())
    }
}
