//! Section/item source adapters
//!
//! Both relations of the authorization model have the same shape: a
//! *section* (group, permission) contains *items* (users, groups). One
//! generic [`RelationAdapter`] implements the [`SourceAdapter`] contract for
//! either relation; [`MembershipAdapter`] and [`AssignmentAdapter`] are its
//! two instantiations.
//!
//! Lookups used for access decisions (`find_sections`, `item_is_included`)
//! fail closed: resolution errors are logged and read as "no access".
//! Absent sections or items are never errors.

pub mod binding;
pub mod relation;

pub use binding::{RelationBinding, RenamePolicy};
pub use relation::RelationAdapter;

use crate::db_operations::DocumentStore;
use crate::error::AuthResult;
use crate::model::{Entity, Group, Permission, User};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Which users belong to which groups
pub type MembershipAdapter = RelationAdapter<Group, User>;

/// Which groups hold which permissions
pub type AssignmentAdapter = RelationAdapter<Permission, Group>;

impl MembershipAdapter {
    /// Membership adapter with the default user/group binding
    pub fn membership(store: Arc<dyn DocumentStore>) -> AuthResult<Self> {
        Self::new(store, RelationBinding::membership())
    }

    /// Delete a user document. No other document embeds users.
    ///
    /// Groups are removed through [`SourceAdapter::delete_section`], which
    /// detaches them from their members first.
    pub fn delete_item(&self, name: &str) -> AuthResult<bool> {
        match self.get_item(name)? {
            Some(user) => {
                self.store().delete(&user.to_document()?)?;
                log::info!("Deleted {} '{}'", User::DOC_TYPE, name);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl AssignmentAdapter {
    /// Assignment adapter with the default group/permission binding
    pub fn assignment(store: Arc<dyn DocumentStore>) -> AuthResult<Self> {
        Self::new(store, RelationBinding::assignment())
    }
}

/// Credentials handed over by the host middleware.
///
/// Either an already resolved item or an identifier to resolve through the
/// item list view. A resolved item takes precedence.
#[derive(Debug, Clone)]
pub struct Credentials<I> {
    pub item: Option<I>,
    pub identifier: Option<String>,
}

impl<I> Credentials<I> {
    pub fn resolved(item: I) -> Self {
        Self {
            item: Some(item),
            identifier: None,
        }
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Self {
            item: None,
            identifier: Some(name.into()),
        }
    }

    /// Credentials that resolve to nothing
    pub fn anonymous() -> Self {
        Self {
            item: None,
            identifier: None,
        }
    }
}

impl<I> Default for Credentials<I> {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// The capability set the host middleware invokes on a section source.
pub trait SourceAdapter {
    type Item;

    /// Names of every section the credentials' item belongs to; empty when
    /// the item cannot be resolved.
    #[must_use]
    fn find_sections(&self, credentials: &Credentials<Self::Item>) -> BTreeSet<String>;

    fn section_exists(&self, section: &str) -> AuthResult<bool>;

    /// Every section mapped to the names of its items
    fn get_all_sections(&self) -> AuthResult<BTreeMap<String, BTreeSet<String>>>;

    fn get_section_items(&self, section: &str) -> AuthResult<BTreeSet<String>>;

    /// False when either side is missing
    #[must_use]
    fn item_is_included(&self, section: &str, item: &str) -> bool;

    /// Add items to a section. Unknown items and items already included are
    /// skipped; an unknown section makes the call a no-op. Returns the number
    /// of item documents written.
    fn include_items(&self, section: &str, items: &[&str]) -> AuthResult<usize>;

    /// Remove items from a section, dropping every matching embedded entry.
    /// Returns the number of item documents written.
    fn exclude_items(&self, section: &str, items: &[&str]) -> AuthResult<usize>;

    /// Fails with [`AuthError::Duplicate`](crate::AuthError::Duplicate) when
    /// the name is taken.
    fn create_section(&self, section: &str) -> AuthResult<()>;

    /// Rename a section; embedded copies follow the binding's
    /// [`RenamePolicy`].
    fn edit_section(&self, section: &str, new_section: &str) -> AuthResult<()>;

    /// Detach the section from every item holding it, then delete it.
    fn delete_section(&self, section: &str) -> AuthResult<()>;
}
