//! Relation bindings
//!
//! A [`RelationBinding`] tells an adapter which entity is the section, which
//! is the item, which fields carry their names and the item's embedded list,
//! and which views answer its queries. It is fixed for the adapter's lifetime.

use crate::config::{ConfigError, ConfigResult};
use crate::db_operations::ViewDefinition;
use crate::model::{Entity, Holds};
use serde::{Deserialize, Serialize};

/// What `edit_section` does with snapshots already embedded in items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenamePolicy {
    /// Rename only the section document; embedded copies keep the old name.
    ///
    /// Lookups by name no longer reach those copies: deleting the section
    /// under its new name leaves them in place, and they can only be
    /// removed with `exclude_items` under the old name.
    #[default]
    Lazy,
    /// Also rewrite every embedded copy to the renamed section
    Cascade,
}

/// Configuration of one section/item relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationBinding {
    /// `doc_type` of the containing side
    pub section_entity: String,
    /// `doc_type` of the contained side
    pub item_entity: String,
    pub section_name_field: String,
    pub item_name_field: String,
    /// Field on the item holding embedded section snapshots
    pub item_relation_field: String,
    /// View of sections keyed by name
    pub section_list_view: String,
    /// View of items keyed by name
    pub item_list_view: String,
    /// View of items keyed by the name of every embedded section
    pub items_by_section_view: String,
    #[serde(default)]
    pub rename_policy: RenamePolicy,
}

impl RelationBinding {
    /// Users in groups
    pub fn membership() -> Self {
        Self {
            section_entity: "group".to_string(),
            item_entity: "user".to_string(),
            section_name_field: "name".to_string(),
            item_name_field: "username".to_string(),
            item_relation_field: "groups".to_string(),
            section_list_view: "group_list".to_string(),
            item_list_view: "user_list".to_string(),
            items_by_section_view: "users_by_group".to_string(),
            rename_policy: RenamePolicy::Lazy,
        }
    }

    /// Groups holding permissions
    pub fn assignment() -> Self {
        Self {
            section_entity: "permission".to_string(),
            item_entity: "group".to_string(),
            section_name_field: "name".to_string(),
            item_name_field: "name".to_string(),
            item_relation_field: "permissions".to_string(),
            section_list_view: "permission_list".to_string(),
            item_list_view: "group_list".to_string(),
            items_by_section_view: "groups_by_permission".to_string(),
            rename_policy: RenamePolicy::Lazy,
        }
    }

    pub fn with_rename_policy(mut self, policy: RenamePolicy) -> Self {
        self.rename_policy = policy;
        self
    }

    /// Check the binding against the entity types it will drive.
    ///
    /// Entity fields are read through typed accessors, so the configured
    /// names must match what those types serialize.
    pub fn validate_for<S: Entity, I: Holds<S>>(&self) -> ConfigResult<()> {
        let expect = |option: &str, configured: &str, actual: &str| {
            if configured == actual {
                Ok(())
            } else {
                Err(ConfigError::validation(format!(
                    "{} is '{}' but the bound entity uses '{}'",
                    option, configured, actual
                )))
            }
        };
        expect("section_entity", &self.section_entity, S::DOC_TYPE)?;
        expect("item_entity", &self.item_entity, I::DOC_TYPE)?;
        expect("section_name_field", &self.section_name_field, S::NAME_FIELD)?;
        expect("item_name_field", &self.item_name_field, I::NAME_FIELD)?;
        expect("item_relation_field", &self.item_relation_field, I::RELATION_FIELD)?;

        let views = [
            &self.section_list_view,
            &self.item_list_view,
            &self.items_by_section_view,
        ];
        if views.iter().any(|v| v.is_empty()) {
            return Err(ConfigError::validation("view names must not be empty"));
        }
        if views[0] == views[1] || views[0] == views[2] || views[1] == views[2] {
            return Err(ConfigError::validation(format!(
                "views of the {}/{} relation must be distinct",
                self.section_entity, self.item_entity
            )));
        }
        Ok(())
    }

    /// The three index definitions this binding needs from the store
    pub fn view_definitions(&self) -> [ViewDefinition; 3] {
        [
            ViewDefinition::by_field(
                &self.section_list_view,
                &self.section_entity,
                &self.section_name_field,
            ),
            ViewDefinition::by_field(
                &self.item_list_view,
                &self.item_entity,
                &self.item_name_field,
            ),
            ViewDefinition::by_embedded(
                &self.items_by_section_view,
                &self.item_entity,
                &self.item_relation_field,
                &self.section_name_field,
            ),
        ]
    }
}
