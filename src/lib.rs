//! # docauth
//!
//! Group membership and permission assignment sources for an
//! authentication/authorization middleware, backed by an embedded document
//! store.
//!
//! ## Core Components
//!
//! * `adapters` - the generic section/item relationship adapter and its two
//!   instantiations (users in groups, groups holding permissions)
//! * `db_operations` - document store contract and the sled implementation
//! * `model` - user, group and permission documents
//! * `security` - salted password hashing
//! * `config` / `logging` - configuration file and logger setup
//!
//! ## Data Model
//!
//! Relations are stored on one side only. A user document embeds snapshots
//! of its groups and a group document embeds snapshots of its permissions.
//! Reverse lookups use secondary views keyed by the embedded names. There is
//! no referential integrity in the store, so the adapters keep both sides
//! consistent themselves and every multi-document operation is idempotent.

pub mod adapters;
pub mod config;
pub mod db_operations;
pub mod error;
pub mod logging;
pub mod model;
pub mod security;
pub mod source;

pub use adapters::{
    AssignmentAdapter, Credentials, MembershipAdapter, RelationAdapter, RelationBinding,
    RenamePolicy, SourceAdapter,
};
pub use config::{load_config, AuthConfig, ConfigError};
pub use db_operations::{DocumentStore, SledStore, ViewDefinition};
pub use error::{AuthError, AuthResult};
pub use model::{Group, Permission, User};
pub use security::CredentialHasher;
pub use source::AuthSource;
