//! Entity definitions
//!
//! Three document shapes: [`User`] embeds [`Group`] snapshots, [`Group`]
//! embeds [`Permission`] snapshots, and [`Permission`] embeds nothing.
//! Relations are stored on one side only; reverse lookups go through store
//! views.

pub mod entity;
mod group;
mod permission;
mod user;

pub use entity::{DocMeta, Entity, Holds, DOC_TYPE_FIELD};
pub use group::Group;
pub use permission::Permission;
pub use user::User;
