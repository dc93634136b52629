//! Credential handling
//!
//! Password hashing lives here and nowhere else. It has no interaction with
//! the relationship adapters; only the [`User`](crate::model::User) entity and
//! the [`AuthSource`](crate::AuthSource) facade call into it.

pub mod password;

pub use password::CredentialHasher;
