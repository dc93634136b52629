//! Argon2id password hashing
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=..,t=..,p=..$<salt>$<hash>`), so
//! the salt and cost parameters travel with the hash. Verification re-derives
//! the hash from the embedded salt and compares the outputs.

use crate::config::HasherConfig;
use crate::error::{AuthError, AuthResult};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

/// Stateless salted one-way password hasher
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher").finish_non_exhaustive()
    }
}

impl CredentialHasher {
    /// Build a hasher with the configured cost parameters
    pub fn new(config: &HasherConfig) -> AuthResult<Self> {
        config.validate()?;
        let params = Params::new(
            config.memory_cost_kib,
            config.time_cost,
            config.parallelism,
            None,
        )
        .map_err(|e| AuthError::Credential(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Generate a fresh random salt in PHC base64 form
    pub fn generate_salt() -> String {
        SaltString::generate(&mut OsRng).as_str().to_string()
    }

    /// Hash `password`, generating a salt when none is given.
    ///
    /// The returned string embeds the salt and parameters.
    pub fn hash(&self, password: &str, salt: Option<&str>) -> AuthResult<String> {
        let salt = match salt {
            Some(s) => SaltString::from_b64(s)
                .map_err(|e| AuthError::Credential(format!("Invalid salt: {}", e)))?,
            None => SaltString::generate(&mut OsRng),
        };

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Credential(format!("Password hashing failed: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Check `password` against a hash produced by [`CredentialHasher::hash`].
    ///
    /// Malformed hashes never verify.
    pub fn verify(&self, hash: &str, password: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Stored password hash is malformed: {}", e);
                return false;
            }
        };
        let params = match Params::try_from(&parsed) {
            Ok(params) => params,
            Err(e) => {
                log::warn!("Stored password hash has invalid parameters: {}", e);
                return false;
            }
        };
        let (Some(salt), Some(expected)) = (parsed.salt, parsed.hash) else {
            return false;
        };

        match self.argon2.hash_password_customized(
            password.as_bytes(),
            Some(parsed.algorithm),
            parsed.version,
            params,
            salt,
        ) {
            Ok(recomputed) => recomputed.hash == Some(expected),
            Err(e) => {
                log::warn!("Password re-derivation failed: {}", e);
                false
            }
        }
    }
}
