//! Credential logics.
//!
//! Passwords are hashed with Argon2id and stored as PHC strings. An account
//! without a password receives an *unusable* credential: a `!` followed by
//! random characters, which can never be produced by the hasher and therefore
//! never verifies.

use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Argon2, Params, Version};
use rand::distributions::{Alphanumeric, DistString};
use rand::rngs::OsRng;
use validator::ValidationErrors;

use crate::config::Argon2 as ArgonConfig;
use crate::error::field_error;

/// Prefix marking a credential that can never verify.
pub const UNUSABLE_PASSWORD_PREFIX: &str = "!";
const UNUSABLE_PASSWORD_SUFFIX_LENGTH: usize = 40;

type Result<T> = std::result::Result<T, CryptoError>;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("argon2 error: {0}")]
    Argon2(String),
}

/// Port for password hashing, consumed by accounts and their manager.
pub trait CredentialService: Send + Sync {
    /// Hash a plaintext password into its stored representation.
    fn hash_password(&self, password: &str) -> Result<String>;

    /// Verify a plaintext password against a stored representation.
    fn verify_password(
        &self,
        password: &str,
        encoded: &str,
    ) -> std::result::Result<(), ValidationErrors>;

    /// Whether a stored hash was produced with other parameters than the
    /// current ones.
    fn needs_rehash(&self, encoded: &str) -> bool;

    /// Produce a credential that no password can match.
    fn unusable_password(&self) -> String {
        format!(
            "{UNUSABLE_PASSWORD_PREFIX}{}",
            Alphanumeric.sample_string(&mut OsRng, UNUSABLE_PASSWORD_SUFFIX_LENGTH)
        )
    }

    /// Hash `password`, or produce an unusable credential when there is
    /// none.
    fn make_password(&self, password: Option<&str>) -> Result<String> {
        match password {
            Some(password) => self.hash_password(password),
            None => Ok(self.unusable_password()),
        }
    }
}

/// Whether a stored credential may ever verify.
pub fn is_password_usable(encoded: &str) -> bool {
    !encoded.is_empty() && !encoded.starts_with(UNUSABLE_PASSWORD_PREFIX)
}

/// Password manager that uses Argon2id and PHC string format for hashing and
/// verification.
pub struct PasswordManager {
    params: Params,
}

impl PasswordManager {
    /// Create a new [`PasswordManager`].
    pub fn new(config: Option<ArgonConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();

        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            Some(config.hash_length),
        )
        .map_err(|err| CryptoError::Argon2(err.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
    }

    fn invalid_password() -> ValidationErrors {
        field_error("password", "invalid_password", "Invalid password.")
    }
}

impl CredentialService for PasswordManager {
    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?;

        Ok(hash.to_string())
    }

    fn verify_password(
        &self,
        password: &str,
        encoded: &str,
    ) -> std::result::Result<(), ValidationErrors> {
        if !is_password_usable(encoded) {
            return Err(Self::invalid_password());
        }

        let parsed = PasswordHash::new(encoded)
            .map_err(|_| Self::invalid_password())?;

        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| Self::invalid_password())
    }

    fn needs_rehash(&self, encoded: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(encoded) else {
            return false;
        };

        if parsed.algorithm != argon2::Algorithm::Argon2id.ident()
            || parsed.version != Some(Version::V0x13.into())
        {
            return true;
        }

        match Params::try_from(&parsed) {
            Ok(params) => {
                params.m_cost() != self.params.m_cost()
                    || params.t_cost() != self.params.t_cost()
                    || params.p_cost() != self.params.p_cost()
                    || params.output_len() != self.params.output_len()
            },
            Err(_) => true,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_password_manager() -> PasswordManager {
    PasswordManager::new(Some(ArgonConfig {
        memory_cost: 1024,
        iterations: 1,
        parallelism: 1,
        hash_length: 32,
    }))
    .unwrap()
}
