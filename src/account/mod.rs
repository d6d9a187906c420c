mod builder;
mod email;
mod manager;
mod memory;
mod repository;

pub use builder::*;
pub use email::*;
pub use manager::*;
pub use memory::*;
pub use repository::*;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{self, CredentialService, CryptoError};

/// Account as saved on database.
///
/// `email` is the sole login identifier.
#[derive(Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    pub full_name: String,
    pub nick_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            id: 0,
            email: String::default(),
            password: String::default(),
            full_name: String::default(),
            nick_name: String::default(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            joined: Utc::now(),
            last_login: None,
        }
    }
}

impl Account {
    /// Start building a new [`Account`].
    pub fn builder() -> AccountBuilder<Missing> {
        AccountBuilder::new()
    }

    pub fn get_full_name(&self) -> &str {
        &self.full_name
    }

    pub fn get_short_name(&self) -> &str {
        &self.nick_name
    }

    /// Hash and store `password`. `None` sets an unusable password.
    ///
    /// Nothing is persisted.
    pub fn set_password(
        &mut self,
        credentials: &dyn CredentialService,
        password: Option<&str>,
    ) -> Result<(), CryptoError> {
        self.password = credentials.make_password(password)?;
        Ok(())
    }

    /// Mark the account as having no password at all.
    pub fn set_unusable_password(&mut self, credentials: &dyn CredentialService) {
        self.password = credentials.unusable_password();
    }

    /// Check `password` against the stored credential.
    pub fn check_password(
        &self,
        credentials: &dyn CredentialService,
        password: &str,
    ) -> bool {
        credentials.verify_password(password, &self.password).is_ok()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.email, self.full_name)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .field("nick_name", &self.nick_name)
            .field("is_active", &self.is_active)
            .field("is_staff", &self.is_staff)
            .field("is_superuser", &self.is_superuser)
            .field("joined", &self.joined)
            .field("last_login", &self.last_login)
            .finish()
    }
}

/// An authenticatable identity.
pub trait Principal {
    /// Name of the field used as login identifier.
    const USERNAME_FIELD: &'static str;

    /// Login identifier.
    fn username(&self) -> &str;

    /// Stored credential material. Never plaintext.
    fn password_hash(&self) -> &str;

    fn has_usable_password(&self) -> bool {
        crypto::is_password_usable(self.password_hash())
    }
}

/// Authorization flags read by a permission system.
pub trait PermissionFlags {
    fn is_active(&self) -> bool;
    fn is_staff(&self) -> bool;
    fn is_superuser(&self) -> bool;

    /// Whether the administration interface may be entered.
    fn can_access_admin(&self) -> bool {
        self.is_active() && self.is_staff()
    }
}

impl Principal for Account {
    const USERNAME_FIELD: &'static str = "email";

    fn username(&self) -> &str {
        &self.email
    }

    fn password_hash(&self) -> &str {
        &self.password
    }
}

impl PermissionFlags for Account {
    fn is_active(&self) -> bool {
        self.is_active
    }

    fn is_staff(&self) -> bool {
        self.is_staff
    }

    fn is_superuser(&self) -> bool {
        self.is_superuser
    }
}
