//! Typed builder for Account.

use chrono::{DateTime, Utc};

use crate::account::{Account, EmailAddress};

/// Value is missing on [`AccountBuilder`].
#[derive(Debug, Clone)]
pub struct Missing;

/// Value is present on [`AccountBuilder`].
#[derive(Debug, Clone)]
pub struct Present<T>(T);

/// [`Account`] builder. An account cannot be built without an email.
#[derive(Debug, Clone)]
pub struct AccountBuilder<Email> {
    email: Email,
    password: String,
    full_name: String,
    nick_name: String,
    is_active: bool,
    joined: Option<DateTime<Utc>>,
}

impl AccountBuilder<Missing> {
    /// Create a new [`AccountBuilder`].
    pub fn new() -> Self {
        Self {
            email: Missing,
            password: String::default(),
            full_name: String::default(),
            nick_name: String::default(),
            is_active: true,
            joined: None,
        }
    }

    /// Update `email` field on [`AccountBuilder`].
    pub fn email(self, email: EmailAddress) -> AccountBuilder<Present<EmailAddress>> {
        AccountBuilder {
            email: Present(email),
            password: self.password,
            full_name: self.full_name,
            nick_name: self.nick_name,
            is_active: self.is_active,
            joined: self.joined,
        }
    }
}

impl Default for AccountBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Email> AccountBuilder<Email> {
    /// Update `password` field on [`AccountBuilder`].
    ///
    /// Expects an already encoded credential.
    pub fn password(mut self, encoded: impl Into<String>) -> Self {
        self.password = encoded.into();
        self
    }

    /// Update `full_name` field on [`AccountBuilder`].
    pub fn full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    /// Update `nick_name` field on [`AccountBuilder`].
    pub fn nick_name(mut self, nick_name: impl Into<String>) -> Self {
        self.nick_name = nick_name.into();
        self
    }

    /// Update `is_active` field on [`AccountBuilder`].
    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Override the join date, which otherwise is the build time.
    pub fn joined(mut self, joined: DateTime<Utc>) -> Self {
        self.joined = Some(joined);
        self
    }
}

impl AccountBuilder<Present<EmailAddress>> {
    /// Build an [`Account`] without any privilege.
    pub fn build(self) -> Account {
        let AccountBuilder {
            email: Present(email),
            password,
            full_name,
            nick_name,
            is_active,
            joined,
        } = self;

        Account {
            id: 0,
            email: email.into_inner(),
            password,
            full_name,
            nick_name,
            is_active,
            is_staff: false,
            is_superuser: false,
            joined: joined.unwrap_or_else(Utc::now),
            last_login: None,
        }
    }
}
