//! Email logic management.

use std::fmt;

use validator::{ValidateLength, ValidationErrors};

use crate::account::{Account, Principal};
use crate::error::field_error;

/// Maximum length of an email, in characters.
pub const MAX_EMAIL_LENGTH: u64 = 255;

/// Value object of a normalized, non-empty email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Converts a string into a normalized [`EmailAddress`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if the string is empty, only made of whitespace, or
    /// longer than [`MAX_EMAIL_LENGTH`] characters once normalized.
    pub fn parse(email: &str) -> Result<Self, ValidationErrors> {
        if email.trim().is_empty() {
            return Err(field_error(
                Account::USERNAME_FIELD,
                "required",
                "Users must have an email address.",
            ));
        }

        let email = normalize_email(email);
        if !email.validate_length(None, Some(MAX_EMAIL_LENGTH), None) {
            return Err(field_error(
                Account::USERNAME_FIELD,
                "length",
                "Email must not exceed 255 characters.",
            ));
        }

        Ok(Self(email))
    }

    /// Returns the same string as a string slice `&str`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner value.
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Lowercase the domain part of an email address.
///
/// The local part is case-sensitive and kept as is. Strings without an `@`
/// are returned unchanged.
pub fn normalize_email(email: &str) -> String {
    match email.trim().rsplit_once('@') {
        Some((name, domain)) => format!("{name}@{}", domain.to_lowercase()),
        None => email.to_owned(),
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
