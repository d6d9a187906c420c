//! Error handler for accounts.

use sqlx::Error as SQLxError;
use thiserror::Error;
use validator::ValidationErrors;

use crate::crypto::CryptoError;

pub type Result<T> = std::result::Result<T, AccountError>;

/// Enum representing account-level errors.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl AccountError {
    /// Whether the underlying store rejected a duplicated email.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, AccountError::Store(err) if err.is_unique_violation())
    }
}

/// Errors raised by an [`crate::account::AccountStore`] implementation.
///
/// They are never recovered locally and reach the caller unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQL request failed: {0}")]
    Sql(#[from] SQLxError),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("an account with email {email:?} already exists")]
    Duplicate { email: String },

    #[error("account not found")]
    NotFound,

    #[error("superuser account must also be staff")]
    SuperuserWithoutStaff,

    #[error("value of {field:?} exceeds {max} characters")]
    ValueTooLong { field: &'static str, max: usize },
}

impl StoreError {
    /// Check whether the error is a unique constraint violation, whatever
    /// the backend.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::Duplicate { .. } => true,
            StoreError::Sql(err) => err
                .as_database_error()
                .is_some_and(|e| e.is_unique_violation()),
            _ => false,
        }
    }
}

/// Build a single-field [`ValidationErrors`].
pub(crate) fn field_error(
    field: &'static str,
    code: &'static str,
    message: &'static str,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        field,
        validator::ValidationError::new(code).with_message(message.into()),
    );
    errors
}
