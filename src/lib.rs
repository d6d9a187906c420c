//! Email-based account model for Pleiades users.
//!
//! [`account::AccountManager`] creates accounts and superusers on top of an
//! explicit [`account::AccountStore`] and [`crypto::CredentialService`].
#![forbid(unsafe_code)]
#![deny(unused_mut)]

pub mod account;
pub mod config;
pub mod crypto;
pub mod database;
pub mod error;
pub mod telemetry;

use std::sync::Arc;

pub use account::{Account, AccountManager, PermissionFlags, Principal};
pub use error::{AccountError, Result, StoreError};

/// Initialize an [`AccountManager`] backed by PostgreSQL.
///
/// `database_url` takes precedence over the `postgres` configuration entry.
/// Migrations are executed before returning.
pub async fn initialize(
    config: &config::Configuration,
    database_url: Option<&str>,
) -> std::result::Result<AccountManager, Box<dyn std::error::Error>> {
    let db = match (database_url, &config.postgres) {
        (Some(url), _) => {
            let pool_size = config
                .postgres
                .as_ref()
                .and_then(|cfg| cfg.pool_size)
                .unwrap_or(database::DEFAULT_POOL_SIZE);
            database::Database::connect(url, pool_size).await?
        },
        (None, Some(cfg)) => database::Database::from_config(cfg).await?,
        (None, None) => {
            return Err("missing `postgres` entry on configuration file".into());
        },
    };

    // execute migrations scripts on start.
    db.migrate().await?;

    let credentials = crypto::PasswordManager::new(config.argon2.clone())?;
    telemetry::describe_metrics();

    Ok(AccountManager::new(
        Arc::new(account::PgAccountStore::new(db.postgres)),
        Arc::new(credentials),
    ))
}
