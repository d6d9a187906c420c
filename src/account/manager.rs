//! Account creation and lifecycle operations.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::account::{Account, AccountStore, EmailAddress, normalize_email};
use crate::crypto::CredentialService;
use crate::error::Result;
use crate::telemetry::{self, Role};

/// Profile fields an account holder may edit.
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[validate(length(max = 255, message = "Full name must not exceed 255 characters."))]
    pub full_name: Option<String>,
    #[validate(length(max = 255, message = "Nick name must not exceed 255 characters."))]
    pub nick_name: Option<String>,
}

/// Account manager.
///
/// Each operation awaits at most one store call per persistence step and
/// surfaces store errors as is.
#[derive(Clone)]
pub struct AccountManager {
    store: Arc<dyn AccountStore>,
    credentials: Arc<dyn CredentialService>,
}

impl AccountManager {
    /// Create a new [`AccountManager`].
    pub fn new(
        store: Arc<dyn AccountStore>,
        credentials: Arc<dyn CredentialService>,
    ) -> Self {
        Self { store, credentials }
    }

    /// Credential service used to hash and verify passwords.
    pub fn credentials(&self) -> &dyn CredentialService {
        self.credentials.as_ref()
    }

    /// Create and save an account with the given email and password.
    ///
    /// Without password, the account receives an unusable credential.
    pub async fn create_user(
        &self,
        email: &str,
        password: Option<&str>,
    ) -> Result<Account> {
        let account = self.insert_user(email, password).await?;

        telemetry::record_account_created(account.id, Role::User);
        Ok(account)
    }

    /// Create and save a superuser with the given email and password.
    pub async fn create_superuser(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Account> {
        let mut account = self.insert_user(email, Some(password)).await?;
        account.is_superuser = true;
        account.is_staff = true;
        self.store.update(&account).await?;

        telemetry::record_account_created(account.id, Role::Superuser);
        Ok(account)
    }

    async fn insert_user(
        &self,
        email: &str,
        password: Option<&str>,
    ) -> Result<Account> {
        let email = EmailAddress::parse(email)?;
        let password = self.credentials.make_password(password)?;

        let account = Account::builder().email(email).password(password).build();
        Ok(self.store.insert(&account).await?)
    }

    /// Find an account by its login identifier, normalized the same way as
    /// on creation.
    pub async fn get_by_natural_key(&self, email: &str) -> Result<Option<Account>> {
        Ok(self.store.find_by_email(&normalize_email(email)).await?)
    }

    /// Return the account matching `email` and `password`, if it is active.
    ///
    /// Outdated password hashes are upgraded and `last_login` is recorded on
    /// success.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Account>> {
        let Some(mut account) =
            self.store.find_by_email(&normalize_email(email)).await?
        else {
            // Hash once anyway so unknown emails take as long as known ones.
            let _ = self.credentials.hash_password(password);
            telemetry::record_authentication("unknown_account");
            return Ok(None);
        };

        if !account.check_password(self.credentials.as_ref(), password) {
            telemetry::record_authentication("invalid_password");
            return Ok(None);
        }

        if !account.is_active {
            telemetry::record_authentication("inactive");
            return Ok(None);
        }

        if self.credentials.needs_rehash(&account.password) {
            account.set_password(self.credentials.as_ref(), Some(password))?;
            tracing::debug!(account_id = account.id, "password hash upgraded");
        }

        account.last_login = Some(Utc::now());
        self.store.update(&account).await?;

        telemetry::record_authentication("success");
        Ok(Some(account))
    }

    /// Replace the password of `account` and save it. `None` makes the
    /// password unusable.
    ///
    /// `account` is left untouched when saving fails.
    pub async fn set_password(
        &self,
        account: &mut Account,
        password: Option<&str>,
    ) -> Result<()> {
        let mut updated = account.clone();
        updated.set_password(self.credentials.as_ref(), password)?;
        self.store.update(&updated).await?;
        *account = updated;

        tracing::info!(account_id = account.id, "password changed");
        Ok(())
    }

    /// Apply profile changes to `account` and save it.
    ///
    /// `account` is left untouched when validation or saving fails.
    pub async fn update_profile(
        &self,
        account: &mut Account,
        profile: Profile,
    ) -> Result<()> {
        profile.validate()?;

        let mut updated = account.clone();
        if let Some(full_name) = profile.full_name {
            updated.full_name = full_name;
        }
        if let Some(nick_name) = profile.nick_name {
            updated.nick_name = nick_name;
        }

        self.store.update(&updated).await?;
        *account = updated;
        Ok(())
    }

    /// Allow or forbid authentication for `account`.
    ///
    /// `account` is left untouched when saving fails.
    pub async fn set_active(&self, account: &mut Account, active: bool) -> Result<()> {
        let updated = Account {
            is_active: active,
            ..account.clone()
        };
        self.store.update(&updated).await?;
        *account = updated;

        tracing::info!(account_id = account.id, active, "account activation changed");
        Ok(())
    }

    /// Delete `account` from the store.
    pub async fn delete(&self, account: Account) -> Result<()> {
        self.store.delete(account.id).await?;

        tracing::info!(account_id = account.id, "account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{MemoryAccountStore, PermissionFlags, Principal};
    use crate::config::Argon2;
    use crate::crypto::{PasswordManager, UNUSABLE_PASSWORD_PREFIX, test_password_manager};
    use crate::error::{AccountError, StoreError};
    use crate::telemetry::test_recorder::CountingRecorder;

    fn manager() -> (AccountManager, Arc<MemoryAccountStore>) {
        let store = Arc::new(MemoryAccountStore::new());
        let manager =
            AccountManager::new(store.clone(), Arc::new(test_password_manager()));
        (manager, store)
    }

    #[tokio::test]
    async fn test_create_user_requires_email() {
        let (manager, store) = manager();

        for email in ["", "  "] {
            let err = manager.create_user(email, Some("password")).await.unwrap_err();
            assert!(matches!(err, AccountError::Validation(_)));
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_user() {
        let (manager, store) = manager();
        let before = Utc::now();

        let account = manager
            .create_user("Ada@PLEIADES.io", Some("correct horse"))
            .await
            .unwrap();

        assert_eq!(account.id, 1);
        assert_eq!(account.email, "Ada@pleiades.io");
        assert!(account.is_active);
        assert!(!account.is_staff);
        assert!(!account.is_superuser);
        assert!(account.joined >= before);
        assert!(account.last_login.is_none());
        assert_ne!(account.password, "correct horse");
        assert!(account.check_password(manager.credentials(), "correct horse"));

        let stored = store.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(stored, account);
    }

    #[tokio::test]
    async fn test_create_user_without_password() {
        let (manager, _) = manager();

        let account = manager.create_user("nopass@pleiades.io", None).await.unwrap();

        assert!(!account.has_usable_password());
        assert!(account.password.starts_with(UNUSABLE_PASSWORD_PREFIX));
        assert!(!account.check_password(manager.credentials(), ""));
        assert!(!account.check_password(manager.credentials(), &account.password));
    }

    #[tokio::test]
    async fn test_create_superuser() {
        let (manager, store) = manager();

        let account = manager
            .create_superuser("root@pleiades.io", "toor")
            .await
            .unwrap();

        assert!(account.is_staff);
        assert!(account.is_superuser);
        assert!(account.can_access_admin());
        assert!(account.check_password(manager.credentials(), "toor"));

        let stored = store.find_by_id(account.id).await.unwrap().unwrap();
        assert!(stored.is_staff);
        assert!(stored.is_superuser);
    }

    #[test]
    fn test_creation_counted_once_per_account() {
        let recorder = CountingRecorder::default();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                let (manager, _) = manager();
                manager.create_superuser("root@pleiades.io", "toor").await.unwrap();
                manager.create_user("ada@pleiades.io", None).await.unwrap();
            })
        });

        assert_eq!(recorder.count("accounts_created_total", "superuser"), 1);
        assert_eq!(recorder.count("accounts_created_total", "user"), 1);
        assert_eq!(recorder.total("accounts_created_total"), 2);
    }

    #[tokio::test]
    async fn test_create_user_email_length() {
        let (manager, store) = manager();
        let domain = "@pleiades.io";

        let longest = format!("{}{domain}", "a".repeat(255 - domain.len()));
        manager.create_user(&longest, None).await.unwrap();

        let too_long = format!("{}{domain}", "b".repeat(256 - domain.len()));
        let err = manager.create_user(&too_long, None).await.unwrap_err();
        assert!(matches!(err, AccountError::Validation(_)));

        let err = manager
            .create_user(&format!("{}@x.io", "a".repeat(300)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Validation(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_superuser_requires_email() {
        let (manager, _) = manager();

        let err = manager.create_superuser("", "toor").await.unwrap_err();
        assert!(matches!(err, AccountError::Validation(_)));
    }

    #[tokio::test]
    async fn test_duplicate_normalized_email() {
        let (manager, store) = manager();

        manager.create_user("bob@example.com", None).await.unwrap();
        let err = manager
            .create_user("bob@EXAMPLE.COM", Some("password"))
            .await
            .unwrap_err();

        assert!(err.is_unique_violation());
        assert!(matches!(
            err,
            AccountError::Store(StoreError::Duplicate { ref email }) if email == "bob@example.com"
        ));
        assert_eq!(store.len().await, 1);

        let err = manager
            .create_superuser("bob@Example.com", "password")
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_get_by_natural_key() {
        let (manager, _) = manager();
        let account = manager.create_user("eve@pleiades.io", None).await.unwrap();

        let found = manager.get_by_natural_key("eve@pleiades.io").await.unwrap();
        assert_eq!(found.map(|a| a.id), Some(account.id));

        let found = manager.get_by_natural_key(" eve@PLEIADES.IO ").await.unwrap();
        assert_eq!(found.map(|a| a.id), Some(account.id));
        assert!(manager.get_by_natural_key("EVE@pleiades.io").await.unwrap().is_none());
        assert!(manager.get_by_natural_key("adam@pleiades.io").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let (manager, store) = manager();
        let account = manager
            .create_user("ada@pleiades.io", Some("correct horse"))
            .await
            .unwrap();

        let logged = manager
            .authenticate("ada@PLEIADES.IO", "correct horse")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(logged.id, account.id);
        assert!(logged.last_login.is_some());
        assert_eq!(
            store.find_by_id(account.id).await.unwrap().unwrap().last_login,
            logged.last_login
        );

        assert!(manager.authenticate("ada@pleiades.io", "wrong").await.unwrap().is_none());
        assert!(manager.authenticate("who@pleiades.io", "correct horse").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_authenticate_inactive_or_unusable() {
        let (manager, _) = manager();

        let mut account = manager
            .create_user("ada@pleiades.io", Some("correct horse"))
            .await
            .unwrap();
        manager.set_active(&mut account, false).await.unwrap();
        assert!(manager.authenticate("ada@pleiades.io", "correct horse").await.unwrap().is_none());

        let nopass = manager.create_user("nopass@pleiades.io", None).await.unwrap();
        assert!(manager.authenticate("nopass@pleiades.io", &nopass.password).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_authenticate_upgrades_hash() {
        let store = Arc::new(MemoryAccountStore::new());
        let old = AccountManager::new(store.clone(), Arc::new(test_password_manager()));
        let account = old.create_user("ada@pleiades.io", Some("pwd")).await.unwrap();

        let stronger = PasswordManager::new(Some(Argon2 {
            memory_cost: 2048,
            iterations: 2,
            parallelism: 1,
            hash_length: 32,
        }))
        .unwrap();
        let new = AccountManager::new(store.clone(), Arc::new(stronger));
        assert!(new.credentials().needs_rehash(&account.password));

        let logged = new.authenticate("ada@pleiades.io", "pwd").await.unwrap().unwrap();
        assert_ne!(logged.password, account.password);
        assert!(!new.credentials().needs_rehash(&logged.password));
        assert!(logged.check_password(new.credentials(), "pwd"));
    }

    #[tokio::test]
    async fn test_set_password() {
        let (manager, store) = manager();
        let mut account = manager.create_user("ada@pleiades.io", None).await.unwrap();

        manager.set_password(&mut account, Some("new secret")).await.unwrap();
        let stored = store.find_by_id(account.id).await.unwrap().unwrap();
        assert!(stored.check_password(manager.credentials(), "new secret"));

        manager.set_password(&mut account, None).await.unwrap();
        let stored = store.find_by_id(account.id).await.unwrap().unwrap();
        assert!(!stored.has_usable_password());
    }

    #[tokio::test]
    async fn test_update_profile() {
        let (manager, store) = manager();
        let mut account = manager.create_user("ada@pleiades.io", None).await.unwrap();

        manager
            .update_profile(
                &mut account,
                Profile {
                    full_name: Some("Ada Lovelace".into()),
                    nick_name: None,
                },
            )
            .await
            .unwrap();

        let stored = store.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(stored.get_full_name(), "Ada Lovelace");
        assert_eq!(stored.get_short_name(), "");
        assert_eq!(stored.to_string(), "ada@pleiades.io (Ada Lovelace)");

        let err = manager
            .update_profile(
                &mut account,
                Profile {
                    full_name: None,
                    nick_name: Some("a".repeat(256)),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Validation(_)));
        assert_eq!(account.nick_name, "");
    }

    #[tokio::test]
    async fn test_failed_save_keeps_account() {
        let (manager, _) = manager();
        let mut ghost = manager.create_user("ghost@pleiades.io", Some("boo")).await.unwrap();
        manager.delete(ghost.clone()).await.unwrap();
        let before = ghost.clone();

        let err = manager.set_password(&mut ghost, Some("new")).await.unwrap_err();
        assert!(matches!(err, AccountError::Store(StoreError::NotFound)));
        assert_eq!(ghost, before);

        let profile = Profile {
            full_name: Some("Casper".into()),
            nick_name: Some("casper".into()),
        };
        let err = manager.update_profile(&mut ghost, profile).await.unwrap_err();
        assert!(matches!(err, AccountError::Store(StoreError::NotFound)));
        assert_eq!(ghost, before);

        let err = manager.set_active(&mut ghost, false).await.unwrap_err();
        assert!(matches!(err, AccountError::Store(StoreError::NotFound)));
        assert_eq!(ghost, before);
    }

    #[tokio::test]
    async fn test_set_active() {
        let (manager, store) = manager();
        let mut account = manager.create_user("ada@pleiades.io", None).await.unwrap();

        manager.set_active(&mut account, false).await.unwrap();
        assert!(!account.is_active);
        assert!(!store.find_by_id(account.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_delete() {
        let (manager, store) = manager();
        let account = manager.create_user("ada@pleiades.io", None).await.unwrap();

        manager.delete(account.clone()).await.unwrap();
        assert!(store.is_empty().await);
        assert!(matches!(
            manager.delete(account).await,
            Err(AccountError::Store(StoreError::NotFound))
        ));
    }
}
