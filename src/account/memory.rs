//! Process-local account store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::account::{Account, AccountStore, StoreResult};
use crate::error::StoreError;

/// Length of the `VARCHAR` columns of the `accounts` table.
const MAX_COLUMN_LENGTH: usize = 255;

/// In-memory [`AccountStore`], enforcing the same constraints as the
/// PostgreSQL schema.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    accounts: BTreeMap<i64, Account>,
}

impl Inner {
    fn check(&self, account: &Account) -> StoreResult<()> {
        for (field, value) in [
            ("email", &account.email),
            ("full_name", &account.full_name),
            ("nick_name", &account.nick_name),
        ] {
            if value.chars().count() > MAX_COLUMN_LENGTH {
                return Err(StoreError::ValueTooLong {
                    field,
                    max: MAX_COLUMN_LENGTH,
                });
            }
        }

        if account.is_superuser && !account.is_staff {
            return Err(StoreError::SuperuserWithoutStaff);
        }

        let taken = self
            .accounts
            .values()
            .any(|other| other.id != account.id && other.email == account.email);
        if taken {
            return Err(StoreError::Duplicate {
                email: account.email.clone(),
            });
        }

        Ok(())
    }
}

impl MemoryAccountStore {
    /// Create a new, empty [`MemoryAccountStore`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub async fn len(&self) -> usize {
        self.inner.read().await.accounts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn insert(&self, account: &Account) -> StoreResult<Account> {
        let mut inner = self.inner.write().await;

        let mut account = account.clone();
        account.id = inner.last_id + 1;
        inner.check(&account)?;

        inner.last_id = account.id;
        inner.accounts.insert(account.id, account.clone());

        Ok(account)
    }

    async fn update(&self, account: &Account) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.check(account)?;

        let stored = inner
            .accounts
            .get_mut(&account.id)
            .ok_or(StoreError::NotFound)?;
        let joined = stored.joined;
        *stored = Account {
            joined,
            ..account.clone()
        };

        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Account>> {
        Ok(self.inner.read().await.accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .inner
            .read()
            .await
            .accounts
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .accounts
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}
