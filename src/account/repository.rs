//! Handle database requests.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::account::Account;
use crate::error::StoreError;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Port for account persistence.
///
/// Implementations must reject a second account with the same `email`, and
/// a superuser account that is not staff.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account and return it with its assigned `id`.
    async fn insert(&self, account: &Account) -> StoreResult<Account>;

    /// Overwrite every mutable field of an existing account.
    async fn update(&self, account: &Account) -> StoreResult<()>;

    /// Find an account using `id` field.
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Account>>;

    /// Find an account using `email` field. Exact match.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// Delete an account.
    async fn delete(&self, id: i64) -> StoreResult<()>;
}

const SELECT_ACCOUNT: &str = r#"SELECT id, email, password, full_name, nick_name,
    is_active, is_staff, is_superuser, joined, last_login
    FROM accounts"#;

/// PostgreSQL account store.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: Pool<Postgres>,
}

impl PgAccountStore {
    /// Create a new [`PgAccountStore`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn insert(&self, account: &Account) -> StoreResult<Account> {
        let account = sqlx::query_as::<_, Account>(
            r#"INSERT INTO accounts (email, password, full_name, nick_name,
                is_active, is_staff, is_superuser, joined, last_login)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING id, email, password, full_name, nick_name,
                is_active, is_staff, is_superuser, joined, last_login"#,
        )
        .bind(&account.email)
        .bind(&account.password)
        .bind(&account.full_name)
        .bind(&account.nick_name)
        .bind(account.is_active)
        .bind(account.is_staff)
        .bind(account.is_superuser)
        .bind(account.joined)
        .bind(account.last_login)
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }

    async fn update(&self, account: &Account) -> StoreResult<()> {
        let result = sqlx::query(
            r#"UPDATE accounts
                SET email = $1, password = $2, full_name = $3, nick_name = $4,
                is_active = $5, is_staff = $6, is_superuser = $7, last_login = $8
                WHERE id = $9"#,
        )
        .bind(&account.email)
        .bind(&account.password)
        .bind(&account.full_name)
        .bind(&account.nick_name)
        .bind(account.is_active)
        .bind(account.is_staff)
        .bind(account.is_superuser)
        .bind(account.last_login)
        .bind(account.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Account>> {
        Ok(
            sqlx::query_as::<_, Account>(&format!("{SELECT_ACCOUNT} WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(
            sqlx::query_as::<_, Account>(&format!("{SELECT_ACCOUNT} WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query(r#"DELETE FROM accounts WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}
