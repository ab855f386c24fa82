//! Account queries.

use divert_core::db::unix_timestamp;

use super::db::{Database, DatabaseError};
use super::filter::{self, ListFilter};
use super::models::Account;

/// Parameters for creating an account.
#[derive(Debug, Clone)]
pub struct AccountParams {
    pub name: String,
    pub password_hash: String,
    pub level: i64,
    pub link_quota: i64,
    /// Membership expiry; defaults to the creation instant.
    pub expires_at: Option<i64>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl AccountParams {
    pub fn new(name: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password_hash: password_hash.into(),
            level: 1,
            link_quota: 10,
            expires_at: None,
            is_active: true,
            is_staff: false,
            is_superuser: false,
        }
    }
}

/// Editable membership and permission fields.
#[derive(Debug, Clone)]
pub struct AccountUpdate {
    pub level: i64,
    pub link_quota: i64,
    pub expires_at: i64,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl Database {
    // =========================================================================
    // Account queries
    // =========================================================================

    /// Create a new account.
    pub async fn create_account(&self, params: &AccountParams) -> Result<Account, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT INTO accounts (name, password_hash, level, link_quota, created_at, expires_at, is_active, is_staff, is_superuser) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&params.name)
        .bind(&params.password_hash)
        .bind(params.level)
        .bind(params.link_quota)
        .bind(now)
        .bind(params.expires_at.unwrap_or(now))
        .bind(params.is_active)
        .bind(params.is_staff)
        .bind(params.is_superuser)
        .execute(self.pool())
        .await?;

        self.get_account(result.last_insert_rowid()).await
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: i64) -> Result<Account, DatabaseError> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Account {id}")))
    }

    /// Get an account by its unique name.
    pub async fn get_account_by_name(&self, name: &str) -> Result<Account, DatabaseError> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE name = ?")
            .bind(name)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Account with name {name}")))
    }

    /// Overwrite membership and permission fields.
    pub async fn update_account(
        &self,
        id: i64,
        update: &AccountUpdate,
    ) -> Result<Account, DatabaseError> {
        let result = sqlx::query(
            "UPDATE accounts SET level = ?, link_quota = ?, expires_at = ?, is_active = ?, is_staff = ?, is_superuser = ? WHERE id = ?",
        )
        .bind(update.level)
        .bind(update.link_quota)
        .bind(update.expires_at)
        .bind(update.is_active)
        .bind(update.is_staff)
        .bind(update.is_superuser)
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Account {id}")));
        }
        self.get_account(id).await
    }

    /// Replace the stored password hash.
    pub async fn set_password_hash(&self, id: i64, hash: &str) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE accounts SET password_hash = ? WHERE id = ?")
            .bind(hash)
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Stamp `last_login` with the current time.
    pub async fn record_login(&self, id: i64) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE accounts SET last_login = ? WHERE id = ?")
            .bind(unix_timestamp())
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Delete an account; owned rows cascade, references elsewhere are nulled.
    pub async fn delete_account(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List accounts, newest first.
    pub async fn list_accounts(
        &self,
        filter: &ListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, DatabaseError> {
        self.fetch_matching(&filter::ACCOUNTS, filter, limit, offset)
            .await
    }

    pub async fn count_accounts(&self, filter: &ListFilter) -> Result<i64, DatabaseError> {
        self.count_matching(&filter::ACCOUNTS, filter).await
    }
}
