//! Account creation rules shared by the CLI and the admin panel.

use tracing::info;

use crate::auth::password::hash_password;
use crate::storage::{Account, AccountParams, Database, DatabaseError};

/// Stored in place of a hash when an account is created without a password.
/// It never parses as a PHC string, so no password verifies against it.
pub const UNUSABLE_PASSWORD: &str = "!";

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("A name is required")]
    NameRequired,

    #[error("A superuser must have is_staff set")]
    SuperuserNotStaff,

    #[error("A superuser must have is_superuser set")]
    SuperuserFlagCleared,

    #[error("An account named {0:?} already exists")]
    NameTaken(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for AccountError {
    fn from(e: DatabaseError) -> Self {
        Self::Database(e)
    }
}

/// Requested account fields; `None` keeps the default.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub name: String,
    pub password: Option<String>,
    pub level: Option<i64>,
    pub link_quota: Option<i64>,
    pub expires_at: Option<i64>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

impl NewAccount {
    pub fn new(name: impl Into<String>, password: Option<&str>) -> Self {
        Self {
            name: name.into(),
            password: password.map(String::from),
            ..Self::default()
        }
    }
}

/// Create a regular account. The password is stored hashed.
pub async fn create_account(db: &Database, new: NewAccount) -> Result<Account, AccountError> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(AccountError::NameRequired);
    }

    let password_hash = match new.password.as_deref() {
        Some(pw) => hash_password(pw).map_err(|e| AccountError::Hash(e.to_string()))?,
        None => UNUSABLE_PASSWORD.to_string(),
    };

    let mut params = AccountParams::new(name, password_hash);
    if let Some(level) = new.level {
        params.level = level;
    }
    if let Some(quota) = new.link_quota {
        params.link_quota = quota;
    }
    params.expires_at = new.expires_at;
    params.is_active = new.is_active.unwrap_or(true);
    params.is_staff = new.is_staff.unwrap_or(false);
    params.is_superuser = new.is_superuser.unwrap_or(false);

    let account = db.create_account(&params).await.map_err(|e| match e {
        DatabaseError::Conflict(_) => AccountError::NameTaken(name.to_string()),
        other => AccountError::Database(other),
    })?;

    info!(
        account_id = account.id,
        name = %account.name,
        is_superuser = account.is_superuser,
        "Account created"
    );
    Ok(account)
}

/// Create a superuser: staff and superuser flags on, level 9 unless given.
pub async fn create_superuser(db: &Database, mut new: NewAccount) -> Result<Account, AccountError> {
    let is_staff = *new.is_staff.get_or_insert(true);
    let is_superuser = *new.is_superuser.get_or_insert(true);
    new.level.get_or_insert(9);

    if !is_staff {
        return Err(AccountError::SuperuserNotStaff);
    }
    if !is_superuser {
        return Err(AccountError::SuperuserFlagCleared);
    }
    create_account(db, new).await
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;

    #[tokio::test]
    async fn regular_account_defaults() {
        let db = Database::open_in_memory().await.unwrap();
        let a = create_account(&db, NewAccount::new("alice", Some("pw-alice-1")))
            .await
            .unwrap();
        assert_eq!(a.level, 1);
        assert_eq!(a.link_quota, 10);
        assert!(a.is_active);
        assert!(!a.is_staff);
        assert!(!a.is_superuser);
        assert_eq!(a.expires_at, a.created_at);
        assert!(verify_password("pw-alice-1", &a.password_hash).unwrap());
    }

    #[tokio::test]
    async fn name_is_required() {
        let db = Database::open_in_memory().await.unwrap();
        let err = create_account(&db, NewAccount::new("  ", Some("x")))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::NameRequired));
    }

    #[tokio::test]
    async fn duplicate_name_is_reported() {
        let db = Database::open_in_memory().await.unwrap();
        create_account(&db, NewAccount::new("bob", None)).await.unwrap();
        let err = create_account(&db, NewAccount::new("bob", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::NameTaken(ref n) if n == "bob"));
    }

    #[tokio::test]
    async fn passwordless_account_cannot_verify() {
        let db = Database::open_in_memory().await.unwrap();
        let a = create_account(&db, NewAccount::new("carol", None))
            .await
            .unwrap();
        assert_eq!(a.password_hash, UNUSABLE_PASSWORD);
        assert!(verify_password("", &a.password_hash).is_err());
    }

    #[tokio::test]
    async fn superuser_flags_and_level() {
        let db = Database::open_in_memory().await.unwrap();
        let root = create_superuser(&db, NewAccount::new("root", Some("pw-root-1")))
            .await
            .unwrap();
        assert!(root.is_staff);
        assert!(root.is_superuser);
        assert_eq!(root.level, 9);

        let mut custom = NewAccount::new("ops", None);
        custom.level = Some(5);
        assert_eq!(create_superuser(&db, custom).await.unwrap().level, 5);
    }

    #[tokio::test]
    async fn superuser_rejects_cleared_flags() {
        let db = Database::open_in_memory().await.unwrap();

        let mut not_staff = NewAccount::new("a", None);
        not_staff.is_staff = Some(false);
        assert!(matches!(
            create_superuser(&db, not_staff).await.unwrap_err(),
            AccountError::SuperuserNotStaff
        ));

        let mut not_super = NewAccount::new("b", None);
        not_super.is_superuser = Some(false);
        assert!(matches!(
            create_superuser(&db, not_super).await.unwrap_err(),
            AccountError::SuperuserFlagCleared
        ));
    }
}
