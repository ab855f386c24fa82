//! Ownership and quota checks applied before every record operation.

use crate::storage::{Account, Owned};

/// Record families guarded by ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Link,
    WorkOrder,
    Number,
}

impl RecordKind {
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::WorkOrder => "work order",
            Self::Number => "number",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Edit,
    Delete,
}

impl Action {
    const fn verb(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("{0}")]
    Forbidden(String),

    #[error("Link quota of {quota} reached")]
    QuotaExceeded { quota: i64 },
}

/// The owner or any superuser may act on a record.
pub fn can_access<T: Owned>(account: &Account, record: &T) -> bool {
    record.owner_id() == account.id || account.is_superuser
}

/// Hand back `record` if `account` may perform `action` on it.
pub fn authorize<T: Owned>(
    account: &Account,
    record: T,
    kind: RecordKind,
    action: Action,
) -> Result<T, AccessError> {
    if can_access(account, &record) {
        Ok(record)
    } else {
        Err(AccessError::Forbidden(forbidden_message(kind, action)))
    }
}

pub fn forbidden_message(kind: RecordKind, action: Action) -> String {
    format!(
        "You do not have permission to {} this {}.",
        action.verb(),
        kind.noun()
    )
}

/// Reject when `owned` links already fill the account's quota.
pub fn check_link_quota(account: &Account, owned: i64) -> Result<(), AccessError> {
    if owned >= account.link_quota {
        return Err(AccessError::QuotaExceeded {
            quota: account.link_quota,
        });
    }
    Ok(())
}

pub fn quota_message(quota: i64) -> String {
    format!("You have reached your link quota ({quota}). Delete a link before adding another.")
}

/// Owner restriction for admin listings: `None` means every owner.
pub fn admin_scope(account: &Account) -> Option<i64> {
    (!account.is_superuser).then_some(account.id)
}
