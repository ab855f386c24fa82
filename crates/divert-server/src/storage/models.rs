//! Data models for Divert storage.

use serde::{Deserialize, Serialize};

use divert_core::db::unix_timestamp;

/// `status` values shared by work orders, links and numbers.
pub const STATUS_CHOICES: &[(i64, &str)] = &[(0, "Disabled"), (1, "Enabled")];

/// `order_type` / `number_type` values.
pub const TYPE_CHOICES: &[(i64, &str)] = &[(1, "Type 1"), (2, "Type 2"), (3, "Type 3")];

/// Countries a link can be delivered to.
pub const COUNTRY_CHOICES: &[(&str, &str)] = &[
    ("CN", "China"),
    ("US", "United States"),
    ("JP", "Japan"),
    ("KR", "South Korea"),
    ("UK", "United Kingdom"),
];

/// Records with exactly one owning account.
pub trait Owned {
    fn owner_id(&self) -> i64;
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub level: i64,
    pub link_quota: i64,
    pub created_at: i64,
    pub expires_at: i64,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub last_login: Option<i64>,
}

impl Account {
    /// Membership has lapsed. Informational only: no access check reads it.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_timestamp())
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            name: self.name.clone(),
            level: self.level,
            link_quota: self.link_quota,
            created_at: self.created_at,
            expires_at: self.expires_at,
            is_expired: self.is_expired(),
            is_active: self.is_active,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
            last_login: self.last_login,
        }
    }
}

/// Account as rendered to clients, with the derived expiry flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: i64,
    pub name: String,
    pub level: i64,
    pub link_quota: i64,
    pub created_at: i64,
    pub expires_at: i64,
    pub is_expired: bool,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub last_login: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: String,
    pub account_id: i64,
    pub token_hash: String,
    pub expires_at: i64,
    pub revoked: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FlashMessage {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub session_id: String,
    pub level: String,
    pub message: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkOrder {
    pub id: i64,
    pub owner_id: i64,
    pub order_type: i64,
    pub name: String,
    pub order_url: String,
    pub start_time: i64,
    pub end_time: i64,
    pub num_type: i64,
    pub all_count: i64,
    pub current_count: i64,
    pub ratio: i64,
    pub order_acct: String,
    pub order_psw: String,
    pub num_size: i64,
    pub status: i64,
}

impl Owned for WorkOrder {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Link {
    pub id: i64,
    pub owner_id: i64,
    pub work_order_id: Option<i64>,
    pub country: String,
    pub identifier: String,
    pub description: String,
    pub status: i64,
    pub created_at: i64,
}

impl Owned for Link {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Number {
    pub id: i64,
    pub owner_id: i64,
    pub work_order_id: Option<i64>,
    pub link_id: Option<i64>,
    pub number_type: i64,
    pub num: String,
    pub visit_count: i64,
    pub valid_count: i64,
    pub status: i64,
    pub created_at: i64,
}

impl Owned for Number {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DivertedTraffic {
    pub id: i64,
    pub source_ip: String,
    pub destination: String,
    pub timestamp: i64,
    pub user_agent: Option<String>,
    pub processed_by: Option<i64>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DivertRule {
    pub id: i64,
    pub name: String,
    pub source_pattern: String,
    pub destination: String,
    pub priority: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub created_by: Option<i64>,
}
