//! SQLite storage for the Divert server.
//!
//! Provides persistence for accounts, sessions, flash messages, work orders,
//! links, numbers, announcements and the diversion subsystem.

mod db;
mod filter;
mod models;
mod queries_accounts;
mod queries_announcements;
mod queries_diversion;
mod queries_links;
mod queries_numbers;
mod queries_sessions;
mod queries_work_orders;


pub use db::{Database, DatabaseError};
pub use filter::{Condition, ListFilter};
pub use models::*;
pub use queries_accounts::{AccountParams, AccountUpdate};
pub use queries_announcements::AnnouncementParams;
pub use queries_diversion::{RuleParams, TrafficParams};
pub use queries_links::LinkParams;
pub use queries_numbers::NumberParams;
pub use queries_sessions::FlashLevel;
pub use queries_work_orders::WorkOrderParams;
