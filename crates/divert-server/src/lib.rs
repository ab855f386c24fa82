//! Divert back office server library.
//!
//! Core functionality for the Divert back office:
//! - SQLite storage for accounts, sessions, work orders, links, numbers,
//!   announcements and diverted traffic
//! - Session tokens and password hashing
//! - Ownership rules and the per-account link quota
//! - Form cleaning and list pagination
//! - The axum page and admin routes

pub mod access;
pub mod accounts;
pub mod auth;
pub mod forms;
pub mod listing;
pub mod server;
pub mod storage;
