//! Authentication module for the Divert server.
//!
//! Provides session token management and password hashing.

pub mod claims;
pub mod jwt;
pub mod password;

pub use claims::Claims;
pub use jwt::{IssuedToken, JwtManager};
