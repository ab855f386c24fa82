//! SQLite database for the Divert server.

pub use divert_core::db::DatabaseError;

divert_core::define_database!(Database, "Divert database migrations complete");
