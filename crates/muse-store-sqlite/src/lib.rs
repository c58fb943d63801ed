//! SQLite backend for the Muse session layer.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One database file holds both the
//! profile store ([`SqliteStore`]) and the local email/password accounts
//! behind [`LocalCredentials`].

mod credentials;
mod encode;
mod schema;
mod store;

pub mod error;

pub use credentials::LocalCredentials;
pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
