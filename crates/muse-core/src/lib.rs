//! Core types and trait definitions for the Muse session layer.
//!
//! This crate is deliberately free of database and HTTP dependencies. It
//! defines the user record, the error taxonomy, and the two collaborators the
//! session manager talks to: a credential provider and a profile store.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod credential;
pub mod error;
pub mod identity;
pub mod store;

pub use error::{AuthError, AuthErrorKind, Error, ProviderError, Result};
