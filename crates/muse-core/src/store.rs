//! The `ProfileStore` trait.
//!
//! Implemented by storage backends (e.g. `muse-store-sqlite`). The session
//! manager depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::identity::{Identity, UserId};

/// Persists [`Identity`] records keyed by [`UserId`].
///
/// Last write wins; no transactional guarantee is assumed beyond the
/// atomicity of a single record.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait ProfileStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve a profile by id. Returns `None` if it has never been stored.
  fn get<'a>(
    &'a self,
    id: &'a UserId,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;

  /// Insert or replace the profile stored under `identity.id`.
  fn put<'a>(
    &'a self,
    identity: &'a Identity,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
