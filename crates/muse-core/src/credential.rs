//! The `CredentialProvider` trait.
//!
//! A credential provider verifies who someone is and remembers that they are
//! signed in across process restarts. It knows nothing about roles, themes or
//! any other profile data.

use std::future::Future;

use tokio::sync::watch;

use crate::{error::ProviderError, identity::RawIdentity};

/// Stream of the provider's persisted credential state. The value present
/// when the receiver is handed out is the state found at process start; every
/// later sign-in, registration or revoke replaces it. Dropping the receiver
/// unsubscribes.
pub type CredentialChanges = watch::Receiver<Option<RawIdentity>>;

pub trait CredentialProvider: Send + Sync {
  /// Run the provider's Google flow.
  fn verify_google(
    &self,
  ) -> impl Future<Output = Result<RawIdentity, ProviderError>> + Send + '_;

  /// Check an email/password pair. Both are opaque to the caller.
  fn verify_email_password<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<RawIdentity, ProviderError>> + Send + 'a;

  /// Create a new email/password account and sign it in.
  fn register<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
    display_name: &'a str,
  ) -> impl Future<Output = Result<RawIdentity, ProviderError>> + Send + 'a;

  /// Forget the persisted credential.
  fn revoke(&self) -> impl Future<Output = Result<(), ProviderError>> + Send + '_;

  /// Subscribe to credential state changes.
  fn on_change(&self) -> CredentialChanges;
}
