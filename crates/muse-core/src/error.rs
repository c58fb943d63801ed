//! Error types for `muse-core`.
//!
//! [`AuthError`] is what every session operation fails with. Its
//! [`AuthErrorKind`] is the classified taxonomy callers branch on; provider
//! failures arrive as a [`ProviderError`] carrying the provider's own code and
//! are classified by [`AuthErrorKind::from_provider_code`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Core errors ─────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown theme: {0:?}")]
  UnknownTheme(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Taxonomy ────────────────────────────────────────────────────────────────

/// Classified reason a session operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorKind {
  /// Bad email/password pair, or a malformed email address.
  InvalidCredentials,
  AccountDisabled,
  AccountNotFound,
  AccountAlreadyExists,
  WeakCredential,
  /// The sign-in method is switched off at the provider.
  MethodNotEnabled,
  /// An interactive flow was dismissed.
  UserCancelled,
  ConcurrentRequest,
  NetworkFailure,
  RateLimited,
  UnknownProviderError,
  /// The profile store could not be read, or a write failed after retries.
  StoreUnavailable,
  /// A profile operation was attempted without a signed-in identity.
  NotAuthenticated,
  /// A profile update carried no changes.
  InvalidProfileUpdate,
}

impl AuthErrorKind {
  /// Classify a provider-native error code. Total: anything unrecognised is
  /// [`AuthErrorKind::UnknownProviderError`].
  pub fn from_provider_code(code: &str) -> Self {
    match code {
      "auth/wrong-password"
      | "auth/invalid-credential"
      | "auth/invalid-login-credentials"
      | "auth/invalid-email" => Self::InvalidCredentials,
      "auth/user-disabled" => Self::AccountDisabled,
      "auth/user-not-found" => Self::AccountNotFound,
      "auth/email-already-in-use"
      | "auth/account-exists-with-different-credential" => {
        Self::AccountAlreadyExists
      }
      "auth/weak-password" => Self::WeakCredential,
      "auth/operation-not-allowed" => Self::MethodNotEnabled,
      "auth/popup-closed-by-user" | "auth/user-cancelled" => {
        Self::UserCancelled
      }
      "auth/cancelled-popup-request" | "auth/popup-already-opened" => {
        Self::ConcurrentRequest
      }
      "auth/network-request-failed" | "auth/timeout" => Self::NetworkFailure,
      "auth/too-many-requests" => Self::RateLimited,
      _ => Self::UnknownProviderError,
    }
  }

  /// Stable machine-readable code.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::InvalidCredentials => "invalid_credentials",
      Self::AccountDisabled => "account_disabled",
      Self::AccountNotFound => "account_not_found",
      Self::AccountAlreadyExists => "account_already_exists",
      Self::WeakCredential => "weak_credential",
      Self::MethodNotEnabled => "method_not_enabled",
      Self::UserCancelled => "user_cancelled",
      Self::ConcurrentRequest => "concurrent_request",
      Self::NetworkFailure => "network_failure",
      Self::RateLimited => "rate_limited",
      Self::UnknownProviderError => "unknown_provider_error",
      Self::StoreUnavailable => "store_unavailable",
      Self::NotAuthenticated => "not_authenticated",
      Self::InvalidProfileUpdate => "invalid_profile_update",
    }
  }

  /// Message shown to a person when nothing more specific is available.
  pub fn default_message(self) -> &'static str {
    match self {
      Self::InvalidCredentials => "Invalid email or password.",
      Self::AccountDisabled => "This account has been disabled.",
      Self::AccountNotFound => "No account exists for this email address.",
      Self::AccountAlreadyExists => {
        "An account already exists for this email address."
      }
      Self::WeakCredential => "Password should be at least 6 characters.",
      Self::MethodNotEnabled => "This sign-in method is not enabled.",
      Self::UserCancelled => "Sign-in was cancelled.",
      Self::ConcurrentRequest => "Another sign-in is already in progress.",
      Self::NetworkFailure => "Network error. Check your connection.",
      Self::RateLimited => "Too many attempts. Try again later.",
      Self::UnknownProviderError => "Authentication failed.",
      Self::StoreUnavailable => "Your profile could not be loaded or saved.",
      Self::NotAuthenticated => "You need to sign in first.",
      Self::InvalidProfileUpdate => "Nothing to update.",
    }
  }
}

impl fmt::Display for AuthErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── AuthError ───────────────────────────────────────────────────────────────

/// A classified session failure with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct AuthError {
  pub kind:    AuthErrorKind,
  pub message: String,
}

impl AuthError {
  pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
    Self { kind, message: message.into() }
  }

  pub fn store_unavailable(source: &dyn std::error::Error) -> Self {
    Self::new(
      AuthErrorKind::StoreUnavailable,
      format!("{} ({source})", AuthErrorKind::StoreUnavailable.default_message()),
    )
  }
}

impl From<AuthErrorKind> for AuthError {
  fn from(kind: AuthErrorKind) -> Self {
    Self::new(kind, kind.default_message())
  }
}

// ─── ProviderError ───────────────────────────────────────────────────────────

/// A raw rejection from a credential provider, in the provider's own terms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
  /// Provider-native code, e.g. `auth/wrong-password`.
  pub code:    String,
  pub message: String,
}

impl ProviderError {
  pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
    Self { code: code.into(), message: message.into() }
  }

  pub fn kind(&self) -> AuthErrorKind {
    AuthErrorKind::from_provider_code(&self.code)
  }
}

impl From<ProviderError> for AuthError {
  fn from(err: ProviderError) -> Self {
    let kind = err.kind();
    let message = if err.message.is_empty() {
      kind.default_message().to_owned()
    } else {
      err.message
    };
    Self { kind, message }
  }
}
