use muse_core::identity::Identity;

/// The session as consumers see it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
  /// The persisted credential has not been checked yet.
  #[default]
  Initializing,
  Unauthenticated,
  Authenticated(Identity),
}

impl SessionState {
  /// `true` until the initial restoration check has completed.
  pub fn is_loading(&self) -> bool { matches!(self, Self::Initializing) }

  pub fn identity(&self) -> Option<&Identity> {
    match self {
      Self::Authenticated(identity) => Some(identity),
      _ => None,
    }
  }

  pub fn is_authenticated(&self) -> bool {
    matches!(self, Self::Authenticated(_))
  }

  /// Short label used in logs.
  pub fn name(&self) -> &'static str {
    match self {
      Self::Initializing => "initializing",
      Self::Unauthenticated => "unauthenticated",
      Self::Authenticated(_) => "authenticated",
    }
  }
}
