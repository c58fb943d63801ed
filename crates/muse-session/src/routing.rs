//! Role-gated routing: what a consumer should show for a given session state.

use muse_core::identity::{Identity, Role};

use crate::state::SessionState;

/// Top-level destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  /// Restoration has not finished; show a spinner, not the sign-in page.
  Loading,
  SignIn,
  /// Signed in but no interests picked yet.
  Onboarding,
  CreatorDashboard,
  ConsumerDashboard,
  AdminDashboard,
}

impl Route {
  pub fn dashboard_for(role: Role) -> Self {
    match role {
      Role::Creator => Self::CreatorDashboard,
      Role::Consumer => Self::ConsumerDashboard,
      Role::Admin => Self::AdminDashboard,
    }
  }

  pub fn path(self) -> &'static str {
    match self {
      Self::Loading => "/",
      Self::SignIn => "/login",
      Self::Onboarding => "/onboarding",
      Self::CreatorDashboard => "/creator",
      Self::ConsumerDashboard => "/consumer",
      Self::AdminDashboard => "/admin",
    }
  }
}

/// Outcome of guarding a role-restricted page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  Granted,
  /// Still restoring; decide once the state settles.
  Pending,
  RedirectToSignIn,
  RedirectTo(Route),
}

/// Where to send someone arriving at the application root.
pub fn landing_route(state: &SessionState) -> Route {
  match state {
    SessionState::Initializing => Route::Loading,
    SessionState::Unauthenticated => Route::SignIn,
    SessionState::Authenticated(identity) => landing_for(identity),
  }
}

fn landing_for(identity: &Identity) -> Route {
  if identity.interests.is_empty() && identity.role != Role::Admin {
    Route::Onboarding
  } else {
    Route::dashboard_for(identity.role)
  }
}

/// Guard a page restricted to `required`. Admins may enter every page.
pub fn authorize(state: &SessionState, required: Role) -> Access {
  match state {
    SessionState::Initializing => Access::Pending,
    SessionState::Unauthenticated => Access::RedirectToSignIn,
    SessionState::Authenticated(identity)
      if identity.role == required || identity.role == Role::Admin =>
    {
      Access::Granted
    }
    SessionState::Authenticated(identity) => {
      Access::RedirectTo(landing_for(identity))
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use muse_core::identity::{RawIdentity, UserId};

  use super::*;

  fn signed_in(role: Role, interests: &[&str]) -> SessionState {
    let raw = RawIdentity {
      id:           UserId::from("u1"),
      email:        "u1@example.com".into(),
      display_name: None,
      avatar_url:   None,
    };
    let mut identity = Identity::from_raw(&raw, Utc::now());
    identity.role = role;
    identity.interests = interests.iter().map(|s| s.to_string()).collect();
    SessionState::Authenticated(identity)
  }

  #[test]
  fn landing_follows_state() {
    assert_eq!(landing_route(&SessionState::Initializing), Route::Loading);
    assert_eq!(landing_route(&SessionState::Unauthenticated), Route::SignIn);
    assert_eq!(
      landing_route(&signed_in(Role::Creator, &["music"])),
      Route::CreatorDashboard
    );
    assert_eq!(
      landing_route(&signed_in(Role::Consumer, &["travel"])),
      Route::ConsumerDashboard
    );
  }

  #[test]
  fn new_profiles_land_on_onboarding() {
    assert_eq!(landing_route(&signed_in(Role::Creator, &[])), Route::Onboarding);
    assert_eq!(
      landing_route(&signed_in(Role::Admin, &[])),
      Route::AdminDashboard
    );
  }

  #[test]
  fn authorize_by_role() {
    let creator = signed_in(Role::Creator, &["music"]);
    assert_eq!(authorize(&creator, Role::Creator), Access::Granted);
    assert_eq!(
      authorize(&creator, Role::Consumer),
      Access::RedirectTo(Route::CreatorDashboard)
    );

    let admin = signed_in(Role::Admin, &[]);
    assert_eq!(authorize(&admin, Role::Consumer), Access::Granted);
  }

  #[test]
  fn authorize_before_sign_in() {
    assert_eq!(authorize(&SessionState::Initializing, Role::Creator), Access::Pending);
    assert_eq!(
      authorize(&SessionState::Unauthenticated, Role::Creator),
      Access::RedirectToSignIn
    );
  }

  #[test]
  fn paths_are_distinct() {
    let routes = [
      Route::Loading,
      Route::SignIn,
      Route::Onboarding,
      Route::CreatorDashboard,
      Route::ConsumerDashboard,
      Route::AdminDashboard,
    ];
    let mut paths: Vec<_> = routes.iter().map(|r| r.path()).collect();
    paths.sort_unstable();
    paths.dedup();
    assert_eq!(paths.len(), routes.len());
  }
}
