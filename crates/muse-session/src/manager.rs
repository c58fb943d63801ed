//! [`SessionManager`] turns credential-provider calls and events into one
//! coherent session state.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::{sync::Mutex as AsyncMutex, task::JoinHandle};

use muse_core::{
  AuthError, AuthErrorKind,
  credential::{CredentialChanges, CredentialProvider},
  identity::{Identity, ProfileUpdate, RawIdentity, Role, Theme, UserId},
  store::ProfileStore,
};

use crate::{
  config::SessionConfig,
  retry::with_retry,
  state::SessionState,
  subscription::{Subscribers, Subscription},
};

// ─── Manager ─────────────────────────────────────────────────────────────────

/// The credential the manager last acted on: `None` until the first one,
/// then the signed-in user id or `None` for signed out.
type Settled = Option<Option<UserId>>;

/// Owns the signed-in identity for one process.
///
/// Share it by `Arc`. Operations that reach the provider or the profile store
/// run one at a time, so a credential published by a sign-in is resolved once
/// whether the caller or the [`Self::listen`] task gets to it first.
pub struct SessionManager<C, S> {
  credentials: Arc<C>,
  profiles:    Arc<S>,
  config:      SessionConfig,
  state:       Mutex<SessionState>,
  subscribers: Subscribers,
  settled:     AsyncMutex<Settled>,
}

impl<C, S> SessionManager<C, S>
where
  C: CredentialProvider,
  S: ProfileStore,
{
  /// Create a manager in the [`SessionState::Initializing`] state. Call
  /// [`Self::restore`] or [`Self::listen`] to leave it.
  pub fn new(credentials: Arc<C>, profiles: Arc<S>, config: SessionConfig) -> Self {
    Self {
      credentials,
      profiles,
      config,
      state: Mutex::new(SessionState::Initializing),
      subscribers: Subscribers::default(),
      settled: AsyncMutex::new(None),
    }
  }

  // ── Snapshots ─────────────────────────────────────────────────────────────

  pub fn state(&self) -> SessionState { self.state.lock().clone() }

  /// The resolved identity, or `None` unless signed in. Never returns an
  /// identity that has not been through the profile store.
  pub fn current_identity(&self) -> Option<Identity> {
    self.state.lock().identity().cloned()
  }

  pub fn is_loading(&self) -> bool { self.state.lock().is_loading() }

  // ── Subscriptions ─────────────────────────────────────────────────────────

  /// Register `callback` for every future transition. Callbacks run
  /// synchronously, in registration order, on the task that caused the
  /// transition.
  pub fn subscribe<F>(&self, callback: F) -> Subscription
  where
    F: Fn(&SessionState) + Send + Sync + 'static,
  {
    self.subscribers.subscribe(callback)
  }

  pub fn subscriber_count(&self) -> usize { self.subscribers.len() }

  // ── Restoration ───────────────────────────────────────────────────────────

  /// Check the provider's persisted credential once and settle the initial
  /// state.
  pub async fn restore(&self) -> Result<SessionState, AuthError> {
    let mut settled = self.settled.lock().await;
    let persisted = self.credentials.on_change().borrow().clone();
    self.apply_credential(&mut settled, persisted).await
  }

  /// React to the provider reporting a (possibly absent) credential.
  pub async fn handle_credential_change(
    &self,
    raw: Option<RawIdentity>,
  ) -> Result<SessionState, AuthError> {
    let mut settled = self.settled.lock().await;
    self.apply_credential(&mut settled, raw).await
  }

  // ── Auth operations ───────────────────────────────────────────────────────

  pub async fn sign_in_with_google(&self) -> Result<Identity, AuthError> {
    let mut settled = self.settled.lock().await;
    let raw = self
      .credentials
      .verify_google()
      .await
      .map_err(|e| rejected("google sign-in", e.into()))?;
    self.complete_sign_in(&mut settled, raw).await
  }

  pub async fn sign_in_with_email(
    &self,
    email: &str,
    password: &str,
  ) -> Result<Identity, AuthError> {
    let mut settled = self.settled.lock().await;
    let raw = self
      .credentials
      .verify_email_password(email, password)
      .await
      .map_err(|e| rejected("email sign-in", e.into()))?;
    self.complete_sign_in(&mut settled, raw).await
  }

  /// Register a new account. The new profile always starts with the default
  /// role and theme, and is stored before this returns.
  pub async fn sign_up_with_email(
    &self,
    email: &str,
    password: &str,
    display_name: &str,
  ) -> Result<Identity, AuthError> {
    let mut settled = self.settled.lock().await;
    let mut raw = self
      .credentials
      .register(email, password, display_name)
      .await
      .map_err(|e| rejected("sign-up", e.into()))?;
    *settled = Some(Some(raw.id.clone()));

    if !display_name.trim().is_empty() {
      raw.display_name = Some(display_name.trim().to_owned());
    }

    let identity = Identity::from_raw(&raw, Utc::now());
    self.persist(&identity).await?;
    self.transition(SessionState::Authenticated(identity.clone()));
    tracing::info!(user = %identity.id, "signed up");
    Ok(identity)
  }

  /// Sign out. A no-op when already signed out. If the provider fails, the
  /// session is left exactly as it was.
  pub async fn sign_out(&self) -> Result<(), AuthError> {
    let mut settled = self.settled.lock().await;
    let signed_out = matches!(*self.state.lock(), SessionState::Unauthenticated);
    if signed_out {
      tracing::debug!("sign-out requested while signed out");
      return Ok(());
    }

    self
      .credentials
      .revoke()
      .await
      .map_err(|e| rejected("sign-out", e.into()))?;
    *settled = Some(None);

    self.transition(SessionState::Unauthenticated);
    tracing::info!("signed out");
    Ok(())
  }

  // ── Profile edits ─────────────────────────────────────────────────────────

  /// Apply `update` to the signed-in profile and persist it.
  pub async fn update_profile(
    &self,
    update: ProfileUpdate,
  ) -> Result<Identity, AuthError> {
    if update.is_empty() {
      return Err(AuthErrorKind::InvalidProfileUpdate.into());
    }
    self.edit(|_| update).await
  }

  pub async fn select_role(&self, role: Role) -> Result<Identity, AuthError> {
    self.update_profile(ProfileUpdate::role(role)).await
  }

  pub async fn toggle_theme(&self) -> Result<Identity, AuthError> {
    self
      .edit(|identity| ProfileUpdate::theme(identity.theme.toggled()))
      .await
  }

  pub async fn set_theme(&self, theme: Theme) -> Result<Identity, AuthError> {
    self.update_profile(ProfileUpdate::theme(theme)).await
  }

  pub async fn set_interests(
    &self,
    interests: Vec<String>,
  ) -> Result<Identity, AuthError> {
    self.update_profile(ProfileUpdate::interests(interests)).await
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  /// Build the update from the signed-in profile, apply it and persist it.
  async fn edit<F>(&self, update: F) -> Result<Identity, AuthError>
  where
    F: FnOnce(&Identity) -> ProfileUpdate,
  {
    let _settled = self.settled.lock().await;
    let mut identity = self
      .current_identity()
      .ok_or(AuthError::from(AuthErrorKind::NotAuthenticated))?;

    let update = update(&identity);
    if update.is_empty() {
      return Err(AuthErrorKind::InvalidProfileUpdate.into());
    }
    identity.apply(&update, Utc::now());

    self.persist(&identity).await?;
    self.transition(SessionState::Authenticated(identity.clone()));
    Ok(identity)
  }

  /// The provider accepted `raw`; it is settled from here on even if the
  /// profile cannot be resolved.
  async fn complete_sign_in(
    &self,
    settled: &mut Settled,
    raw: RawIdentity,
  ) -> Result<Identity, AuthError> {
    *settled = Some(Some(raw.id.clone()));
    let identity = self.adopt(&raw).await?;
    self.transition(SessionState::Authenticated(identity.clone()));
    tracing::info!(user = %identity.id, role = %identity.role, "signed in");
    Ok(identity)
  }

  async fn apply_credential(
    &self,
    settled: &mut Settled,
    raw: Option<RawIdentity>,
  ) -> Result<SessionState, AuthError> {
    *settled = Some(raw.as_ref().map(|raw| raw.id.clone()));
    match raw {
      None => {
        self.transition(SessionState::Unauthenticated);
      }
      Some(raw) => {
        let identity = self.adopt(&raw).await?;
        self.transition(SessionState::Authenticated(identity));
      }
    }
    Ok(self.state())
  }

  /// Apply the provider's latest credential unless the manager has already
  /// acted on it. Reads the channel only once the operation lock is held, so
  /// a value superseded by a sign-in or sign-out is never replayed.
  async fn follow(&self, changes: &mut CredentialChanges) {
    let mut settled = self.settled.lock().await;
    let current = changes.borrow_and_update().clone();
    let id = current.as_ref().map(|raw| raw.id.clone());
    if *settled == Some(id) {
      return;
    }
    if let Err(err) = self.apply_credential(&mut settled, current).await {
      tracing::warn!(error = %err, "could not apply credential change");
    }
  }

  /// Keep the held identity when `raw` names the user already signed in;
  /// otherwise go through the profile store.
  async fn adopt(&self, raw: &RawIdentity) -> Result<Identity, AuthError> {
    match self.current_identity() {
      Some(identity) if identity.id == raw.id => Ok(identity),
      _ => self.resolve_or_create(raw).await,
    }
  }

  /// Stored profiles are authoritative; a first-time credential gets a fresh
  /// profile with default role and theme, persisted before it is returned.
  async fn resolve_or_create(&self, raw: &RawIdentity) -> Result<Identity, AuthError> {
    let stored = self.profiles.get(&raw.id).await.map_err(|e| {
      tracing::warn!(user = %raw.id, error = %e, "profile lookup failed");
      AuthError::store_unavailable(&e)
    })?;

    if let Some(identity) = stored {
      return Ok(identity);
    }

    let identity = Identity::from_raw(raw, Utc::now());
    tracing::debug!(user = %identity.id, "creating profile");
    self.persist(&identity).await?;
    Ok(identity)
  }

  async fn persist(&self, identity: &Identity) -> Result<(), AuthError> {
    let profiles = &*self.profiles;
    with_retry(&self.config.retry, "profile write", move || profiles.put(identity))
      .await
      .map_err(|e| AuthError::store_unavailable(&e))
  }

  /// Move to `next` and notify subscribers, unless the state is unchanged.
  fn transition(&self, next: SessionState) -> bool {
    self.subscribers.dispatch(|| {
      let mut state = self.state.lock();
      if *state == next {
        return None;
      }
      tracing::debug!(from = state.name(), to = next.name(), "session transition");
      *state = next.clone();
      Some(next)
    })
  }
}

fn rejected(operation: &str, err: AuthError) -> AuthError {
  tracing::info!(operation, kind = %err.kind, "auth operation rejected");
  err
}

// ─── Credential listener ─────────────────────────────────────────────────────

impl<C, S> SessionManager<C, S>
where
  C: CredentialProvider + 'static,
  S: ProfileStore + 'static,
{
  /// Follow the provider's credential changes on a background task, starting
  /// with the state persisted at process start. Dropping the returned guard
  /// stops listening.
  pub fn listen(self: &Arc<Self>) -> CredentialListener {
    let mut changes = self.credentials.on_change();
    let manager = Arc::clone(self);

    let task = tokio::spawn(async move {
      loop {
        manager.follow(&mut changes).await;
        if changes.changed().await.is_err() {
          break;
        }
      }
    });

    CredentialListener { task }
  }
}

/// Guard for the task spawned by [`SessionManager::listen`].
#[must_use = "dropping a CredentialListener stops it"]
pub struct CredentialListener {
  task: JoinHandle<()>,
}

impl CredentialListener {
  pub fn stop(self) { drop(self) }

  pub fn is_finished(&self) -> bool { self.task.is_finished() }
}

impl Drop for CredentialListener {
  fn drop(&mut self) { self.task.abort(); }
}
