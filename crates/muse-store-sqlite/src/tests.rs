//! Integration tests for `SqliteStore` and `LocalCredentials` against an
//! in-memory database.

use std::sync::Arc;

use chrono::{Duration, Utc};
use muse_core::{
  AuthErrorKind,
  credential::CredentialProvider,
  identity::{Identity, RawIdentity, Role, Theme, UserId},
  store::ProfileStore,
};
use muse_session::{SessionConfig, SessionManager, SessionState};

use crate::{LocalCredentials, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn identity(id: &str) -> Identity {
  let raw = RawIdentity {
    id:           UserId::from(id),
    email:        format!("{id}@example.com"),
    display_name: Some("Ada".into()),
    avatar_url:   Some("https://example.com/ada.png".into()),
  };
  Identity::from_raw(&raw, Utc::now())
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_and_get_profile() {
  let s = store().await;
  let mut ada = identity("u1");
  ada.interests = vec!["music".into(), "film".into()];
  ada.niche = Some("reviews".into());

  s.put(&ada).await.unwrap();

  let fetched = s.get(&UserId::from("u1")).await.unwrap();
  assert_eq!(fetched, Some(ada));
}

#[tokio::test]
async fn get_missing_profile_returns_none() {
  let s = store().await;
  let result = s.get(&UserId::from("nobody")).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn put_replaces_existing_profile() {
  let s = store().await;
  let mut ada = identity("u1");
  s.put(&ada).await.unwrap();

  ada.role = Role::Consumer;
  ada.theme = Theme::Dark;
  ada.avatar_url = None;
  ada.updated_at = ada.updated_at + Duration::seconds(10);
  s.put(&ada).await.unwrap();

  let fetched = s.get(&ada.id).await.unwrap().unwrap();
  assert_eq!(fetched.role, Role::Consumer);
  assert_eq!(fetched.theme, Theme::Dark);
  assert!(fetched.avatar_url.is_none());
  assert_eq!(fetched.updated_at, ada.updated_at);
  assert_eq!(s.list_profiles().await.unwrap().len(), 1);
}

#[tokio::test]
async fn list_profiles_returns_all() {
  let s = store().await;
  s.put(&identity("u1")).await.unwrap();
  s.put(&identity("u2")).await.unwrap();

  let ids: Vec<String> = s
    .list_profiles()
    .await
    .unwrap()
    .into_iter()
    .map(|p| p.id.to_string())
    .collect();
  assert_eq!(ids.len(), 2);
  assert!(ids.contains(&"u1".to_string()));
  assert!(ids.contains(&"u2".to_string()));
}

// ─── Local credentials ───────────────────────────────────────────────────────

async fn credentials() -> (SqliteStore, LocalCredentials) {
  let s = store().await;
  let c = LocalCredentials::open(s.clone()).await.unwrap();
  (s, c)
}

#[tokio::test]
async fn register_then_verify() {
  let (_, c) = credentials().await;

  let registered = c.register("Ada@Example.com", "secret1", "Ada").await.unwrap();
  assert_eq!(registered.email, "ada@example.com");
  assert_eq!(registered.display_name.as_deref(), Some("Ada"));

  let verified = c.verify_email_password("ada@example.com", "secret1").await.unwrap();
  assert_eq!(verified.id, registered.id);
}

#[tokio::test]
async fn register_rejections() {
  let (_, c) = credentials().await;
  c.register("ada@example.com", "secret1", "Ada").await.unwrap();

  let err = c.register("ADA@example.com", "secret2", "Ada").await.unwrap_err();
  assert_eq!(err.kind(), AuthErrorKind::AccountAlreadyExists);

  let err = c.register("bob@example.com", "12345", "Bob").await.unwrap_err();
  assert_eq!(err.kind(), AuthErrorKind::WeakCredential);

  let err = c.register("not-an-email", "secret1", "Bob").await.unwrap_err();
  assert_eq!(err.kind(), AuthErrorKind::InvalidCredentials);
}

#[tokio::test]
async fn verify_rejections() {
  let (_, c) = credentials().await;
  c.register("ada@example.com", "secret1", "Ada").await.unwrap();

  let err = c.verify_email_password("ada@example.com", "wrong!").await.unwrap_err();
  assert_eq!(err.kind(), AuthErrorKind::InvalidCredentials);

  let err = c.verify_email_password("bob@example.com", "secret1").await.unwrap_err();
  assert_eq!(err.kind(), AuthErrorKind::AccountNotFound);

  let err = c.verify_google().await.unwrap_err();
  assert_eq!(err.kind(), AuthErrorKind::MethodNotEnabled);
}

#[tokio::test]
async fn disabled_account_cannot_sign_in() {
  let (_, c) = credentials().await;
  c.register("ada@example.com", "secret1", "Ada").await.unwrap();
  assert!(c.on_change().borrow().is_some());

  assert!(c.disable_account("ada@example.com").await.unwrap());
  assert!(c.on_change().borrow().is_none());
  assert!(!c.disable_account("bob@example.com").await.unwrap());

  let err = c.verify_email_password("ada@example.com", "secret1").await.unwrap_err();
  assert_eq!(err.kind(), AuthErrorKind::AccountDisabled);
}

#[tokio::test]
async fn credential_changes_are_published() {
  let (_, c) = credentials().await;
  let mut changes = c.on_change();
  assert!(changes.borrow_and_update().is_none());

  let raw = c.register("ada@example.com", "secret1", "").await.unwrap();
  assert!(raw.display_name.is_none());
  assert!(changes.has_changed().unwrap());
  assert_eq!(changes.borrow_and_update().as_ref(), Some(&raw));

  c.revoke().await.unwrap();
  assert!(changes.borrow_and_update().is_none());
}

#[tokio::test]
async fn credential_survives_reopen() {
  let s = store().await;
  let first = LocalCredentials::open(s.clone()).await.unwrap();
  let raw = first.register("ada@example.com", "secret1", "Ada").await.unwrap();
  drop(first);

  let second = LocalCredentials::open(s.clone()).await.unwrap();
  assert_eq!(second.on_change().borrow().as_ref(), Some(&raw));

  second.revoke().await.unwrap();
  let third = LocalCredentials::open(s).await.unwrap();
  assert!(third.on_change().borrow().is_none());
}

// ─── End to end ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn session_restores_across_processes() {
  let s = store().await;

  let first = SessionManager::new(
    Arc::new(LocalCredentials::open(s.clone()).await.unwrap()),
    Arc::new(s.clone()),
    SessionConfig::default(),
  );
  assert_eq!(first.restore().await.unwrap(), SessionState::Unauthenticated);
  let created = first
    .sign_up_with_email("ada@example.com", "secret1", "Ada")
    .await
    .unwrap();
  let chosen = first.select_role(Role::Consumer).await.unwrap();
  drop(first);

  let second = SessionManager::new(
    Arc::new(LocalCredentials::open(s.clone()).await.unwrap()),
    Arc::new(s.clone()),
    SessionConfig::default(),
  );
  let restored = second.restore().await.unwrap();

  assert_eq!(restored, SessionState::Authenticated(chosen.clone()));
  assert_eq!(chosen.id, created.id);
  assert_eq!(chosen.role, Role::Consumer);

  second.sign_out().await.unwrap();
  assert!(second.current_identity().is_none());
  assert_eq!(s.list_profiles().await.unwrap().len(), 1);
}
