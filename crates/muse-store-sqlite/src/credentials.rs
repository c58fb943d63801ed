//! [`LocalCredentials`]: email/password accounts kept next to the profiles.
//!
//! Passwords are stored as argon2 PHC strings. The signed-in account is
//! persisted in `current_credential`, so a new process picks the session back
//! up from the receiver returned by [`CredentialProvider::on_change`].

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use chrono::Utc;
use rand_core::OsRng;
use rusqlite::OptionalExtension as _;
use tokio::sync::watch;
use uuid::Uuid;

use muse_core::{
  ProviderError,
  credential::{CredentialChanges, CredentialProvider},
  identity::RawIdentity,
};

use crate::{
  Error, Result, SqliteStore,
  encode::{RawAccount, encode_dt, is_plausible_email, normalize_email},
};

/// Shortest password `register` accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

const ACCOUNT_COLUMNS: &str =
  "user_id, email, password_hash, display_name, disabled";

pub struct LocalCredentials {
  store:   SqliteStore,
  changes: watch::Sender<Option<RawIdentity>>,
}

impl LocalCredentials {
  /// Attach to `store` and load the credential persisted by a previous run.
  pub async fn open(store: SqliteStore) -> Result<Self> {
    let persisted = load_current(&store).await?;
    if let Some(raw) = &persisted {
      tracing::debug!(user = %raw.id, "restored persisted credential");
    }
    let (changes, _) = watch::channel(persisted);
    Ok(Self { store, changes })
  }

  /// Disable an account. It can no longer sign in, and if it is the
  /// signed-in account the credential is dropped. Returns `false` if no
  /// account has that email.
  pub async fn disable_account(&self, email: &str) -> Result<bool> {
    let email = normalize_email(email);

    let (found, was_current) = self
      .store
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let user_id: Option<String> = tx
          .query_row(
            "SELECT user_id FROM accounts WHERE email = ?1",
            rusqlite::params![email],
            |r| r.get(0),
          )
          .optional()?;
        let Some(user_id) = user_id else {
          return Ok((false, false));
        };
        tx.execute(
          "UPDATE accounts SET disabled = 1 WHERE user_id = ?1",
          rusqlite::params![user_id],
        )?;
        let cleared = tx.execute(
          "DELETE FROM current_credential WHERE user_id = ?1",
          rusqlite::params![user_id],
        )?;
        tx.commit()?;
        Ok((true, cleared > 0))
      })
      .await?;

    if was_current {
      self.changes.send_replace(None);
    }
    Ok(found)
  }

  async fn find_account(&self, email: String) -> Result<Option<RawAccount>> {
    let account = self
      .store
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1"),
            rusqlite::params![email],
            RawAccount::from_row,
          )
          .optional()?)
      })
      .await?;
    Ok(account)
  }

  async fn set_current(&self, raw: &RawIdentity) -> Result<()> {
    let user_id = raw.id.as_str().to_owned();
    let at = encode_dt(Utc::now());

    self
      .store
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO current_credential (slot, user_id, signed_in_at)
           VALUES (1, ?1, ?2)",
          rusqlite::params![user_id, at],
        )?;
        Ok(())
      })
      .await?;

    self.changes.send_replace(Some(raw.clone()));
    Ok(())
  }
}

async fn load_current(store: &SqliteStore) -> Result<Option<RawIdentity>> {
  let account = store
    .conn
    .call(|conn| {
      Ok(conn
        .query_row(
          "SELECT a.user_id, a.email, a.password_hash, a.display_name, a.disabled
           FROM current_credential c
           JOIN accounts a ON a.user_id = c.user_id
           WHERE a.disabled = 0",
          [],
          RawAccount::from_row,
        )
        .optional()?)
    })
    .await?;
  Ok(account.as_ref().map(RawAccount::raw_identity))
}

// ─── Password hashing ────────────────────────────────────────────────────────

/// Hash on the blocking pool; argon2 is deliberately slow.
async fn hash_password(password: String) -> Result<String> {
  tokio::task::spawn_blocking(move || {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map(|hash| hash.to_string())
      .map_err(|e| Error::PasswordHash(e.to_string()))
  })
  .await
  .map_err(|e| Error::PasswordHash(e.to_string()))?
}

async fn verify_password(password: String, phc: String) -> Result<bool> {
  tokio::task::spawn_blocking(move || {
    let parsed =
      PasswordHash::new(&phc).map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok(),
    )
  })
  .await
  .map_err(|e| Error::PasswordHash(e.to_string()))?
}

// ─── CredentialProvider impl ─────────────────────────────────────────────────

fn internal(err: Error) -> ProviderError {
  tracing::warn!(error = %err, "local credential store failed");
  ProviderError::new("auth/internal-error", err.to_string())
}

impl CredentialProvider for LocalCredentials {
  async fn verify_google(&self) -> Result<RawIdentity, ProviderError> {
    Err(ProviderError::new(
      "auth/operation-not-allowed",
      "Google sign-in is not available for local accounts.",
    ))
  }

  async fn verify_email_password(
    &self,
    email: &str,
    password: &str,
  ) -> Result<RawIdentity, ProviderError> {
    let email = normalize_email(email);
    if !is_plausible_email(&email) {
      return Err(ProviderError::new("auth/invalid-email", ""));
    }

    let account = self
      .find_account(email)
      .await
      .map_err(internal)?
      .ok_or_else(|| ProviderError::new("auth/user-not-found", ""))?;

    let matches = verify_password(password.to_owned(), account.password_hash.clone())
      .await
      .map_err(internal)?;
    if !matches {
      return Err(ProviderError::new("auth/wrong-password", ""));
    }
    if account.disabled {
      return Err(ProviderError::new("auth/user-disabled", ""));
    }

    let raw = account.raw_identity();
    self.set_current(&raw).await.map_err(internal)?;
    Ok(raw)
  }

  async fn register(
    &self,
    email: &str,
    password: &str,
    display_name: &str,
  ) -> Result<RawIdentity, ProviderError> {
    let email = normalize_email(email);
    if !is_plausible_email(&email) {
      return Err(ProviderError::new("auth/invalid-email", ""));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
      return Err(ProviderError::new("auth/weak-password", ""));
    }

    let hash = hash_password(password.to_owned()).await.map_err(internal)?;
    let raw = RawIdentity {
      id:           Uuid::new_v4().to_string().into(),
      email:        email.clone(),
      display_name: Some(display_name.trim().to_owned()).filter(|n| !n.is_empty()),
      avatar_url:   None,
    };

    let user_id = raw.id.as_str().to_owned();
    let name = raw.display_name.clone();
    let created_at = encode_dt(Utc::now());
    let inserted = self
      .store
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken: bool = tx
          .query_row(
            "SELECT 1 FROM accounts WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO accounts (user_id, email, password_hash, display_name, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![user_id, email, hash, name, created_at],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await
      .map_err(|e| internal(e.into()))?;

    if !inserted {
      return Err(ProviderError::new("auth/email-already-in-use", ""));
    }

    tracing::info!(user = %raw.id, "registered local account");
    self.set_current(&raw).await.map_err(internal)?;
    Ok(raw)
  }

  async fn revoke(&self) -> Result<(), ProviderError> {
    self
      .store
      .conn
      .call(|conn| {
        conn.execute("DELETE FROM current_credential", [])?;
        Ok(())
      })
      .await
      .map_err(|e| internal(e.into()))?;

    self.changes.send_replace(None);
    Ok(())
  }

  fn on_change(&self) -> CredentialChanges { self.changes.subscribe() }
}
