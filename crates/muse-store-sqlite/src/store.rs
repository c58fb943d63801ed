//! [`SqliteStore`]: the SQLite implementation of [`ProfileStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;

use muse_core::{
  identity::{Identity, UserId},
  store::ProfileStore,
};

use crate::{Error, Result, encode::RawProfile, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Muse profile store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Every stored profile, oldest first.
  pub async fn list_profiles(&self) -> Result<Vec<Identity>> {
    let raws: Vec<RawProfile> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM profiles ORDER BY created_at, user_id",
          RawProfile::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawProfile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_identity).collect()
  }
}

// ─── ProfileStore impl ───────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  type Error = Error;

  async fn get(&self, id: &UserId) -> Result<Option<Identity>> {
    let id_str = id.as_str().to_owned();

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM profiles WHERE user_id = ?1", RawProfile::COLUMNS),
            rusqlite::params![id_str],
            RawProfile::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProfile::into_identity).transpose()
  }

  async fn put(&self, identity: &Identity) -> Result<()> {
    let raw = RawProfile::encode(identity)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (
             user_id, email, display_name, avatar_url, role, interests,
             niche, target_audience, theme, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
           ON CONFLICT (user_id) DO UPDATE SET
             email           = excluded.email,
             display_name    = excluded.display_name,
             avatar_url      = excluded.avatar_url,
             role            = excluded.role,
             interests       = excluded.interests,
             niche           = excluded.niche,
             target_audience = excluded.target_audience,
             theme           = excluded.theme,
             created_at      = excluded.created_at,
             updated_at      = excluded.updated_at",
          rusqlite::params![
            raw.user_id,
            raw.email,
            raw.display_name,
            raw.avatar_url,
            raw.role,
            raw.interests,
            raw.niche,
            raw.target_audience,
            raw.theme,
            raw.created_at,
            raw.updated_at,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(user = %identity.id, "profile stored");
    Ok(())
  }
}
