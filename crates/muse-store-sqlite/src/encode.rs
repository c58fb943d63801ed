//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings; interests are a compact JSON array; roles
//! and themes use their lowercase names.

use chrono::{DateTime, Utc};
use muse_core::identity::{Identity, RawIdentity, UserId};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Interests ───────────────────────────────────────────────────────────────

pub fn encode_interests(interests: &[String]) -> Result<String> {
  Ok(serde_json::to_string(interests)?)
}

pub fn decode_interests(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Emails ──────────────────────────────────────────────────────────────────

/// Accounts are keyed by the trimmed, lowercased address.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

/// A deliberately loose shape check: `local@domain.tld`, no whitespace.
pub fn is_plausible_email(email: &str) -> bool {
  if email.chars().any(char::is_whitespace) {
    return false;
  }
  match email.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && !domain.contains('@')
        && domain
          .split_once('.')
          .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
    }
    None => false,
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `profiles` row.
pub struct RawProfile {
  pub user_id:         String,
  pub email:           String,
  pub display_name:    String,
  pub avatar_url:      Option<String>,
  pub role:            String,
  pub interests:       String,
  pub niche:           Option<String>,
  pub target_audience: Option<String>,
  pub theme:           String,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawProfile {
  pub const COLUMNS: &'static str = "user_id, email, display_name, avatar_url, \
     role, interests, niche, target_audience, theme, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:         row.get(0)?,
      email:           row.get(1)?,
      display_name:    row.get(2)?,
      avatar_url:      row.get(3)?,
      role:            row.get(4)?,
      interests:       row.get(5)?,
      niche:           row.get(6)?,
      target_audience: row.get(7)?,
      theme:           row.get(8)?,
      created_at:      row.get(9)?,
      updated_at:      row.get(10)?,
    })
  }

  pub fn encode(identity: &Identity) -> Result<Self> {
    Ok(Self {
      user_id:         identity.id.as_str().to_owned(),
      email:           identity.email.clone(),
      display_name:    identity.display_name.clone(),
      avatar_url:      identity.avatar_url.clone(),
      role:            identity.role.as_str().to_owned(),
      interests:       encode_interests(&identity.interests)?,
      niche:           identity.niche.clone(),
      target_audience: identity.target_audience.clone(),
      theme:           identity.theme.as_str().to_owned(),
      created_at:      encode_dt(identity.created_at),
      updated_at:      encode_dt(identity.updated_at),
    })
  }

  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      id:              UserId::new(self.user_id),
      email:           self.email,
      display_name:    self.display_name,
      avatar_url:      self.avatar_url,
      role:            self.role.parse()?,
      interests:       decode_interests(&self.interests)?,
      niche:           self.niche,
      target_audience: self.target_audience,
      theme:           self.theme.parse()?,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read from an `accounts` row.
pub struct RawAccount {
  pub user_id:       String,
  pub email:         String,
  pub password_hash: String,
  pub display_name:  Option<String>,
  pub disabled:      bool,
}

impl RawAccount {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      email:         row.get(1)?,
      password_hash: row.get(2)?,
      display_name:  row.get(3)?,
      disabled:      row.get(4)?,
    })
  }

  pub fn raw_identity(&self) -> RawIdentity {
    RawIdentity {
      id:           UserId::new(self.user_id.clone()),
      email:        self.email.clone(),
      display_name: self.display_name.clone(),
      avatar_url:   None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn email_shapes() {
    assert!(is_plausible_email("a@x.com"));
    assert!(is_plausible_email("first.last@mail.example.org"));
    assert!(!is_plausible_email("a@x"));
    assert!(!is_plausible_email("@x.com"));
    assert!(!is_plausible_email("a@@x.com"));
    assert!(!is_plausible_email("a b@x.com"));
    assert!(!is_plausible_email("plain"));
  }

  #[test]
  fn normalizes_case_and_whitespace() {
    assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
  }

  #[test]
  fn bad_timestamp_is_reported() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
