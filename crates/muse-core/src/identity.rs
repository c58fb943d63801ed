//! The durable user record and the edits a signed-in person can make to it.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── UserId ──────────────────────────────────────────────────────────────────

/// Identifier assigned by the credential provider. Immutable once assigned
/// and the only key a profile is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for UserId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for UserId {
  fn from(s: String) -> Self { Self(s) }
}

// ─── Role / Theme ────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[default]
  Creator,
  Consumer,
  Admin,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Creator => "creator",
      Self::Consumer => "consumer",
      Self::Admin => "admin",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "creator" => Ok(Self::Creator),
      "consumer" => Ok(Self::Consumer),
      "admin" => Ok(Self::Admin),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
  #[default]
  Light,
  Dark,
}

impl Theme {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Light => "light",
      Self::Dark => "dark",
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      Self::Light => Self::Dark,
      Self::Dark => Self::Light,
    }
  }
}

impl fmt::Display for Theme {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Theme {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "light" => Ok(Self::Light),
      "dark" => Ok(Self::Dark),
      other => Err(Error::UnknownTheme(other.to_owned())),
    }
  }
}

// ─── RawIdentity ─────────────────────────────────────────────────────────────

/// What a credential provider asserts about whoever just authenticated.
/// Carries no role or theme; those only ever come from the profile store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawIdentity {
  pub id:           UserId,
  pub email:        String,
  pub display_name: Option<String>,
  pub avatar_url:   Option<String>,
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// The durable user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub id:              UserId,
  pub email:           String,
  pub display_name:    String,
  pub avatar_url:      Option<String>,
  pub role:            Role,
  pub interests:       Vec<String>,
  pub niche:           Option<String>,
  pub target_audience: Option<String>,
  pub theme:           Theme,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

impl Identity {
  /// Synthesise a first-time record from a credential assertion, with the
  /// default role and theme.
  pub fn from_raw(raw: &RawIdentity, now: DateTime<Utc>) -> Self {
    let display_name = raw
      .display_name
      .as_deref()
      .map(str::trim)
      .filter(|n| !n.is_empty())
      .map(str::to_owned)
      .unwrap_or_else(|| email_local_part(&raw.email).to_owned());

    Self {
      id: raw.id.clone(),
      email: raw.email.clone(),
      display_name,
      avatar_url: raw.avatar_url.clone(),
      role: Role::default(),
      interests: Vec::new(),
      niche: None,
      target_audience: None,
      theme: Theme::default(),
      created_at: now,
      updated_at: now,
    }
  }

  /// Apply a profile edit and bump `updated_at`. `id` and `created_at` are
  /// never touched.
  pub fn apply(&mut self, update: &ProfileUpdate, now: DateTime<Utc>) {
    if let Some(name) = &update.display_name {
      self.display_name = name.clone();
    }
    if let Some(avatar) = &update.avatar_url {
      self.avatar_url = avatar.clone();
    }
    if let Some(role) = update.role {
      self.role = role;
    }
    if let Some(interests) = &update.interests {
      self.interests = interests.clone();
    }
    if let Some(niche) = &update.niche {
      self.niche = niche.clone();
    }
    if let Some(audience) = &update.target_audience {
      self.target_audience = audience.clone();
    }
    if let Some(theme) = update.theme {
      self.theme = theme;
    }
    self.updated_at = now;
  }
}

fn email_local_part(email: &str) -> &str {
  email.split_once('@').map_or(email, |(local, _)| local)
}

// ─── ProfileUpdate ───────────────────────────────────────────────────────────

/// A partial edit of an [`Identity`]. `None` leaves a field alone; for
/// optional fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
  pub display_name:    Option<String>,
  pub avatar_url:      Option<Option<String>>,
  pub role:            Option<Role>,
  pub interests:       Option<Vec<String>>,
  pub niche:           Option<Option<String>>,
  pub target_audience: Option<Option<String>>,
  pub theme:           Option<Theme>,
}

impl ProfileUpdate {
  pub fn role(role: Role) -> Self { Self { role: Some(role), ..Self::default() } }

  pub fn theme(theme: Theme) -> Self {
    Self { theme: Some(theme), ..Self::default() }
  }

  pub fn interests(interests: Vec<String>) -> Self {
    Self { interests: Some(interests), ..Self::default() }
  }

  pub fn is_empty(&self) -> bool { *self == Self::default() }
}
