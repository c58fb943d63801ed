//! `muse` configuration: a TOML file layered under `MUSE_*` environment
//! variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use muse_session::SessionConfig;
use serde::Deserialize;

/// Runtime configuration, deserialised from `muse.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
  /// SQLite file holding accounts, the signed-in credential and profiles.
  pub store_path: PathBuf,
  pub session:    SessionConfig,
}

impl Default for CliConfig {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("~/.local/share/muse/muse.db"),
      session:    SessionConfig::default(),
    }
  }
}

impl CliConfig {
  /// Read `path` (optional) and the environment, e.g.
  /// `MUSE_SESSION__RETRY__MAX_ATTEMPTS=5`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("MUSE")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?;

    let mut cfg: CliConfig = settings
      .try_deserialize()
      .context("failed to deserialise CliConfig")?;

    cfg.session.validate().context("invalid session configuration")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
