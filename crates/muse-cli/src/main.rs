//! `muse`: command-line front end for the Muse session layer.
//!
//! Opens the local SQLite store, restores whatever session a previous run
//! left behind, and performs one account action.
//!
//! # Usage
//!
//! ```text
//! muse sign-up ada@example.com --name "Ada"
//! muse sign-in ada@example.com
//! muse role consumer
//! muse whoami
//! muse sign-out
//! ```

mod settings;

use std::{
  io::{self, BufRead, Write},
  path::PathBuf,
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use muse_core::identity::{Identity, Role, Theme};
use muse_session::{SessionManager, SessionState, routing};
use muse_store_sqlite::{LocalCredentials, SqliteStore};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::CliConfig;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "muse", author, version, about = "Muse account and session tool")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "muse.toml")]
  config: PathBuf,

  /// Override the SQLite store path from the config file.
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create a local account and sign in. Reads the password from stdin.
  SignUp {
    email: String,
    #[arg(long, default_value = "")]
    name:  String,
  },
  /// Sign in with email and password. Reads the password from stdin.
  SignIn { email: String },
  /// Sign in with Google.
  Google,
  /// Sign out of the current session.
  SignOut,
  /// Show the signed-in profile and where the app would route it.
  Whoami,
  /// Pick the signed-in profile's role.
  Role { role: Role },
  /// Set the theme, or toggle it when omitted.
  Theme { theme: Option<Theme> },
  /// Replace the signed-in profile's interests.
  Interests { interests: Vec<String> },
  /// Disable a local account.
  Disable { email: String },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut cfg = CliConfig::load(&cli.config)?;
  if let Some(store) = cli.store {
    cfg.store_path = store;
  }

  if let Some(parent) = cfg.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  let credentials = LocalCredentials::open(store.clone())
    .await
    .context("failed to load local credentials")?;
  let credentials = Arc::new(credentials);

  let manager = SessionManager::new(
    Arc::clone(&credentials),
    Arc::new(store),
    cfg.session.clone(),
  );
  let _trace = manager.subscribe(|state| {
    tracing::info!(state = state.name(), "session changed");
  });

  manager
    .restore()
    .await
    .context("failed to restore session")?;

  match cli.command {
    Command::SignUp { email, name } => {
      let password = read_password()?;
      let identity = manager
        .sign_up_with_email(&email, &password, &name)
        .await
        .context("sign-up failed")?;
      print_identity(&identity)?;
    }
    Command::SignIn { email } => {
      let password = read_password()?;
      let identity = manager
        .sign_in_with_email(&email, &password)
        .await
        .context("sign-in failed")?;
      print_identity(&identity)?;
    }
    Command::Google => {
      let identity = manager
        .sign_in_with_google()
        .await
        .context("Google sign-in failed")?;
      print_identity(&identity)?;
    }
    Command::SignOut => {
      manager.sign_out().await.context("sign-out failed")?;
      println!("signed out");
    }
    Command::Whoami => match manager.state() {
      SessionState::Authenticated(identity) => print_identity(&identity)?,
      other => println!(
        "not signed in (route: {})",
        routing::landing_route(&other).path()
      ),
    },
    Command::Role { role } => {
      let identity = manager.select_role(role).await.context("update failed")?;
      print_identity(&identity)?;
    }
    Command::Theme { theme } => {
      let identity = match theme {
        Some(theme) => manager.set_theme(theme).await,
        None => manager.toggle_theme().await,
      }
      .context("update failed")?;
      print_identity(&identity)?;
    }
    Command::Interests { interests } => {
      let identity = manager
        .set_interests(interests)
        .await
        .context("update failed")?;
      print_identity(&identity)?;
    }
    Command::Disable { email } => {
      if credentials.disable_account(&email).await? {
        println!("disabled {email}");
      } else {
        anyhow::bail!("no account for {email}");
      }
    }
  }

  Ok(())
}

fn print_identity(identity: &Identity) -> anyhow::Result<()> {
  let state = SessionState::Authenticated(identity.clone());
  println!("{}", serde_json::to_string_pretty(identity)?);
  println!("route: {}", routing::landing_route(&state).path());
  Ok(())
}

/// Read a password from stdin (no echo control).
fn read_password() -> anyhow::Result<String> {
  let stdin = io::stdin();
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
