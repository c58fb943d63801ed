//! Session lifecycle for Muse.
//!
//! [`SessionManager`] owns the signed-in identity of one process. It drives a
//! small state machine (`Initializing` → `Unauthenticated` ⇄ `Authenticated`)
//! from calls into a [`CredentialProvider`](muse_core::credential::CredentialProvider)
//! and events coming back from it, resolves every credential against a
//! [`ProfileStore`](muse_core::store::ProfileStore), and broadcasts each
//! transition to subscribers exactly once.

pub mod config;
pub mod error;
pub mod retry;
pub mod routing;

mod manager;
mod state;
mod subscription;

pub use config::{RetryConfig, SessionConfig};
pub use error::{Error, Result};
pub use manager::{CredentialListener, SessionManager};
pub use state::SessionState;
pub use subscription::Subscription;
