//! Authentication session management for Levelup.
//!
//! This crate owns the single credential a client process holds:
//!
//! 1. **Acquisition** — exchanging a username and password for a token
//!    ([`Authenticator::login`])
//! 2. **Persistence** — writing it to an injected [`KeyValueStore`] so it
//!    survives a restart, and reading it back ([`Session::restore`])
//! 3. **Refresh and teardown** — the transport swaps tokens and ends the
//!    session through the [`CredentialSource`](levelup_transport::CredentialSource)
//!    implementation on [`Session`]
//! 4. **Route guard** — a synchronous permit/redirect decision for
//!    protected views ([`Session::guard`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Store Layer (above)    ← caches share the ApiClient built around this session
//!     ↕
//! Session Layer (this crate)  ← credential, state machine, persistence
//!     ↕
//! Transport Layer (below)     ← ApiClient, CredentialSource seam
//! ```

mod auth;
mod credential;
mod error;
mod session;
mod storage;

pub use auth::Authenticator;
pub use credential::Credential;
pub use error::SessionError;
pub use session::{RouteDecision, Session, SessionSnapshot, SessionState};
pub use storage::{
    FileStore, KeyValueStore, MemoryStore, REFRESH_TOKEN_KEY, TOKEN_KEY,
    USERNAME_KEY,
};
