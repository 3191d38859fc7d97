//! # Levelup
//!
//! Client-side session and data-sync layer for the Levelup gamification
//! portal.
//!
//! A [`Portal`] wires the three layers around one shared session:
//! the HTTP transport (bearer tagging, one-shot token refresh), the
//! session (login, persistence, route guard) and the two domain caches
//! (users and rewards). Presentation code reads the caches and issues
//! commands through them; it never talks to the backend directly.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use levelup::prelude::*;
//!
//! # async fn run() -> Result<(), LevelupError> {
//! let portal = Portal::builder()
//!     .base_url("http://127.0.0.1:5000")
//!     .store(MemoryStore::new())
//!     .build()?;
//!
//! portal.login("admin", "secret").await?;
//! portal.refresh_all().await?;
//! for user in portal.users().leaderboard() {
//!     println!("{} {}", user.name, user.xp);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod notice;
mod portal;
mod telemetry;

pub use error::LevelupError;
pub use notice::{Notice, NoticeLevel};
pub use portal::{Portal, PortalBuilder};
pub use telemetry::init_tracing;

pub use levelup_session as session;
pub use levelup_store as store;
pub use levelup_transport as transport;

/// Everything a presentation layer usually needs, in one import.
pub mod prelude {
    pub use crate::{LevelupError, Notice, NoticeLevel, Portal, PortalBuilder, init_tracing};
    pub use levelup_session::{
        Credential, FileStore, KeyValueStore, MemoryStore, RouteDecision, SessionError,
        SessionSnapshot, SessionState,
    };
    pub use levelup_store::{
        CacheEnvelope, DEFAULT_XP_GRANT, FailureKind, Reward, RewardId, StoreError, User, UserId,
        XP_PER_LEVEL,
    };
    pub use levelup_transport::{ClientConfig, Exchange, TransportError};
}
