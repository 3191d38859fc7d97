//! Client-side domain caches for Levelup.
//!
//! Two caches mirror the backend's collections:
//!
//! - [`UserDirectory`] — users with their XP, level and badges
//! - [`RewardCatalog`] — rewards and their XP cost
//!
//! Each wraps its collection in a [`CacheEnvelope`] (`items`, `loading`,
//! `error`) and follows the same pattern for every operation:
//!
//! ```text
//! pending (loading = true, error cleared)
//!     ├──→ fulfilled: apply the server's response, loading = false
//!     └──→ rejected:  keep last-known-good items, record error, loading = false
//! ```
//!
//! The caches are passive mirrors. They never compute XP, levels or
//! balances; every change comes from a server response. Nothing is
//! applied optimistically.

mod envelope;
mod error;
mod model;
mod rewards;
mod users;

pub use envelope::CacheEnvelope;
pub use error::{FailureKind, StoreError};
pub use model::{Reward, RewardId, User, UserId, XP_PER_LEVEL};
pub use rewards::RewardCatalog;
pub use users::{DEFAULT_XP_GRANT, UserDirectory};
