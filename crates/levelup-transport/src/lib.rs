//! HTTP transport layer for Levelup.
//!
//! Everything the portal says to its backend goes through one
//! [`ApiClient`]. The client does two things on top of a plain HTTP round
//! trip:
//!
//! 1. **Bearer tagging** — every outbound request carries
//!    `Authorization: Bearer <token>` when the session holds a credential.
//! 2. **Transparent re-authentication** — an HTTP 401 triggers exactly one
//!    `POST /refresh`, and on success exactly one retry of the original
//!    request. A failed refresh tears the session down.
//!
//! # How it fits in the stack
//!
//! ```text
//! Store Layer (above)      ← users / rewards caches issue requests
//!     ↕
//! Session Layer (above)    ← implements CredentialSource, owns persistence
//!     ↕
//! Transport Layer (this crate)  ← ApiClient + Exchange
//! ```
//!
//! The transport never touches storage. It reads and updates the session
//! only through the [`CredentialSource`] trait.
//!
//! # Feature Flags
//!
//! - `reqwest` (default) — [`ReqwestExchange`], backed by `reqwest`
//! - `mock` — [`mock::ScriptedExchange`], an in-memory exchange for tests

#![allow(async_fn_in_trait)]

mod client;
mod config;
mod error;
mod exchange;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
#[cfg(feature = "reqwest")]
mod http;

pub use client::{ApiClient, CredentialSource, NoCredentials};
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::TransportError;
pub use exchange::{Exchange, HttpRequest, HttpResponse, Method};
#[cfg(feature = "reqwest")]
pub use http::ReqwestExchange;
