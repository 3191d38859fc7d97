//! `Portal` builder and the wiring of the three layers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use levelup_session::{Authenticator, Credential, FileStore, KeyValueStore, MemoryStore, Session};
use levelup_store::{Reward, RewardCatalog, RewardId, User, UserDirectory, UserId};
use levelup_transport::{ApiClient, ClientConfig, CredentialSource, Exchange, ReqwestExchange};

use crate::LevelupError;

/// Builder for a [`Portal`].
///
/// # Example
///
/// ```rust,no_run
/// use levelup::prelude::*;
///
/// # fn run() -> Result<(), LevelupError> {
/// let portal = Portal::builder()
///     .base_url("https://portal.example.com")
///     .store_path("session.json")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct PortalBuilder {
    config: ClientConfig,
    store: Option<Box<dyn KeyValueStore>>,
    store_path: Option<PathBuf>,
}

impl PortalBuilder {
    /// Creates a builder with default settings and an in-memory store.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            store: None,
            store_path: None,
        }
    }

    /// Sets the backend base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config = self.config.with_base_url(base_url);
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Sets the `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config = self.config.with_user_agent(user_agent);
        self
    }

    /// Replaces the whole transport configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Persists the credential in `store`.
    pub fn store(mut self, store: impl KeyValueStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self.store_path = None;
        self
    }

    /// Persists the credential in a JSON file at `path`, opened at build
    /// time.
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self.store = None;
        self
    }

    /// Builds a portal that talks HTTP through `reqwest`.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the store file cannot be
    /// read.
    pub fn build(self) -> Result<Portal<ReqwestExchange>, LevelupError> {
        let exchange = ReqwestExchange::new(self.config.clone())?;
        self.build_with(exchange)
    }

    /// Builds a portal on top of any [`Exchange`].
    pub fn build_with<E: Exchange>(self, exchange: E) -> Result<Portal<E>, LevelupError> {
        let store: Box<dyn KeyValueStore> = match (self.store, self.store_path) {
            (Some(store), _) => store,
            (None, Some(path)) => Box::new(FileStore::open(path)?),
            (None, None) => Box::new(MemoryStore::new()),
        };

        let session = Arc::new(Session::restore(store));
        let credentials: Arc<dyn CredentialSource> = session.clone();
        let client = ApiClient::new(exchange, credentials);

        tracing::info!(
            base_url = self.config.normalized_base_url(),
            state = %session.state(),
            "portal ready"
        );

        Ok(Portal {
            auth: Authenticator::new(client.clone(), Arc::clone(&session)),
            users: UserDirectory::new(client.clone()),
            rewards: RewardCatalog::new(client.clone()),
            session,
            client,
        })
    }
}

impl Default for PortalBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One client process's view of the backend.
///
/// Every component shares the same session and the same [`ApiClient`],
/// so a token refreshed by one cache request is used by the next request
/// from any other. Clones share everything.
pub struct Portal<E> {
    session: Arc<Session>,
    client: ApiClient<E>,
    auth: Authenticator<E>,
    users: UserDirectory<E>,
    rewards: RewardCatalog<E>,
}

impl<E> Clone for Portal<E> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            client: self.client.clone(),
            auth: self.auth.clone(),
            users: self.users.clone(),
            rewards: self.rewards.clone(),
        }
    }
}

impl Portal<ReqwestExchange> {
    /// Creates a new builder.
    pub fn builder() -> PortalBuilder {
        PortalBuilder::new()
    }
}

impl<E: Exchange> Portal<E> {
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn client(&self) -> &ApiClient<E> {
        &self.client
    }

    pub fn auth(&self) -> &Authenticator<E> {
        &self.auth
    }

    pub fn users(&self) -> &UserDirectory<E> {
        &self.users
    }

    pub fn rewards(&self) -> &RewardCatalog<E> {
        &self.rewards
    }

    /// Logs in and installs the credential.
    pub async fn login(&self, username: &str, password: &str) -> Result<Credential, LevelupError> {
        Ok(self.auth.login(username, password).await?)
    }

    /// Ends the session. The caches keep their last contents until the
    /// next load.
    pub fn logout(&self) {
        self.auth.logout();
    }

    /// Loads users and rewards concurrently.
    ///
    /// Both loads run to completion even if one fails; the first error
    /// (users before rewards) is returned.
    pub async fn refresh_all(&self) -> Result<(), LevelupError> {
        let (users, rewards) = tokio::join!(self.users.load(), self.rewards.load());
        users?;
        rewards?;
        Ok(())
    }

    /// Redeems a reward, then reloads the user directory so the debited
    /// XP becomes visible.
    ///
    /// A failed reload does not undo the redemption; it is recorded on
    /// the user directory and the consumed reward is still returned.
    pub async fn redeem(&self, user_id: UserId, reward_id: RewardId) -> Result<Reward, LevelupError> {
        let reward = self.rewards.redeem(user_id, reward_id).await?;
        if let Err(e) = self.users.load().await {
            tracing::warn!(%user_id, error = %e, "reload after redemption failed");
        }
        Ok(reward)
    }

    /// The current user's own record, matched by username.
    pub fn current_user(&self) -> Option<User> {
        let username = self.session.username()?;
        self.users.users().into_iter().find(|u| u.name == username)
    }
}
