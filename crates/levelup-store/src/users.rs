//! The user directory: a mirror of `/users`.

use std::sync::Arc;

use levelup_transport::{ApiClient, Exchange};
use serde::Serialize;

use crate::envelope::SharedEnvelope;
use crate::{CacheEnvelope, StoreError, User, UserId};

/// XP the admin panel grants per click.
pub const DEFAULT_XP_GRANT: u32 = 50;

#[derive(Serialize)]
struct CreateUser<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct GrantXp {
    xp: u32,
}

#[derive(Serialize)]
struct GrantBadge<'a> {
    badge: &'a str,
}

/// Cached collection of portal users.
///
/// Clones share the same cache.
pub struct UserDirectory<E> {
    client: ApiClient<E>,
    cache: Arc<SharedEnvelope<User>>,
}

impl<E> Clone for UserDirectory<E> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<E: Exchange> UserDirectory<E> {
    /// Creates an empty directory backed by `client`.
    pub fn new(client: ApiClient<E>) -> Self {
        Self {
            client,
            cache: Arc::new(SharedEnvelope::new()),
        }
    }

    /// A copy of the collection and its request status.
    pub fn snapshot(&self) -> CacheEnvelope<User> {
        self.cache.snapshot()
    }

    /// A copy of the cached users, in server order.
    pub fn users(&self) -> Vec<User> {
        self.cache.read().items.clone()
    }

    /// Looks up a cached user.
    pub fn get(&self, id: UserId) -> Option<User> {
        self.cache.read().items.iter().find(|u| u.id == id).cloned()
    }

    /// Users ordered by XP, highest first. Ties keep server order.
    pub fn leaderboard(&self) -> Vec<User> {
        let mut users = self.users();
        users.sort_by(|a, b| b.xp.cmp(&a.xp));
        users
    }

    /// Replaces the collection with the server's current list.
    pub async fn load(&self) -> Result<Vec<User>, StoreError> {
        self.cache
            .track("users.load", self.client.get::<Vec<User>>("/users"), |items, fresh| {
                items.clone_from(fresh);
            })
            .await
    }

    /// Asks the server to grant `amount` XP to a user.
    ///
    /// The cached entry is replaced with the user the server returns; the
    /// cache never adds XP or levels up on its own.
    pub async fn grant_xp(&self, user_id: UserId, amount: u32) -> Result<User, StoreError> {
        let path = format!("/users/{user_id}/xp");
        let user = self
            .cache
            .track(
                "users.grant_xp",
                self.client.put::<_, User>(&path, &GrantXp { xp: amount }),
                replace_by_id,
            )
            .await?;
        tracing::info!(%user_id, amount, xp = user.xp, level = user.level, "xp granted");
        Ok(user)
    }

    /// Grants [`DEFAULT_XP_GRANT`] XP.
    pub async fn grant_default_xp(&self, user_id: UserId) -> Result<User, StoreError> {
        self.grant_xp(user_id, DEFAULT_XP_GRANT).await
    }

    /// Asks the server to give a user a badge.
    ///
    /// Duplicates are not filtered here; the server decides.
    pub async fn grant_badge(&self, user_id: UserId, label: &str) -> Result<User, StoreError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(self.cache.reject_locally("badge label is required"));
        }

        let path = format!("/users/{user_id}/add_badge");
        let user = self
            .cache
            .track(
                "users.grant_badge",
                self.client.post::<_, User>(&path, &GrantBadge { badge: label }),
                replace_by_id,
            )
            .await?;
        tracing::info!(%user_id, badge = label, "badge granted");
        Ok(user)
    }

    /// Creates a user with zero XP and appends it to the collection.
    pub async fn create(&self, name: &str) -> Result<User, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.cache.reject_locally("user name is required"));
        }

        let user = self
            .cache
            .track(
                "users.create",
                self.client.post::<_, User>("/users", &CreateUser { name }),
                |items, created| items.push(created.clone()),
            )
            .await?;
        tracing::info!(user_id = %user.id, name = %user.name, "user created");
        Ok(user)
    }
}

/// Swaps in the server's copy of a user. Unknown ids leave the
/// collection untouched.
fn replace_by_id(items: &mut Vec<User>, updated: &User) {
    if let Some(slot) = items.iter_mut().find(|u| u.id == updated.id) {
        *slot = updated.clone();
    }
}
