//! The reward catalog: a mirror of `/rewards`.

use std::sync::Arc;

use levelup_transport::{ApiClient, Exchange};
use serde::Serialize;

use crate::envelope::SharedEnvelope;
use crate::{CacheEnvelope, Reward, RewardId, StoreError, UserId};

#[derive(Serialize)]
struct AddReward<'a> {
    name: &'a str,
    xp_cost: u32,
}

#[derive(Serialize)]
struct Redeem {
    reward_id: RewardId,
}

/// Cached reward catalog.
///
/// Clones share the same cache.
pub struct RewardCatalog<E> {
    client: ApiClient<E>,
    cache: Arc<SharedEnvelope<Reward>>,
}

impl<E> Clone for RewardCatalog<E> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<E: Exchange> RewardCatalog<E> {
    /// Creates an empty catalog backed by `client`.
    pub fn new(client: ApiClient<E>) -> Self {
        Self {
            client,
            cache: Arc::new(SharedEnvelope::new()),
        }
    }

    /// A copy of the collection and its request status.
    pub fn snapshot(&self) -> CacheEnvelope<Reward> {
        self.cache.snapshot()
    }

    /// A copy of the cached rewards, in server order.
    pub fn rewards(&self) -> Vec<Reward> {
        self.cache.read().items.clone()
    }

    /// Looks up a cached reward.
    pub fn get(&self, id: RewardId) -> Option<Reward> {
        self.cache.read().items.iter().find(|r| r.id == id).cloned()
    }

    /// Rewards costing at most `xp`.
    ///
    /// A display hint only; the server has the final say on redemption.
    pub fn affordable(&self, xp: u32) -> Vec<Reward> {
        self.cache
            .read()
            .items
            .iter()
            .filter(|r| r.xp_cost <= xp)
            .cloned()
            .collect()
    }

    /// Replaces the catalog with the server's current list.
    pub async fn load(&self) -> Result<Vec<Reward>, StoreError> {
        self.cache
            .track(
                "rewards.load",
                self.client.get::<Vec<Reward>>("/rewards"),
                |items, fresh| items.clone_from(fresh),
            )
            .await
    }

    /// Adds a reward to the catalog.
    ///
    /// The name must be non-blank and the cost positive; both are checked
    /// before any request is sent.
    pub async fn add(&self, name: &str, xp_cost: u32) -> Result<Reward, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.cache.reject_locally("reward name is required"));
        }
        if xp_cost == 0 {
            return Err(self.cache.reject_locally("xp cost must be a positive integer"));
        }

        let reward = self
            .cache
            .track(
                "rewards.add",
                self.client
                    .post::<_, Reward>("/rewards", &AddReward { name, xp_cost }),
                |items, created| items.push(created.clone()),
            )
            .await?;
        tracing::info!(reward_id = %reward.id, name = %reward.name, xp_cost, "reward added");
        Ok(reward)
    }

    /// Redeems a reward for a user.
    ///
    /// On success the consumed reward leaves the catalog (one entry, the
    /// one whose id the server returned). The user's XP debit is not
    /// reflected here; reload the user directory to see it.
    pub async fn redeem(&self, user_id: UserId, reward_id: RewardId) -> Result<Reward, StoreError> {
        let path = format!("/users/{user_id}/redeem");
        let reward = self
            .cache
            .track(
                "rewards.redeem",
                self.client.post::<_, Reward>(&path, &Redeem { reward_id }),
                |items, consumed| {
                    if let Some(pos) = items.iter().position(|r| r.id == consumed.id) {
                        items.remove(pos);
                    }
                },
            )
            .await?;
        tracing::info!(%user_id, reward_id = %reward.id, "reward redeemed");
        Ok(reward)
    }
}
