//! Loyalty points and reward redemption.

use eathub_core::{RedeemRequest, Redemption, RewardId, RewardsStatus};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{ServiceContext, keys, ttl};
use crate::retry::retry_request;
use crate::{Error, Result};

/// Raw rewards calls.
pub mod base {
    use eathub_core::{RedeemRequest, Redemption, RewardsStatus};

    use crate::http::{ApiClient, ApiError};

    /// `GET /rewards/status`
    pub async fn fetch_status(api: &ApiClient) -> Result<RewardsStatus, ApiError> {
        api.get("rewards/status", &[]).await
    }

    /// `POST /rewards/redeem`, tagged with `idempotency_key`.
    pub async fn redeem(
        api: &ApiClient,
        request: &RedeemRequest,
        idempotency_key: &str,
    ) -> Result<Redemption, ApiError> {
        api.post_idempotent("rewards/redeem", request, idempotency_key)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct RewardsService {
    ctx: ServiceContext,
}

impl RewardsService {
    #[must_use]
    pub const fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Points balance and redeemable rewards.
    ///
    /// Without a valid session (401/403) this returns
    /// [`RewardsStatus::signed_out`] instead of an error. The placeholder is
    /// not cached.
    ///
    /// # Errors
    ///
    /// Returns other API errors once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn get_rewards_status(&self) -> Result<RewardsStatus> {
        let policy = self.ctx.read_policy();
        let api = &self.ctx.api;
        let result = self
            .ctx
            .cache
            .with_cache(keys::REWARDS_STATUS, Some(ttl::REWARDS), || {
                retry_request(&policy, || base::fetch_status(api))
            })
            .await;

        match result {
            Ok(status) => Ok(status),
            Err(e) if e.is_auth_error() => {
                debug!(status = ?e.status, "Not signed in, using empty rewards status");
                Ok(RewardsStatus::signed_out())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Spend `points` on `reward_id`.
    ///
    /// Retried once on network errors and 5xx. Every attempt carries the same
    /// `Idempotency-Key`, so a retry after a lost response cannot redeem
    /// twice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a blank reward id or zero
    /// points, or the API error (4xx is never retried).
    #[instrument(skip(self), fields(reward_id = %reward_id))]
    pub async fn redeem_reward(&self, reward_id: &RewardId, points: u32) -> Result<Redemption> {
        if reward_id.is_blank() {
            return Err(Error::InvalidArgument("Reward id is required".to_string()));
        }
        if points == 0 {
            return Err(Error::InvalidArgument(
                "Points to redeem must be greater than zero".to_string(),
            ));
        }

        let request = RedeemRequest {
            reward_id: reward_id.clone(),
            points,
        };
        let key = Uuid::new_v4().to_string();
        let policy = self.ctx.mutation_policy();
        let redemption = retry_request(&policy, || {
            base::redeem(&self.ctx.api, &request, &key)
        })
        .await?;

        self.ctx.cache.invalidate_pattern(keys::REWARDS);
        info!(points_spent = redemption.points_spent, "Reward redeemed");
        Ok(redemption)
    }
}
