//! Loyalty points and rewards.

use serde::{Deserialize, Serialize};

use super::id::RewardId;

/// A reward that can be bought with points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: RewardId,
    pub name: String,
    #[serde(alias = "points", alias = "pointsCost")]
    pub points_required: u32,
    #[serde(default)]
    pub description: Option<String>,
}

/// The signed-in customer's points balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RewardsStatus {
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default, alias = "rewards")]
    pub available_rewards: Vec<Reward>,
    /// False when the status is the signed-out placeholder.
    #[serde(default = "default_true")]
    pub enrolled: bool,
}

const fn default_true() -> bool {
    true
}

impl RewardsStatus {
    /// What a visitor without a session sees: no points, nothing to redeem.
    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            points: 0,
            tier: None,
            available_rewards: Vec::new(),
            enrolled: false,
        }
    }

    /// Rewards the current balance can pay for.
    pub fn affordable(&self) -> impl Iterator<Item = &Reward> {
        self.available_rewards
            .iter()
            .filter(|r| r.points_required <= self.points)
    }
}

/// Body of `POST /rewards/redeem`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    pub reward_id: RewardId,
    pub points: u32,
}

/// Result of a redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub reward_id: RewardId,
    #[serde(default)]
    pub points_spent: u32,
    #[serde(default)]
    pub remaining_points: u32,
    /// Voucher issued for the reward, if any.
    #[serde(default)]
    pub voucher_code: Option<String>,
}
