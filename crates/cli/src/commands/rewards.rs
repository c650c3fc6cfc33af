//! Rewards and voucher commands.

use eathub_client::EatHub;
use eathub_core::RewardId;

use super::{CliError, parse_price};

/// `eathub rewards status`
#[allow(clippy::print_stdout)]
pub async fn status(hub: &EatHub) -> Result<(), CliError> {
    let status = hub.rewards().get_rewards_status().await?;
    if !status.enrolled {
        println!("Sign in to collect points and redeem rewards.");
        return Ok(());
    }

    match &status.tier {
        Some(tier) => println!("{} points ({tier})", status.points),
        None => println!("{} points", status.points),
    }
    for reward in &status.available_rewards {
        let marker = if reward.points_required <= status.points { "+" } else { " " };
        println!(
            "{marker} [{}] {} - {} points",
            reward.id, reward.name, reward.points_required
        );
    }
    Ok(())
}

/// `eathub rewards redeem <reward-id>`
#[allow(clippy::print_stdout)]
pub async fn redeem(hub: &EatHub, reward_id: &str) -> Result<(), CliError> {
    let status = hub.rewards().get_rewards_status().await?;
    let reward_id = RewardId::new(reward_id);
    let reward = status
        .available_rewards
        .iter()
        .find(|r| r.id == reward_id)
        .ok_or_else(|| CliError::Usage(format!("Unknown reward '{reward_id}'")))?;
    if reward.points_required > status.points {
        return Err(CliError::Usage(format!(
            "{} needs {} points, you have {}",
            reward.name, reward.points_required, status.points
        )));
    }

    let redemption = hub
        .rewards()
        .redeem_reward(&reward.id, reward.points_required)
        .await?;
    println!(
        "Redeemed {}. {} points left.",
        reward.name, redemption.remaining_points
    );
    if let Some(code) = &redemption.voucher_code {
        println!("Voucher code: {code}");
    }
    Ok(())
}

/// `eathub vouchers list`
#[allow(clippy::print_stdout)]
pub async fn vouchers(hub: &EatHub) -> Result<(), CliError> {
    let vouchers = hub.vouchers().get_available_vouchers().await?;
    if vouchers.is_empty() {
        println!("No vouchers available.");
        return Ok(());
    }
    for voucher in &vouchers {
        match &voucher.description {
            Some(description) => println!("{} - {description}", voucher.code),
            None => println!("{}", voucher.code),
        }
    }
    Ok(())
}

/// `eathub vouchers check <code>`
#[allow(clippy::print_stdout)]
pub async fn check_voucher(hub: &EatHub, code: &str, total: Option<&str>) -> Result<(), CliError> {
    let total = match total {
        Some(raw) => parse_price(raw)?,
        None => hub.cart().total_price(),
    };
    let validation = hub.vouchers().validate_voucher(code, total).await?;
    if validation.valid {
        let discount = validation.discount_amount.unwrap_or_default();
        println!("{code} is valid: {discount} off {total}");
    } else {
        println!(
            "{code} cannot be used: {}",
            validation.message.as_deref().unwrap_or("not valid for this order")
        );
    }
    Ok(())
}
