//! Discount vouchers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::VoucherId;
use super::price::Price;

/// How a voucher reduces the order total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// Percentage of the order total, `0..=100`.
    Percentage(Decimal),
    /// Fixed amount off.
    Fixed(Price),
}

impl Discount {
    /// Amount taken off `total`, never more than `total`.
    #[must_use]
    pub fn amount_for(&self, total: Price) -> Price {
        let raw = match self {
            Self::Percentage(pct) => {
                let pct = (*pct).clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
                total
                    .amount()
                    .checked_mul(pct)
                    .map_or(total.amount() / Decimal::ONE_HUNDRED * pct, |v| {
                        v / Decimal::ONE_HUNDRED
                    })
                    .round_dp(2)
            }
            Self::Fixed(amount) => amount.amount(),
        };
        Price::new(raw.min(total.amount())).unwrap_or(Price::ZERO)
    }
}

/// A voucher as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    pub id: VoucherId,
    pub code: String,
    pub discount: Discount,
    #[serde(default, alias = "minOrderAmount")]
    pub min_order: Option<Price>,
    #[serde(default, alias = "expiryDate")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true", alias = "isActive")]
    pub active: bool,
    #[serde(default)]
    pub description: Option<String>,
}

const fn default_true() -> bool {
    true
}

impl Voucher {
    /// Whether the voucher can be applied to `total` at `now`.
    #[must_use]
    pub fn applies_to(&self, total: Price, now: DateTime<Utc>) -> bool {
        self.active
            && self.expires_at.is_none_or(|at| at > now)
            && self.min_order.is_none_or(|min| total >= min)
    }
}

/// Fields for creating or replacing a voucher (admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherInput {
    pub code: String,
    pub discount: Discount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_order: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
}

/// Body of `POST /vouchers/validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateVoucherRequest {
    pub code: String,
    pub order_total: Price,
}

/// Backend verdict on a voucher code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherValidation {
    pub valid: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, alias = "discount")]
    pub discount_amount: Option<Price>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_percentage_discount() {
        let d = Discount::Percentage(Decimal::new(10, 0));
        assert_eq!(d.amount_for(Price::from_cents(3448)), Price::from_cents(345));
    }

    #[test]
    fn test_percentage_of_huge_total() {
        let d = Discount::Percentage(Decimal::new(50, 0));
        let amount = d.amount_for(Price::MAX);
        assert!(amount < Price::MAX);
        assert!(amount > Price::ZERO);
    }

    #[test]
    fn test_fixed_discount_capped_at_total() {
        let d = Discount::Fixed(Price::from_cents(5000));
        assert_eq!(d.amount_for(Price::from_cents(1200)), Price::from_cents(1200));
    }

    #[test]
    fn test_applies_to() {
        let now = Utc::now();
        let voucher: Voucher = serde_json::from_value(serde_json::json!({
            "id": 3,
            "code": "WELCOME",
            "discount": {"type": "fixed", "value": 50},
            "minOrder": 200,
        }))
        .unwrap();
        assert!(voucher.applies_to(Price::from_cents(20000), now));
        assert!(!voucher.applies_to(Price::from_cents(19999), now));

        let expired = Voucher {
            expires_at: Some(now - Duration::hours(1)),
            ..voucher
        };
        assert!(!expired.applies_to(Price::from_cents(20000), now));
    }
}
