//! Orders and checkout payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::email::Email;
use super::id::{MenuItemId, OrderNumber};
use super::price::Price;
use super::status::OrderStatus;

/// Reasons a [`NewOrder`] is rejected before it is sent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderValidationError {
    #[error("order must contain at least one item")]
    NoItems,
    #[error("item {0} has a zero quantity")]
    ZeroQuantity(MenuItemId),
    #[error("order total must be greater than zero")]
    ZeroTotal,
    #[error("customer name is required")]
    MissingName,
    #[error("customer phone number is required")]
    MissingPhone,
    #[error("delivery address is required for delivery orders")]
    MissingAddress,
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Online,
}

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Fulfillment {
    #[default]
    Pickup,
    Delivery,
}

/// Contact details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[serde(alias = "id")]
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
}

/// Checkout payload for `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer: CustomerDetails,
    pub items: Vec<OrderLine>,
    pub total: Price,
    #[serde(default)]
    pub fulfillment: Fulfillment,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voucher_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewOrder {
    /// Build an order from cart lines; `total` is the sum of the lines.
    #[must_use]
    pub fn from_lines(customer: CustomerDetails, items: Vec<OrderLine>) -> Self {
        let total = items.iter().map(|l| l.price.times(l.quantity)).sum();
        Self {
            customer,
            items,
            total,
            fulfillment: Fulfillment::default(),
            payment_method: PaymentMethod::default(),
            voucher_code: None,
            notes: None,
        }
    }

    /// Check the order before submitting it.
    ///
    /// # Errors
    ///
    /// Returns the first [`OrderValidationError`] found.
    pub fn validate(&self) -> Result<(), OrderValidationError> {
        if self.items.is_empty() {
            return Err(OrderValidationError::NoItems);
        }
        if let Some(line) = self.items.iter().find(|l| l.quantity == 0) {
            return Err(OrderValidationError::ZeroQuantity(line.menu_item_id.clone()));
        }
        if self.total.is_zero() {
            return Err(OrderValidationError::ZeroTotal);
        }
        if self.customer.name.trim().is_empty() {
            return Err(OrderValidationError::MissingName);
        }
        if self.customer.phone.trim().is_empty() {
            return Err(OrderValidationError::MissingPhone);
        }
        if self.fulfillment == Fulfillment::Delivery
            && self
                .customer
                .address
                .as_deref()
                .is_none_or(|a| a.trim().is_empty())
        {
            return Err(OrderValidationError::MissingAddress);
        }
        Ok(())
    }
}

/// An order as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_number: OrderNumber,
    pub items: Vec<OrderLine>,
    pub total: Price,
    #[serde(default)]
    pub discount: Option<Price>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub customer: Option<CustomerDetails>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> CustomerDetails {
        CustomerDetails {
            name: "Ana".into(),
            phone: "0917".into(),
            email: None,
            address: None,
        }
    }

    fn line(quantity: u32) -> OrderLine {
        OrderLine {
            menu_item_id: MenuItemId::new("1"),
            name: "Pizza".into(),
            price: Price::from_cents(1299),
            quantity,
        }
    }

    #[test]
    fn test_from_lines_totals() {
        let order = NewOrder::from_lines(customer(), vec![line(2)]);
        assert_eq!(order.total, Price::from_cents(2598));
        assert_eq!(order.validate(), Ok(()));
    }

    #[test]
    fn test_validation_failures() {
        let empty = NewOrder::from_lines(customer(), vec![]);
        assert_eq!(empty.validate(), Err(OrderValidationError::NoItems));

        let zero = NewOrder::from_lines(customer(), vec![line(0)]);
        assert!(matches!(
            zero.validate(),
            Err(OrderValidationError::ZeroQuantity(_))
        ));

        let mut nameless = NewOrder::from_lines(customer(), vec![line(1)]);
        nameless.customer.name = "  ".into();
        assert_eq!(nameless.validate(), Err(OrderValidationError::MissingName));

        let mut delivery = NewOrder::from_lines(customer(), vec![line(1)]);
        delivery.fulfillment = Fulfillment::Delivery;
        assert_eq!(
            delivery.validate(),
            Err(OrderValidationError::MissingAddress)
        );
    }
}
