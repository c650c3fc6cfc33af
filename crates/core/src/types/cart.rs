//! Cart line items.

use serde::{Deserialize, Serialize};

use super::id::MenuItemId;
use super::menu::MenuItem;
use super::order::OrderLine;
use super::price::Price;

/// One line in the cart.
///
/// `quantity` is always at least 1; the cart store removes a line rather
/// than keep it at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: MenuItemId,
    pub name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub quantity: u32,
}

impl CartItem {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }

    /// Order line for checkout.
    #[must_use]
    pub fn to_order_line(&self) -> OrderLine {
        OrderLine {
            menu_item_id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
            quantity: self.quantity,
        }
    }
}

/// Payload of an "add to cart" action.
///
/// `quantity` defaults to 1 when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub id: MenuItemId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl NewCartItem {
    /// Set an explicit quantity.
    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }
}

impl From<&MenuItem> for NewCartItem {
    fn from(item: &MenuItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            image: item.image.clone(),
            quantity: None,
        }
    }
}
