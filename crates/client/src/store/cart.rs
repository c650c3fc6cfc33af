//! Shopping cart, persisted under [`CART_KEY`].

use std::sync::Arc;

use eathub_core::{CartItem, MenuItemId, NewCartItem, OrderLine, Price};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Reducer, Store};
use crate::storage::Storage;

/// Storage key holding the cart lines as a JSON array.
pub const CART_KEY: &str = "eathub_cart";

/// Cart contents, one line per menu item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartState {
    items: Vec<CartItem>,
}

/// Cart mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Merge into the line with the same id, or append a new line.
    AddItem(NewCartItem),
    /// Set a line's quantity; zero or less removes it.
    UpdateQuantity { id: MenuItemId, quantity: i64 },
    RemoveItem(MenuItemId),
    Clear,
}

impl Reducer for CartState {
    type Action = CartAction;

    fn reduce(&self, action: CartAction) -> Self {
        let mut items = self.items.clone();
        match action {
            CartAction::AddItem(new) => {
                let quantity = new.quantity.unwrap_or(1);
                if quantity == 0 {
                    return self.clone();
                }
                match items.iter_mut().find(|i| i.id == new.id) {
                    Some(line) => line.quantity = line.quantity.saturating_add(quantity),
                    None => items.push(CartItem {
                        id: new.id,
                        name: new.name,
                        price: new.price,
                        image: new.image,
                        quantity,
                    }),
                }
            }
            CartAction::UpdateQuantity { id, quantity } => {
                if quantity <= 0 {
                    items.retain(|i| i.id != id);
                } else if let Some(line) = items.iter_mut().find(|i| i.id == id) {
                    line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                }
            }
            CartAction::RemoveItem(id) => items.retain(|i| i.id != id),
            CartAction::Clear => items.clear(),
        }
        Self { items }
    }
}

impl CartState {
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines, saturating at `u32::MAX`.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |count, i| count.saturating_add(i.quantity))
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Quantity of `id` in the cart, 0 if absent.
    #[must_use]
    pub fn quantity_of(&self, id: &MenuItemId) -> u32 {
        self.items
            .iter()
            .find(|i| &i.id == id)
            .map_or(0, |i| i.quantity)
    }

    /// Order lines for checkout.
    #[must_use]
    pub fn to_order_lines(&self) -> Vec<OrderLine> {
        self.items.iter().map(CartItem::to_order_line).collect()
    }
}

/// The cart, rehydrated from and persisted to storage.
///
/// Persistence failures are logged; the in-memory cart stays authoritative.
pub struct CartStore {
    store: Store<CartState>,
}

impl CartStore {
    /// Load the cart from `storage` and persist every change back to it.
    ///
    /// A missing or unreadable cart starts empty.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let store = Store::new(load(storage.as_ref()));
        store.subscribe(move |state: &CartState| save(storage.as_ref(), state));
        Self { store }
    }

    pub fn dispatch(&self, action: CartAction) -> CartState {
        self.store.dispatch(action)
    }

    /// Snapshot of the cart.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.store.state()
    }

    pub fn add_item(&self, item: NewCartItem) -> CartState {
        self.dispatch(CartAction::AddItem(item))
    }

    pub fn update_quantity(&self, id: MenuItemId, quantity: i64) -> CartState {
        self.dispatch(CartAction::UpdateQuantity { id, quantity })
    }

    pub fn remove_item(&self, id: MenuItemId) -> CartState {
        self.dispatch(CartAction::RemoveItem(id))
    }

    pub fn clear(&self) -> CartState {
        self.dispatch(CartAction::Clear)
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.store.with_state(CartState::item_count)
    }

    #[must_use]
    pub fn total_price(&self) -> Price {
        self.store.with_state(CartState::total_price)
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.store.fmt(f)
    }
}

fn load(storage: &dyn Storage) -> CartState {
    let raw = match storage.get_item(CART_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return CartState::default(),
        Err(e) => {
            warn!(error = %e, "Failed to read saved cart");
            return CartState::default();
        }
    };
    match serde_json::from_str::<Vec<CartItem>>(&raw) {
        Ok(lines) => rebuild(lines),
        Err(e) => {
            warn!(error = %e, "Saved cart is corrupt, starting empty");
            CartState::default()
        }
    }
}

/// Replay saved lines through the reducer: zero-quantity lines are dropped
/// and repeated ids merge into one line.
fn rebuild(lines: Vec<CartItem>) -> CartState {
    let saved = lines.len();
    let state = lines.into_iter().fold(CartState::default(), |state, line| {
        state.reduce(CartAction::AddItem(NewCartItem {
            id: line.id,
            name: line.name,
            price: line.price,
            image: line.image,
            quantity: Some(line.quantity),
        }))
    });
    if state.items.len() != saved {
        warn!(saved, kept = state.items.len(), "Repaired saved cart");
    }
    state
}

fn save(storage: &dyn Storage, state: &CartState) {
    let encoded = match serde_json::to_string(state) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "Failed to encode cart");
            return;
        }
    };
    match storage.set_item(CART_KEY, &encoded) {
        Ok(()) => debug!(lines = state.items.len(), "Saved cart"),
        Err(e) => warn!(error = %e, "Failed to save cart"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn pizza() -> NewCartItem {
        NewCartItem {
            id: "pizza".into(),
            name: "Margherita".to_string(),
            price: Price::from_cents(1299),
            image: None,
            quantity: None,
        }
    }

    fn salad() -> NewCartItem {
        NewCartItem {
            id: "salad".into(),
            name: "Caesar".to_string(),
            price: Price::from_cents(850),
            image: Some("/img/salad.png".to_string()),
            quantity: None,
        }
    }

    #[test]
    fn test_add_merges_same_id() {
        let state = CartState::default()
            .reduce(CartAction::AddItem(pizza()))
            .reduce(CartAction::AddItem(pizza().with_quantity(2)));

        assert_eq!(state.items().len(), 1);
        assert_eq!(state.quantity_of(&"pizza".into()), 3);
    }

    #[test]
    fn test_add_zero_quantity_is_noop() {
        let state = CartState::default().reduce(CartAction::AddItem(pizza().with_quantity(0)));
        assert!(state.is_empty());
    }

    #[test]
    fn test_totals() {
        let state = CartState::default()
            .reduce(CartAction::AddItem(pizza().with_quantity(2)))
            .reduce(CartAction::AddItem(salad()));

        assert_eq!(state.item_count(), 3);
        assert_eq!(state.total_price(), Price::from_cents(3448));
        assert_eq!(state.total_price().to_string(), "34.48");
    }

    #[test]
    fn test_update_to_zero_equals_remove() {
        let cart = CartState::default()
            .reduce(CartAction::AddItem(pizza()))
            .reduce(CartAction::AddItem(salad()));

        let updated = cart.reduce(CartAction::UpdateQuantity {
            id: "pizza".into(),
            quantity: 0,
        });
        let removed = cart.reduce(CartAction::RemoveItem("pizza".into()));

        assert_eq!(updated, removed);
        assert_eq!(
            cart.reduce(CartAction::UpdateQuantity {
                id: "pizza".into(),
                quantity: -3,
            }),
            removed
        );
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let cart = CartState::default().reduce(CartAction::AddItem(pizza()));
        let same = cart.reduce(CartAction::UpdateQuantity {
            id: "ghost".into(),
            quantity: 4,
        });
        assert_eq!(cart, same);
    }

    #[test]
    fn test_order_lines() {
        let cart = CartState::default().reduce(CartAction::AddItem(salad().with_quantity(2)));
        let lines = cart.to_order_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].menu_item_id.as_str(), "salad");
        assert_eq!(lines[0].quantity, 2);
    }

    #[test]
    fn test_persists_and_rehydrates() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());

        let cart = CartStore::new(Arc::clone(&storage));
        cart.add_item(pizza().with_quantity(2));
        cart.add_item(salad());

        let reloaded = CartStore::new(Arc::clone(&storage));
        assert_eq!(reloaded.state(), cart.state());
        assert_eq!(reloaded.item_count(), 3);

        reloaded.clear();
        assert_eq!(storage.get_item(CART_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_item_count_saturates() {
        let state = CartState::default()
            .reduce(CartAction::AddItem(pizza().with_quantity(u32::MAX)))
            .reduce(CartAction::AddItem(salad()));

        assert_eq!(state.item_count(), u32::MAX);
    }

    #[test]
    fn test_total_of_huge_cart_saturates() {
        let mut huge = pizza().with_quantity(u32::MAX);
        huge.price = serde_json::from_str("1e20").unwrap();
        let state = CartState::default()
            .reduce(CartAction::AddItem(huge))
            .reduce(CartAction::AddItem(salad()));

        assert_eq!(state.total_price(), Price::MAX);
    }

    #[test]
    fn test_saved_cart_is_repaired_on_load() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage
            .set_item(
                CART_KEY,
                r#"[
                    {"id":"a","name":"A","price":1.0,"quantity":0},
                    {"id":"pizza","name":"Margherita","price":12.99,"quantity":1},
                    {"id":"pizza","name":"Margherita","price":12.99,"quantity":2}
                ]"#,
            )
            .unwrap();

        let cart = CartStore::new(storage).state();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity_of(&"a".into()), 0);
        assert_eq!(cart.quantity_of(&"pizza".into()), 3);
    }

    #[test]
    fn test_corrupt_saved_cart_starts_empty() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage.set_item(CART_KEY, "[{\"id\":").unwrap();

        let cart = CartStore::new(storage);
        assert!(cart.state().is_empty());
        assert_eq!(cart.total_price(), Price::ZERO);
    }
}
