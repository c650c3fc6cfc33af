//! The [`EatHub`] handle: one HTTP client, cache, cart and session shared by
//! every service.

use std::sync::Arc;

use eathub_core::{CustomerDetails, Fulfillment, NewOrder, Order, PaymentMethod};
use tracing::{info, instrument};

use crate::cache::TtlCache;
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::http::{ApiClient, TokenProvider};
use crate::services::{
    AdminService, AuthService, FeedbackService, MenuService, OrderService, RewardsService,
    ServiceContext, VoucherService, keys,
};
use crate::storage::Storage;
use crate::store::auth::AuthStore;
use crate::store::cart::CartStore;
use crate::Result;

/// Checkout choices beyond the customer's contact details.
#[derive(Debug, Clone, Default)]
pub struct CheckoutOptions {
    pub fulfillment: Fulfillment,
    pub payment_method: PaymentMethod,
    pub voucher_code: Option<String>,
    pub notes: Option<String>,
}

/// EatHub client. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct EatHub {
    inner: Arc<EatHubInner>,
}

struct EatHubInner {
    config: ClientConfig,
    cache: TtlCache,
    cart: CartStore,
    session: Arc<AuthStore>,
    menu: MenuService,
    orders: OrderService,
    rewards: RewardsService,
    vouchers: VoucherService,
    auth: AuthService,
    admin: AdminService,
    feedback: FeedbackService,
}

impl EatHub {
    /// Build a client over `storage`, restoring any saved cart and session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, storage: Arc<dyn Storage>) -> Result<Self> {
        Self::with_clock(config, storage, Arc::new(SystemClock))
    }

    /// Like [`EatHub::new`] with an explicit clock for cache expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_clock(
        config: ClientConfig,
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let session = Arc::new(AuthStore::new(Arc::clone(&storage)));
        let tokens: Arc<dyn TokenProvider> = session.clone();
        let api = ApiClient::new(&config, Some(tokens))?;
        let cache = TtlCache::with_clock(Arc::clone(&storage), clock)
            .with_default_ttl(config.cache_ttl);
        let cart = CartStore::new(storage);

        let ctx = ServiceContext::new(api, cache.clone(), config.retry);
        info!(
            base_url = %config.base_url,
            signed_in = session.is_authenticated(),
            cart_items = cart.item_count(),
            "EatHub client ready"
        );

        Ok(Self {
            inner: Arc::new(EatHubInner {
                menu: MenuService::new(ctx.clone()),
                orders: OrderService::new(ctx.clone()),
                rewards: RewardsService::new(ctx.clone()),
                vouchers: VoucherService::new(ctx.clone()),
                auth: AuthService::new(ctx.clone(), Arc::clone(&session)),
                admin: AdminService::new(ctx.clone(), Arc::clone(&session)),
                feedback: FeedbackService::new(ctx),
                config,
                cache,
                cart,
                session,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn cache(&self) -> &TtlCache {
        &self.inner.cache
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// The session store.
    #[must_use]
    pub fn session(&self) -> &AuthStore {
        &self.inner.session
    }

    #[must_use]
    pub fn menu(&self) -> &MenuService {
        &self.inner.menu
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn rewards(&self) -> &RewardsService {
        &self.inner.rewards
    }

    #[must_use]
    pub fn vouchers(&self) -> &VoucherService {
        &self.inner.vouchers
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn admin(&self) -> &AdminService {
        &self.inner.admin
    }

    #[must_use]
    pub fn feedback(&self) -> &FeedbackService {
        &self.inner.feedback
    }

    /// Place an order for the current cart and empty it on success.
    ///
    /// The cart is left untouched when the order fails.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] for an empty cart or
    /// incomplete details, or the API error.
    #[instrument(skip(self, customer, options))]
    pub async fn checkout(&self, customer: CustomerDetails, options: CheckoutOptions) -> Result<Order> {
        let mut order = NewOrder::from_lines(customer, self.inner.cart.state().to_order_lines());
        order.fulfillment = options.fulfillment;
        order.payment_method = options.payment_method;
        order.voucher_code = options
            .voucher_code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        order.notes = options.notes;

        let created = self.inner.orders.create_order(&order).await?;
        self.inner.cart.clear();
        Ok(created)
    }

    /// End the session and drop data cached for the signed-in user.
    pub fn logout(&self) {
        self.inner.session.logout();
        self.inner.cache.invalidate_pattern(keys::REWARDS);
        self.inner.cache.invalidate_pattern(keys::VOUCHERS);
    }
}

impl std::fmt::Debug for EatHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EatHub")
            .field("base_url", &self.inner.config.base_url.as_str())
            .field("signed_in", &self.inner.session.is_authenticated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use eathub_core::{NewCartItem, Price};
    use secrecy::SecretString;

    use super::*;
    use crate::storage::MemoryStorage;
    use crate::Error;

    fn client(storage: Arc<dyn Storage>) -> EatHub {
        let config = ClientConfig::new("http://127.0.0.1:9/api").unwrap();
        EatHub::new(config, storage).unwrap()
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_is_rejected_locally() {
        let hub = client(Arc::new(MemoryStorage::new()));
        let customer = CustomerDetails {
            name: "Ana".to_string(),
            phone: "555-0100".to_string(),
            ..CustomerDetails::default()
        };

        let err = hub.checkout(customer, CheckoutOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_checkout_keeps_cart_on_validation_error() {
        let hub = client(Arc::new(MemoryStorage::new()));
        hub.cart().add_item(NewCartItem {
            id: "pizza".into(),
            name: "Margherita".to_string(),
            price: Price::from_cents(1299),
            image: None,
            quantity: None,
        });

        let err = hub
            .checkout(CustomerDetails::default(), CheckoutOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(hub.cart().item_count(), 1);
    }

    #[test]
    fn test_logout_drops_user_cache() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let hub = client(Arc::clone(&storage));
        let principal = serde_json::from_str(r#"{"id":"u1","name":"Ana"}"#).unwrap();
        hub.session()
            .login(SecretString::from("tok".to_string()), principal);
        hub.cache().set(keys::REWARDS_STATUS, &1, None);
        hub.cache().set(keys::CATEGORIES_ALL, &2, None);

        hub.logout();

        assert!(!hub.session().is_authenticated());
        assert_eq!(hub.cache().get::<i32>(keys::REWARDS_STATUS), None);
        assert_eq!(hub.cache().get::<i32>(keys::CATEGORIES_ALL), Some(2));
    }

    #[test]
    fn test_restores_saved_state() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let first = client(Arc::clone(&storage));
        first.cart().add_item(NewCartItem {
            id: "salad".into(),
            name: "Caesar".to_string(),
            price: Price::from_cents(850),
            image: None,
            quantity: Some(2),
        });

        let second = client(storage);
        assert_eq!(second.cart().item_count(), 2);
    }
}
