//! Order placement and tracking.

use eathub_core::{NewOrder, Order, OrderNumber};
use tracing::{info, instrument};

use super::{ServiceContext, keys, require_id, segment};
use crate::Result;
use crate::retry::retry_request;

/// Raw order calls.
pub mod base {
    use eathub_core::{NewOrder, Order};

    use crate::http::{ApiClient, ApiError};

    /// `POST /orders`
    pub async fn create_order(api: &ApiClient, order: &NewOrder) -> Result<Order, ApiError> {
        api.post("orders", order).await
    }

    /// `GET /orders/:orderNumber`
    pub async fn fetch_order(api: &ApiClient, order_number: &str) -> Result<Order, ApiError> {
        api.get(&format!("orders/{order_number}"), &[]).await
    }
}

#[derive(Debug, Clone)]
pub struct OrderService {
    ctx: ServiceContext,
}

impl OrderService {
    #[must_use]
    pub const fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Submit an order.
    ///
    /// Never retried: a timeout leaves it unknown whether the order was
    /// placed. On success the rewards and voucher caches are dropped, since
    /// the order may have earned points or consumed a voucher.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] if the order fails
    /// validation, or the API error unchanged.
    #[instrument(skip(self, order), fields(lines = order.items.len(), total = %order.total))]
    pub async fn create_order(&self, order: &NewOrder) -> Result<Order> {
        order.validate()?;

        let policy = self.ctx.no_retry();
        let created = retry_request(&policy, || base::create_order(&self.ctx.api, order)).await?;

        self.ctx.cache.invalidate_pattern(keys::REWARDS);
        self.ctx.cache.invalidate_pattern(keys::VOUCHERS);
        info!(order_number = %created.order_number, "Order placed");
        Ok(created)
    }

    /// Look up an order by number. Not cached; status changes often.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] for a blank order number,
    /// or an API error once retries are exhausted.
    #[instrument(skip(self), fields(order_number = %order_number))]
    pub async fn get_order(&self, order_number: &OrderNumber) -> Result<Order> {
        require_id("Order number", order_number.as_str())?;
        let policy = self.ctx.read_policy();
        let number = segment(order_number.as_str());
        let order = retry_request(&policy, || base::fetch_order(&self.ctx.api, &number)).await?;
        Ok(order)
    }
}
