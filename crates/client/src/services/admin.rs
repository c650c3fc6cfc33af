//! Admin dashboard operations: menu, orders, vouchers and feedback.
//!
//! All calls require a signed-in session; the server decides whether it is
//! an admin one. Mutations are never retried and drop the cache namespaces
//! customers read the changed data through.

use std::sync::Arc;

use eathub_core::{
    Discount, Feedback, FeedbackId, MenuItem, MenuItemId, MenuItemInput, Order, OrderNumber,
    OrderStatus, Principal, Voucher, VoucherId, VoucherInput,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use tracing::{info, instrument};

use super::auth::{credentials, verify_outcome};
use super::{ServiceContext, keys, require_id, segment};
use crate::retry::retry_request;
use crate::store::auth::AuthStore;
use crate::{Error, Result};

/// Raw admin calls. Ids are expected to be path-encoded already.
pub mod base {
    use eathub_core::{
        AuthResponse, Credentials, Feedback, MenuItem, MenuItemInput, Order, OrderStatus, Voucher,
        VoucherInput,
    };
    use serde::de::IgnoredAny;
    use serde_json::json;

    use crate::http::{ApiClient, ApiError};
    use crate::services::auth::VerifyResponse;

    /// `POST /admin/login`
    pub async fn login(api: &ApiClient, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        api.post("admin/login", credentials).await
    }

    /// `GET /admin/verify`
    pub async fn verify(api: &ApiClient) -> Result<VerifyResponse, ApiError> {
        let body: Option<VerifyResponse> = api.get("admin/verify", &[]).await?;
        Ok(body.unwrap_or_default())
    }

    /// `POST /admin/menu`
    pub async fn create_menu_item(api: &ApiClient, input: &MenuItemInput) -> Result<MenuItem, ApiError> {
        api.post("admin/menu", input).await
    }

    /// `PUT /admin/menu/:id`
    pub async fn update_menu_item(
        api: &ApiClient,
        id: &str,
        input: &MenuItemInput,
    ) -> Result<MenuItem, ApiError> {
        api.put(&format!("admin/menu/{id}"), input).await
    }

    /// `DELETE /admin/menu/:id`
    pub async fn delete_menu_item(api: &ApiClient, id: &str) -> Result<(), ApiError> {
        let _: IgnoredAny = api.delete(&format!("admin/menu/{id}")).await?;
        Ok(())
    }

    /// `PATCH /admin/menu/:id/availability`
    pub async fn set_availability(api: &ApiClient, id: &str, available: bool) -> Result<MenuItem, ApiError> {
        api.patch(
            &format!("admin/menu/{id}/availability"),
            &json!({ "available": available }),
        )
        .await
    }

    /// `GET /admin/orders[?status=]`
    pub async fn list_orders(api: &ApiClient, status: Option<OrderStatus>) -> Result<Vec<Order>, ApiError> {
        let query: Vec<(&str, String)> = status
            .map(|s| ("status", s.to_string()))
            .into_iter()
            .collect();
        api.get("admin/orders", &query).await
    }

    /// `PATCH /admin/orders/:orderNumber/status`
    pub async fn update_order_status(
        api: &ApiClient,
        order_number: &str,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        api.patch(
            &format!("admin/orders/{order_number}/status"),
            &json!({ "status": status }),
        )
        .await
    }

    /// `GET /admin/vouchers`
    pub async fn list_vouchers(api: &ApiClient) -> Result<Vec<Voucher>, ApiError> {
        api.get("admin/vouchers", &[]).await
    }

    /// `POST /admin/vouchers`
    pub async fn create_voucher(api: &ApiClient, input: &VoucherInput) -> Result<Voucher, ApiError> {
        api.post("admin/vouchers", input).await
    }

    /// `PUT /admin/vouchers/:id`
    pub async fn update_voucher(
        api: &ApiClient,
        id: &str,
        input: &VoucherInput,
    ) -> Result<Voucher, ApiError> {
        api.put(&format!("admin/vouchers/{id}"), input).await
    }

    /// `DELETE /admin/vouchers/:id`
    pub async fn delete_voucher(api: &ApiClient, id: &str) -> Result<(), ApiError> {
        let _: IgnoredAny = api.delete(&format!("admin/vouchers/{id}")).await?;
        Ok(())
    }

    /// `GET /admin/feedback`
    pub async fn list_feedback(api: &ApiClient) -> Result<Vec<Feedback>, ApiError> {
        api.get("admin/feedback", &[]).await
    }

    /// `DELETE /admin/feedback/:id`
    pub async fn delete_feedback(api: &ApiClient, id: &str) -> Result<(), ApiError> {
        let _: IgnoredAny = api.delete(&format!("admin/feedback/{id}")).await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AdminService {
    ctx: ServiceContext,
    store: Arc<AuthStore>,
}

impl AdminService {
    #[must_use]
    pub const fn new(ctx: ServiceContext, store: Arc<AuthStore>) -> Self {
        Self { ctx, store }
    }

    fn require_session(&self) -> Result<()> {
        if self.store.is_authenticated() {
            Ok(())
        } else {
            Err(Error::NotAuthenticated)
        }
    }

    fn invalidate_menu(&self) {
        self.ctx.cache.invalidate_pattern(keys::MENU);
        self.ctx.cache.invalidate_pattern(keys::CATEGORIES);
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Sign in as an admin.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for malformed credentials, or the
    /// API error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Principal> {
        let credentials = credentials(email, password)?;
        let policy = self.ctx.no_retry();
        let response =
            retry_request(&policy, || base::login(&self.ctx.api, &credentials)).await?;
        let principal = response.user.clone();
        self.store
            .login(SecretString::from(response.token), response.user);
        Ok(principal)
    }

    /// Whether the current token is a valid admin token.
    ///
    /// # Errors
    ///
    /// Returns network and 5xx errors once the single retry is spent.
    #[instrument(skip(self))]
    pub async fn verify(&self) -> Result<bool> {
        let policy = self.ctx.mutation_policy();
        verify_outcome(retry_request(&policy, || base::verify(&self.ctx.api)).await)
    }

    // =========================================================================
    // Menu
    // =========================================================================

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a blank name, or the API error.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_menu_item(&self, input: &MenuItemInput) -> Result<MenuItem> {
        self.require_session()?;
        validate_menu_input(input)?;
        let policy = self.ctx.no_retry();
        let item =
            retry_request(&policy, || base::create_menu_item(&self.ctx.api, input)).await?;
        self.invalidate_menu();
        info!(id = %item.id, "Menu item created");
        Ok(item)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a blank id or name, or the API
    /// error.
    #[instrument(skip(self, input), fields(id = %id))]
    pub async fn update_menu_item(&self, id: &MenuItemId, input: &MenuItemInput) -> Result<MenuItem> {
        self.require_session()?;
        require_id("Menu item id", id.as_str())?;
        validate_menu_input(input)?;
        let id = segment(id.as_str());
        let policy = self.ctx.no_retry();
        let item =
            retry_request(&policy, || base::update_menu_item(&self.ctx.api, &id, input)).await?;
        self.invalidate_menu();
        Ok(item)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a blank id, or the API error.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_menu_item(&self, id: &MenuItemId) -> Result<()> {
        self.require_session()?;
        require_id("Menu item id", id.as_str())?;
        let id = segment(id.as_str());
        let policy = self.ctx.no_retry();
        retry_request(&policy, || base::delete_menu_item(&self.ctx.api, &id)).await?;
        self.invalidate_menu();
        Ok(())
    }

    /// Mark a menu item (un)available without editing anything else.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a blank id, or the API error.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn set_availability(&self, id: &MenuItemId, available: bool) -> Result<MenuItem> {
        self.require_session()?;
        require_id("Menu item id", id.as_str())?;
        let id = segment(id.as_str());
        let policy = self.ctx.no_retry();
        let item = retry_request(&policy, || {
            base::set_availability(&self.ctx.api, &id, available)
        })
        .await?;
        self.invalidate_menu();
        Ok(item)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Orders, optionally only those in `status`.
    ///
    /// # Errors
    ///
    /// Returns an API error once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>> {
        self.require_session()?;
        let policy = self.ctx.read_policy();
        let orders = retry_request(&policy, || base::list_orders(&self.ctx.api, status)).await?;
        Ok(orders)
    }

    /// Move an order from `current` to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `current` cannot move to `next`
    /// (backwards, or out of a terminal state), or the API error.
    #[instrument(skip(self), fields(order_number = %order_number))]
    pub async fn update_order_status(
        &self,
        order_number: &OrderNumber,
        current: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order> {
        self.require_session()?;
        require_id("Order number", order_number.as_str())?;
        if !current.can_transition_to(next) {
            return Err(Error::InvalidArgument(format!(
                "Cannot move an order from {current} to {next}"
            )));
        }
        let number = segment(order_number.as_str());
        let policy = self.ctx.no_retry();
        let order = retry_request(&policy, || {
            base::update_order_status(&self.ctx.api, &number, next)
        })
        .await?;
        info!(%current, %next, "Order status updated");
        Ok(order)
    }

    // =========================================================================
    // Vouchers
    // =========================================================================

    /// # Errors
    ///
    /// Returns an API error once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn list_vouchers(&self) -> Result<Vec<Voucher>> {
        self.require_session()?;
        let policy = self.ctx.read_policy();
        let vouchers = retry_request(&policy, || base::list_vouchers(&self.ctx.api)).await?;
        Ok(vouchers)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a blank code or an out-of-range
    /// discount, or the API error.
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_voucher(&self, input: &VoucherInput) -> Result<Voucher> {
        self.require_session()?;
        validate_voucher_input(input)?;
        let policy = self.ctx.no_retry();
        let voucher = retry_request(&policy, || base::create_voucher(&self.ctx.api, input)).await?;
        self.ctx.cache.invalidate_pattern(keys::VOUCHERS);
        Ok(voucher)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a blank id or invalid input,
    /// or the API error.
    #[instrument(skip(self, input), fields(id = %id))]
    pub async fn update_voucher(&self, id: &VoucherId, input: &VoucherInput) -> Result<Voucher> {
        self.require_session()?;
        require_id("Voucher id", id.as_str())?;
        validate_voucher_input(input)?;
        let id = segment(id.as_str());
        let policy = self.ctx.no_retry();
        let voucher =
            retry_request(&policy, || base::update_voucher(&self.ctx.api, &id, input)).await?;
        self.ctx.cache.invalidate_pattern(keys::VOUCHERS);
        Ok(voucher)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a blank id, or the API error.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_voucher(&self, id: &VoucherId) -> Result<()> {
        self.require_session()?;
        require_id("Voucher id", id.as_str())?;
        let id = segment(id.as_str());
        let policy = self.ctx.no_retry();
        retry_request(&policy, || base::delete_voucher(&self.ctx.api, &id)).await?;
        self.ctx.cache.invalidate_pattern(keys::VOUCHERS);
        Ok(())
    }

    // =========================================================================
    // Feedback
    // =========================================================================

    /// # Errors
    ///
    /// Returns an API error once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn list_feedback(&self) -> Result<Vec<Feedback>> {
        self.require_session()?;
        let policy = self.ctx.read_policy();
        let feedback = retry_request(&policy, || base::list_feedback(&self.ctx.api)).await?;
        Ok(feedback)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a blank id, or the API error.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_feedback(&self, id: &FeedbackId) -> Result<()> {
        self.require_session()?;
        require_id("Feedback id", id.as_str())?;
        let id = segment(id.as_str());
        let policy = self.ctx.no_retry();
        retry_request(&policy, || base::delete_feedback(&self.ctx.api, &id)).await?;
        Ok(())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn validate_menu_input(input: &MenuItemInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(Error::InvalidArgument("Menu item name is required".to_string()));
    }
    Ok(())
}

fn validate_voucher_input(input: &VoucherInput) -> Result<()> {
    if input.code.trim().is_empty() {
        return Err(Error::InvalidArgument("Voucher code is required".to_string()));
    }
    match input.discount {
        Discount::Percentage(p) if p <= Decimal::ZERO || p > Decimal::ONE_HUNDRED => Err(
            Error::InvalidArgument(format!("Percentage discount must be in (0, 100], got {p}")),
        ),
        Discount::Fixed(amount) if amount.is_zero() => Err(Error::InvalidArgument(
            "Fixed discount must be greater than zero".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use eathub_core::Price;

    use super::*;

    fn voucher(discount: Discount) -> VoucherInput {
        VoucherInput {
            code: "WELCOME10".to_string(),
            discount,
            min_order: None,
            expires_at: None,
            active: true,
        }
    }

    #[test]
    fn test_voucher_input_validation() {
        assert!(validate_voucher_input(&voucher(Discount::Percentage(Decimal::TEN))).is_ok());
        assert!(validate_voucher_input(&voucher(Discount::Percentage(Decimal::ZERO))).is_err());
        assert!(
            validate_voucher_input(&voucher(Discount::Percentage(Decimal::from(101)))).is_err()
        );
        assert!(validate_voucher_input(&voucher(Discount::Fixed(Price::ZERO))).is_err());
        assert!(validate_voucher_input(&voucher(Discount::Fixed(Price::from_cents(500)))).is_ok());

        let mut blank = voucher(Discount::Percentage(Decimal::TEN));
        blank.code = "  ".to_string();
        assert!(matches!(
            validate_voucher_input(&blank),
            Err(Error::InvalidArgument(_))
        ));
    }
}
