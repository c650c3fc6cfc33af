//! Voucher listing and validation.

use eathub_core::{Price, ValidateVoucherRequest, Voucher, VoucherValidation};
use tracing::{debug, instrument};

use super::{ServiceContext, keys, ttl};
use crate::retry::retry_request;
use crate::{Error, Result};

/// Raw voucher calls.
pub mod base {
    use eathub_core::{ValidateVoucherRequest, Voucher, VoucherValidation};

    use crate::http::{ApiClient, ApiError};

    /// `GET /vouchers/available`
    pub async fn fetch_available(api: &ApiClient) -> Result<Vec<Voucher>, ApiError> {
        api.get("vouchers/available", &[]).await
    }

    /// `POST /vouchers/validate`
    pub async fn validate(
        api: &ApiClient,
        request: &ValidateVoucherRequest,
    ) -> Result<VoucherValidation, ApiError> {
        api.post("vouchers/validate", request).await
    }
}

#[derive(Debug, Clone)]
pub struct VoucherService {
    ctx: ServiceContext,
}

impl VoucherService {
    #[must_use]
    pub const fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Vouchers the signed-in customer may use. Empty when signed out.
    ///
    /// # Errors
    ///
    /// Returns API errors other than 401/403 once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn get_available_vouchers(&self) -> Result<Vec<Voucher>> {
        let policy = self.ctx.read_policy();
        let api = &self.ctx.api;
        let result = self
            .ctx
            .cache
            .with_cache(keys::VOUCHERS_AVAILABLE, Some(ttl::VOUCHERS), || {
                retry_request(&policy, || base::fetch_available(api))
            })
            .await;

        match result {
            Ok(vouchers) => Ok(vouchers),
            Err(e) if e.is_auth_error() => {
                debug!(status = ?e.status, "Not signed in, no vouchers available");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Ask the server whether `code` applies to an order of `order_total`.
    ///
    /// An unknown or expired code is usually a 4xx, returned without retry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a blank code or a zero total,
    /// or the API error.
    #[instrument(skip(self), fields(total = %order_total))]
    pub async fn validate_voucher(
        &self,
        code: &str,
        order_total: Price,
    ) -> Result<VoucherValidation> {
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::InvalidArgument("Voucher code is required".to_string()));
        }
        if order_total.is_zero() {
            return Err(Error::InvalidArgument(
                "Order total must be greater than zero".to_string(),
            ));
        }

        let request = ValidateVoucherRequest {
            code: code.to_string(),
            order_total,
        };
        let policy = self.ctx.mutation_policy();
        let validation =
            retry_request(&policy, || base::validate(&self.ctx.api, &request)).await?;
        Ok(validation)
    }
}
