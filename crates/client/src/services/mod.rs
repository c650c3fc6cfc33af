//! Domain services over the EatHub REST API.
//!
//! # Architecture
//!
//! Every endpoint has a raw call in its service's `base` module that performs
//! the request and returns the unwrapped body. The public service methods
//! compose those with a [`RetryPolicy`] and, for cacheable reads, the
//! [`TtlCache`]. Mutations validate their input before any network call and
//! invalidate the related cache namespace after success.
//!
//! Retry counts are fixed per call site:
//! - reads: 2 retries on network errors and 5xx
//! - reward redemption, voucher validation, token verification: 1 retry
//! - order creation, login, signup, admin and feedback mutations: none

pub mod admin;
pub mod auth;
pub mod feedback;
pub mod menu;
pub mod orders;
pub mod rewards;
pub mod vouchers;

pub use admin::AdminService;
pub use auth::AuthService;
pub use feedback::FeedbackService;
pub use menu::MenuService;
pub use orders::OrderService;
pub use rewards::RewardsService;
pub use vouchers::VoucherService;

use crate::cache::TtlCache;
use crate::config::RetrySettings;
use crate::http::{ApiClient, ApiError};
use crate::retry::RetryPolicy;

/// Retries for idempotent reads.
pub const READ_RETRIES: u32 = 2;

/// Retries for mutations that are safe to repeat once.
pub const MUTATION_RETRIES: u32 = 1;

/// Cache keys. Namespaces end in `_` so they can be invalidated by prefix.
pub mod keys {
    pub const MENU: &str = "menu_";
    pub const CATEGORIES: &str = "categories_";
    pub const REWARDS: &str = "rewards_";
    pub const VOUCHERS: &str = "vouchers_";

    pub const MENU_FEATURED: &str = "menu_featured";
    pub const MENU_ANNOUNCEMENT: &str = "menu_announcement";
    pub const CATEGORIES_ALL: &str = "categories_all";
    pub const REWARDS_STATUS: &str = "rewards_status";
    pub const VOUCHERS_AVAILABLE: &str = "vouchers_available";

    /// `menu_<query>`, e.g. `menu_all` or `menu_category=drinks`.
    #[must_use]
    pub fn menu_list(suffix: &str) -> String {
        format!("menu_{suffix}")
    }

    #[must_use]
    pub fn menu_item(id: &str) -> String {
        format!("menu_item_{id}")
    }
}

/// Freshness window per kind of data.
pub mod ttl {
    use std::time::Duration;

    pub const MENU: Duration = Duration::from_secs(5 * 60);
    pub const FEATURED: Duration = Duration::from_secs(5 * 60);
    pub const CATEGORIES: Duration = Duration::from_secs(30 * 60);
    pub const ANNOUNCEMENT: Duration = Duration::from_secs(2 * 60);
    pub const REWARDS: Duration = Duration::from_secs(60);
    pub const VOUCHERS: Duration = Duration::from_secs(5 * 60);
}

/// Handles shared by every service.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    pub api: ApiClient,
    pub cache: TtlCache,
    pub retry: RetrySettings,
}

impl ServiceContext {
    #[must_use]
    pub const fn new(api: ApiClient, cache: TtlCache, retry: RetrySettings) -> Self {
        Self { api, cache, retry }
    }

    /// Policy for reads.
    #[must_use]
    pub fn read_policy(&self) -> RetryPolicy<ApiError> {
        RetryPolicy::new(READ_RETRIES, ApiError::is_retryable).with_settings(self.retry)
    }

    /// Policy for mutations retried once, and only when the server may not
    /// have processed the request.
    #[must_use]
    pub fn mutation_policy(&self) -> RetryPolicy<ApiError> {
        RetryPolicy::new(MUTATION_RETRIES, |e: &ApiError| {
            e.is_network() || e.is_server_error()
        })
        .with_settings(self.retry)
    }

    /// Policy for calls that must not be repeated.
    #[must_use]
    pub fn no_retry(&self) -> RetryPolicy<ApiError> {
        RetryPolicy::none().with_settings(self.retry)
    }
}

/// Percent-encode `raw` for use as one path segment.
pub(crate) fn segment(raw: &str) -> String {
    urlencoding::encode(raw.trim()).into_owned()
}

/// Reject blank identifiers before they reach a URL.
pub(crate) fn require_id(what: &str, id: &str) -> crate::Result<()> {
    if id.trim().is_empty() {
        return Err(crate::Error::InvalidArgument(format!("{what} is required")));
    }
    Ok(())
}
