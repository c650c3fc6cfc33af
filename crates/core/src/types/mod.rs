//! Core types for EatHub.
//!
//! This module provides type-safe wrappers and the records exchanged with the
//! backend.

pub mod cart;
pub mod email;
pub mod feedback;
pub mod id;
pub mod menu;
pub mod order;
pub mod price;
pub mod principal;
pub mod rewards;
pub mod status;
pub mod voucher;

pub use cart::{CartItem, NewCartItem};
pub use email::{Email, EmailError};
pub use feedback::{Feedback, FeedbackError, NewFeedback};
pub use id::*;
pub use menu::{Announcement, Category, MenuItem, MenuItemInput, MenuQuery};
pub use order::{
    CustomerDetails, Fulfillment, NewOrder, Order, OrderLine, OrderValidationError, PaymentMethod,
};
pub use price::{Price, PriceError};
pub use principal::{AuthResponse, Credentials, Principal, SignupRequest};
pub use rewards::{RedeemRequest, Redemption, Reward, RewardsStatus};
pub use status::{OrderStatus, Role};
pub use voucher::{Discount, ValidateVoucherRequest, Voucher, VoucherInput, VoucherValidation};
