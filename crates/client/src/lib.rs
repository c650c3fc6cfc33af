//! EatHub client library.
//!
//! Talks to the EatHub REST backend and keeps the customer's cart and
//! session across runs:
//! - [`cache`] - TTL cache over persistent storage
//! - [`retry`] - exponential backoff with per-call-site policies
//! - [`http`] - `reqwest` client with bearer auth and normalized errors
//! - [`services`] - menu, orders, rewards, vouchers, auth, admin, feedback
//! - [`store`] - reducer-driven cart and session stores
//!
//! [`EatHub`] wires them together over one [`storage::Storage`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod retry;
pub mod services;
pub mod storage;
pub mod store;

pub use client::{CheckoutOptions, EatHub};
pub use config::{ClientConfig, ConfigError, RetrySettings};
pub use error::{Error, Result};
pub use http::ApiError;
