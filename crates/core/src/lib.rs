//! EatHub Core - Shared domain types.
//!
//! This crate provides the types exchanged between the EatHub client library,
//! the CLI and the EatHub REST backend:
//! - menu items, categories and announcements
//! - cart lines and orders
//! - rewards, vouchers and feedback
//! - authenticated principals
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no storage,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, prices, emails, statuses and the domain records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
