//! Binder Core - Shared domain types for the Binder TCG storefront.
//!
//! This crate provides the types used across all Binder components:
//! - `storefront` - Catalog, cart, checkout, orders and notifications
//! - `relay` - Email relay service
//! - `cli` - Command-line tools for seeding and order management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no persistence. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money, emails, statuses and card conditions
//! - [`template`] - `{{placeholder}}` substitution for email templates
//! - [`pricing`] - Cart subtotal, shipping and tax rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod template;
pub mod types;

pub use types::*;
