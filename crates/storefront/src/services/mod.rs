//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `catalog` - Product and category store
//! - `cart` - Shopping cart with live-price totals
//! - `checkout` - Cart + payment approval to order
//! - `orders` - Order registry and status workflow
//! - `notify` - Email settings, templates and delivery
//! - `seed` - Built-in catalog data

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod notify;
pub mod orders;
pub mod seed;

pub use cart::{CartError, CartStore};
pub use catalog::{CatalogError, ProductStore};
pub use checkout::{CheckoutContext, CheckoutError, CheckoutRequest, complete_checkout};
pub use notify::{EmailOutcome, EmailService, NotifyError};
pub use orders::{OrderError, OrderRegistry, OrderRepository, PlacedOrder, StatusUpdate, StoredOrders};
