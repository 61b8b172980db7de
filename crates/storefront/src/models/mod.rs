//! Domain models for the storefront.
//!
//! These are the persisted shapes: each serializes to the camelCase JSON kept
//! under its storage key.

pub mod cart;
pub mod order;
pub mod product;

pub use cart::{CartItem, CartLine, CartSummary};
pub use order::{Order, OrderDraft, OrderItem, ShippingAddress, StatusChange, TransitionError};
pub use product::{Category, NewProduct, Product, ProductUpdate};
