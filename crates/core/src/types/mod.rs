//! Core domain types for Binder.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod card;
pub mod email;
pub mod id;
pub mod money;
pub mod provider;
pub mod status;

pub use card::CardCondition;
pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use provider::EmailProvider;
pub use status::{OrderStatus, ParseStatusError, PaymentStatus};
