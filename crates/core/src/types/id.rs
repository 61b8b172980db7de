//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. Ids are strings so
//! seeded catalog entries can use readable slugs alongside generated ids.

use rand::Rng;

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `AsRef<str>` implementations
///
/// # Example
///
/// ```rust
/// # use binder_core::define_id;
/// define_id!(ShelfId);
/// define_id!(BinderId);
///
/// let shelf = ShelfId::new("shelf-1");
/// let binder = BinderId::new("shelf-1");
///
/// // These are different types, so this won't compile:
/// // let _: ShelfId = binder;
/// assert_eq!(shelf.as_str(), binder.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(CategoryId);
define_id!(OrderId);
define_id!(TemplateId);

impl ProductId {
    /// Generate a fresh random product id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("prod-{}", uuid::Uuid::new_v4().simple()))
    }
}

impl OrderId {
    /// Generate an order number of the form `ORD-<unix millis>-<4 digits>`.
    #[must_use]
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix: u16 = rand::rng().random_range(1000..10_000);
        Self(format!("ORD-{millis}-{suffix}"))
    }
}

impl TemplateId {
    /// The template sent when an order is placed.
    pub const ORDER_CONFIRMATION: &'static str = "order_confirmation";
    /// The template sent by the settings panel's "send test" action.
    pub const TEST_EMAIL: &'static str = "test_email";

    /// Template id used for status-change notifications, e.g. `order_shipped`.
    #[must_use]
    pub fn for_status(status: crate::OrderStatus) -> Self {
        Self(format!("order_{}", status.as_str()))
    }
}
