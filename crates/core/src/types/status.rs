//! Status enums for orders and payments.
//!
//! [`OrderStatus`] doubles as the order lifecycle state machine:
//!
//! ```text
//! pending ──► processing ──► shipped ──► delivered
//!    │ ▲          ▲
//!    │ └─ paid ───┘
//!    └──► failed
//!
//! any non-terminal state ──► cancelled
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing a status string fails.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl ParseStatusError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Failed,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Paid,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
        Self::Failed,
    ];

    /// Lowercase wire name, also used in template ids (`order_<status>`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    /// Human-readable label for emails and notices.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Payment Failed",
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (_, Self::Cancelled)
            | (Self::Pending, Self::Paid | Self::Failed | Self::Processing)
            | (Self::Paid, Self::Processing)
            | (Self::Processing, Self::Shipped)
            | (Self::Shipped, Self::Delivered) => true,
            _ => false,
        }
    }

    /// Whether entering this status notifies the customer by email.
    #[must_use]
    pub const fn notifies_customer(self) -> bool {
        matches!(
            self,
            Self::Processing | Self::Shipped | Self::Delivered | Self::Cancelled
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseStatusError::new("order status", s))
    }
}

/// Outcome reported by the hosted payment widget's approval callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Funds captured.
    Completed,
    /// Approved but not yet captured.
    Pending,
    /// Capture declined or errored.
    Failed,
}

impl PaymentStatus {
    /// Order status a new order starts in for this payment outcome.
    #[must_use]
    pub const fn initial_order_status(self) -> OrderStatus {
        match self {
            Self::Completed => OrderStatus::Paid,
            Self::Pending => OrderStatus::Pending,
            Self::Failed => OrderStatus::Failed,
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "completed" | "complete" | "approved" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            "failed" | "declined" => Ok(Self::Failed),
            _ => Err(ParseStatusError::new("payment status", s)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        use OrderStatus::{Delivered, Paid, Pending, Processing, Shipped};
        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Paid));
        assert!(Paid.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
    }

    #[test]
    fn test_cancel_from_any_non_terminal() {
        for status in OrderStatus::ALL {
            assert_eq!(
                status.can_transition_to(OrderStatus::Cancelled),
                !status.is_terminal(),
                "{status}"
            );
        }
    }

    #[test]
    fn test_rejected_transitions() {
        use OrderStatus::{Cancelled, Delivered, Pending, Processing, Shipped};
        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Processing));
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Shipped.can_transition_to(Processing));
        assert!(!Processing.can_transition_to(Processing));
    }

    #[test]
    fn test_notifying_statuses() {
        let notifying: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| s.notifies_customer())
            .collect();
        assert_eq!(
            notifying,
            vec![
                OrderStatus::Processing,
                OrderStatus::Shipped,
                OrderStatus::Delivered,
                OrderStatus::Cancelled
            ]
        );
    }

    #[test]
    fn test_parse_and_serde() {
        assert_eq!("Shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("lost".parse::<OrderStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(
            "APPROVED".parse::<PaymentStatus>().unwrap(),
            PaymentStatus::Completed
        );
    }
}
