//! Status enums and the order lifecycle.
//!
//! [`OrderStatus`] owns the transition table every status change goes
//! through. Callers never assign a status directly; they ask the current
//! status for a [`StatusTransition`] and persist that.

use serde::{Deserialize, Serialize};

/// Order fulfillment status.
///
/// ```text
/// pending -> confirmed -> processing -> shipped -> delivered
///    |           |            |           |
///    +-----------+------------+-----------+--> cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Statuses reachable in one step from `self`.
    #[must_use]
    pub const fn allowed_transitions(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Processing, Self::Cancelled],
            Self::Processing => &[Self::Shipped, Self::Cancelled],
            Self::Shipped => &[Self::Delivered, Self::Cancelled],
            Self::Delivered | Self::Cancelled => &[],
        }
    }

    /// Whether `next` is a legal single step from `self`.
    ///
    /// A status is never a legal successor of itself.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Terminal statuses accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Validate a move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] carrying the allowed set when `next`
    /// is not reachable from `self`.
    pub fn transition_to(self, next: Self) -> Result<StatusTransition, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(StatusTransition {
                from: self,
                to: next,
            })
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
                allowed: self.allowed_transitions().to_vec(),
            })
        }
    }

    /// Lowercase name as stored in the database and sent over the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// A validated single-step status change.
///
/// Only [`OrderStatus::transition_to`] constructs one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusTransition {
    from: OrderStatus,
    to: OrderStatus,
}

impl StatusTransition {
    /// Status before the change.
    #[must_use]
    pub const fn from(&self) -> OrderStatus {
        self.from
    }

    /// Status after the change.
    #[must_use]
    pub const fn to(&self) -> OrderStatus {
        self.to
    }
}

/// A rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot move order from {from} to {to}")]
pub struct InvalidTransition {
    /// Current status.
    pub from: OrderStatus,
    /// Requested status.
    pub to: OrderStatus,
    /// Statuses that would have been accepted.
    pub allowed: Vec<OrderStatus>,
}

/// Payment settlement status of an order or payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Refunded => write!(f, "refunded"),
        }
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Store staff with access to `/admin`.
    Admin,
    #[default]
    Customer,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Customer => write!(f, "customer"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "customer" => Ok(Self::Customer),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const LEGAL: [(OrderStatus, OrderStatus); 8] = [
        (OrderStatus::Pending, OrderStatus::Confirmed),
        (OrderStatus::Pending, OrderStatus::Cancelled),
        (OrderStatus::Confirmed, OrderStatus::Processing),
        (OrderStatus::Confirmed, OrderStatus::Cancelled),
        (OrderStatus::Processing, OrderStatus::Shipped),
        (OrderStatus::Processing, OrderStatus::Cancelled),
        (OrderStatus::Shipped, OrderStatus::Delivered),
        (OrderStatus::Shipped, OrderStatus::Cancelled),
    ];

    #[test]
    fn test_every_pair_matches_table() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = LEGAL.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{from} -> {to} should be {}",
                    if expected { "allowed" } else { "rejected" }
                );
                assert_eq!(from.transition_to(to).is_ok(), expected);
            }
        }
    }

    #[test]
    fn test_self_transition_rejected() {
        for status in OrderStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Delivered.allowed_transitions().is_empty());
        assert!(OrderStatus::Cancelled.allowed_transitions().is_empty());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_rejection_carries_allowed_set() {
        let err = OrderStatus::Pending
            .transition_to(OrderStatus::Shipped)
            .unwrap_err();
        assert_eq!(err.from, OrderStatus::Pending);
        assert_eq!(err.to, OrderStatus::Shipped);
        assert_eq!(
            err.allowed,
            vec![OrderStatus::Confirmed, OrderStatus::Cancelled]
        );
        assert_eq!(err.to_string(), "cannot move order from pending to shipped");
    }

    #[test]
    fn test_transition_records_endpoints() {
        let transition = OrderStatus::Processing
            .transition_to(OrderStatus::Shipped)
            .unwrap();
        assert_eq!(transition.from(), OrderStatus::Processing);
        assert_eq!(transition.to(), OrderStatus::Shipped);
    }

    #[test]
    fn test_happy_path_reaches_delivered() {
        let mut status = OrderStatus::default();
        for next in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            status = status.transition_to(next).unwrap().to();
        }
        assert_eq!(status, OrderStatus::Delivered);
    }

    #[test]
    fn test_status_string_forms_agree() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("refunded".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_user_role_parse() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("super_admin".parse::<UserRole>().is_err());
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
