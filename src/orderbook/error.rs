use serde::{Deserialize, Serialize};
use std::fmt;

use crate::orderbook::types::{OrderId, Position, Quantity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderBookError {
    /// Order not found in the book
    OrderNotFound,

    /// Invalid price (zero, negative or not finite)
    InvalidPrice,

    /// Invalid quantity (zero)
    InvalidQuantity,

    /// Accepting the order would push the aggregate position past the limit
    RiskLimitExceeded { projected: Position, limit: Position },

    /// Reduction larger than the order's remaining quantity
    InsufficientQuantity {
        order_id: OrderId,
        requested: Quantity,
        remaining: Quantity,
    },

    /// Cannot fill more than remaining quantity
    OverFill,
}

impl fmt::Display for OrderBookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderBookError::OrderNotFound => write!(f, "Order not found"),
            OrderBookError::InvalidPrice => write!(f, "Invalid price"),
            OrderBookError::InvalidQuantity => write!(f, "Invalid quantity"),
            OrderBookError::RiskLimitExceeded { projected, limit } => write!(
                f,
                "Position limit exceeded: projected {} exceeds limit {}",
                projected, limit
            ),
            OrderBookError::InsufficientQuantity {
                order_id,
                requested,
                remaining,
            } => write!(
                f,
                "Cannot reduce order {} by {}: only {} remaining",
                order_id, requested, remaining
            ),
            OrderBookError::OverFill => write!(f, "Cannot fill more than remaining quantity"),
        }
    }
}

impl std::error::Error for OrderBookError {}

/// Result type for order book operations
pub type OrderBookResult<T> = Result<T, OrderBookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(OrderBookError::OrderNotFound.to_string(), "Order not found");
        assert_eq!(OrderBookError::InvalidPrice.to_string(), "Invalid price");
        assert_eq!(
            OrderBookError::RiskLimitExceeded {
                projected: 101,
                limit: 100
            }
            .to_string(),
            "Position limit exceeded: projected 101 exceeds limit 100"
        );
        assert_eq!(
            OrderBookError::InsufficientQuantity {
                order_id: 7,
                requested: 10,
                remaining: 4
            }
            .to_string(),
            "Cannot reduce order 7 by 10: only 4 remaining"
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = OrderBookError::RiskLimitExceeded {
            projected: -150,
            limit: 100,
        };
        let serialized = serde_json::to_string(&error).unwrap();
        let deserialized: OrderBookError = serde_json::from_str(&serialized).unwrap();
        assert_eq!(error, deserialized);
    }
}
