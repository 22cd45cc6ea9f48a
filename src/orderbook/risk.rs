//! Pre-trade position limit.
//!
//! The gate evaluates the full submitted quantity against the aggregate resting
//! position *before* matching. Matching moves quantity off the opposite side one
//! for one, so the post-match position equals the pre-match projection and the
//! two checks never disagree.

use serde::Serialize;
use tracing::warn;

use crate::orderbook::error::{OrderBookError, OrderBookResult};
use crate::orderbook::types::{Position, Quantity, Side};

pub const DEFAULT_MAX_POSITION: Position = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskGate {
    max_position: Position,
}

impl RiskGate {
    /// A negative limit is clamped to zero, which only admits orders that
    /// leave the book flat.
    pub fn new(max_position: Position) -> Self {
        Self {
            max_position: max_position.max(0),
        }
    }

    pub fn max_position(&self) -> Position {
        self.max_position
    }

    /// Accept iff `|position ± quantity| <= max_position`
    pub fn check(&self, quantity: Quantity, side: Side, position: Position) -> bool {
        self.evaluate(quantity, side, position).is_ok()
    }

    /// Like [`check`](Self::check) but returns the projected position on success
    pub fn evaluate(
        &self,
        quantity: Quantity,
        side: Side,
        position: Position,
    ) -> OrderBookResult<Position> {
        let projected = Position::try_from(quantity)
            .ok()
            .and_then(|q| position.checked_add(side.signed(q)));

        match projected {
            Some(p) if p.unsigned_abs() <= self.max_position as u64 => Ok(p),
            Some(p) => {
                warn!(
                    "Risk gate rejected {} {}: projected position {} exceeds limit {}",
                    side, quantity, p, self.max_position
                );
                Err(OrderBookError::RiskLimitExceeded {
                    projected: p,
                    limit: self.max_position,
                })
            }
            None => {
                warn!(
                    "Risk gate rejected {} {}: position arithmetic overflow",
                    side, quantity
                );
                Err(OrderBookError::RiskLimitExceeded {
                    projected: match side {
                        Side::Buy => Position::MAX,
                        Side::Sell => Position::MIN,
                    },
                    limit: self.max_position,
                })
            }
        }
    }
}

impl Default for RiskGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POSITION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_up_to_limit() {
        let gate = RiskGate::new(100);
        assert!(gate.check(100, Side::Buy, 0));
        assert!(gate.check(100, Side::Sell, 0));
        assert!(!gate.check(101, Side::Buy, 0));
        assert!(!gate.check(101, Side::Sell, 0));
    }

    #[test]
    fn test_nets_against_existing_position() {
        let gate = RiskGate::new(100);

        // Selling out of a long position is fine even for large sizes
        assert_eq!(gate.evaluate(180, Side::Sell, 90), Ok(-90));
        assert!(!gate.check(191, Side::Sell, 90));
        assert!(!gate.check(11, Side::Buy, 90));
    }

    #[test]
    fn test_rejection_reports_projection() {
        let gate = RiskGate::new(100);
        assert_eq!(
            gate.evaluate(50, Side::Sell, -60),
            Err(OrderBookError::RiskLimitExceeded {
                projected: -110,
                limit: 100
            })
        );
    }

    #[test]
    fn test_overflowing_quantity_is_rejected() {
        let gate = RiskGate::new(Position::MAX);
        assert!(!gate.check(u64::MAX, Side::Buy, 0));
        assert!(!gate.check(1, Side::Buy, Position::MAX));
        assert!(gate.check(1, Side::Sell, Position::MAX));
    }

    #[test]
    fn test_zero_limit_only_allows_netting() {
        let gate = RiskGate::new(0);
        assert!(!gate.check(1, Side::Buy, 0));
        assert!(gate.check(5, Side::Buy, -5));
    }

    #[test]
    fn test_negative_limit_clamps_to_zero() {
        let gate = RiskGate::new(-5);
        assert_eq!(gate.max_position(), 0);
        assert!(!gate.check(5, Side::Buy, 0));
        assert!(!gate.check(5, Side::Sell, 0));
        assert!(gate.check(5, Side::Sell, 5));
    }
}
