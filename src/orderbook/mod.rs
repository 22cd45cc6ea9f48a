//! Core order book implementation module
//!
//! Order and trade records, the pre-trade risk gate, the price-time priority
//! matcher, best-of-book queries and order administration for a single instrument.

pub mod book;
pub mod error;
pub mod matching;
pub mod operations;
pub mod price_level;
pub mod risk;
pub mod shared;
pub mod types;

// Re-export main types for convenience
pub use book::{OrderBook, OrderBookStats};
pub use error::{OrderBookError, OrderBookResult};
pub use price_level::PriceLevel;
pub use risk::{RiskGate, DEFAULT_MAX_POSITION};
pub use shared::SharedOrderBook;
pub use types::{
    BookSnapshot, MarketEvent, Order, OrderId, OrderStatus, Position, Price, PriceLevelInfo,
    Quantity, Side, Submission, TopOfBook, Trade, NO_ORDER_ID,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        // Test that all main types are accessible
        let _book = OrderBook::new("TEST".to_string());
        let _order = Order::new_limit(1, Side::Buy, 100.0, 100);
        let _error = OrderBookError::OrderNotFound;
        let _gate = RiskGate::new(DEFAULT_MAX_POSITION);
    }
}
