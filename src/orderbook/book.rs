use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::orderbook::error::{OrderBookError, OrderBookResult};
use crate::orderbook::matching::MatchingEngine;
use crate::orderbook::price_level::{PriceKey, PriceLevel};
use crate::orderbook::risk::RiskGate;
use crate::orderbook::types::{
    BookSnapshot, Order, OrderId, Position, Price, PriceLevelInfo, Quantity, Side, Submission,
    TopOfBook,
};

/// Single-instrument limit order book.
///
/// Owns every resting order. Orders live in an id-indexed arena while each side
/// keeps a price-ordered map of FIFO levels holding ids only. All operations take
/// `&self`/`&mut self` and complete synchronously; callers that share a book across
/// threads serialize access themselves (see [`SharedOrderBook`](super::SharedOrderBook)).
#[derive(Debug, Clone)]
pub struct OrderBook {
    pub symbol: String,

    bids: BTreeMap<PriceKey, PriceLevel>, // iterated from the back: highest price first
    asks: BTreeMap<PriceKey, PriceLevel>, // iterated from the front: lowest price first

    pub(crate) orders: HashMap<OrderId, Order>,
    next_order_id: OrderId,
    risk: RiskGate,

    // Statistics
    last_trade_price: Option<Price>,
    total_trades: u64,
    total_volume: u64,
}

impl OrderBook {
    pub fn new(symbol: String) -> Self {
        Self::with_risk_gate(symbol, RiskGate::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self::with_risk_gate(config.symbol.clone(), RiskGate::new(config.max_position))
    }

    pub fn with_risk_gate(symbol: String, risk: RiskGate) -> Self {
        info!(
            "Creating new order book for symbol: {} (max position {})",
            symbol,
            risk.max_position()
        );

        Self {
            symbol,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: HashMap::new(),
            next_order_id: 1,
            risk,
            last_trade_price: None,
            total_trades: 0,
            total_volume: 0,
        }
    }

    /// Submit a limit order.
    ///
    /// The risk gate sees the full quantity against the current aggregate position
    /// before any matching. A rejected submission consumes no id and leaves the
    /// book untouched. An accepted one always receives a fresh id, whether it ends
    /// up resting, partially filled or fully filled.
    pub fn submit(
        &mut self,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> OrderBookResult<Submission> {
        debug!("Submitting {} {} @ {}", side, quantity, price);

        Self::validate(price, quantity)?;
        self.risk
            .evaluate(quantity, side, self.aggregate_position())?;

        let mut order = Order::new_limit(self.next_sequence(), side, price, quantity);

        let opposite_levels = match side {
            Side::Buy => &mut self.asks,
            Side::Sell => &mut self.bids,
        };
        let trades = MatchingEngine::match_order(&mut order, opposite_levels, &mut self.orders)?;

        if let Some(last_trade) = trades.last() {
            self.total_trades += trades.len() as u64;
            self.total_volume += trades.iter().map(|t| t.quantity).sum::<Quantity>();
            self.last_trade_price = Some(last_trade.price);
        }

        let submission = Submission {
            order_id: order.id,
            side,
            price,
            quantity,
            status: order.status,
            trades,
            resting_quantity: order.remaining_quantity,
        };

        if order.remaining_quantity > 0 {
            self.add_order_to_book(order);
        }

        Ok(submission)
    }

    /// Best resting order on `side`: highest bid or lowest ask, earliest arrival
    /// among orders at that price.
    pub fn top_of_book(&self, side: Side) -> Option<TopOfBook> {
        let level = match side {
            Side::Buy => self.bids.values().next_back(),
            Side::Sell => self.asks.values().next(),
        }?;

        let order = self.orders.get(&level.front()?)?;
        Some(TopOfBook {
            price: order.price,
            quantity: order.remaining_quantity,
            order_id: order.id,
        })
    }

    /// Get current best bid price
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().map(PriceKey::price)
    }

    /// Get current best ask price
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().map(PriceKey::price)
    }

    /// Get current spread
    pub fn spread(&self) -> Option<Price> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) if ask > bid => Some(ask - bid),
            _ => None,
        }
    }

    /// Get last trade price
    pub fn last_trade_price(&self) -> Option<Price> {
        self.last_trade_price
    }

    /// Signed resting quantity: bids count positive, asks negative
    pub fn aggregate_position(&self) -> Position {
        let side_total = |levels: &BTreeMap<PriceKey, PriceLevel>| -> i128 {
            levels
                .values()
                .map(|level| level.total_quantity() as i128)
                .sum()
        };

        let net = side_total(&self.bids) - side_total(&self.asks);
        net.clamp(Position::MIN as i128, Position::MAX as i128) as Position
    }

    pub fn risk_gate(&self) -> &RiskGate {
        &self.risk
    }

    /// Look up a resting order
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    /// Resting orders on one side in priority order
    pub fn resting_orders(&self, side: Side) -> Vec<&Order> {
        let levels: Box<dyn Iterator<Item = &PriceLevel>> = match side {
            Side::Buy => Box::new(self.bids.values().rev()),
            Side::Sell => Box::new(self.asks.values()),
        };

        levels
            .flat_map(|level| level.order_ids())
            .filter_map(|id| self.orders.get(&id))
            .collect()
    }

    /// Generate an aggregated depth snapshot, `depth` levels per side
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        let level_info = |level: &PriceLevel| {
            let (quantity, order_count) = level.get_depth_info();
            PriceLevelInfo {
                price: level.price,
                quantity,
                order_count,
            }
        };

        BookSnapshot {
            symbol: self.symbol.clone(),
            timestamp: Utc::now(),
            bids: self.bids.values().rev().take(depth).map(level_info).collect(),
            asks: self.asks.values().take(depth).map(level_info).collect(),
            last_trade_price: self.last_trade_price,
        }
    }

    /// Get total number of orders in the book
    pub fn total_orders(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Get statistics
    pub fn get_stats(&self) -> OrderBookStats {
        OrderBookStats {
            symbol: self.symbol.clone(),
            total_orders: self.total_orders(),
            bid_levels: self.bids.len(),
            ask_levels: self.asks.len(),
            best_bid: self.best_bid(),
            best_ask: self.best_ask(),
            spread: self.spread(),
            aggregate_position: self.aggregate_position(),
            last_trade_price: self.last_trade_price,
            total_trades: self.total_trades,
            total_volume: self.total_volume,
            next_order_id: self.next_order_id,
        }
    }

    // Crate-internal helpers shared with administration

    pub(crate) fn levels_mut(&mut self, side: Side) -> &mut BTreeMap<PriceKey, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.orders.clear();
        self.next_order_id = 1;
        self.last_trade_price = None;
        self.total_trades = 0;
        self.total_volume = 0;
    }

    // Private helper methods

    fn validate(price: Price, quantity: Quantity) -> OrderBookResult<()> {
        if !price.is_finite() || price <= 0.0 {
            return Err(OrderBookError::InvalidPrice);
        }

        if quantity == 0 {
            return Err(OrderBookError::InvalidQuantity);
        }

        Ok(())
    }

    fn add_order_to_book(&mut self, order: Order) {
        let price = order.price;
        let side = order.side;
        let order_id = order.id;

        self.levels_mut(side)
            .entry(PriceKey::new(price))
            .or_insert_with(|| PriceLevel::new(price))
            .push_back(order_id, order.remaining_quantity);

        debug!(
            "Order {} resting at price {} on {} side with {} remaining",
            order_id, price, side, order.remaining_quantity
        );
        self.orders.insert(order_id, order);
    }

    fn next_sequence(&mut self) -> OrderId {
        let id = self.next_order_id;
        self.next_order_id += 1;
        id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBookStats {
    pub symbol: String,
    pub total_orders: usize,
    pub bid_levels: usize,
    pub ask_levels: usize,
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    pub spread: Option<Price>,
    pub aggregate_position: Position,
    pub last_trade_price: Option<Price>,
    pub total_trades: u64,
    pub total_volume: u64,
    pub next_order_id: OrderId,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new("DEFAULT".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::types::OrderStatus;

    fn book_with_limit(max_position: Position) -> OrderBook {
        OrderBook::with_risk_gate("TEST".to_string(), RiskGate::new(max_position))
    }

    #[test]
    fn test_empty_book() {
        let book = OrderBook::new("TEST".to_string());
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), None);
        assert_eq!(book.spread(), None);
        assert_eq!(book.top_of_book(Side::Buy), None);
        assert_eq!(book.top_of_book(Side::Sell), None);
        assert_eq!(book.total_orders(), 0);
        assert_eq!(book.aggregate_position(), 0);
    }

    #[test]
    fn test_add_limit_orders() {
        let mut book = OrderBook::new("TEST".to_string());

        let buy = book.submit(Side::Buy, 100.0, 10).unwrap();
        let sell = book.submit(Side::Sell, 101.0, 10).unwrap();

        assert_eq!(buy.order_id, 1);
        assert_eq!(sell.order_id, 2);
        assert!(buy.trades.is_empty() && sell.trades.is_empty());

        assert_eq!(book.best_bid(), Some(100.0));
        assert_eq!(book.best_ask(), Some(101.0));
        assert_eq!(book.spread(), Some(1.0));
        assert_eq!(book.total_orders(), 2);
        assert_eq!(book.aggregate_position(), 0);
    }

    #[test]
    fn test_invalid_input_consumes_no_id() {
        let mut book = OrderBook::new("TEST".to_string());

        assert_eq!(book.submit(Side::Buy, 0.0, 5), Err(OrderBookError::InvalidPrice));
        assert_eq!(book.submit(Side::Buy, -1.0, 5), Err(OrderBookError::InvalidPrice));
        assert_eq!(
            book.submit(Side::Buy, f64::NAN, 5),
            Err(OrderBookError::InvalidPrice)
        );
        assert_eq!(
            book.submit(Side::Sell, 100.0, 0),
            Err(OrderBookError::InvalidQuantity)
        );

        assert_eq!(book.submit(Side::Buy, 100.0, 5).unwrap().order_id, 1);
    }

    #[test]
    fn test_order_matching() {
        let mut book = OrderBook::new("TEST".to_string());

        book.submit(Side::Sell, 100.0, 100).unwrap();
        let result = book.submit(Side::Buy, 100.0, 50).unwrap();

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].price, 100.0);
        assert_eq!(result.trades[0].quantity, 50);
        assert_eq!(result.status, OrderStatus::Filled);
        assert!(!result.is_resting());

        assert_eq!(book.total_orders(), 1);
        assert_eq!(book.best_ask(), Some(100.0));
        assert_eq!(book.last_trade_price(), Some(100.0));
    }

    #[test]
    fn test_trade_at_maker_price() {
        let mut book = OrderBook::new("TEST".to_string());

        book.submit(Side::Sell, 99.0, 10).unwrap();
        let result = book.submit(Side::Buy, 105.0, 10).unwrap();

        assert_eq!(result.trades[0].price, 99.0);
        assert!(book.is_empty());
    }

    #[test]
    fn test_price_priority_beats_arrival() {
        let mut book = OrderBook::new("TEST".to_string());

        let worse = book.submit(Side::Sell, 101.0, 10).unwrap().order_id;
        let better = book.submit(Side::Sell, 100.0, 10).unwrap().order_id;

        let result = book.submit(Side::Buy, 101.0, 10).unwrap();
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].sell_order_id, better);
        assert_eq!(result.trades[0].price, 100.0);
        assert_eq!(book.top_of_book(Side::Sell).unwrap().order_id, worse);
    }

    #[test]
    fn test_price_time_priority() {
        let mut book = OrderBook::new("TEST".to_string());

        let first = book.submit(Side::Buy, 100.0, 30).unwrap().order_id;
        let second = book.submit(Side::Buy, 100.0, 40).unwrap().order_id;

        let result = book.submit(Side::Sell, 100.0, 50).unwrap();
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].buy_order_id, first);
        assert_eq!(result.trades[0].quantity, 30);
        assert_eq!(result.trades[1].buy_order_id, second);
        assert_eq!(result.trades[1].quantity, 20);

        assert_eq!(
            book.top_of_book(Side::Buy),
            Some(TopOfBook {
                price: 100.0,
                quantity: 20,
                order_id: second
            })
        );
    }

    #[test]
    fn test_top_of_book_tie_break_is_earliest_arrival() {
        let mut book = OrderBook::new("TEST".to_string());

        book.submit(Side::Sell, 100.0, 3).unwrap();
        book.submit(Side::Sell, 100.0, 7).unwrap();

        let top = book.top_of_book(Side::Sell).unwrap();
        assert_eq!(top.order_id, 1);
        assert_eq!(top.quantity, 3);
        assert_eq!(book.top_of_book(Side::Sell), Some(top));
    }

    #[test]
    fn test_multi_level_sweep_rests_remainder() {
        let mut book = book_with_limit(1_000);

        book.submit(Side::Sell, 100.0, 10).unwrap();
        book.submit(Side::Sell, 100.5, 10).unwrap();
        book.submit(Side::Sell, 102.0, 10).unwrap();

        let result = book.submit(Side::Buy, 101.0, 25).unwrap();
        assert_eq!(result.filled_quantity(), 20);
        assert_eq!(result.resting_quantity, 5);
        assert_eq!(result.status, OrderStatus::PartiallyFilled);

        let top_bid = book.top_of_book(Side::Buy).unwrap();
        assert_eq!((top_bid.price, top_bid.quantity, top_bid.order_id), (101.0, 5, 4));
        assert_eq!(book.best_ask(), Some(102.0));

        let stats = book.get_stats();
        assert_eq!(stats.total_trades, 2);
        assert_eq!(stats.total_volume, 20);
        assert_eq!(stats.last_trade_price, Some(100.5));
    }

    #[test]
    fn test_risk_rejection_leaves_book_untouched() {
        let mut book = book_with_limit(100);

        book.submit(Side::Buy, 99.0, 80).unwrap();
        let before = book.get_stats();

        let rejected = book.submit(Side::Buy, 99.0, 21);
        assert_eq!(
            rejected,
            Err(OrderBookError::RiskLimitExceeded {
                projected: 101,
                limit: 100
            })
        );
        assert_eq!(book.get_stats(), before);

        // Selling through the long is allowed and the next id is still 2
        let sell = book.submit(Side::Sell, 99.0, 180).unwrap();
        assert_eq!(sell.order_id, 2);
        assert_eq!(book.aggregate_position(), -100);
    }

    #[test]
    fn test_snapshot_depth() {
        let mut book = book_with_limit(1_000);

        book.submit(Side::Buy, 99.0, 10).unwrap();
        book.submit(Side::Buy, 99.0, 5).unwrap();
        book.submit(Side::Buy, 98.0, 10).unwrap();
        book.submit(Side::Buy, 97.0, 10).unwrap();
        book.submit(Side::Sell, 101.0, 4).unwrap();
        book.submit(Side::Sell, 102.0, 6).unwrap();

        let snapshot = book.snapshot(2);
        assert_eq!(snapshot.symbol, "TEST");
        assert_eq!(
            snapshot.bids,
            vec![
                PriceLevelInfo {
                    price: 99.0,
                    quantity: 15,
                    order_count: 2
                },
                PriceLevelInfo {
                    price: 98.0,
                    quantity: 10,
                    order_count: 1
                },
            ]
        );
        assert_eq!(snapshot.asks.len(), 2);
        assert_eq!(snapshot.asks[0].price, 101.0);
        assert_eq!(snapshot.asks[1].price, 102.0);
        assert_eq!(snapshot.last_trade_price, None);
    }

    #[test]
    fn test_resting_orders_in_priority_order() {
        let mut book = book_with_limit(1_000);

        book.submit(Side::Buy, 99.0, 1).unwrap();
        book.submit(Side::Buy, 100.0, 1).unwrap();
        book.submit(Side::Buy, 99.0, 1).unwrap();

        let ids: Vec<OrderId> = book
            .resting_orders(Side::Buy)
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert!(book.resting_orders(Side::Sell).is_empty());
    }
}
