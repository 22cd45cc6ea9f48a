use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::orderbook::error::OrderBookError;
use crate::orderbook::price_level::{PriceKey, PriceLevel};
use crate::orderbook::types::{Order, OrderId, Side, Trade};

/// Price-time priority matcher for incoming limit orders
pub struct MatchingEngine;

impl MatchingEngine {
    /// Match an incoming order against the opposite side of the book.
    ///
    /// Levels are visited best price first (lowest ask for a buy, highest bid
    /// for a sell) and orders within a level oldest first. Fully consumed makers
    /// are removed from both the level and the arena; emptied levels are dropped.
    pub fn match_order(
        order: &mut Order,
        opposite_levels: &mut BTreeMap<PriceKey, PriceLevel>,
        orders: &mut HashMap<OrderId, Order>,
    ) -> Result<Vec<Trade>, OrderBookError> {
        let mut trades = Vec::new();

        debug!(
            "Matching {} order {} for {} @ {}",
            order.side, order.id, order.remaining_quantity, order.price
        );

        while order.remaining_quantity > 0 {
            let best = match order.side {
                Side::Buy => opposite_levels.first_entry(),
                Side::Sell => opposite_levels.last_entry(),
            };

            let Some(mut entry) = best else {
                break;
            };

            if !order.crosses(entry.key().price()) {
                break; // No more matches possible at worse prices
            }

            Self::match_level(order, entry.get_mut(), orders, &mut trades)?;

            if entry.get().is_empty() {
                entry.remove();
            }
        }

        debug!("Order {} generated {} trades", order.id, trades.len());
        Ok(trades)
    }

    /// Consume one price level front to back until the taker or the level is exhausted
    fn match_level(
        order: &mut Order,
        level: &mut PriceLevel,
        orders: &mut HashMap<OrderId, Order>,
        trades: &mut Vec<Trade>,
    ) -> Result<(), OrderBookError> {
        while order.remaining_quantity > 0 {
            let Some(maker_id) = level.front() else {
                break;
            };

            let Some(maker) = orders.get_mut(&maker_id) else {
                warn!(
                    "Level {} references unknown order {}, dropping it",
                    level.price, maker_id
                );
                level.pop_front();
                continue;
            };

            let fill_quantity = order.remaining_quantity.min(maker.remaining_quantity);

            maker.fill(fill_quantity)?;
            order.fill(fill_quantity)?;
            level.release_quantity(fill_quantity);

            // Trade executes at the price of the resting order
            trades.push(Trade::between(order, maker, fill_quantity));

            let maker_done = maker.remaining_quantity == 0;
            if maker_done {
                level.pop_front();
                orders.remove(&maker_id);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::types::{OrderStatus, Price, Quantity};

    fn rest(
        levels: &mut BTreeMap<PriceKey, PriceLevel>,
        orders: &mut HashMap<OrderId, Order>,
        id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) {
        levels
            .entry(PriceKey::new(price))
            .or_insert_with(|| PriceLevel::new(price))
            .push_back(id, quantity);
        orders.insert(id, Order::new_limit(id, side, price, quantity));
    }

    #[test]
    fn test_buy_walks_asks_from_lowest_price() {
        let mut asks = BTreeMap::new();
        let mut orders = HashMap::new();
        rest(&mut asks, &mut orders, 1, Side::Sell, 101.0, 10);
        rest(&mut asks, &mut orders, 2, Side::Sell, 100.0, 10);
        rest(&mut asks, &mut orders, 3, Side::Sell, 102.0, 10);

        let mut taker = Order::new_limit(4, Side::Buy, 101.0, 15);
        let trades = MatchingEngine::match_order(&mut taker, &mut asks, &mut orders).unwrap();

        assert_eq!(trades.len(), 2);
        assert_eq!((trades[0].sell_order_id, trades[0].price), (2, 100.0));
        assert_eq!((trades[1].sell_order_id, trades[1].price), (1, 101.0));
        assert_eq!(trades[1].quantity, 5);

        assert_eq!(taker.remaining_quantity, 0);
        assert_eq!(taker.status, OrderStatus::Filled);
        assert!(!orders.contains_key(&2));
        assert_eq!(orders[&1].remaining_quantity, 5);
        // 102.0 does not cross and stays untouched
        assert_eq!(asks.len(), 2);
    }

    #[test]
    fn test_sell_walks_bids_from_highest_price() {
        let mut bids = BTreeMap::new();
        let mut orders = HashMap::new();
        rest(&mut bids, &mut orders, 1, Side::Buy, 99.0, 5);
        rest(&mut bids, &mut orders, 2, Side::Buy, 100.0, 5);

        let mut taker = Order::new_limit(3, Side::Sell, 98.0, 20);
        let trades = MatchingEngine::match_order(&mut taker, &mut bids, &mut orders).unwrap();

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].buy_order_id, 2);
        assert_eq!(trades[0].price, 100.0);
        assert_eq!(trades[1].buy_order_id, 1);
        assert_eq!(trades[1].price, 99.0);
        assert_eq!(taker.remaining_quantity, 10);
        assert!(bids.is_empty());
        assert!(orders.is_empty());
    }

    #[test]
    fn test_time_priority_within_level() {
        let mut asks = BTreeMap::new();
        let mut orders = HashMap::new();
        rest(&mut asks, &mut orders, 1, Side::Sell, 100.0, 100);
        rest(&mut asks, &mut orders, 2, Side::Sell, 100.0, 200);

        let mut taker = Order::new_limit(3, Side::Buy, 100.0, 150);
        let trades = MatchingEngine::match_order(&mut taker, &mut asks, &mut orders).unwrap();

        assert_eq!(trades.len(), 2);
        assert_eq!((trades[0].sell_order_id, trades[0].quantity), (1, 100));
        assert_eq!((trades[1].sell_order_id, trades[1].quantity), (2, 50));

        let level = &asks[&PriceKey::new(100.0)];
        assert_eq!(level.get_depth_info(), (150, 1));
        assert_eq!(orders[&2].remaining_quantity, 150);
    }

    #[test]
    fn test_no_cross_no_trades() {
        let mut asks = BTreeMap::new();
        let mut orders = HashMap::new();
        rest(&mut asks, &mut orders, 1, Side::Sell, 100.5, 10);

        let mut taker = Order::new_limit(2, Side::Buy, 100.0, 10);
        let trades = MatchingEngine::match_order(&mut taker, &mut asks, &mut orders).unwrap();

        assert!(trades.is_empty());
        assert_eq!(taker.remaining_quantity, 10);
        assert_eq!(taker.status, OrderStatus::New);
        assert_eq!(orders[&1].remaining_quantity, 10);
    }
}
