//! Order administration over the resting set: cancel, reduce and reset.

use tracing::{debug, info};

use crate::orderbook::book::OrderBook;
use crate::orderbook::error::{OrderBookError, OrderBookResult};
use crate::orderbook::price_level::PriceKey;
use crate::orderbook::types::{Order, OrderId, Quantity};

impl OrderBook {
    /// Cancel a resting order, removing all of its remaining quantity.
    /// Returns the removed order.
    pub fn cancel_order(&mut self, order_id: OrderId) -> OrderBookResult<Order> {
        debug!("Cancelling order: {}", order_id);

        let mut order = self
            .orders
            .remove(&order_id)
            .ok_or(OrderBookError::OrderNotFound)?;

        self.unlink(&order);
        order.cancel();

        info!(
            "Order {} cancelled, {} remaining at {}",
            order_id, order.remaining_quantity, order.price
        );
        Ok(order)
    }

    /// Reduce a resting order's remaining quantity by `amount`, keeping its queue
    /// position. The order is removed once nothing remains. Unknown ids and
    /// over-reductions fail without touching the book.
    ///
    /// Returns the quantity left on the order.
    pub fn reduce_order(&mut self, order_id: OrderId, amount: Quantity) -> OrderBookResult<Quantity> {
        debug!("Reducing order {} by {}", order_id, amount);

        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(OrderBookError::OrderNotFound)?;

        let remaining = order.reduce(amount)?;
        let (side, price) = (order.side, order.price);

        if let Some(level) = self.levels_mut(side).get_mut(&PriceKey::new(price)) {
            level.release_quantity(amount);
        }

        if remaining == 0 {
            if let Some(order) = self.orders.remove(&order_id) {
                self.unlink(&order);
            }
            info!("Order {} reduced to zero and removed", order_id);
            return Ok(0);
        }

        debug!("Order {} reduced by {}, {} remaining", order_id, amount, remaining);
        Ok(remaining)
    }

    /// Administrative reset: drop every resting order and restart ids at 1
    pub fn clear(&mut self) {
        let dropped = self.total_orders();
        self.reset();
        info!("Order book {} cleared, {} orders dropped", self.symbol, dropped);
    }

    /// Detach an order (already taken out of the arena) from its price level
    fn unlink(&mut self, order: &Order) {
        let key = PriceKey::new(order.price);
        let levels = self.levels_mut(order.side);

        if let Some(level) = levels.get_mut(&key) {
            level.remove_order(order.id, order.remaining_quantity);

            // Clean up empty price level
            if level.is_empty() {
                levels.remove(&key);
            }
        }
    }
}
