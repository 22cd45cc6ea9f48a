//! Fixed-width call boundary over an owned book.
//!
//! Mirrors the narrow synchronous surface embedders expect: IEEE-754 `f64`
//! prices, 64-bit signed quantities and ids, `bool` sides, and `0` as the
//! "no order" value. Every failure collapses to a sentinel (`0` id, `false`,
//! or an all-zero quote); the underlying reason is logged at debug level.

use tracing::debug;

use crate::config::EngineConfig;
use crate::orderbook::types::{OrderId, Quantity, Side, NO_ORDER_ID};
use crate::orderbook::OrderBook;

/// `(price, quantity, id)` triple returned by [`BookHandle::top_of_book`]
pub type Quote = (f64, i64, i64);

/// Returned when the queried side is empty
pub const EMPTY_QUOTE: Quote = (0.0, 0, NO_ORDER_ID as i64);

/// Explicitly owned book handle; callers create, pass and drop it.
#[derive(Debug, Clone, Default)]
pub struct BookHandle {
    book: OrderBook,
}

impl BookHandle {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            book: OrderBook::with_config(config),
        }
    }

    /// Submit a limit order. Returns the assigned id, or 0 if it was rejected.
    pub fn add_order(&mut self, price: f64, quantity: i64, is_buy: bool) -> i64 {
        let Some(quantity) = to_quantity(quantity) else {
            return NO_ORDER_ID as i64;
        };

        match self.book.submit(side_of(is_buy), price, quantity) {
            Ok(submission) => to_wire_id(submission.order_id),
            Err(e) => {
                debug!("add_order rejected: {}", e);
                NO_ORDER_ID as i64
            }
        }
    }

    pub fn cancel_order(&mut self, id: i64) -> bool {
        let Some(id) = to_order_id(id) else {
            return false;
        };
        self.book.cancel_order(id).is_ok()
    }

    pub fn reduce_order(&mut self, id: i64, amount: i64) -> bool {
        let (Some(id), Some(amount)) = (to_order_id(id), Quantity::try_from(amount).ok()) else {
            return false;
        };
        self.book.reduce_order(id, amount).is_ok()
    }

    pub fn top_of_book(&self, is_buy: bool) -> Quote {
        self.book
            .top_of_book(side_of(is_buy))
            .map(|top| {
                (
                    top.price,
                    i64::try_from(top.quantity).unwrap_or(i64::MAX),
                    to_wire_id(top.order_id),
                )
            })
            .unwrap_or(EMPTY_QUOTE)
    }

    pub fn clear(&mut self) {
        self.book.clear();
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn into_inner(self) -> OrderBook {
        self.book
    }
}

impl From<OrderBook> for BookHandle {
    fn from(book: OrderBook) -> Self {
        Self { book }
    }
}

fn side_of(is_buy: bool) -> Side {
    if is_buy {
        Side::Buy
    } else {
        Side::Sell
    }
}

fn to_quantity(quantity: i64) -> Option<Quantity> {
    Quantity::try_from(quantity).ok().filter(|q| *q > 0)
}

fn to_order_id(id: i64) -> Option<OrderId> {
    OrderId::try_from(id).ok().filter(|id| *id != NO_ORDER_ID)
}

fn to_wire_id(id: OrderId) -> i64 {
    i64::try_from(id).unwrap_or(NO_ORDER_ID as i64)
}
