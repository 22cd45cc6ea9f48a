use parking_lot::Mutex;
use std::sync::Arc;

use crate::orderbook::book::{OrderBook, OrderBookStats};
use crate::orderbook::error::OrderBookResult;
use crate::orderbook::types::{
    BookSnapshot, Order, OrderId, Price, Quantity, Side, Submission, TopOfBook,
};

/// Cloneable handle that serializes access to one book.
///
/// Every method holds the lock for exactly one logical operation. Use
/// [`with_book`](Self::with_book) when several steps must observe the same state.
#[derive(Debug, Clone)]
pub struct SharedOrderBook {
    inner: Arc<Mutex<OrderBook>>,
}

impl SharedOrderBook {
    pub fn new(book: OrderBook) -> Self {
        Self {
            inner: Arc::new(Mutex::new(book)),
        }
    }

    pub fn submit(&self, side: Side, price: Price, quantity: Quantity) -> OrderBookResult<Submission> {
        self.inner.lock().submit(side, price, quantity)
    }

    pub fn cancel_order(&self, order_id: OrderId) -> OrderBookResult<Order> {
        self.inner.lock().cancel_order(order_id)
    }

    pub fn reduce_order(&self, order_id: OrderId, amount: Quantity) -> OrderBookResult<Quantity> {
        self.inner.lock().reduce_order(order_id, amount)
    }

    pub fn top_of_book(&self, side: Side) -> Option<TopOfBook> {
        self.inner.lock().top_of_book(side)
    }

    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        self.inner.lock().snapshot(depth)
    }

    pub fn get_stats(&self) -> OrderBookStats {
        self.inner.lock().get_stats()
    }

    pub fn total_orders(&self) -> usize {
        self.inner.lock().total_orders()
    }

    pub fn clear(&self) {
        self.inner.lock().clear()
    }

    /// Run `f` with exclusive access to the book
    pub fn with_book<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut OrderBook) -> R,
    {
        let mut book = self.inner.lock();
        f(&mut book)
    }
}

impl From<OrderBook> for SharedOrderBook {
    fn from(book: OrderBook) -> Self {
        Self::new(book)
    }
}
