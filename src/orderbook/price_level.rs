use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::orderbook::types::{OrderId, Price, Quantity};

/// Totally ordered price used as the level key.
/// Prices are validated positive and finite before they reach the book.
#[derive(Debug, Clone, Copy)]
pub struct PriceKey(Price);

impl PriceKey {
    pub fn new(price: Price) -> Self {
        Self(price)
    }

    pub fn price(&self) -> Price {
        self.0
    }
}

impl PartialEq for PriceKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PriceKey {}

impl PartialOrd for PriceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Represents a price level in the order book.
/// Holds only order ids in arrival order (FIFO); the orders themselves
/// live in the book's arena.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    pub price: Price,
    orders: VecDeque<OrderId>,
    total_quantity: Quantity,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        Self {
            price,
            orders: VecDeque::new(),
            total_quantity: 0,
        }
    }

    /// Append an order to the back of the queue (maintains time priority)
    pub fn push_back(&mut self, order_id: OrderId, quantity: Quantity) {
        self.orders.push_back(order_id);
        self.total_quantity += quantity;
    }

    /// Oldest order at this level
    pub fn front(&self) -> Option<OrderId> {
        self.orders.front().copied()
    }

    /// Drop the head of the queue once it has been fully consumed
    pub fn pop_front(&mut self) -> Option<OrderId> {
        self.orders.pop_front()
    }

    /// Remove an order by id, releasing its remaining quantity
    pub fn remove_order(&mut self, order_id: OrderId, remaining: Quantity) -> bool {
        match self.orders.iter().position(|id| *id == order_id) {
            Some(pos) => {
                self.orders.remove(pos);
                self.total_quantity = self.total_quantity.saturating_sub(remaining);
                true
            }
            None => false,
        }
    }

    /// Account for quantity taken out of an order at this level
    /// (fills and reductions) without changing queue position
    pub fn release_quantity(&mut self, quantity: Quantity) {
        self.total_quantity = self.total_quantity.saturating_sub(quantity);
    }

    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    pub fn order_count(&self) -> u32 {
        self.orders.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn order_ids(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.orders.iter().copied()
    }

    /// Get depth information for this level
    pub fn get_depth_info(&self) -> (Quantity, u32) {
        (self.total_quantity(), self.order_count())
    }
}
