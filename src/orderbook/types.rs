use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::orderbook::error::OrderBookError;

/// Order identifier, assigned from 1 per book. 0 is never issued.
pub type OrderId = u64;
pub type Price = f64;
pub type Quantity = u64;
/// Signed resting quantity: buys positive, sells negative
pub type Position = i64;

/// Identifier reserved for "no order" in sentinel results
pub const NO_ORDER_ID: OrderId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Contribution of `quantity` on this side to the aggregate position
    pub fn signed(self, quantity: Position) -> Position {
        match self {
            Side::Buy => quantity,
            Side::Sell => -quantity,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub price: Price,
    pub original_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
}

impl Order {
    pub fn new_limit(id: OrderId, side: Side, price: Price, quantity: Quantity) -> Self {
        Self {
            id,
            side,
            price,
            original_quantity: quantity,
            remaining_quantity: quantity,
            status: OrderStatus::New,
            timestamp: Utc::now(),
        }
    }

    pub fn fill(&mut self, quantity: Quantity) -> Result<(), OrderBookError> {
        if quantity > self.remaining_quantity {
            return Err(OrderBookError::OverFill);
        }

        self.remaining_quantity -= quantity;

        if self.remaining_quantity == 0 {
            self.status = OrderStatus::Filled;
        } else {
            self.status = OrderStatus::PartiallyFilled;
        }

        Ok(())
    }

    /// Administrative reduction. Leaves the fill status untouched.
    pub fn reduce(&mut self, amount: Quantity) -> Result<Quantity, OrderBookError> {
        if amount > self.remaining_quantity {
            return Err(OrderBookError::InsufficientQuantity {
                order_id: self.id,
                requested: amount,
                remaining: self.remaining_quantity,
            });
        }

        self.remaining_quantity -= amount;
        Ok(self.remaining_quantity)
    }

    pub fn cancel(&mut self) {
        self.status = OrderStatus::Cancelled;
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.original_quantity - self.remaining_quantity
    }

    /// Whether this order would trade against a resting order at `resting_price`
    pub fn crosses(&self, resting_price: Price) -> bool {
        match self.side {
            Side::Buy => self.price >= resting_price,
            Side::Sell => self.price <= resting_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    /// Maker's price
    pub price: Price,
    pub quantity: Quantity,
    pub aggressor: Side,
    pub timestamp: DateTime<Utc>,
}

impl Trade {
    /// Build a trade between an incoming taker and a resting maker
    pub fn between(taker: &Order, maker: &Order, quantity: Quantity) -> Self {
        let (buy_order_id, sell_order_id) = match taker.side {
            Side::Buy => (taker.id, maker.id),
            Side::Sell => (maker.id, taker.id),
        };

        Self {
            buy_order_id,
            sell_order_id,
            price: maker.price,
            quantity,
            aggressor: taker.side,
            timestamp: Utc::now(),
        }
    }

    pub fn notional(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// Best resting order on one side of the book
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopOfBook {
    pub price: Price,
    pub quantity: Quantity,
    pub order_id: OrderId,
}

/// Outcome of an accepted submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub status: OrderStatus,
    pub trades: Vec<Trade>,
    pub resting_quantity: Quantity,
}

impl Submission {
    pub fn filled_quantity(&self) -> Quantity {
        self.trades.iter().map(|t| t.quantity).sum()
    }

    pub fn is_resting(&self) -> bool {
        self.resting_quantity > 0
    }

    /// Render as market events: trades in execution order, then the acceptance
    pub fn events(&self) -> Vec<MarketEvent> {
        let mut events: Vec<MarketEvent> = self
            .trades
            .iter()
            .cloned()
            .map(|trade| MarketEvent::Trade { trade })
            .collect();

        events.push(MarketEvent::OrderAccepted {
            order_id: self.order_id,
            side: self.side,
            price: self.price,
            quantity: self.quantity,
            resting_quantity: self.resting_quantity,
        });

        events
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub bids: Vec<PriceLevelInfo>,
    pub asks: Vec<PriceLevelInfo>,
    pub last_trade_price: Option<Price>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLevelInfo {
    pub price: Price,
    pub quantity: Quantity,
    pub order_count: u32,
}

// Market data events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarketEvent {
    OrderAccepted {
        order_id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
        resting_quantity: Quantity,
    },
    OrderRejected {
        side: Side,
        price: Price,
        quantity: Quantity,
        reason: OrderBookError,
    },
    Trade {
        trade: Trade,
    },
    OrderCancelled {
        order_id: OrderId,
        remaining_quantity: Quantity,
    },
    OrderReduced {
        order_id: OrderId,
        amount: Quantity,
        remaining_quantity: Quantity,
    },
    BookCleared,
}
