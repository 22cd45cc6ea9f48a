//! Single-Instrument Limit Order Matching Engine
//!
//! Accepts buy/sell limit orders, matches crossing orders immediately under
//! price-time priority, keeps resting liquidity on both sides of the book,
//! enforces a maximum net-position limit and answers best-bid/best-ask queries.
//!
//! # Features
//!
//! - **Price-Time Priority**: best price first, FIFO within a price level
//! - **Maker Pricing**: trades execute at the resting order's price
//! - **Position Limit**: a pre-trade risk gate over the aggregate resting position
//! - **Order Administration**: cancel, partial reduction and administrative reset
//! - **Monitoring**: `tracing` logs and `metrics` counters/gauges/histograms
//!
//! # Quick Start
//!
//! ```rust
//! use limit_order_engine::{OrderBook, Side};
//!
//! let mut book = OrderBook::new("AAPL".to_string());
//!
//! let sell = book.submit(Side::Sell, 100.0, 10)?;
//! let buy = book.submit(Side::Buy, 100.0, 4)?;
//! assert_eq!(buy.trades[0].sell_order_id, sell.order_id);
//!
//! let top = book.top_of_book(Side::Sell).unwrap();
//! assert_eq!((top.price, top.quantity, top.order_id), (100.0, 6, sell.order_id));
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! 1. **Arena**: `HashMap<OrderId, Order>` holds every resting order exactly once
//! 2. **Price Levels**: one `BTreeMap<PriceKey, PriceLevel>` per side, each level a
//!    FIFO queue of order ids
//!
//! The book is single-owner and synchronous. [`SharedOrderBook`] wraps it in a
//! mutex for callers that need cross-thread access, and [`boundary::BookHandle`]
//! exposes a fixed-width surface with sentinel results.

pub mod boundary;
pub mod config;
pub mod metrics;
pub mod orderbook;

// Re-export commonly used types
pub use config::{ConfigError, EngineConfig};
pub use orderbook::{
    error::{OrderBookError, OrderBookResult},
    types::{Order, OrderId, OrderStatus, Position, Price, Quantity, Side, Submission, TopOfBook, Trade},
    OrderBook, RiskGate, SharedOrderBook,
};

pub use crate::metrics::OrderBookMetrics;
