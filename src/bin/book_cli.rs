//! Line-oriented driver for a single order book.
//!
//! Reads one command per line from stdin and writes one JSON response per line
//! to stdout:
//!
//! ```text
//! buy <price> <qty>      sell <price> <qty>
//! cancel <id>            reduce <id> <amount>
//! top <buy|sell>         depth [levels]
//! stats                  clear
//! quit
//! ```
//!
//! Usage: `book_cli [config.toml]`

use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use limit_order_engine::orderbook::{BookSnapshot, MarketEvent};
use limit_order_engine::{
    EngineConfig, OrderBook, OrderBookMetrics, OrderId, Price, Quantity, Side, TopOfBook,
};

const DEFAULT_DEPTH: usize = 5;

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Submit {
        side: Side,
        price: Price,
        quantity: Quantity,
    },
    Cancel(OrderId),
    Reduce(OrderId, Quantity),
    Top(Side),
    Depth(usize),
    Stats,
    Clear,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Command, String> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or_else(|| "empty command".to_string())?;
        let args: Vec<&str> = parts.collect();

        let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("buy", [price, quantity]) | ("sell", [price, quantity]) => Command::Submit {
                side: if verb.eq_ignore_ascii_case("buy") {
                    Side::Buy
                } else {
                    Side::Sell
                },
                price: parse_arg(price, "price")?,
                quantity: parse_arg(quantity, "quantity")?,
            },
            ("cancel", [id]) => Command::Cancel(parse_arg(id, "order id")?),
            ("reduce", [id, amount]) => {
                Command::Reduce(parse_arg(id, "order id")?, parse_arg(amount, "amount")?)
            }
            ("top", [side]) => Command::Top(parse_side(side)?),
            ("depth", []) => Command::Depth(DEFAULT_DEPTH),
            ("depth", [levels]) => Command::Depth(parse_arg(levels, "levels")?),
            ("stats", []) => Command::Stats,
            ("clear", []) => Command::Clear,
            ("quit", []) | ("exit", []) => Command::Quit,
            _ => return Err(format!("unrecognized command: {}", line.trim())),
        };

        Ok(command)
    }
}

fn parse_arg<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T, String> {
    raw.parse()
        .map_err(|_| format!("invalid {}: {}", name, raw))
}

fn parse_side(raw: &str) -> Result<Side, String> {
    match raw.to_ascii_lowercase().as_str() {
        "buy" | "bid" => Ok(Side::Buy),
        "sell" | "ask" => Ok(Side::Sell),
        _ => Err(format!("invalid side: {}", raw)),
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Response {
    Events { events: Vec<MarketEvent> },
    Top { side: Side, top: Option<TopOfBook> },
    Depth { snapshot: BookSnapshot },
    Stats {
        total_orders: usize,
        bid_levels: usize,
        ask_levels: usize,
        aggregate_position: i64,
        total_trades: u64,
        total_volume: u64,
        next_order_id: OrderId,
    },
    Error { message: String },
}

fn execute(book: &mut OrderBook, metrics: &OrderBookMetrics, command: Command) -> Response {
    match command {
        Command::Submit {
            side,
            price,
            quantity,
        } => {
            let outcome = metrics.time_submit(|| book.submit(side, price, quantity));
            metrics.record_submission(&outcome);

            let events = match outcome {
                Ok(submission) => submission.events(),
                Err(reason) => vec![MarketEvent::OrderRejected {
                    side,
                    price,
                    quantity,
                    reason,
                }],
            };
            Response::Events { events }
        }
        Command::Cancel(order_id) => match metrics.time_cancel(|| book.cancel_order(order_id)) {
            Ok(order) => {
                metrics.increment_orders_cancelled();
                Response::Events {
                    events: vec![MarketEvent::OrderCancelled {
                        order_id,
                        remaining_quantity: order.remaining_quantity,
                    }],
                }
            }
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        },
        Command::Reduce(order_id, amount) => {
            match metrics.time_reduce(|| book.reduce_order(order_id, amount)) {
                Ok(remaining_quantity) => {
                    metrics.increment_orders_reduced();
                    Response::Events {
                        events: vec![MarketEvent::OrderReduced {
                            order_id,
                            amount,
                            remaining_quantity,
                        }],
                    }
                }
                Err(e) => Response::Error {
                    message: e.to_string(),
                },
            }
        }
        Command::Top(side) => Response::Top {
            side,
            top: metrics.time_query(|| book.top_of_book(side)),
        },
        Command::Depth(levels) => Response::Depth {
            snapshot: book.snapshot(levels),
        },
        Command::Stats => {
            let stats = book.get_stats();
            metrics.record_book_state(&stats);
            Response::Stats {
                total_orders: stats.total_orders,
                bid_levels: stats.bid_levels,
                ask_levels: stats.ask_levels,
                aggregate_position: stats.aggregate_position,
                total_trades: stats.total_trades,
                total_volume: stats.total_volume,
                next_order_id: stats.next_order_id,
            }
        }
        Command::Clear => {
            book.clear();
            Response::Events {
                events: vec![MarketEvent::BookCleared],
            }
        }
        Command::Quit => Response::Events { events: vec![] },
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(Path::new(&path))?,
        None => EngineConfig::default(),
    };

    let mut book = OrderBook::with_config(&config);
    let metrics = OrderBookMetrics::new();
    info!("Accepting commands for {}", config.symbol);

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let response = match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => execute(&mut book, &metrics, command),
            Err(message) => {
                warn!("{}", message);
                Response::Error { message }
            }
        };

        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
        stdout.flush()?;
    }

    Ok(())
}
