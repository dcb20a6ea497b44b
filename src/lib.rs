//! Sidebet - a binary-outcome prediction market engine.
//!
//! Markets trade YES/NO token pairs minted 1:1 against $1 of collateral.
//! Each market carries two limit order books (one per token) matched with
//! price/time priority; trades print at the resting order's price. The
//! engine tracks weighted-average cost basis per position and realizes P&L
//! on every disposal, then settles all positions when a market resolves:
//! the winning token pays $1, the losing token pays nothing.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files
//! - [`domain`] - Core types: markets, traders, orders, trades
//! - [`book`] - Per-token order books and depth snapshots
//! - [`exchange`] - The engine: all operations on one entry type
//! - [`stats`] - Exchange and trader statistics read models
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use sidebet::config::EngineConfig;
//! use sidebet::domain::{CreateMarket, MarketId, Side, TokenType, TraderId};
//! use sidebet::exchange::Exchange;
//!
//! let exchange = Exchange::new(EngineConfig::default());
//! exchange.create_market(CreateMarket {
//!     id: MarketId::new("btc-100k"),
//!     question: "Will BTC close above $100k this year?".into(),
//!     description: String::new(),
//!     tags: vec!["crypto".into()],
//!     resolution_deadline: chrono::Utc::now() + chrono::Duration::days(120),
//!     initial_probability: dec!(0.5),
//! })?;
//!
//! let alice = exchange.create_trader(TraderId::new("alice")).id;
//! exchange.mint(&MarketId::new("btc-100k"), &alice, dec!(100))?;
//! let (order, trades) = exchange.place_order(
//!     &MarketId::new("btc-100k"),
//!     &alice,
//!     TokenType::Yes,
//!     Side::Sell,
//!     dec!(0.65),
//!     dec!(50),
//! )?;
//! assert!(trades.is_empty()); // no bids yet, the order rests
//! assert!(order.is_active());
//! # Ok::<(), sidebet::error::Error>(())
//! ```

pub mod book;
pub mod config;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod stats;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
