//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests). Provides concise factory functions so tests focus
//! on assertions rather than construction boilerplate.

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

use crate::config::EngineConfig;
use crate::domain::{CreateMarket, Market, MarketId, Price, TraderId};
use crate::exchange::Exchange;

/// An exchange with default engine configuration.
pub fn exchange() -> Exchange {
    Exchange::new(EngineConfig::default())
}

/// Create a [`MarketId`] from a string.
pub fn market_id(id: &str) -> MarketId {
    MarketId::from(id)
}

/// Create a [`TraderId`] from a string.
pub fn trader_id(id: &str) -> TraderId {
    TraderId::from(id)
}

/// A [`CreateMarket`] input with sensible defaults: a 30-day deadline and
/// a 50% seed probability.
pub fn market_input(id: &str) -> CreateMarket {
    CreateMarket {
        id: MarketId::from(id),
        question: format!("Will {id} happen?"),
        description: String::new(),
        tags: vec!["test".to_string()],
        resolution_deadline: Utc::now() + Duration::days(30),
        initial_probability: dec!(0.5),
    }
}

/// Create an open market with defaults on `exchange`.
pub fn open_market(exchange: &Exchange, id: &str) -> Market {
    exchange
        .create_market(market_input(id))
        .unwrap_or_else(|e| panic!("failed to create test market {id}: {e}"))
}

/// Create an open market with a specific seed probability.
pub fn open_market_at(exchange: &Exchange, id: &str, probability: Price) -> Market {
    let mut input = market_input(id);
    input.initial_probability = probability;
    exchange
        .create_market(input)
        .unwrap_or_else(|e| panic!("failed to create test market {id}: {e}"))
}

/// Provision a trader with the default starting balance.
pub fn funded_trader(exchange: &Exchange, id: &str) -> TraderId {
    let trader = exchange.create_trader(TraderId::from(id));
    trader.id
}
