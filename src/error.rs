use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::ids::{MarketId, OrderId, TraderId};
use crate::domain::market::MarketStatus;
use crate::domain::order::{OrderStatus, TokenType};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors surfaced by exchange operations.
///
/// Every failure is a rejected operation: the engine never applies a partial
/// mutation before returning one of these.
#[derive(Error, Debug)]
pub enum Error {
    #[error("market not found: {0}")]
    MarketNotFound(MarketId),

    #[error("trader not found: {0}")]
    TraderNotFound(TraderId),

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("market already exists: {0}")]
    DuplicateMarket(MarketId),

    #[error("market {market_id} is {status}, operation requires an open market")]
    MarketNotOpen {
        market_id: MarketId,
        status: MarketStatus,
    },

    #[error("market {market_id} is already terminal ({status})")]
    MarketTerminal {
        market_id: MarketId,
        status: MarketStatus,
    },

    #[error("order {order_id} is {status} and cannot be modified")]
    OrderNotActive {
        order_id: OrderId,
        status: OrderStatus,
    },

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("insufficient {token} tokens: required {required}, available {available}")]
    InsufficientTokens {
        token: TokenType,
        required: Decimal,
        available: Decimal,
    },

    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Decimal },

    #[error("limit price must lie strictly between 0 and 1, got {price}")]
    PriceOutOfRange { price: Decimal },

    #[error("order cannot overfill: quantity {quantity}, already filled {filled}, fill {fill}")]
    Overfill {
        quantity: Decimal,
        filled: Decimal,
        fill: Decimal,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
