//! Limit orders on outcome tokens.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::{MarketId, OrderId, TraderId};
use crate::domain::money::{Price, Volume};
use crate::error::{Error, Result};

/// Which leg of the binary pair an order trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenType {
    Yes,
    No,
}

impl TokenType {
    /// The opposite leg of the pair.
    #[must_use]
    pub fn complement(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "YES"),
            Self::No => write!(f, "NO"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Execution style of an order. Only limit orders exist today; market
/// orders would need a protection-price story first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Limit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit => write!(f, "LIMIT"),
        }
    }
}

/// Lifecycle state of an order. `Filled` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            Self::Filled => write!(f, "FILLED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A limit order resting in, or matching against, a book.
///
/// `seq` is assigned by the engine on acceptance and breaks price ties in
/// favor of the earlier order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub market_id: MarketId,
    pub trader_id: TraderId,
    pub token: TokenType,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Price,
    pub quantity: Volume,
    pub filled_quantity: Volume,
    pub status: OrderStatus,
    pub seq: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        market_id: MarketId,
        trader_id: TraderId,
        token: TokenType,
        side: Side,
        price: Price,
        quantity: Volume,
        seq: u64,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OrderId::new(),
            market_id,
            trader_id,
            token,
            side,
            order_type: OrderType::Limit,
            price,
            quantity,
            filled_quantity: Volume::ZERO,
            status: OrderStatus::Open,
            seq,
            created_at: at,
            updated_at: at,
        }
    }

    /// Unfilled remainder of the order.
    #[must_use]
    pub fn remaining(&self) -> Volume {
        self.quantity - self.filled_quantity
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.status, OrderStatus::Open | OrderStatus::PartiallyFilled)
    }

    /// Record a fill of `quantity` tokens, updating the status.
    ///
    /// Errors when the fill would exceed the order quantity.
    pub fn fill(&mut self, quantity: Volume, at: DateTime<Utc>) -> Result<()> {
        if quantity > self.remaining() {
            return Err(Error::Overfill {
                quantity: self.quantity,
                filled: self.filled_quantity,
                fill: quantity,
            });
        }
        self.filled_quantity += quantity;
        self.status = if self.remaining() == Volume::ZERO {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.updated_at = at;
        Ok(())
    }

    /// Cancel the order. Errors once the order is already terminal.
    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<()> {
        if !self.is_active() {
            return Err(Error::OrderNotActive {
                order_id: self.id.clone(),
                status: self.status,
            });
        }
        self.status = OrderStatus::Cancelled;
        self.updated_at = at;
        Ok(())
    }
}
