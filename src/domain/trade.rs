//! Executed trade records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::{MarketId, OrderId, TradeId, TraderId};
use crate::domain::money::{Price, Volume};
use crate::domain::order::TokenType;

/// An immutable record of a print between two orders.
///
/// Trades execute at the resting (maker) order's price. The record is
/// append-only; nothing in the engine mutates a trade after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub market_id: MarketId,
    pub token: TokenType,
    pub price: Price,
    pub quantity: Volume,
    /// Notional value of the print, `price * quantity`.
    pub value: Volume,
    pub buyer_id: TraderId,
    pub buyer_order_id: OrderId,
    pub seller_id: TraderId,
    pub seller_order_id: OrderId,
    /// Whether this print created new token supply. Book matches transfer
    /// existing tokens, so this is false for every matched trade.
    pub minted: bool,
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        market_id: MarketId,
        token: TokenType,
        price: Price,
        quantity: Volume,
        buyer_id: TraderId,
        buyer_order_id: OrderId,
        seller_id: TraderId,
        seller_order_id: OrderId,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TradeId::new(),
            market_id,
            token,
            price,
            quantity,
            value: price * quantity,
            buyer_id,
            buyer_order_id,
            seller_id,
            seller_order_id,
            minted: false,
            executed_at,
        }
    }
}
