//! Per-token limit order books with price/time priority.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ids::{MarketId, OrderId};
use crate::domain::money::{Price, Volume};
use crate::domain::order::{Side, TokenType};

/// A resting order's key in the book: enough to rank it and find it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookEntry {
    pub order_id: OrderId,
    pub price: Price,
    pub seq: u64,
}

/// One side of a book, kept in priority order.
///
/// Bids rank by price descending, asks by price ascending; within a price
/// level the lower `seq` (earlier order) ranks first.
#[derive(Debug, Clone, Default)]
struct BookSide {
    entries: Vec<BookEntry>,
}

impl BookSide {
    fn insert(&mut self, entry: BookEntry, ranks_before: impl Fn(&BookEntry, &BookEntry) -> bool) {
        let at = self
            .entries
            .iter()
            .position(|e| ranks_before(&entry, e))
            .unwrap_or(self.entries.len());
        self.entries.insert(at, entry);
    }

    fn remove(&mut self, order_id: &OrderId) -> bool {
        match self.entries.iter().position(|e| &e.order_id == order_id) {
            Some(at) => {
                self.entries.remove(at);
                true
            }
            None => false,
        }
    }
}

/// The book for one token of one market.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    bids: BookSide,
    asks: BookSide,
}

impl OrderBook {
    /// Rest an order on its side, preserving price/time priority.
    pub fn insert(&mut self, side: Side, entry: BookEntry) {
        match side {
            Side::Buy => self
                .bids
                .insert(entry, |a, b| a.price > b.price || (a.price == b.price && a.seq < b.seq)),
            Side::Sell => self
                .asks
                .insert(entry, |a, b| a.price < b.price || (a.price == b.price && a.seq < b.seq)),
        }
    }

    /// Remove an order from its side. Returns false if it was not resting.
    pub fn remove(&mut self, side: Side, order_id: &OrderId) -> bool {
        match side {
            Side::Buy => self.bids.remove(order_id),
            Side::Sell => self.asks.remove(order_id),
        }
    }

    /// Highest-priority resting bid.
    #[must_use]
    pub fn best_bid(&self) -> Option<&BookEntry> {
        self.bids.entries.first()
    }

    /// Highest-priority resting ask.
    #[must_use]
    pub fn best_ask(&self) -> Option<&BookEntry> {
        self.asks.entries.first()
    }

    pub fn bids(&self) -> impl Iterator<Item = &BookEntry> {
        self.bids.entries.iter()
    }

    pub fn asks(&self) -> impl Iterator<Item = &BookEntry> {
        self.asks.entries.iter()
    }

    /// Drain every resting order id from both sides, e.g. when the market
    /// goes terminal.
    pub fn drain(&mut self) -> Vec<OrderId> {
        let mut ids: Vec<OrderId> = Vec::with_capacity(self.bids.entries.len() + self.asks.entries.len());
        ids.extend(self.bids.entries.drain(..).map(|e| e.order_id));
        ids.extend(self.asks.entries.drain(..).map(|e| e.order_id));
        ids
    }

    /// Aggregate one side into price levels, using `remaining` to look up
    /// each order's unfilled quantity.
    pub fn levels<F>(&self, side: Side, remaining: F) -> Vec<BookLevel>
    where
        F: Fn(&OrderId) -> Volume,
    {
        let entries = match side {
            Side::Buy => &self.bids.entries,
            Side::Sell => &self.asks.entries,
        };
        let mut levels: Vec<BookLevel> = Vec::new();
        for entry in entries {
            match levels.last_mut() {
                Some(level) if level.price == entry.price => {
                    level.quantity += remaining(&entry.order_id);
                    level.order_count += 1;
                }
                _ => levels.push(BookLevel {
                    price: entry.price,
                    quantity: remaining(&entry.order_id),
                    order_count: 1,
                }),
            }
        }
        levels
    }
}

/// Aggregated depth at one price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Price,
    pub quantity: Volume,
    pub order_count: usize,
}

/// Snapshot of one token's book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBook {
    pub token: TokenType,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    pub spread: Option<Decimal>,
}

impl TokenBook {
    pub fn new(token: TokenType, bids: Vec<BookLevel>, asks: Vec<BookLevel>) -> Self {
        let best_bid = bids.first().map(|l| l.price);
        let best_ask = asks.first().map(|l| l.price);
        let spread = match (best_bid, best_ask) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        };
        Self {
            token,
            bids,
            asks,
            best_bid,
            best_ask,
            spread,
        }
    }
}

/// Snapshot of both books of a market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketBook {
    pub market_id: MarketId,
    pub yes: TokenBook,
    pub no: TokenBook,
    pub updated_at: DateTime<Utc>,
}
