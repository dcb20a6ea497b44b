//! Read models for exchange-wide and per-trader statistics.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ids::TraderId;

/// Aggregate counters across the whole exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeStats {
    pub total_markets: usize,
    pub open_markets: usize,
    /// Markets resolved YES or NO. Invalidated markets are terminal but do
    /// not count as resolved.
    pub resolved_markets: usize,
    pub total_traders: usize,
    pub total_trades: usize,
    pub total_volume: Decimal,
}

/// One trader's scoreboard line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraderStats {
    pub trader_id: TraderId,
    pub realized_pnl: Decimal,
    pub trade_count: u64,
    pub wins: u64,
    pub losses: u64,
    /// Total notional traded, summed over both sides of every trade the
    /// trader participated in.
    pub volume: Decimal,
    pub balance: Decimal,
}

/// A page of the P&L leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<TraderStats>,
    /// Number of traders overall, not just on this page.
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}
