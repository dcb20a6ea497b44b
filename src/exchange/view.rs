//! Read-only views: book snapshots, positions, trades, and statistics.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::book::{MarketBook, OrderBook, TokenBook};
use crate::domain::ids::{MarketId, TraderId};
use crate::domain::money::Volume;
use crate::domain::order::{Side, TokenType};
use crate::domain::trade::Trade;
use crate::domain::trader::Position;
use crate::error::Result;
use crate::stats::{ExchangeStats, Leaderboard, TraderStats};

use super::{Exchange, State};

impl Exchange {
    /// Aggregated depth snapshot of both books of a market.
    pub fn order_book(&self, market_id: &MarketId) -> Result<MarketBook> {
        let state = self.state.lock();
        state.market(market_id)?;

        let snapshot = |token: TokenType| {
            let empty = OrderBook::default();
            let book = state
                .books
                .get(&(market_id.clone(), token))
                .unwrap_or(&empty);
            let remaining = |id: &crate::domain::ids::OrderId| {
                state.orders.get(id).map_or(Volume::ZERO, |o| o.remaining())
            };
            TokenBook::new(
                token,
                book.levels(Side::Buy, remaining),
                book.levels(Side::Sell, remaining),
            )
        };

        Ok(MarketBook {
            market_id: market_id.clone(),
            yes: snapshot(TokenType::Yes),
            no: snapshot(TokenType::No),
            updated_at: Utc::now(),
        })
    }

    /// A trader's position in one market, if any.
    pub fn position(&self, trader_id: &TraderId, market_id: &MarketId) -> Result<Option<Position>> {
        let state = self.state.lock();
        Ok(state.trader(trader_id)?.position(market_id).cloned())
    }

    /// Most recent trades in a market, newest first.
    pub fn trades_for_market(&self, market_id: &MarketId, limit: Option<usize>) -> Vec<Trade> {
        let limit = limit.unwrap_or(self.config.default_page_size);
        let state = self.state.lock();
        state
            .trades
            .iter()
            .rev()
            .filter(|t| &t.market_id == market_id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Most recent trades a trader took part in, newest first.
    pub fn trades_for_trader(&self, trader_id: &TraderId, limit: Option<usize>) -> Vec<Trade> {
        let limit = limit.unwrap_or(self.config.default_page_size);
        let state = self.state.lock();
        state
            .trades
            .iter()
            .rev()
            .filter(|t| &t.buyer_id == trader_id || &t.seller_id == trader_id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Exchange-wide aggregate counters.
    pub fn stats(&self) -> ExchangeStats {
        let state = self.state.lock();
        let open_markets = state.markets.values().filter(|m| m.status.is_open()).count();
        let resolved_markets = state
            .markets
            .values()
            .filter(|m| {
                matches!(
                    m.status,
                    crate::domain::market::MarketStatus::ResolvedYes
                        | crate::domain::market::MarketStatus::ResolvedNo
                )
            })
            .count();
        let total_volume = state.markets.values().map(|m| m.volume.total_volume).sum();

        ExchangeStats {
            total_markets: state.markets.len(),
            open_markets,
            resolved_markets,
            total_traders: state.traders.len(),
            total_trades: state.trades.len(),
            total_volume,
        }
    }

    /// One trader's scoreboard line.
    pub fn trader_stats(&self, trader_id: &TraderId) -> Result<TraderStats> {
        let state = self.state.lock();
        let trader = state.trader(trader_id)?;
        Ok(state.stats_line(trader))
    }

    /// All traders ranked by realized P&L, best first, paginated.
    pub fn leaderboard(&self, limit: Option<usize>, offset: usize) -> Leaderboard {
        let limit = limit.unwrap_or(self.config.default_page_size);
        let state = self.state.lock();
        let mut entries: Vec<TraderStats> =
            state.traders.values().map(|t| state.stats_line(t)).collect();
        entries.sort_by(|a, b| {
            b.realized_pnl
                .cmp(&a.realized_pnl)
                .then_with(|| a.trader_id.as_str().cmp(b.trader_id.as_str()))
        });
        let total = entries.len();
        let entries = entries.into_iter().skip(offset).take(limit).collect();

        Leaderboard {
            entries,
            total,
            limit,
            offset,
        }
    }
}

impl State {
    /// Build a trader's stats line, with volume derived from the trade log.
    fn stats_line(&self, trader: &crate::domain::trader::Trader) -> TraderStats {
        let volume: Decimal = self
            .trades
            .iter()
            .filter(|t| t.buyer_id == trader.id || t.seller_id == trader.id)
            .map(|t| t.value)
            .sum();

        TraderStats {
            trader_id: trader.id.clone(),
            realized_pnl: trader.realized_pnl,
            trade_count: trader.trade_count,
            wins: trader.wins,
            losses: trader.losses,
            volume,
            balance: trader.balance,
        }
    }
}
