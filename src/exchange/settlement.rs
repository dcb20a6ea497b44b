//! Resolution and settlement: turning terminal outcomes into payouts.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::ids::{MarketId, TraderId};
use crate::domain::market::{Outcome, ResolutionProof};
use crate::domain::money::Volume;
use crate::domain::order::TokenType;
use crate::error::Result;

use super::{Exchange, State};

/// Per-trader outcome of settling one market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub trader_id: TraderId,
    pub market_id: MarketId,
    pub yes_tokens: Volume,
    pub no_tokens: Volume,
    /// Cash credited: winning tokens at $1 each.
    pub payout: Decimal,
    /// Realized P&L of the settlement step, against remaining cost bases.
    pub pnl: Decimal,
}

/// One entry in a batch resolution.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub market_id: MarketId,
    pub outcome: Outcome,
    pub resolved_by: String,
    pub evidence: serde_json::Value,
}

impl Exchange {
    /// Resolve a market to `outcome` and settle every open position.
    ///
    /// Resting orders are cancelled, the winning token pays $1 per unit,
    /// and positions are zeroed. Fails without side effects if the market
    /// is unknown or already terminal.
    pub fn resolve_market(
        &self,
        market_id: &MarketId,
        outcome: Outcome,
        resolved_by: impl Into<String>,
        evidence: serde_json::Value,
    ) -> Result<Vec<Settlement>> {
        let mut state = self.state.lock();
        let now = Utc::now();
        let proof = ResolutionProof {
            outcome,
            resolved_by: resolved_by.into(),
            evidence,
            timestamp: now,
        };
        state.market_mut(market_id)?.resolve(proof, now)?;

        state.cancel_resting_orders(market_id);
        let settlements = state.settle_positions(market_id, outcome);
        state.refresh_quotes(market_id);

        info!(
            market_id = %market_id,
            %outcome,
            settled = settlements.len(),
            "market resolved"
        );
        Ok(settlements)
    }

    /// Resolve several markets in one call.
    ///
    /// Each market resolves independently; one failure does not stop the
    /// rest. Results come back in request order.
    pub fn batch_resolve(
        &self,
        requests: Vec<ResolveRequest>,
    ) -> Vec<(MarketId, Result<Vec<Settlement>>)> {
        requests
            .into_iter()
            .map(|req| {
                let result =
                    self.resolve_market(&req.market_id, req.outcome, req.resolved_by, req.evidence);
                if let Err(e) = &result {
                    warn!(market_id = %req.market_id, error = %e, "batch resolution entry failed");
                }
                (req.market_id, result)
            })
            .collect()
    }

    /// Void a market: terminal, resting orders cancelled, no payout.
    ///
    /// Collateral stays locked and positions are left in place; balances
    /// and P&L are untouched.
    pub fn invalidate_market(&self, market_id: &MarketId, reason: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.market_mut(market_id)?.invalidate(Utc::now())?;
        state.cancel_resting_orders(market_id);
        state.refresh_quotes(market_id);
        info!(market_id = %market_id, reason, "market invalidated");
        Ok(())
    }
}

impl State {
    /// Cancel every order resting on either book of `market_id`.
    pub(crate) fn cancel_resting_orders(&mut self, market_id: &MarketId) {
        let now = Utc::now();
        for token in [TokenType::Yes, TokenType::No] {
            let ids = self.book_mut(market_id, token).drain();
            for id in ids {
                if let Some(order) = self.orders.get_mut(&id) {
                    let cancelled = order.cancel(now);
                    debug_assert!(cancelled.is_ok(), "drained book entry was not active");
                }
            }
        }
    }

    /// Pay out every non-empty position in `market_id` for `outcome`.
    fn settle_positions(&mut self, market_id: &MarketId, outcome: Outcome) -> Vec<Settlement> {
        let win = outcome.winning_token();
        let lose = win.complement();
        let mut settlements = Vec::new();

        let mut trader_ids: Vec<TraderId> = self
            .traders
            .iter()
            .filter(|(_, t)| t.position(market_id).is_some_and(|p| !p.is_empty()))
            .map(|(id, _)| id.clone())
            .collect();
        trader_ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        for trader_id in trader_ids {
            let Some(trader) = self.traders.get_mut(&trader_id) else {
                continue;
            };
            let position = trader.position_mut(market_id);
            let win_qty = position.tokens(win);
            let lose_qty = position.tokens(lose);
            let win_basis = position.cost_basis(win);
            let lose_basis = position.cost_basis(lose);
            position.clear();

            let payout = win_qty;
            let pnl = (Decimal::ONE - win_basis) * win_qty - lose_basis * lose_qty;
            trader.credit(payout);
            trader.realized_pnl += pnl;
            if pnl > Decimal::ZERO {
                trader.wins += 1;
            } else if pnl < Decimal::ZERO {
                trader.losses += 1;
            }

            settlements.push(Settlement {
                trader_id,
                market_id: market_id.clone(),
                yes_tokens: if win == TokenType::Yes { win_qty } else { lose_qty },
                no_tokens: if win == TokenType::No { win_qty } else { lose_qty },
                payout,
                pnl,
            });
        }
        settlements
    }
}
