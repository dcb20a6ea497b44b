//! The exchange engine: all state behind one entry type.
//!
//! Every public operation takes the internal lock, validates its inputs
//! against current state, and only then mutates. A returned error means
//! nothing changed.

mod matching;
mod settlement;
mod view;

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::book::OrderBook;
use crate::config::EngineConfig;
use crate::domain::ids::{MarketId, OrderId, TraderId};
use crate::domain::market::{CreateMarket, Market, MarketFilter};
use crate::domain::money::{is_valid_limit_price, Volume};
use crate::domain::order::{Order, TokenType};
use crate::domain::trade::Trade;
use crate::domain::trader::Trader;
use crate::error::{Error, Result};

pub use settlement::{ResolveRequest, Settlement};

/// Receipt for a completed mint: `amount` YES and `amount` NO tokens were
/// created against `cost` of collateral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintReceipt {
    pub market_id: MarketId,
    pub trader_id: TraderId,
    pub amount: Volume,
    pub cost: Decimal,
}

/// Receipt for a completed redemption: `amount` pairs burned, `proceeds`
/// of collateral returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemReceipt {
    pub market_id: MarketId,
    pub trader_id: TraderId,
    pub amount: Volume,
    pub proceeds: Decimal,
}

/// All mutable engine state, guarded by the lock in [`Exchange`].
#[derive(Debug, Default)]
pub(crate) struct State {
    pub(crate) markets: HashMap<MarketId, Market>,
    pub(crate) traders: HashMap<TraderId, Trader>,
    pub(crate) orders: HashMap<OrderId, Order>,
    pub(crate) trades: Vec<Trade>,
    pub(crate) books: HashMap<(MarketId, TokenType), OrderBook>,
    pub(crate) next_seq: u64,
}

impl State {
    pub(crate) fn market(&self, id: &MarketId) -> Result<&Market> {
        self.markets
            .get(id)
            .ok_or_else(|| Error::MarketNotFound(id.clone()))
    }

    pub(crate) fn market_mut(&mut self, id: &MarketId) -> Result<&mut Market> {
        self.markets
            .get_mut(id)
            .ok_or_else(|| Error::MarketNotFound(id.clone()))
    }

    pub(crate) fn trader(&self, id: &TraderId) -> Result<&Trader> {
        self.traders
            .get(id)
            .ok_or_else(|| Error::TraderNotFound(id.clone()))
    }

    pub(crate) fn trader_mut(&mut self, id: &TraderId) -> Result<&mut Trader> {
        self.traders
            .get_mut(id)
            .ok_or_else(|| Error::TraderNotFound(id.clone()))
    }

    pub(crate) fn book_mut(&mut self, market_id: &MarketId, token: TokenType) -> &mut OrderBook {
        self.books
            .entry((market_id.clone(), token))
            .or_default()
    }

    pub(crate) fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Re-derive the quoted best bid/ask for both tokens from the books.
    pub(crate) fn refresh_quotes(&mut self, market_id: &MarketId) {
        let quote = |books: &HashMap<(MarketId, TokenType), OrderBook>, token: TokenType| {
            let book = books.get(&(market_id.clone(), token));
            (
                book.and_then(|b| b.best_bid().map(|e| e.price)),
                book.and_then(|b| b.best_ask().map(|e| e.price)),
            )
        };
        let (yes_bid, yes_ask) = quote(&self.books, TokenType::Yes);
        let (no_bid, no_ask) = quote(&self.books, TokenType::No);
        if let Some(market) = self.markets.get_mut(market_id) {
            market.prices.yes_best_bid = yes_bid;
            market.prices.yes_best_ask = yes_ask;
            market.prices.no_best_bid = no_bid;
            market.prices.no_best_ask = no_ask;
        }
    }
}

/// A binary-outcome prediction market exchange.
///
/// Owns the whole engine state; intended to be created once and shared by
/// reference. Operations are serialized by an internal lock, so concurrent
/// callers observe each operation as atomic.
#[derive(Debug)]
pub struct Exchange {
    config: EngineConfig,
    state: Mutex<State>,
}

impl Exchange {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State::default()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create a market. Fails on id reuse or an out-of-range seed
    /// probability; new markets start `Open`.
    pub fn create_market(&self, input: CreateMarket) -> Result<Market> {
        if !is_valid_limit_price(input.initial_probability) {
            return Err(Error::PriceOutOfRange {
                price: input.initial_probability,
            });
        }
        let mut state = self.state.lock();
        if state.markets.contains_key(&input.id) {
            return Err(Error::DuplicateMarket(input.id));
        }
        let market = Market::new(input, Utc::now());
        info!(market_id = %market.id, question = %market.question, "market created");
        state.markets.insert(market.id.clone(), market.clone());
        Ok(market)
    }

    pub fn market(&self, id: &MarketId) -> Result<Market> {
        self.state.lock().market(id).cloned()
    }

    /// List markets matching `filter`, paginated. Returns the page and the
    /// total match count.
    pub fn list_markets(
        &self,
        filter: &MarketFilter,
        offset: usize,
        limit: Option<usize>,
    ) -> (Vec<Market>, usize) {
        let limit = limit.unwrap_or(self.config.default_page_size);
        let state = self.state.lock();
        let mut matched: Vec<&Market> = state.markets.values().filter(|m| filter.matches(m)).collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.as_str().cmp(b.id.as_str())));
        let total = matched.len();
        let page = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        (page, total)
    }

    /// Open or halted markets whose resolution deadline falls within
    /// `window` from now.
    pub fn markets_expiring_within(&self, window: chrono::Duration) -> Vec<Market> {
        let now = Utc::now();
        let cutoff = now + window;
        let state = self.state.lock();
        let mut expiring: Vec<Market> = state
            .markets
            .values()
            .filter(|m| !m.status.is_terminal() && m.resolution_deadline <= cutoff)
            .cloned()
            .collect();
        expiring.sort_by(|a, b| a.resolution_deadline.cmp(&b.resolution_deadline));
        expiring
    }

    /// Provision a trader with the configured starting balance.
    ///
    /// Idempotent: creating an existing trader returns the existing record
    /// untouched.
    pub fn create_trader(&self, id: TraderId) -> Trader {
        let mut state = self.state.lock();
        if let Some(existing) = state.traders.get(&id) {
            return existing.clone();
        }
        let trader = Trader::new(id.clone(), self.config.starting_balance, Utc::now());
        debug!(trader_id = %id, balance = %trader.balance, "trader created");
        state.traders.insert(id, trader.clone());
        trader
    }

    pub fn trader(&self, id: &TraderId) -> Result<Trader> {
        self.state.lock().trader(id).cloned()
    }

    /// Pause trading on a market. Resting orders stay on the book.
    pub fn halt_market(&self, id: &MarketId, reason: &str) -> Result<()> {
        let mut state = self.state.lock();
        let market = state.market_mut(id)?;
        market.halt()?;
        info!(market_id = %id, reason, "market halted");
        Ok(())
    }

    pub fn resume_market(&self, id: &MarketId) -> Result<()> {
        let mut state = self.state.lock();
        let market = state.market_mut(id)?;
        market.resume()?;
        info!(market_id = %id, "market resumed");
        Ok(())
    }

    /// Mint `amount` YES/NO pairs for `trader`, locking `amount` dollars
    /// of collateral.
    pub fn mint(&self, market_id: &MarketId, trader_id: &TraderId, amount: Volume) -> Result<MintReceipt> {
        if amount <= Volume::ZERO {
            return Err(Error::NonPositiveAmount { amount });
        }
        let mut state = self.state.lock();
        state.market(market_id)?.ensure_open()?;
        let trader = state.trader(trader_id)?;
        // cost is $1 per pair
        if trader.balance < amount {
            return Err(Error::InsufficientFunds {
                required: amount,
                available: trader.balance,
            });
        }

        let trader = state.trader_mut(trader_id)?;
        trader.debit(amount)?;
        trader.position_mut(market_id).mint(amount);
        state.market_mut(market_id)?.supply.mint_pairs(amount);

        debug!(market_id = %market_id, trader_id = %trader_id, %amount, "minted token pairs");
        Ok(MintReceipt {
            market_id: market_id.clone(),
            trader_id: trader_id.clone(),
            amount,
            cost: amount,
        })
    }

    /// Redeem `amount` complete pairs back into `amount` dollars.
    pub fn redeem(&self, market_id: &MarketId, trader_id: &TraderId, amount: Volume) -> Result<RedeemReceipt> {
        if amount <= Volume::ZERO {
            return Err(Error::NonPositiveAmount { amount });
        }
        let mut state = self.state.lock();
        state.market(market_id)?.ensure_open()?;
        let trader = state.trader_mut(trader_id)?;
        // a trader with no position holds no pairs; don't materialize one
        // on the failure path
        let Some(position) = trader.positions.get_mut(market_id) else {
            return Err(Error::InsufficientTokens {
                token: TokenType::Yes,
                required: amount,
                available: Volume::ZERO,
            });
        };
        position.redeem(amount)?;
        trader.credit(amount);
        state.market_mut(market_id)?.supply.redeem_pairs(amount);

        debug!(market_id = %market_id, trader_id = %trader_id, %amount, "redeemed token pairs");
        Ok(RedeemReceipt {
            market_id: market_id.clone(),
            trader_id: trader_id.clone(),
            amount,
            proceeds: amount,
        })
    }
}
