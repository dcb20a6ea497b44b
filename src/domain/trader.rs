//! Traders, balances, and per-market token positions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::ids::{MarketId, TraderId};
use crate::domain::money::{Price, Volume};
use crate::domain::order::TokenType;
use crate::error::{Error, Result};

/// Token holdings in one market, with quantity-weighted average cost basis
/// tracked per leg.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Position {
    yes_tokens: Volume,
    no_tokens: Volume,
    yes_cost_basis: Price,
    no_cost_basis: Price,
}

impl Position {
    #[must_use]
    pub fn tokens(&self, token: TokenType) -> Volume {
        match token {
            TokenType::Yes => self.yes_tokens,
            TokenType::No => self.no_tokens,
        }
    }

    #[must_use]
    pub fn cost_basis(&self, token: TokenType) -> Price {
        match token {
            TokenType::Yes => self.yes_cost_basis,
            TokenType::No => self.no_cost_basis,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.yes_tokens == Volume::ZERO && self.no_tokens == Volume::ZERO
    }

    /// Add `quantity` tokens acquired at `price`, folding the purchase into
    /// the weighted-average cost basis of that leg.
    pub fn acquire(&mut self, token: TokenType, quantity: Volume, price: Price) {
        let (tokens, basis) = self.leg_mut(token);
        let held = *tokens;
        *basis = if held + quantity == Volume::ZERO {
            Decimal::ZERO
        } else {
            (*basis * held + price * quantity) / (held + quantity)
        };
        *tokens = held + quantity;
    }

    /// Remove `quantity` tokens sold at `price` and return the realized
    /// P&L of the disposal, `(price - basis) * quantity`.
    ///
    /// The cost basis of the remaining tokens is unchanged.
    pub fn dispose(&mut self, token: TokenType, quantity: Volume, price: Price) -> Result<Decimal> {
        let (tokens, basis) = self.leg_mut(token);
        if quantity > *tokens {
            return Err(Error::InsufficientTokens {
                token,
                required: quantity,
                available: *tokens,
            });
        }
        let pnl = (price - *basis) * quantity;
        *tokens -= quantity;
        if *tokens == Volume::ZERO {
            *basis = Decimal::ZERO;
        }
        Ok(pnl)
    }

    /// Record a mint of `amount` complete pairs.
    ///
    /// Each leg costs $0.50 of the $1 collateral, so both bases are blended
    /// toward 0.5 as if each leg were bought at that price.
    pub fn mint(&mut self, amount: Volume) {
        self.acquire(TokenType::Yes, amount, dec!(0.5));
        self.acquire(TokenType::No, amount, dec!(0.5));
    }

    /// Record a redemption of `amount` complete pairs.
    ///
    /// No P&L is realized: the pair is exchanged for its $1 collateral at
    /// face value. Bases for any remaining tokens are unchanged.
    pub fn redeem(&mut self, amount: Volume) -> Result<()> {
        let held = self.yes_tokens.min(self.no_tokens);
        if amount > held {
            let token = if self.yes_tokens <= self.no_tokens {
                TokenType::Yes
            } else {
                TokenType::No
            };
            return Err(Error::InsufficientTokens {
                token,
                required: amount,
                available: held,
            });
        }
        self.yes_tokens -= amount;
        self.no_tokens -= amount;
        if self.yes_tokens == Volume::ZERO {
            self.yes_cost_basis = Decimal::ZERO;
        }
        if self.no_tokens == Volume::ZERO {
            self.no_cost_basis = Decimal::ZERO;
        }
        Ok(())
    }

    /// Drop all holdings, e.g. after settlement pays the position out.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn leg_mut(&mut self, token: TokenType) -> (&mut Volume, &mut Price) {
        match token {
            TokenType::Yes => (&mut self.yes_tokens, &mut self.yes_cost_basis),
            TokenType::No => (&mut self.no_tokens, &mut self.no_cost_basis),
        }
    }
}

/// A participant: cash balance, running P&L counters, and positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trader {
    pub id: TraderId,
    pub balance: Decimal,
    pub realized_pnl: Decimal,
    pub trade_count: u64,
    pub wins: u64,
    pub losses: u64,
    pub created_at: DateTime<Utc>,
    pub positions: HashMap<MarketId, Position>,
}

impl Trader {
    pub fn new(id: TraderId, starting_balance: Decimal, at: DateTime<Utc>) -> Self {
        Self {
            id,
            balance: starting_balance,
            realized_pnl: Decimal::ZERO,
            trade_count: 0,
            wins: 0,
            losses: 0,
            created_at: at,
            positions: HashMap::new(),
        }
    }

    pub fn credit(&mut self, amount: Decimal) {
        self.balance += amount;
    }

    /// Deduct `amount` from the cash balance, failing before any mutation
    /// when funds are short.
    pub fn debit(&mut self, amount: Decimal) -> Result<()> {
        if amount > self.balance {
            return Err(Error::InsufficientFunds {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    #[must_use]
    pub fn position(&self, market_id: &MarketId) -> Option<&Position> {
        self.positions.get(market_id)
    }

    /// The position in `market_id`, created empty on first access.
    pub fn position_mut(&mut self, market_id: &MarketId) -> &mut Position {
        self.positions.entry(market_id.clone()).or_default()
    }
}
