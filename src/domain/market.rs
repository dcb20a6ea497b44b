//! Market aggregate: lifecycle state machine, token supply, and pricing.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ids::{MarketId, TraderId};
use crate::domain::money::{Price, Volume};
use crate::domain::order::TokenType;
use crate::error::{Error, Result};

/// Lifecycle state of a market.
///
/// `Open` and `Halted` are interchangeable via halt/resume; the three
/// resolved states are terminal and one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketStatus {
    Open,
    Halted,
    ResolvedYes,
    ResolvedNo,
    Invalid,
}

impl MarketStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ResolvedYes | Self::ResolvedNo | Self::Invalid)
    }

    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Halted => write!(f, "HALTED"),
            Self::ResolvedYes => write!(f, "RESOLVED_YES"),
            Self::ResolvedNo => write!(f, "RESOLVED_NO"),
            Self::Invalid => write!(f, "INVALID"),
        }
    }
}

/// The outcome a market resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Yes,
    No,
}

impl Outcome {
    /// The token that pays $1 under this outcome.
    #[must_use]
    pub fn winning_token(self) -> TokenType {
        match self {
            Self::Yes => TokenType::Yes,
            Self::No => TokenType::No,
        }
    }

    #[must_use]
    pub fn terminal_status(self) -> MarketStatus {
        match self {
            Self::Yes => MarketStatus::ResolvedYes,
            Self::No => MarketStatus::ResolvedNo,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "YES"),
            Self::No => write!(f, "NO"),
        }
    }
}

/// Outstanding token supply backed by collateral.
///
/// Minting and redeeming always move both legs together, so
/// `yes_supply == no_supply == collateral` holds at all times.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenSupply {
    yes_supply: Volume,
    no_supply: Volume,
    collateral: Decimal,
}

impl TokenSupply {
    #[must_use]
    pub fn yes_supply(&self) -> Volume {
        self.yes_supply
    }

    #[must_use]
    pub fn no_supply(&self) -> Volume {
        self.no_supply
    }

    #[must_use]
    pub fn collateral(&self) -> Decimal {
        self.collateral
    }

    pub fn mint_pairs(&mut self, amount: Volume) {
        self.yes_supply += amount;
        self.no_supply += amount;
        self.collateral += amount;
    }

    pub fn redeem_pairs(&mut self, amount: Volume) {
        self.yes_supply -= amount;
        self.no_supply -= amount;
        self.collateral -= amount;
    }
}

/// Current prices for both legs, kept complementary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketPrices {
    pub yes_price: Price,
    pub no_price: Price,
    pub yes_best_bid: Option<Price>,
    pub yes_best_ask: Option<Price>,
    pub no_best_bid: Option<Price>,
    pub no_best_ask: Option<Price>,
    pub last_trade_at: Option<DateTime<Utc>>,
}

impl MarketPrices {
    fn seeded(initial_probability: Price) -> Self {
        Self {
            yes_price: initial_probability,
            no_price: Decimal::ONE - initial_probability,
            yes_best_bid: None,
            yes_best_ask: None,
            no_best_bid: None,
            no_best_ask: None,
            last_trade_at: None,
        }
    }

    /// Update last-trade prices from a print, keeping
    /// `yes_price + no_price == 1`.
    pub fn record_print(&mut self, token: TokenType, price: Price, at: DateTime<Utc>) {
        self.yes_price = match token {
            TokenType::Yes => price,
            TokenType::No => Decimal::ONE - price,
        };
        self.no_price = Decimal::ONE - self.yes_price;
        self.last_trade_at = Some(at);
    }
}

/// Cumulative trading activity for one market.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeStats {
    pub total_volume: Decimal,
    pub trade_count: u64,
    pub unique_traders: HashSet<TraderId>,
}

impl VolumeStats {
    pub fn record_trade(&mut self, value: Decimal, buyer: &TraderId, seller: &TraderId) {
        self.total_volume += value;
        self.trade_count += 1;
        self.unique_traders.insert(buyer.clone());
        self.unique_traders.insert(seller.clone());
    }
}

/// One sample in a market's price history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub yes_price: Price,
    pub volume: Decimal,
}

/// Evidence attached to a resolution. The payload is opaque to the engine;
/// it is stored verbatim for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionProof {
    pub outcome: Outcome,
    pub resolved_by: String,
    pub evidence: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Input for creating a market.
#[derive(Debug, Clone)]
pub struct CreateMarket {
    pub id: MarketId,
    pub question: String,
    pub description: String,
    pub tags: Vec<String>,
    pub resolution_deadline: DateTime<Utc>,
    /// Seed probability for the YES leg, used as the initial price print.
    pub initial_probability: Price,
}

/// Filter for market listings. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct MarketFilter {
    pub statuses: Vec<MarketStatus>,
    pub tags: Vec<String>,
}

impl MarketFilter {
    #[must_use]
    pub fn matches(&self, market: &Market) -> bool {
        let status_ok = self.statuses.is_empty() || self.statuses.contains(&market.status);
        let tags_ok = self.tags.is_empty() || self.tags.iter().any(|t| market.tags.contains(t));
        status_ok && tags_ok
    }
}

/// A binary-outcome market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub question: String,
    pub description: String,
    pub tags: Vec<String>,
    pub status: MarketStatus,
    pub created_at: DateTime<Utc>,
    pub resolution_deadline: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub initial_probability: Price,
    pub supply: TokenSupply,
    pub prices: MarketPrices,
    pub volume: VolumeStats,
    pub price_history: Vec<PricePoint>,
    pub resolution_proof: Option<ResolutionProof>,
}

impl Market {
    pub fn new(input: CreateMarket, at: DateTime<Utc>) -> Self {
        let prices = MarketPrices::seeded(input.initial_probability);
        let history = vec![PricePoint {
            timestamp: at,
            yes_price: prices.yes_price,
            volume: Decimal::ZERO,
        }];
        Self {
            id: input.id,
            question: input.question,
            description: input.description,
            tags: input.tags,
            status: MarketStatus::Open,
            created_at: at,
            resolution_deadline: input.resolution_deadline,
            resolved_at: None,
            initial_probability: input.initial_probability,
            supply: TokenSupply::default(),
            prices,
            volume: VolumeStats::default(),
            price_history: history,
            resolution_proof: None,
        }
    }

    /// Fail unless the market currently accepts trading operations.
    pub fn ensure_open(&self) -> Result<()> {
        if !self.status.is_open() {
            return Err(Error::MarketNotOpen {
                market_id: self.id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    fn ensure_not_terminal(&self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::MarketTerminal {
                market_id: self.id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    /// Pause trading. Reversible via [`Market::resume`].
    pub fn halt(&mut self) -> Result<()> {
        self.ensure_not_terminal()?;
        self.status = MarketStatus::Halted;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        self.ensure_not_terminal()?;
        self.status = MarketStatus::Open;
        Ok(())
    }

    /// Move to the terminal state for `outcome` and pin prices to it.
    ///
    /// Fails if the market is already terminal; a market resolves once.
    pub fn resolve(&mut self, proof: ResolutionProof, at: DateTime<Utc>) -> Result<()> {
        self.ensure_not_terminal()?;
        let outcome = proof.outcome;
        self.status = outcome.terminal_status();
        self.resolved_at = Some(at);
        self.resolution_proof = Some(proof);
        let (yes, no) = match outcome {
            Outcome::Yes => (Decimal::ONE, Decimal::ZERO),
            Outcome::No => (Decimal::ZERO, Decimal::ONE),
        };
        self.prices.yes_price = yes;
        self.prices.no_price = no;
        Ok(())
    }

    /// Void the market. Terminal, like resolution, but with no payout.
    pub fn invalidate(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.ensure_not_terminal()?;
        self.status = MarketStatus::Invalid;
        self.resolved_at = Some(at);
        Ok(())
    }

    /// Record a trade print: prices, volume stats, and a history point.
    ///
    /// `history_cap` bounds retained history; the oldest points fall off.
    pub fn record_trade(
        &mut self,
        token: TokenType,
        price: Price,
        value: Decimal,
        buyer: &TraderId,
        seller: &TraderId,
        at: DateTime<Utc>,
        history_cap: usize,
    ) {
        self.prices.record_print(token, price, at);
        self.volume.record_trade(value, buyer, seller);
        self.price_history.push(PricePoint {
            timestamp: at,
            yes_price: self.prices.yes_price,
            volume: value,
        });
        if self.price_history.len() > history_cap {
            let excess = self.price_history.len() - history_cap;
            self.price_history.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn market() -> Market {
        Market::new(
            CreateMarket {
                id: MarketId::new("test-market"),
                question: "Will it happen?".into(),
                description: String::new(),
                tags: vec!["test".into()],
                resolution_deadline: Utc::now() + chrono::Duration::days(30),
                initial_probability: dec!(0.5),
            },
            Utc::now(),
        )
    }

    fn proof(outcome: Outcome) -> ResolutionProof {
        ResolutionProof {
            outcome,
            resolved_by: "oracle".into(),
            evidence: serde_json::json!({"source": "test"}),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_market_is_open_with_seeded_prices() {
        let m = market();
        assert_eq!(m.status, MarketStatus::Open);
        assert_eq!(m.prices.yes_price, dec!(0.5));
        assert_eq!(m.prices.no_price, dec!(0.5));
        assert_eq!(m.price_history.len(), 1);
    }

    #[test]
    fn halt_and_resume_round_trip() {
        let mut m = market();
        m.halt().unwrap();
        assert_eq!(m.status, MarketStatus::Halted);
        assert!(m.ensure_open().is_err());

        m.resume().unwrap();
        assert_eq!(m.status, MarketStatus::Open);
        assert!(m.ensure_open().is_ok());
    }

    #[test]
    fn resolve_pins_prices_to_outcome() {
        let mut m = market();
        m.resolve(proof(Outcome::Yes), Utc::now()).unwrap();

        assert_eq!(m.status, MarketStatus::ResolvedYes);
        assert_eq!(m.prices.yes_price, dec!(1));
        assert_eq!(m.prices.no_price, dec!(0));
        assert!(m.resolved_at.is_some());
        assert!(m.resolution_proof.is_some());
    }

    #[test]
    fn double_resolution_is_rejected() {
        let mut m = market();
        m.resolve(proof(Outcome::No), Utc::now()).unwrap();

        let err = m.resolve(proof(Outcome::Yes), Utc::now()).unwrap_err();
        assert!(matches!(err, Error::MarketTerminal { .. }));
        assert_eq!(m.status, MarketStatus::ResolvedNo);
    }

    #[test]
    fn terminal_market_cannot_resume() {
        let mut m = market();
        m.invalidate(Utc::now()).unwrap();

        assert!(m.resume().is_err());
        assert!(m.halt().is_err());
        assert_eq!(m.status, MarketStatus::Invalid);
    }

    #[test]
    fn record_print_keeps_prices_complementary() {
        let mut m = market();
        m.prices.record_print(TokenType::No, dec!(0.40), Utc::now());

        assert_eq!(m.prices.yes_price, dec!(0.60));
        assert_eq!(m.prices.no_price, dec!(0.40));
        assert!(m.prices.last_trade_at.is_some());
    }

    #[test]
    fn record_trade_updates_volume_and_history() {
        let mut m = market();
        let alice = TraderId::new("alice");
        let bob = TraderId::new("bob");
        m.record_trade(
            TokenType::Yes,
            dec!(0.60),
            dec!(42),
            &alice,
            &bob,
            Utc::now(),
            100,
        );

        assert_eq!(m.volume.total_volume, dec!(42));
        assert_eq!(m.volume.trade_count, 1);
        assert_eq!(m.volume.unique_traders.len(), 2);
        assert_eq!(m.price_history.len(), 2);
    }

    #[test]
    fn history_is_capped() {
        let mut m = market();
        let alice = TraderId::new("alice");
        let bob = TraderId::new("bob");
        for _ in 0..10 {
            m.record_trade(
                TokenType::Yes,
                dec!(0.60),
                dec!(1),
                &alice,
                &bob,
                Utc::now(),
                5,
            );
        }
        assert_eq!(m.price_history.len(), 5);
    }

    #[test]
    fn filter_matches_status_and_tags() {
        let m = market();
        assert!(MarketFilter::default().matches(&m));
        assert!(MarketFilter {
            statuses: vec![MarketStatus::Open],
            tags: vec!["test".into()],
        }
        .matches(&m));
        assert!(!MarketFilter {
            statuses: vec![MarketStatus::Halted],
            ..Default::default()
        }
        .matches(&m));
        assert!(!MarketFilter {
            tags: vec!["other".into()],
            ..Default::default()
        }
        .matches(&m));
    }
}
