//! Core domain types: identifiers, money, markets, traders, orders, trades.

pub mod ids;
pub mod market;
pub mod money;
pub mod order;
pub mod trade;
pub mod trader;

pub use ids::{MarketId, OrderId, TradeId, TraderId};
pub use market::{
    CreateMarket, Market, MarketFilter, MarketPrices, MarketStatus, Outcome, PricePoint,
    ResolutionProof, TokenSupply, VolumeStats,
};
pub use money::{is_valid_limit_price, Price, Volume};
pub use order::{Order, OrderStatus, OrderType, Side, TokenType};
pub use trade::Trade;
pub use trader::{Position, Trader};
