//! Order placement, cancellation, and the matching loop.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::book::BookEntry;
use crate::domain::ids::{MarketId, OrderId, TraderId};
use crate::domain::money::{is_valid_limit_price, Price, Volume};
use crate::domain::order::{Order, Side, TokenType};
use crate::domain::trade::Trade;
use crate::error::{Error, Result};

use super::{Exchange, State};

impl Exchange {
    /// Place a limit order.
    ///
    /// The order matches immediately against the opposite side of the book
    /// while prices cross, each fill printing at the resting order's price;
    /// any remainder rests at the limit price. Returns the order as stored
    /// and the trades executed on the way in.
    ///
    /// Funding checks are made against the trader's balance and holdings at
    /// placement time; nothing is escrowed while the order rests.
    pub fn place_order(
        &self,
        market_id: &MarketId,
        trader_id: &TraderId,
        token: TokenType,
        side: Side,
        price: Price,
        quantity: Volume,
    ) -> Result<(Order, Vec<Trade>)> {
        if quantity <= Volume::ZERO {
            return Err(Error::NonPositiveAmount { amount: quantity });
        }
        if !is_valid_limit_price(price) {
            return Err(Error::PriceOutOfRange { price });
        }

        let mut state = self.state.lock();
        state.market(market_id)?.ensure_open()?;
        let trader = state.trader(trader_id)?;
        match side {
            Side::Buy => {
                let required = price * quantity;
                if trader.balance < required {
                    return Err(Error::InsufficientFunds {
                        required,
                        available: trader.balance,
                    });
                }
            }
            Side::Sell => {
                let held = trader
                    .position(market_id)
                    .map_or(Volume::ZERO, |p| p.tokens(token));
                if held < quantity {
                    return Err(Error::InsufficientTokens {
                        token,
                        required: quantity,
                        available: held,
                    });
                }
            }
        }

        let now = Utc::now();
        let seq = state.next_seq();
        let mut order = Order::new(
            market_id.clone(),
            trader_id.clone(),
            token,
            side,
            price,
            quantity,
            seq,
            now,
        );

        let trades = state.match_order(&mut order, self.config.price_history_cap)?;

        if order.is_active() {
            state.book_mut(market_id, token).insert(
                side,
                BookEntry {
                    order_id: order.id.clone(),
                    price: order.price,
                    seq: order.seq,
                },
            );
        }
        state.orders.insert(order.id.clone(), order.clone());
        state.refresh_quotes(market_id);

        info!(
            market_id = %market_id,
            trader_id = %trader_id,
            order_id = %order.id,
            %token, %side, %price, %quantity,
            fills = trades.len(),
            "order placed"
        );
        Ok((order, trades))
    }

    /// Cancel a resting order. No balance or position effects.
    pub fn cancel_order(&self, order_id: &OrderId) -> Result<Order> {
        let mut state = self.state.lock();
        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| Error::OrderNotFound(order_id.clone()))?;
        order.cancel(Utc::now())?;
        let (market_id, token, side) = (order.market_id.clone(), order.token, order.side);
        let cancelled = order.clone();

        state.book_mut(&market_id, token).remove(side, order_id);
        state.refresh_quotes(&market_id);
        debug!(order_id = %order_id, market_id = %market_id, "order cancelled");
        Ok(cancelled)
    }

    /// All open orders for a trader, oldest first.
    pub fn open_orders(&self, trader_id: &TraderId) -> Vec<Order> {
        let state = self.state.lock();
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| &o.trader_id == trader_id && o.is_active())
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.seq);
        orders
    }

    pub fn order(&self, order_id: &OrderId) -> Result<Order> {
        self.state
            .lock()
            .orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| Error::OrderNotFound(order_id.clone()))
    }
}

impl State {
    /// Match `taker` against the opposite side of its book until the book
    /// no longer crosses or the taker is filled.
    pub(crate) fn match_order(&mut self, taker: &mut Order, history_cap: usize) -> Result<Vec<Trade>> {
        let mut trades = Vec::new();

        while taker.remaining() > Volume::ZERO {
            let book = self.book_mut(&taker.market_id, taker.token);
            let best = match taker.side {
                Side::Buy => book.best_ask().cloned(),
                Side::Sell => book.best_bid().cloned(),
            };
            let Some(entry) = best else { break };
            let crosses = match taker.side {
                Side::Buy => entry.price <= taker.price,
                Side::Sell => entry.price >= taker.price,
            };
            if !crosses {
                break;
            }

            let maker = self
                .orders
                .get(&entry.order_id)
                .ok_or_else(|| Error::OrderNotFound(entry.order_id.clone()))?;
            let fill = taker.remaining().min(maker.remaining());
            let trade_price = entry.price;
            let maker_id = maker.id.clone();
            let maker_trader = maker.trader_id.clone();
            let maker_side = maker.side;

            // A resting order is only an intent; the maker may have spent
            // the cash or sold the tokens since placing it. Such orders are
            // removed here and matching moves on to the next level.
            if !self.maker_can_honor(&maker_trader, &taker.market_id, taker.token, maker_side, trade_price, fill) {
                warn!(order_id = %maker_id, trader_id = %maker_trader, "cancelling unfunded resting order");
                let now = Utc::now();
                if let Some(maker) = self.orders.get_mut(&maker_id) {
                    maker.cancel(now)?;
                }
                self.book_mut(&taker.market_id, taker.token)
                    .remove(maker_side, &maker_id);
                continue;
            }

            let (buyer_id, buyer_order, seller_id, seller_order) = match taker.side {
                Side::Buy => (
                    taker.trader_id.clone(),
                    taker.id.clone(),
                    maker_trader.clone(),
                    maker_id.clone(),
                ),
                Side::Sell => (
                    maker_trader.clone(),
                    maker_id.clone(),
                    taker.trader_id.clone(),
                    taker.id.clone(),
                ),
            };

            let now = Utc::now();
            self.apply_fill(
                &taker.market_id,
                taker.token,
                trade_price,
                fill,
                &buyer_id,
                &seller_id,
            )?;

            let maker = self
                .orders
                .get_mut(&maker_id)
                .ok_or_else(|| Error::OrderNotFound(maker_id.clone()))?;
            maker.fill(fill, now)?;
            let maker_done = !maker.is_active();
            taker.fill(fill, now)?;

            if maker_done {
                self.book_mut(&taker.market_id, taker.token)
                    .remove(maker_side, &maker_id);
            }

            let trade = Trade::new(
                taker.market_id.clone(),
                taker.token,
                trade_price,
                fill,
                buyer_id.clone(),
                buyer_order,
                seller_id.clone(),
                seller_order,
                now,
            );
            debug!(
                market_id = %taker.market_id,
                token = %taker.token,
                price = %trade_price,
                quantity = %fill,
                buyer = %buyer_id,
                seller = %seller_id,
                "trade executed"
            );

            if let Some(market) = self.markets.get_mut(&taker.market_id) {
                market.record_trade(
                    taker.token,
                    trade_price,
                    trade.value,
                    &buyer_id,
                    &seller_id,
                    now,
                    history_cap,
                );
            }
            self.trades.push(trade.clone());
            trades.push(trade);
        }

        Ok(trades)
    }

    /// Whether the maker's trader can still fund a fill of `quantity` at
    /// `price`.
    fn maker_can_honor(
        &self,
        trader_id: &TraderId,
        market_id: &MarketId,
        token: TokenType,
        maker_side: Side,
        price: Price,
        quantity: Volume,
    ) -> bool {
        let Some(trader) = self.traders.get(trader_id) else {
            return false;
        };
        match maker_side {
            Side::Buy => trader.balance >= price * quantity,
            Side::Sell => {
                trader
                    .position(market_id)
                    .map_or(Volume::ZERO, |p| p.tokens(token))
                    >= quantity
            }
        }
    }

    /// Move cash and tokens for one fill and update both traders' P&L
    /// counters. The seller realizes P&L against their cost basis; the
    /// buyer's basis absorbs the purchase.
    fn apply_fill(
        &mut self,
        market_id: &MarketId,
        token: TokenType,
        price: Price,
        quantity: Volume,
        buyer_id: &TraderId,
        seller_id: &TraderId,
    ) -> Result<()> {
        let value = price * quantity;

        let seller = self.trader_mut(seller_id)?;
        let pnl = seller.position_mut(market_id).dispose(token, quantity, price)?;
        seller.realized_pnl += pnl;
        seller.credit(value);
        seller.trade_count += 1;

        let buyer = self.trader_mut(buyer_id)?;
        buyer.debit(value)?;
        buyer.position_mut(market_id).acquire(token, quantity, price);
        buyer.trade_count += 1;

        Ok(())
    }
}
