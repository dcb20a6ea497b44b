//! P&L, volume, and leaderboard integration tests.

use rust_decimal_macros::dec;

use sidebet::domain::{Side, TokenType};
use sidebet::testkit;

#[test]
fn pnl_starts_at_zero() {
    let exchange = testkit::exchange();
    let alice = testkit::funded_trader(&exchange, "alice");

    let trader = exchange.trader(&alice).unwrap();
    assert_eq!(trader.realized_pnl, dec!(0));
    assert_eq!(trader.trade_count, 0);
}

#[test]
fn profitable_sell_realizes_gain() {
    let exchange = testkit::exchange();
    let m1 = testkit::market_id("m1");
    testkit::open_market(&exchange, "m1");
    let alice = testkit::funded_trader(&exchange, "alice");
    let bob = testkit::funded_trader(&exchange, "bob");

    // mint sets a $0.50 cost basis per leg
    exchange.mint(&m1, &alice, dec!(100)).unwrap();
    exchange
        .place_order(&m1, &alice, TokenType::Yes, Side::Sell, dec!(0.70), dec!(50))
        .unwrap();
    exchange
        .place_order(&m1, &bob, TokenType::Yes, Side::Buy, dec!(0.70), dec!(50))
        .unwrap();

    // (0.70 - 0.50) * 50 = $10
    assert_eq!(exchange.trader(&alice).unwrap().realized_pnl, dec!(10));
}

#[test]
fn loss_making_sell_realizes_loss() {
    let exchange = testkit::exchange();
    let m1 = testkit::market_id("m1");
    testkit::open_market(&exchange, "m1");
    let alice = testkit::funded_trader(&exchange, "alice");
    let bob = testkit::funded_trader(&exchange, "bob");

    exchange.mint(&m1, &alice, dec!(100)).unwrap();
    exchange
        .place_order(&m1, &alice, TokenType::Yes, Side::Sell, dec!(0.30), dec!(50))
        .unwrap();
    exchange
        .place_order(&m1, &bob, TokenType::Yes, Side::Buy, dec!(0.30), dec!(50))
        .unwrap();

    // (0.30 - 0.50) * 50 = -$10
    assert_eq!(exchange.trader(&alice).unwrap().realized_pnl, dec!(-10));
}

#[test]
fn trade_count_increments_for_both_sides() {
    let exchange = testkit::exchange();
    let m1 = testkit::market_id("m1");
    testkit::open_market(&exchange, "m1");
    let alice = testkit::funded_trader(&exchange, "alice");
    let bob = testkit::funded_trader(&exchange, "bob");

    exchange.mint(&m1, &alice, dec!(100)).unwrap();

    exchange
        .place_order(&m1, &alice, TokenType::Yes, Side::Sell, dec!(0.60), dec!(20))
        .unwrap();
    exchange
        .place_order(&m1, &bob, TokenType::Yes, Side::Buy, dec!(0.60), dec!(20))
        .unwrap();

    exchange
        .place_order(&m1, &alice, TokenType::No, Side::Sell, dec!(0.40), dec!(30))
        .unwrap();
    exchange
        .place_order(&m1, &bob, TokenType::No, Side::Buy, dec!(0.40), dec!(30))
        .unwrap();

    assert_eq!(exchange.trader(&alice).unwrap().trade_count, 2);
    assert_eq!(exchange.trader(&bob).unwrap().trade_count, 2);
}

#[test]
fn volume_is_summed_from_trades() {
    let exchange = testkit::exchange();
    let m1 = testkit::market_id("m1");
    testkit::open_market(&exchange, "m1");
    let alice = testkit::funded_trader(&exchange, "alice");
    let bob = testkit::funded_trader(&exchange, "bob");

    exchange.mint(&m1, &alice, dec!(100)).unwrap();

    // trade 1: 50 YES @ 0.60 = $30
    exchange
        .place_order(&m1, &alice, TokenType::Yes, Side::Sell, dec!(0.60), dec!(50))
        .unwrap();
    exchange
        .place_order(&m1, &bob, TokenType::Yes, Side::Buy, dec!(0.60), dec!(50))
        .unwrap();

    // trade 2: 30 NO @ 0.40 = $12
    exchange
        .place_order(&m1, &alice, TokenType::No, Side::Sell, dec!(0.40), dec!(30))
        .unwrap();
    exchange
        .place_order(&m1, &bob, TokenType::No, Side::Buy, dec!(0.40), dec!(30))
        .unwrap();

    assert_eq!(exchange.trader_stats(&alice).unwrap().volume, dec!(42));
    assert_eq!(exchange.trader_stats(&bob).unwrap().volume, dec!(42));
}

#[test]
fn leaderboard_sorts_by_realized_pnl() {
    let exchange = testkit::exchange();
    let m1 = testkit::market_id("m1");
    testkit::open_market(&exchange, "m1");

    let alice = testkit::funded_trader(&exchange, "alice");
    let bob = testkit::funded_trader(&exchange, "bob");
    let carol = testkit::funded_trader(&exchange, "carol");

    exchange.mint(&m1, &alice, dec!(100)).unwrap();
    exchange
        .place_order(&m1, &alice, TokenType::Yes, Side::Sell, dec!(0.80), dec!(50))
        .unwrap();
    exchange
        .place_order(&m1, &bob, TokenType::Yes, Side::Buy, dec!(0.80), dec!(50))
        .unwrap();
    // Carol does not trade

    let board = exchange.leaderboard(Some(10), 0);
    assert_eq!(board.total, 3);
    // Alice leads with (0.80 - 0.50) * 50 = $15
    assert_eq!(board.entries[0].trader_id, alice);
    assert_eq!(board.entries[0].realized_pnl, dec!(15));

    let bob_entry = board.entries.iter().find(|e| e.trader_id == bob).unwrap();
    assert_eq!(bob_entry.realized_pnl, dec!(0));
    let carol_entry = board.entries.iter().find(|e| e.trader_id == carol).unwrap();
    assert_eq!(carol_entry.realized_pnl, dec!(0));
}

#[test]
fn leaderboard_paginates() {
    let exchange = testkit::exchange();
    for i in 0..5 {
        testkit::funded_trader(&exchange, &format!("trader{i}"));
    }

    let page1 = exchange.leaderboard(Some(2), 0);
    assert_eq!(page1.entries.len(), 2);
    assert_eq!(page1.total, 5);

    let page2 = exchange.leaderboard(Some(2), 2);
    assert_eq!(page2.entries.len(), 2);

    let page3 = exchange.leaderboard(Some(2), 4);
    assert_eq!(page3.entries.len(), 1);
}

#[test]
fn trader_stats_reflect_trading_activity() {
    let exchange = testkit::exchange();
    let m1 = testkit::market_id("m1");
    testkit::open_market(&exchange, "m1");
    let alice = testkit::funded_trader(&exchange, "alice");
    let bob = testkit::funded_trader(&exchange, "bob");

    exchange.mint(&m1, &alice, dec!(100)).unwrap();
    exchange
        .place_order(&m1, &alice, TokenType::Yes, Side::Sell, dec!(0.70), dec!(40))
        .unwrap();
    exchange
        .place_order(&m1, &bob, TokenType::Yes, Side::Buy, dec!(0.70), dec!(40))
        .unwrap();

    let stats = exchange.trader_stats(&alice).unwrap();
    assert_eq!(stats.trader_id, alice);
    assert_eq!(stats.trade_count, 1);
    assert_eq!(stats.volume, dec!(28));
    assert_eq!(stats.realized_pnl, dec!(8));
    // 10000 - 100 (mint) + 28 (sell 40 @ 0.70)
    assert_eq!(stats.balance, dec!(9928));
}

#[test]
fn exchange_stats_aggregate_trades_and_volume() {
    let exchange = testkit::exchange();
    let m1 = testkit::market_id("m1");
    testkit::open_market(&exchange, "m1");
    let alice = testkit::funded_trader(&exchange, "alice");
    let bob = testkit::funded_trader(&exchange, "bob");

    exchange.mint(&m1, &alice, dec!(100)).unwrap();
    exchange
        .place_order(&m1, &alice, TokenType::Yes, Side::Sell, dec!(0.60), dec!(50))
        .unwrap();
    exchange
        .place_order(&m1, &bob, TokenType::Yes, Side::Buy, dec!(0.60), dec!(50))
        .unwrap();

    let stats = exchange.stats();
    assert_eq!(stats.total_traders, 2);
    assert_eq!(stats.total_trades, 1);
    assert_eq!(stats.total_volume, dec!(30));

    let market_trades = exchange.trades_for_market(&m1, None);
    assert_eq!(market_trades.len(), 1);
    let alice_trades = exchange.trades_for_trader(&alice, None);
    assert_eq!(alice_trades.len(), 1);
}
