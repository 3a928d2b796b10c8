//! Validation, matching and resting behavior of `limit_orders`.

use crate::test_helpers::*;
use itembook::prelude::*;

#[test]
fn zero_quantity_is_rejected() {
    let h = Harness::new();
    let err = h.market.limit_orders(ALICE, &[buy(100, 0)]).unwrap_err();
    assert!(matches!(err, MarketError::NoQuantity));
}

#[test]
fn zero_price_is_rejected() {
    let h = Harness::new();
    let err = h.market.limit_orders(ALICE, &[buy(0, 10)]).unwrap_err();
    assert!(matches!(err, MarketError::PriceZero));
}

#[test]
fn unlisted_item_is_rejected() {
    let h = Harness::new();
    let order = LimitOrder {
        side: Side::Buy,
        item_id: ItemId(999),
        price: 100,
        quantity: 10,
    };
    let err = h.market.limit_orders(ALICE, &[order]).unwrap_err();
    assert!(matches!(
        err,
        MarketError::ItemNotListed { item_id: ItemId(999) }
    ));
}

#[test]
fn off_tick_price_is_rejected() {
    let h = Harness::new();
    h.market
        .set_item_configs(
            &[ItemId(5)],
            &[ItemConfig {
                tick: 10,
                min_quantity: 1,
            }],
        )
        .unwrap();
    let order = LimitOrder {
        side: Side::Buy,
        item_id: ItemId(5),
        price: 105,
        quantity: 10,
    };
    let err = h.market.limit_orders(ALICE, &[order]).unwrap_err();
    assert!(matches!(
        err,
        MarketError::PriceNotMultipleOfTick { price: 105, tick: 10 }
    ));
}

#[test]
fn oversized_quantity_is_rejected() {
    let h = Harness::new();
    let err = h
        .market
        .limit_orders(ALICE, &[buy(100, 1 << 24)])
        .unwrap_err();
    assert!(matches!(err, MarketError::QuantityTooLarge { .. }));
}

#[test]
fn validation_failure_aborts_whole_batch_untouched() {
    let h = Harness::new();
    let err = h
        .market
        .limit_orders(ALICE, &[buy(100, 10), buy(0, 10)])
        .unwrap_err();
    assert!(matches!(err, MarketError::PriceZero));
    // The valid first order must not have been applied.
    assert_eq!(h.market.highest_bid(ITEM), None);
    assert_eq!(h.market.next_order_id(), 1);
}

#[test]
fn resting_bid_escrows_coins() {
    let h = Harness::new();
    let before = h.coins.balance_of(ALICE);
    let id = h.rest(ALICE, buy(100, 10));
    assert_eq!(h.coins.balance_of(ALICE), before - 1_000);
    assert_eq!(h.coins.core_balance(), 1_000);
    assert_eq!(h.market.maker_of(id), Some(ALICE));
    assert_eq!(h.market.highest_bid(ITEM), Some(100));
}

#[test]
fn resting_ask_escrows_items() {
    let h = Harness::new();
    let before = h.items.balance_of(ALICE, ITEM);
    h.rest(ALICE, sell(101, 10));
    assert_eq!(h.items.balance_of(ALICE, ITEM), before - 10);
    assert_eq!(h.items.core_balance(ITEM), 10);
    assert_eq!(h.market.lowest_ask(ITEM), Some(101));
}

#[test]
fn buy_taker_matches_at_level_price_not_limit() {
    let h = Harness::new();
    let ask = h.rest(ALICE, sell(100, 10));
    let coins_before = h.coins.balance_of(BOB);
    let outcome = h.submit(BOB, buy(105, 10));
    assert_eq!(outcome.filled, 10);
    assert_eq!(outcome.cost, 1_000);
    assert_eq!(outcome.fills, vec![Fill {
        order_id: ask,
        quantity: 10,
        price: 100,
    }]);
    // Taker pays the level price, receives the items at once.
    assert_eq!(h.coins.balance_of(BOB), coins_before - 1_000);
    assert_eq!(h.items.balance_of(BOB, ITEM), 1_000_010);
    // The maker's proceeds are claimable, not pushed.
    assert_eq!(h.market.coins_claimable(&[ask], false), 1_000);
    assert_eq!(h.market.lowest_ask(ITEM), None);
}

#[test]
fn sell_taker_is_paid_immediately() {
    let h = Harness::new();
    let bid = h.rest(ALICE, buy(100, 10));
    let coins_before = h.coins.balance_of(BOB);
    let items_before = h.items.balance_of(BOB, ITEM);
    let outcome = h.submit(BOB, sell(100, 4));
    assert_eq!(outcome.filled, 4);
    assert_eq!(outcome.cost, 400);
    assert_eq!(h.coins.balance_of(BOB), coins_before + 400);
    assert_eq!(h.items.balance_of(BOB, ITEM), items_before - 4);
    // The bid maker's items wait in the claimable pool.
    assert_eq!(
        h.market.items_claimable(&[bid], &[ITEM]).unwrap(),
        vec![4]
    );
    // The bid still rests with the remaining 6.
    assert_eq!(
        h.market.all_orders_at_price(Side::Buy, ITEM, 100),
        vec![OrderView {
            id: bid,
            maker: ALICE,
            quantity: 6,
        }]
    );
}

#[test]
fn partial_fill_rests_the_remainder() {
    let h = Harness::new();
    h.rest(ALICE, sell(101, 4));
    let outcome = h.submit(BOB, buy(101, 10));
    assert_eq!(outcome.filled, 4);
    assert_eq!(outcome.rested, 6);
    let id = outcome.order_id.unwrap();
    assert_eq!(
        h.market.all_orders_at_price(Side::Buy, ITEM, 101),
        vec![OrderView {
            id,
            maker: BOB,
            quantity: 6,
        }]
    );
    // Escrow covers only the rested remainder, at the resting price.
    assert_eq!(h.coins.core_balance(), 6 * 101);
}

#[test]
fn taker_sweeps_multiple_levels_in_price_order() {
    let h = Harness::new();
    let a1 = h.rest(ALICE, sell(102, 5));
    let a2 = h.rest(ALICE, sell(101, 5));
    let outcome = h.submit(BOB, buy(102, 8));
    assert_eq!(outcome.filled, 8);
    assert_eq!(outcome.cost, 5 * 101 + 3 * 102);
    let hit: Vec<OrderId> = outcome.fills.iter().map(|f| f.order_id).collect();
    assert_eq!(hit, vec![a2, a1]);
    assert_eq!(h.market.last_trade_price(ITEM), Some(102));
}

#[test]
fn time_priority_within_a_level() {
    let h = Harness::new();
    let first = h.rest(ALICE, sell(101, 5));
    let second = h.rest(BOB, sell(101, 5));
    let outcome = h.submit(CAROL, buy(101, 6));
    assert_eq!(outcome.fills.len(), 2);
    assert_eq!(outcome.fills[0].order_id, first);
    assert_eq!(outcome.fills[0].quantity, 5);
    assert_eq!(outcome.fills[1].order_id, second);
    assert_eq!(outcome.fills[1].quantity, 1);
}

#[test]
fn residual_below_min_quantity_is_rejected_with_signal() {
    let h = Harness::new();
    h.market
        .set_item_configs(
            &[ITEM],
            &[ItemConfig {
                tick: 1,
                min_quantity: 20,
            }],
        )
        .unwrap();
    h.take_events();
    let outcome = h.submit(ALICE, sell(101, 10));
    assert_eq!(outcome.filled, 0);
    assert_eq!(outcome.rested, 0);
    assert!(outcome.order_id.is_none());
    let events = h.take_events();
    assert!(events.iter().any(|event| matches!(
        event,
        MarketEvent::FailedToAddToBook {
            maker: ALICE,
            side: Side::Sell,
            item_id: ITEM,
            price: 101,
            quantity: 10,
            ..
        }
    )));
    // No level was created and nothing left the seller's wallet.
    assert_eq!(h.market.lowest_ask(ITEM), None);
    assert_eq!(h.items.balance_of(ALICE, ITEM), 1_000_000);
}

#[test]
fn matched_portion_stands_when_residual_is_rejected() {
    let h = Harness::new();
    h.rest(ALICE, buy(100, 10));
    h.market
        .set_item_configs(
            &[ITEM],
            &[ItemConfig {
                tick: 1,
                min_quantity: 50,
            }],
        )
        .unwrap();
    let outcome = h.submit(BOB, sell(100, 40));
    assert_eq!(outcome.filled, 10);
    assert_eq!(outcome.rested, 0);
    assert!(outcome.order_id.is_none());
    // Matched items moved; the rejected 30 stayed with the seller.
    assert_eq!(h.items.balance_of(BOB, ITEM), 1_000_000 - 10);
}

#[test]
fn batch_processes_orders_in_sequence() {
    let h = Harness::new();
    let outcomes = h
        .market
        .limit_orders(ALICE, &[sell(101, 5), sell(102, 5)])
        .unwrap();
    assert_eq!(outcomes.len(), 2);
    // A later buy in the same batch can hit an earlier sell from it.
    let outcomes = h
        .market
        .limit_orders(BOB, &[buy(101, 5), buy(102, 5)])
        .unwrap();
    assert_eq!(outcomes[0].filled, 5);
    assert_eq!(outcomes[1].filled, 5);
    assert_eq!(h.market.lowest_ask(ITEM), None);
}

#[test]
fn sells_that_fully_match_do_not_consume_order_ids() {
    let h = Harness::new();
    h.rest(ALICE, buy(100, 10));
    let before = h.market.next_order_id();
    let outcome = h.submit(BOB, sell(100, 10));
    assert_eq!(outcome.filled, 10);
    assert!(outcome.order_id.is_none());
    assert_eq!(h.market.next_order_id(), before);
}

#[test]
fn too_many_orders_hit_aborts() {
    let h = Harness::new();
    // 125 full segments of one-unit asks at distinct prices: 500 orders,
    // plus one more level to trip the cap.
    let mut orders = Vec::new();
    for price in 0..126u64 {
        for _ in 0..4 {
            orders.push(sell(1_000 + price, 1));
        }
    }
    for chunk in orders.chunks(50) {
        h.market.limit_orders(ALICE, chunk).unwrap();
    }
    let err = h.market.limit_orders(BOB, &[buy(2_000, 504)]).unwrap_err();
    assert!(matches!(err, MarketError::TooManyOrdersHit { limit: 500 }));
}

#[test]
fn books_are_independent_per_item() {
    let h = Harness::new();
    h.rest(ALICE, sell(101, 10));
    let other = LimitOrder {
        side: Side::Buy,
        item_id: OTHER_ITEM,
        price: 101,
        quantity: 10,
    };
    let outcome = h.submit(BOB, other);
    // The ask on ITEM is not visible to OTHER_ITEM's book.
    assert_eq!(outcome.filled, 0);
    assert_eq!(h.market.lowest_ask(ITEM), Some(101));
    assert_eq!(h.market.highest_bid(OTHER_ITEM), Some(101));
}
