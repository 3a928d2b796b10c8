//! End-to-end walkthroughs of the canonical book situations.

use crate::test_helpers::*;
use itembook::prelude::*;

#[test]
fn quoted_spread_rests_on_both_sides() {
    let h = Harness::new();
    h.rest(ALICE, buy(100, 10));
    h.rest(BOB, sell(101, 10));
    assert_eq!(h.market.highest_bid(ITEM), Some(100));
    assert_eq!(h.market.lowest_ask(ITEM), Some(101));
    assert_eq!(h.market.spread(ITEM), Some(1));
}

#[test]
fn small_take_leaves_reduced_resting_quantity() {
    let h = Harness::new();
    h.rest(ALICE, buy(100, 10));
    let ask = h.rest(BOB, sell(101, 10));
    let outcome = h.submit(CAROL, buy(101, 3));
    assert_eq!(outcome.filled, 3);
    assert_eq!(outcome.fills, vec![Fill {
        order_id: ask,
        quantity: 3,
        price: 101,
    }]);
    assert_eq!(h.market.coins_claimable(&[ask], false), 303);
    assert_eq!(
        h.market.all_orders_at_price(Side::Sell, ITEM, 101),
        vec![OrderView {
            id: ask,
            maker: BOB,
            quantity: 7,
        }]
    );
}

#[test]
fn cancel_middle_of_segment_left_shifts() {
    let h = Harness::new();
    let ids: Vec<OrderId> = (0..4).map(|_| h.rest(ALICE, buy(100, 10))).collect();
    h.market
        .cancel_orders(ALICE, &[ids[1]], &[key(Side::Buy, 100)])
        .unwrap();
    let remaining: Vec<OrderId> = h
        .market
        .all_orders_at_price(Side::Buy, ITEM, 100)
        .iter()
        .map(|view| view.id)
        .collect();
    assert_eq!(remaining, vec![ids[0], ids[2], ids[3]]);
}

#[test]
fn consumed_level_reappears_fresh() {
    let h = Harness::new();
    for _ in 0..4 {
        h.rest(ALICE, buy(100, 10));
    }
    let outcome = h.submit(BOB, sell(100, 40));
    assert_eq!(outcome.filled, 40);
    // Entire segment consumed: the level leaves the tree.
    assert_eq!(h.market.highest_bid(ITEM), None);
    assert!(h.market.node(Side::Buy, ITEM, 100).is_none());

    h.rest(CAROL, buy(100, 5));
    let node = h.market.node(Side::Buy, ITEM, 100).unwrap();
    assert_eq!(node.tombstone_offset, 0);
    assert_eq!(node.segment_count, 1);
    assert_eq!(h.market.highest_bid(ITEM), Some(100));
}

#[test]
fn full_level_overflows_one_tick_down() {
    let h = Harness::new();
    // Default cap is 100 orders per price: fill the level completely.
    let orders = vec![buy(100, 1); 100];
    for chunk in orders.chunks(25) {
        h.market.limit_orders(ALICE, chunk).unwrap();
    }
    assert_eq!(h.market.all_orders_at_price(Side::Buy, ITEM, 100).len(), 100);

    let outcome = h.submit(BOB, buy(100, 1));
    let id = outcome.order_id.unwrap();
    // The engine walked to 99 and inserted there.
    assert_eq!(h.market.all_orders_at_price(Side::Buy, ITEM, 100).len(), 100);
    assert_eq!(
        h.market.all_orders_at_price(Side::Buy, ITEM, 99),
        vec![OrderView {
            id,
            maker: BOB,
            quantity: 1,
        }]
    );
    // Escrow was taken at the actual resting price.
    let events = h.take_events();
    assert!(events.iter().any(|event| matches!(
        event,
        MarketEvent::AddedToBook { price: 99, .. }
    )));
}

#[test]
fn min_quantity_rejects_whole_remainder() {
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
    let outcome = h.submit(ALICE, sell(150, 10));
    assert!(outcome.order_id.is_none());
    assert_eq!(outcome.filled, 0);
    let events = h.take_events();
    assert!(events.iter().any(|event| matches!(
        event,
        MarketEvent::FailedToAddToBook { quantity: 10, .. }
    )));
    assert!(h.market.node(Side::Sell, ITEM, 150).is_none());
}

#[test]
fn matching_never_crosses_the_book() {
    let h = Harness::new();
    h.rest(ALICE, sell(105, 10));
    h.rest(ALICE, sell(103, 10));
    h.rest(BOB, buy(95, 10));

    // A buy that rests must sit strictly below the asks it did not reach.
    let outcome = h.submit(CAROL, buy(101, 5));
    assert_eq!(outcome.filled, 0);
    assert!(h.market.highest_bid(ITEM) <= Some(101));
    assert!(h.market.lowest_ask(ITEM) > Some(101));

    // A sell that crosses consumes every bid at or above its limit and
    // rests the remainder at the limit, never below a surviving bid.
    let outcome = h.submit(CAROL, sell(100, 10));
    assert_eq!(outcome.filled, 5);
    assert_eq!(outcome.rested, 5);
    assert_eq!(h.market.lowest_ask(ITEM), Some(100));
    assert_eq!(h.market.highest_bid(ITEM), Some(95));
}
