//! Criterion benchmarks for the hot paths: resting inserts, cancels and
//! aggressive taker sweeps.

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use itembook::prelude::*;
use std::hint::black_box;
use std::sync::Arc;

const MAKER: AccountId = AccountId(1);
const TAKER: AccountId = AccountId(2);
const ITEM: ItemId = ItemId(1);

fn fresh_market() -> (Market, Arc<InMemoryCoinLedger>, Arc<InMemoryItemCustody>) {
    let coins = Arc::new(InMemoryCoinLedger::new());
    let items = Arc::new(InMemoryItemCustody::new());
    let market = Market::new(coins.clone(), items.clone(), Arc::new(NoRoyalty));
    market
        .set_item_configs(
            &[ITEM],
            &[ItemConfig {
                tick: 1,
                min_quantity: 1,
            }],
        )
        .unwrap();
    coins.mint(MAKER, u128::MAX / 4);
    coins.mint(TAKER, u128::MAX / 4);
    items.mint(MAKER, ITEM, u64::MAX / 4);
    items.mint(TAKER, ITEM, u64::MAX / 4);
    (market, coins, items)
}

fn bench_add_resting_orders(c: &mut Criterion) {
    c.bench_function("add_resting_bids_64_levels", |b| {
        b.iter_batched(
            fresh_market,
            |(market, _, _)| {
                for price in 0..64u64 {
                    let order = LimitOrder {
                        side: Side::Buy,
                        item_id: ITEM,
                        price: 1_000 + price,
                        quantity: 10,
                    };
                    black_box(market.limit_orders(MAKER, &[order]).unwrap());
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_taker_sweep(c: &mut Criterion) {
    c.bench_function("taker_sweeps_32_levels", |b| {
        b.iter_batched(
            || {
                let (market, coins, items) = fresh_market();
                let asks: Vec<LimitOrder> = (0..128u64)
                    .map(|i| LimitOrder {
                        side: Side::Sell,
                        item_id: ITEM,
                        price: 1_000 + i / 4,
                        quantity: 5,
                    })
                    .collect();
                for chunk in asks.chunks(32) {
                    market.limit_orders(MAKER, chunk).unwrap();
                }
                (market, coins, items)
            },
            |(market, _, _)| {
                let order = LimitOrder {
                    side: Side::Buy,
                    item_id: ITEM,
                    price: 2_000,
                    quantity: 128 * 5,
                };
                black_box(market.limit_orders(TAKER, &[order]).unwrap());
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_cancel_mid_level(c: &mut Criterion) {
    c.bench_function("cancel_middle_of_deep_level", |b| {
        b.iter_batched(
            || {
                let (market, coins, items) = fresh_market();
                let bids = vec![
                    LimitOrder {
                        side: Side::Buy,
                        item_id: ITEM,
                        price: 500,
                        quantity: 1,
                    };
                    96
                ];
                let mut ids = Vec::new();
                for chunk in bids.chunks(32) {
                    for outcome in market.limit_orders(MAKER, chunk).unwrap() {
                        ids.push(outcome.order_id.unwrap());
                    }
                }
                (market, coins, items, ids)
            },
            |(market, _, _, ids)| {
                let target = ids[ids.len() / 2];
                let key = OrderKey {
                    side: Side::Buy,
                    item_id: ITEM,
                    price: 500,
                };
                black_box(market.cancel_orders(MAKER, &[target], &[key]).unwrap());
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_add_resting_orders,
    bench_taker_sweep,
    bench_cancel_mid_level
);
criterion_main!(benches);
