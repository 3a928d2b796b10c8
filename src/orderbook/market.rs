//! The multi-item market engine.
//!
//! [`Market`] owns one [`OrderBook`] per item id plus the global state the
//! books share: the monotone order-id counter, the maker table, the
//! claimable ledger and the fee schedule. All mutating entry points run
//! under a single command gate so every command observes and leaves a
//! consistent book; external collaborators are only invoked after the
//! book mutations for the command are complete.

use crate::orderbook::book::OrderBook;
use crate::orderbook::claims::ClaimableLedger;
use crate::orderbook::custody::{CoinLedger, ItemCustody, RoyaltyOracle};
use crate::orderbook::error::MarketError;
use crate::orderbook::events::{MarketEvent, MarketEventListener};
use crate::orderbook::fees::{FeeSchedule, FeeTake};
use crate::orderbook::types::{
    AccountId, BASIS_POINTS, Fill, ItemConfig, ItemId, LevelNode, LimitOrder, MAX_CLAIM_ORDERS,
    MAX_SLOT_QUANTITY, OrderId, OrderOutcome, OrderView, SLOTS_PER_SEGMENT, Side,
};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, trace};
use uuid::Uuid;

/// Default cap on resting orders per price level (a multiple of the
/// segment slot count).
pub const DEFAULT_MAX_ORDERS_PER_PRICE: u32 = 100;

/// Royalties are collection-wide; any item id serves as the oracle probe.
const ROYALTY_PROBE_ITEM: ItemId = ItemId(1);

/// Identifies a resting order's location for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderKey {
    /// Side the order rests on.
    pub side: Side,
    /// Book it rests in.
    pub item_id: ItemId,
    /// Price level it rests at (the actual price it landed on).
    pub price: u64,
}

/// Coin and item movements owed to collaborators once a command's book
/// mutations are done. Inbound legs run before outbound so escrow always
/// covers what leaves it.
#[derive(Default)]
struct Settlement {
    coins_from_caller: u128,
    coins_to_caller: u128,
    fees: FeeTake,
    items_from_caller: BTreeMap<ItemId, u64>,
    items_to_caller: BTreeMap<ItemId, u64>,
}

impl Settlement {
    fn add_fees(&mut self, take: FeeTake) {
        self.fees.royalty += take.royalty;
        self.fees.dev += take.dev;
        self.fees.burn += take.burn;
    }
}

/// The limit-order matching engine for all item books.
pub struct Market {
    books: DashMap<ItemId, Arc<OrderBook>>,
    item_configs: DashMap<ItemId, ItemConfig>,
    makers: DashMap<OrderId, AccountId>,
    claims: ClaimableLedger,
    fees: RwLock<FeeSchedule>,
    next_order_id: AtomicU64,
    max_orders_per_price: AtomicU32,
    coins: Arc<dyn CoinLedger>,
    items: Arc<dyn ItemCustody>,
    royalties: Arc<dyn RoyaltyOracle>,
    event_listener: Option<MarketEventListener>,
    command_gate: Mutex<()>,
}

impl Market {
    /// Create a market wired to its collaborators.
    pub fn new(
        coins: Arc<dyn CoinLedger>,
        items: Arc<dyn ItemCustody>,
        royalties: Arc<dyn RoyaltyOracle>,
    ) -> Self {
        Market {
            books: DashMap::new(),
            item_configs: DashMap::new(),
            makers: DashMap::new(),
            claims: ClaimableLedger::new(),
            fees: RwLock::new(FeeSchedule::default()),
            next_order_id: AtomicU64::new(1),
            max_orders_per_price: AtomicU32::new(DEFAULT_MAX_ORDERS_PER_PRICE),
            coins,
            items,
            royalties,
            event_listener: None,
            command_gate: Mutex::new(()),
        }
    }

    /// Create a market with an event listener attached.
    pub fn with_event_listener(
        coins: Arc<dyn CoinLedger>,
        items: Arc<dyn ItemCustody>,
        royalties: Arc<dyn RoyaltyOracle>,
        listener: MarketEventListener,
    ) -> Self {
        let mut market = Market::new(coins, items, royalties);
        market.event_listener = Some(listener);
        market
    }

    /// Attach or replace the event listener.
    pub fn set_event_listener(&mut self, listener: MarketEventListener) {
        self.event_listener = Some(listener);
    }

    fn emit(&self, events: Vec<MarketEvent>) {
        if let Some(listener) = &self.event_listener {
            for event in &events {
                listener(event);
            }
        }
    }

    fn book(&self, item_id: ItemId) -> Arc<OrderBook> {
        self.books
            .entry(item_id)
            .or_insert_with(|| Arc::new(OrderBook::new(item_id)))
            .clone()
    }

    fn allocate_order_id(&self) -> OrderId {
        let raw = self.next_order_id.fetch_add(1, Ordering::AcqRel);
        OrderId::new(raw).expect("40-bit order id space exhausted")
    }

    fn validate(&self, order: &LimitOrder) -> Result<ItemConfig, MarketError> {
        if order.quantity == 0 {
            return Err(MarketError::NoQuantity);
        }
        if order.quantity > MAX_SLOT_QUANTITY {
            return Err(MarketError::QuantityTooLarge {
                quantity: order.quantity,
            });
        }
        if order.price == 0 {
            return Err(MarketError::PriceZero);
        }
        let config = self
            .item_configs
            .get(&order.item_id)
            .map(|entry| *entry.value())
            .filter(ItemConfig::is_listed)
            .ok_or(MarketError::ItemNotListed {
                item_id: order.item_id,
            })?;
        if order.price % config.tick != 0 {
            return Err(MarketError::PriceNotMultipleOfTick {
                price: order.price,
                tick: config.tick,
            });
        }
        Ok(config)
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Submit a batch of limit orders for `caller`.
    ///
    /// Every order is validated before any is processed, so a validation
    /// failure aborts the batch with no state change. Each order then
    /// matches against the opposite side at acceptable prices; a residual
    /// at or above the item's `min_quantity` rests on the book (stepping
    /// ticks away from the spread when levels are full), while a smaller
    /// residual is handed back through a `FailedToAddToBook` event with
    /// the matched portion standing.
    ///
    /// # Errors
    /// Validation errors and [`MarketError::TooManyOrdersHit`] abort the
    /// call; settlement errors surface from the collaborators.
    pub fn limit_orders(
        &self,
        caller: AccountId,
        orders: &[LimitOrder],
    ) -> Result<Vec<OrderOutcome>, MarketError> {
        let _gate = self.command_gate.lock().expect("command gate poisoned");
        let transaction_id = Uuid::new_v4();

        let configs = orders
            .iter()
            .map(|order| self.validate(order))
            .collect::<Result<Vec<_>, _>>()?;

        let mut outcomes = Vec::with_capacity(orders.len());
        let mut events = Vec::new();
        let mut settlement = Settlement::default();
        for (order, config) in orders.iter().zip(configs) {
            let outcome = self.process_limit_order(
                caller,
                order,
                config,
                transaction_id,
                &mut events,
                &mut settlement,
            )?;
            outcomes.push(outcome);
        }

        self.settle(caller, settlement)?;
        self.emit(events);
        Ok(outcomes)
    }

    fn process_limit_order(
        &self,
        caller: AccountId,
        order: &LimitOrder,
        config: ItemConfig,
        transaction_id: Uuid,
        events: &mut Vec<MarketEvent>,
        settlement: &mut Settlement,
    ) -> Result<OrderOutcome, MarketError> {
        let book = self.book(order.item_id);
        trace!(
            %caller,
            side = %order.side,
            item = %order.item_id,
            price = order.price,
            quantity = order.quantity,
            "processing limit order"
        );

        let take = book.take_from_book(order.side, order.price, order.quantity)?;
        let taken = take.taken;
        let cost = take.cost;
        let fills: Vec<Fill> = take.fills;

        match order.side {
            Side::Buy => {
                // Sellers' gross proceeds accrue to their claimable pool;
                // fees come out at claim time, at the rates then current.
                for fill in &fills {
                    self.claims.credit_coins(fill.order_id, fill.notional());
                }
                settlement.coins_from_caller += cost;
                if taken > 0 {
                    *settlement.items_to_caller.entry(order.item_id).or_insert(0) +=
                        u64::from(taken);
                }
            }
            Side::Sell => {
                for fill in &fills {
                    self.claims
                        .credit_items(fill.order_id, order.item_id, u64::from(fill.quantity));
                }
                // A sell taker is paid immediately, net of fees at the
                // current rates.
                let fee = self.fee_schedule().split(cost);
                settlement.add_fees(fee);
                settlement.coins_to_caller += cost - fee.total();
                if taken > 0 {
                    *settlement
                        .items_from_caller
                        .entry(order.item_id)
                        .or_insert(0) += u64::from(taken);
                }
            }
        }

        if !fills.is_empty() {
            events.push(MarketEvent::OrdersMatched {
                transaction_id,
                taker: caller,
                side: order.side,
                item_id: order.item_id,
                fills: fills.clone(),
            });
        }

        let residual = order.quantity - taken;
        let mut rested = 0;
        let mut order_id = None;
        if residual > 0 {
            if residual < config.min_quantity {
                debug!(
                    %caller,
                    item = %order.item_id,
                    residual,
                    min_quantity = config.min_quantity,
                    "residual below minimum quantity, not resting"
                );
                events.push(MarketEvent::FailedToAddToBook {
                    transaction_id,
                    maker: caller,
                    side: order.side,
                    item_id: order.item_id,
                    price: order.price,
                    quantity: residual,
                });
            } else {
                let resolved = book.resolve_insert_price(
                    order.side,
                    order.price,
                    config.tick,
                    self.max_orders_per_price(),
                );
                match resolved {
                    Some(price) => {
                        let id = self.allocate_order_id();
                        book.place_resting(order.side, price, id, residual);
                        self.makers.insert(id, caller);
                        match order.side {
                            Side::Buy => {
                                settlement.coins_from_caller +=
                                    u128::from(price) * u128::from(residual);
                            }
                            Side::Sell => {
                                *settlement
                                    .items_from_caller
                                    .entry(order.item_id)
                                    .or_insert(0) += u64::from(residual);
                            }
                        }
                        events.push(MarketEvent::AddedToBook {
                            transaction_id,
                            maker: caller,
                            order_id: id,
                            side: order.side,
                            item_id: order.item_id,
                            price,
                            quantity: residual,
                        });
                        rested = residual;
                        order_id = Some(id);
                    }
                    None => {
                        events.push(MarketEvent::FailedToAddToBook {
                            transaction_id,
                            maker: caller,
                            side: order.side,
                            item_id: order.item_id,
                            price: order.price,
                            quantity: residual,
                        });
                    }
                }
            }
        }

        Ok(OrderOutcome {
            order_id,
            filled: taken,
            rested,
            cost,
            fills,
        })
    }

    /// Cancel resting orders and refund their unfilled economics: coins
    /// for bids (quantity × level price), items for asks.
    ///
    /// # Errors
    /// `order_ids` and `keys` must be the same length; every entry must
    /// name a live level ([`MarketError::OrderNotFoundInTree`]), a live
    /// order ([`MarketError::OrderNotFound`]) owned by `caller`
    /// ([`MarketError::NotMaker`]).
    pub fn cancel_orders(
        &self,
        caller: AccountId,
        order_ids: &[OrderId],
        keys: &[OrderKey],
    ) -> Result<(), MarketError> {
        let _gate = self.command_gate.lock().expect("command gate poisoned");
        if order_ids.len() != keys.len() {
            return Err(MarketError::LengthMismatch {
                left: order_ids.len(),
                right: keys.len(),
            });
        }
        let transaction_id = Uuid::new_v4();

        let mut coins_refund = 0u128;
        let mut items_refund: BTreeMap<ItemId, u64> = BTreeMap::new();
        for (&order_id, key) in order_ids.iter().zip(keys) {
            let book = self
                .books
                .get(&key.item_id)
                .map(|entry| entry.value().clone())
                .ok_or(MarketError::OrderNotFoundInTree {
                    side: key.side,
                    price: key.price,
                })?;
            // Level lookup comes first, then the id search, then ownership.
            if book.node(key.side, key.price).is_none() {
                return Err(MarketError::OrderNotFoundInTree {
                    side: key.side,
                    price: key.price,
                });
            }
            match self.makers.get(&order_id).map(|entry| *entry.value()) {
                None => return Err(MarketError::OrderNotFound { order_id }),
                Some(maker) if maker != caller => {
                    return Err(MarketError::NotMaker { order_id, caller });
                }
                Some(_) => {}
            }
            let quantity = book
                .cancel_resting(key.side, key.price, order_id)
                .map_err(|level_missing| {
                    if level_missing {
                        MarketError::OrderNotFoundInTree {
                            side: key.side,
                            price: key.price,
                        }
                    } else {
                        MarketError::OrderNotFound { order_id }
                    }
                })?;
            match key.side {
                Side::Buy => {
                    coins_refund += u128::from(quantity) * u128::from(key.price);
                }
                Side::Sell => {
                    *items_refund.entry(key.item_id).or_insert(0) += u64::from(quantity);
                }
            }
            trace!(%caller, %order_id, side = %key.side, price = key.price, "order cancelled");
        }

        if coins_refund > 0 {
            self.coins.transfer_from_core(caller, coins_refund)?;
        }
        if !items_refund.is_empty() {
            let batch: Vec<(ItemId, u64)> = items_refund.into_iter().collect();
            self.items.transfer_batch_from_core(caller, &batch)?;
        }
        self.emit(vec![MarketEvent::OrdersCancelled {
            transaction_id,
            maker: caller,
            order_ids: order_ids.to_vec(),
        }]);
        Ok(())
    }

    /// Claim coin proceeds for sold orders owned by `caller`.
    ///
    /// The fee split uses the rates current at claim time, making rate
    /// changes retroactive against the un-claimed pool. Returns the net
    /// amount paid out.
    ///
    /// # Errors
    /// All-or-nothing: any id not owned by the caller or with a zero
    /// accumulator fails the whole call before anything is zeroed.
    pub fn claim_coins(
        &self,
        caller: AccountId,
        order_ids: &[OrderId],
    ) -> Result<u128, MarketError> {
        let _gate = self.command_gate.lock().expect("command gate poisoned");
        self.claim_coins_inner(caller, order_ids)
    }

    fn claim_coins_inner(
        &self,
        caller: AccountId,
        order_ids: &[OrderId],
    ) -> Result<u128, MarketError> {
        if order_ids.len() > MAX_CLAIM_ORDERS {
            return Err(MarketError::TooManyClaims {
                limit: MAX_CLAIM_ORDERS,
            });
        }
        let transaction_id = Uuid::new_v4();

        // Validate everything before zeroing anything.
        let mut gross = 0u128;
        for &order_id in order_ids {
            self.assert_maker(order_id, caller)?;
            let amount = self.claims.coins_of(order_id);
            if amount == 0 {
                return Err(MarketError::NothingToClaim { order_id });
            }
            gross += amount;
        }
        for &order_id in order_ids {
            self.claims.take_coins(order_id);
        }

        let schedule = self.fee_schedule();
        let fee = schedule.split(gross);
        let net = gross - fee.total();
        self.pay_fees(&schedule, fee)?;
        if net > 0 {
            self.coins.transfer_from_core(caller, net)?;
        }
        debug!(%caller, gross, net, "coins claimed");
        self.emit(vec![MarketEvent::ClaimedCoins {
            transaction_id,
            maker: caller,
            order_ids: order_ids.to_vec(),
            gross,
            fees: fee.total(),
        }]);
        Ok(net)
    }

    /// Claim item proceeds for bought orders owned by `caller`.
    ///
    /// `order_ids` and `item_ids` are parallel arrays; each pair names one
    /// accumulator. Items are delivered in a single batch.
    ///
    /// # Errors
    /// All-or-nothing, like [`Market::claim_coins`].
    pub fn claim_items(
        &self,
        caller: AccountId,
        order_ids: &[OrderId],
        item_ids: &[ItemId],
    ) -> Result<(), MarketError> {
        let _gate = self.command_gate.lock().expect("command gate poisoned");
        self.claim_items_inner(caller, order_ids, item_ids)
    }

    fn claim_items_inner(
        &self,
        caller: AccountId,
        order_ids: &[OrderId],
        item_ids: &[ItemId],
    ) -> Result<(), MarketError> {
        if order_ids.len() != item_ids.len() {
            return Err(MarketError::LengthMismatch {
                left: order_ids.len(),
                right: item_ids.len(),
            });
        }
        if order_ids.len() > MAX_CLAIM_ORDERS {
            return Err(MarketError::TooManyClaims {
                limit: MAX_CLAIM_ORDERS,
            });
        }
        let transaction_id = Uuid::new_v4();

        for (&order_id, &item_id) in order_ids.iter().zip(item_ids) {
            self.assert_maker(order_id, caller)?;
            if self.claims.items_of(order_id, item_id) == 0 {
                return Err(MarketError::NothingToClaim { order_id });
            }
        }

        let mut claimed = Vec::with_capacity(order_ids.len());
        let mut batch: BTreeMap<ItemId, u64> = BTreeMap::new();
        for (&order_id, &item_id) in order_ids.iter().zip(item_ids) {
            let amount = self.claims.take_items(order_id, item_id);
            claimed.push((order_id, item_id, amount));
            *batch.entry(item_id).or_insert(0) += amount;
        }

        let batch: Vec<(ItemId, u64)> = batch.into_iter().collect();
        self.items.transfer_batch_from_core(caller, &batch)?;
        self.emit(vec![MarketEvent::ClaimedItems {
            transaction_id,
            maker: caller,
            claims: claimed,
        }]);
        Ok(())
    }

    /// Claim coins and items in one call. Empty arrays skip their part.
    pub fn claim_all(
        &self,
        caller: AccountId,
        coin_order_ids: &[OrderId],
        item_order_ids: &[OrderId],
        item_ids: &[ItemId],
    ) -> Result<(), MarketError> {
        let _gate = self.command_gate.lock().expect("command gate poisoned");
        if !coin_order_ids.is_empty() {
            self.claim_coins_inner(caller, coin_order_ids)?;
        }
        if !item_order_ids.is_empty() {
            self.claim_items_inner(caller, item_order_ids, item_ids)?;
        }
        Ok(())
    }

    fn assert_maker(&self, order_id: OrderId, caller: AccountId) -> Result<(), MarketError> {
        match self.makers.get(&order_id).map(|entry| *entry.value()) {
            Some(maker) if maker == caller => Ok(()),
            _ => Err(MarketError::NotMaker { order_id, caller }),
        }
    }

    fn pay_fees(&self, schedule: &FeeSchedule, fee: FeeTake) -> Result<(), MarketError> {
        if fee.royalty > 0 {
            self.coins
                .transfer_from_core(schedule.royalty_recipient, fee.royalty)?;
        }
        if fee.dev > 0 {
            self.coins
                .transfer_from_core(schedule.dev_recipient, fee.dev)?;
        }
        if fee.burn > 0 {
            self.coins.burn(fee.burn)?;
        }
        Ok(())
    }

    fn settle(&self, caller: AccountId, settlement: Settlement) -> Result<(), MarketError> {
        if settlement.coins_from_caller > 0 {
            self.coins
                .transfer_to_core(caller, settlement.coins_from_caller)?;
        }
        if !settlement.items_from_caller.is_empty() {
            let batch: Vec<(ItemId, u64)> = settlement.items_from_caller.into_iter().collect();
            self.items.transfer_batch_to_core(caller, &batch)?;
        }
        let schedule = self.fee_schedule();
        self.pay_fees(&schedule, settlement.fees)?;
        if settlement.coins_to_caller > 0 {
            self.coins
                .transfer_from_core(caller, settlement.coins_to_caller)?;
        }
        if !settlement.items_to_caller.is_empty() {
            let batch: Vec<(ItemId, u64)> = settlement.items_to_caller.into_iter().collect();
            self.items.transfer_batch_from_core(caller, &batch)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Admin
    // ------------------------------------------------------------------

    /// Configure items for trading. `item_ids` and `configs` are parallel
    /// arrays. A non-zero tick, once set, can never change; `min_quantity`
    /// may be adjusted freely.
    pub fn set_item_configs(
        &self,
        item_ids: &[ItemId],
        configs: &[ItemConfig],
    ) -> Result<(), MarketError> {
        let _gate = self.command_gate.lock().expect("command gate poisoned");
        if item_ids.len() != configs.len() {
            return Err(MarketError::LengthMismatch {
                left: item_ids.len(),
                right: configs.len(),
            });
        }
        for (&item_id, config) in item_ids.iter().zip(configs) {
            if let Some(existing) = self.item_configs.get(&item_id) {
                if existing.tick != 0 && existing.tick != config.tick {
                    return Err(MarketError::TickCannotBeChanged { item_id });
                }
            }
            self.item_configs.insert(item_id, *config);
            debug!(item = %item_id, tick = config.tick, min_quantity = config.min_quantity, "item configured");
        }
        Ok(())
    }

    /// Set the cap on resting orders per price level. Must be a multiple
    /// of the segment slot count so full levels end on a segment boundary.
    pub fn set_max_orders_per_price(&self, value: u32) -> Result<(), MarketError> {
        let _gate = self.command_gate.lock().expect("command gate poisoned");
        if value as usize % SLOTS_PER_SEGMENT != 0 {
            return Err(MarketError::MaxOrdersNotMultipleOfSlots { value });
        }
        self.max_orders_per_price.store(value, Ordering::Release);
        Ok(())
    }

    /// Set the dev fee. The rate is stored in 8 bits; the recipient must
    /// be consistent with the rate in both directions: a positive rate
    /// requires a non-zero recipient, and a non-zero recipient requires a
    /// positive rate.
    pub fn set_fees(
        &self,
        dev_recipient: AccountId,
        dev_rate: u16,
        burn_rate: u16,
    ) -> Result<(), MarketError> {
        let _gate = self.command_gate.lock().expect("command gate poisoned");
        if dev_rate > u16::from(u8::MAX) {
            return Err(MarketError::DevFeeTooHigh { rate: dev_rate });
        }
        if dev_rate > 0 && dev_recipient.is_zero() {
            return Err(MarketError::ZeroRecipient);
        }
        if dev_rate == 0 && !dev_recipient.is_zero() {
            return Err(MarketError::DevFeeNotSet);
        }
        let mut fees = self.fees.write().expect("fee lock poisoned");
        fees.dev_rate = dev_rate as u8;
        fees.dev_recipient = dev_recipient;
        fees.burn_rate = burn_rate;
        debug!(dev_rate, burn_rate, recipient = %dev_recipient, "fees updated");
        Ok(())
    }

    /// Re-query the royalty oracle and cache the recipient and rate.
    ///
    /// The oracle is probed with a gross equal to the fee basis so the
    /// reported amount is directly the rate in basis points.
    pub fn update_royalty_fee(&self) {
        let _gate = self.command_gate.lock().expect("command gate poisoned");
        let (recipient, rate) = self
            .royalties
            .royalty_info(ROYALTY_PROBE_ITEM, BASIS_POINTS)
            .map(|(recipient, amount)| (recipient, amount.min(BASIS_POINTS) as u16))
            .unwrap_or((AccountId::ZERO, 0));
        let mut fees = self.fees.write().expect("fee lock poisoned");
        fees.royalty_recipient = recipient;
        fees.royalty_rate = rate;
        debug!(%recipient, rate, "royalty fee updated");
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The highest resting bid for an item, if any.
    pub fn highest_bid(&self, item_id: ItemId) -> Option<u64> {
        self.books.get(&item_id)?.highest_bid()
    }

    /// The lowest resting ask for an item, if any.
    pub fn lowest_ask(&self, item_id: ItemId) -> Option<u64> {
        self.books.get(&item_id)?.lowest_ask()
    }

    /// Best ask minus best bid for an item.
    pub fn spread(&self, item_id: ItemId) -> Option<u64> {
        self.books.get(&item_id)?.spread()
    }

    /// Average of best bid and best ask for an item.
    pub fn mid_price(&self, item_id: ItemId) -> Option<f64> {
        self.books.get(&item_id)?.mid_price()
    }

    /// Price of the most recent match on an item's book.
    pub fn last_trade_price(&self, item_id: ItemId) -> Option<u64> {
        self.books.get(&item_id)?.last_trade_price()
    }

    /// Live orders at a price in time order, tombstoned segments skipped.
    pub fn all_orders_at_price(&self, side: Side, item_id: ItemId, price: u64) -> Vec<OrderView> {
        let Some(book) = self.books.get(&item_id).map(|entry| entry.value().clone()) else {
            return Vec::new();
        };
        book.orders_at_price(side, price)
            .into_iter()
            .map(|(id, quantity)| OrderView {
                id,
                maker: self.maker_of(id).unwrap_or(AccountId::ZERO),
                quantity,
            })
            .collect()
    }

    /// Tombstone offset and segment count of a present price level.
    pub fn node(&self, side: Side, item_id: ItemId, price: u64) -> Option<LevelNode> {
        self.books.get(&item_id)?.node(side, price)
    }

    /// Total coins claimable over `order_ids`, optionally net of fees at
    /// the current rates.
    pub fn coins_claimable(&self, order_ids: &[OrderId], apply_fees: bool) -> u128 {
        let gross: u128 = order_ids
            .iter()
            .map(|&order_id| self.claims.coins_of(order_id))
            .sum();
        if apply_fees { self.fee_schedule().net(gross) } else { gross }
    }

    /// Items claimable per `(order, item)` pair. Parallel arrays.
    pub fn items_claimable(
        &self,
        order_ids: &[OrderId],
        item_ids: &[ItemId],
    ) -> Result<Vec<u64>, MarketError> {
        if order_ids.len() != item_ids.len() {
            return Err(MarketError::LengthMismatch {
                left: order_ids.len(),
                right: item_ids.len(),
            });
        }
        Ok(order_ids
            .iter()
            .zip(item_ids)
            .map(|(&order_id, &item_id)| self.claims.items_of(order_id, item_id))
            .collect())
    }

    /// Owner of an order, if the order ever rested.
    pub fn maker_of(&self, order_id: OrderId) -> Option<AccountId> {
        self.makers.get(&order_id).map(|entry| *entry.value())
    }

    /// Current per-level resting order cap.
    pub fn max_orders_per_price(&self) -> u32 {
        self.max_orders_per_price.load(Ordering::Acquire)
    }

    /// Current item configuration, if set.
    pub fn item_config(&self, item_id: ItemId) -> Option<ItemConfig> {
        self.item_configs.get(&item_id).map(|entry| *entry.value())
    }

    /// Current fee schedule.
    pub fn fee_schedule(&self) -> FeeSchedule {
        *self.fees.read().expect("fee lock poisoned")
    }

    /// The id the next resting order will receive.
    pub fn next_order_id(&self) -> u64 {
        self.next_order_id.load(Ordering::Acquire)
    }

    pub(crate) fn books_iter(&self) -> Vec<Arc<OrderBook>> {
        self.books.iter().map(|entry| entry.value().clone()).collect()
    }

    pub(crate) fn claims(&self) -> &ClaimableLedger {
        &self.claims
    }

    pub(crate) fn maker_entries(&self) -> Vec<(OrderId, AccountId)> {
        self.makers
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    pub(crate) fn item_config_entries(&self) -> Vec<(ItemId, ItemConfig)> {
        self.item_configs
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    pub(crate) fn restore_counters(&self, next_order_id: u64, max_orders_per_price: u32) {
        self.next_order_id.store(next_order_id, Ordering::Release);
        self.max_orders_per_price
            .store(max_orders_per_price, Ordering::Release);
    }

    pub(crate) fn restore_fees(&self, schedule: FeeSchedule) {
        *self.fees.write().expect("fee lock poisoned") = schedule;
    }

    pub(crate) fn restore_maker(&self, order_id: OrderId, maker: AccountId) {
        self.makers.insert(order_id, maker);
    }

    pub(crate) fn restore_item_config(&self, item_id: ItemId, config: ItemConfig) {
        self.item_configs.insert(item_id, config);
    }

    pub(crate) fn restore_book(&self, item_id: ItemId) -> Arc<OrderBook> {
        self.book(item_id)
    }
}
