//! # EventRouter — translates broker/bus events into core calls
//!
//! Owns the [`Contract`] snapshot, the [`SwingStateMachine`], the
//! strategy's own position/cost accounting, and the live
//! `order_dict`/`trade_dict` bookkeeping from SPEC_FULL.md §3's
//! Lifecycles. Grounded on `core::engine::mod::Engine::process`: one
//! `dispatch`-style entry point per inbound event, internally matched
//! against the current session state, with no internal handler-closure
//! registry (SPEC_FULL.md §9, REDESIGN FLAG 1).

use crate::calendar::{AlwaysOpenCalendar, TradingCalendar};
use crate::event::{BuySellResult, InboundEvent, OutboundEvent};
use crate::session::SessionControl;
use rust_decimal::Decimal;
use std::collections::HashMap;
use swing_core::contract::MarketDataUpdate;
use swing_core::order::{OrderOwner, OrderRecord, OrderStatus, TradeRecord};
use swing_core::side::{Action, Side, SideMap};
use swing_core::{position_math, Contract};
use swing_strategy::{Intent, PositionView, SwingConfig, SwingStateMachine};
use tracing::{debug, error, info, warn};

/// The strategy's own per-session cost accounting: one-way gross exposure
/// per side (used for risky-mode sizing and position caps) plus a netted
/// position/CMA pair whose realized gain feeds `_gain`/`_nlv`
/// (SPEC_FULL.md §3).
#[derive(Debug, Clone)]
struct Accounting {
    position_qty: SideMap<i64>,
    one_way_cma: SideMap<Decimal>,
    net_cma: Decimal,
    net_position: i64,
    principal: Decimal,
    gain: Decimal,
}

impl Accounting {
    fn new(principal: Decimal) -> Self {
        Self {
            position_qty: SideMap::splat(0),
            one_way_cma: SideMap::splat(Decimal::ZERO),
            net_cma: Decimal::ZERO,
            net_position: 0,
            principal,
            gain: Decimal::ZERO,
        }
    }

    fn nlv(&self) -> Decimal {
        self.principal + self.gain
    }

    fn on_trade(&mut self, action: Action, side: Side, price: Decimal, qty: i64, unit: Decimal) {
        position_math::update_one_way(
            &mut self.position_qty,
            &mut self.one_way_cma,
            action,
            side,
            price,
            qty,
        );
        let (new_cma, new_position, realized_gain) =
            position_math::update_two_way(self.net_cma, self.net_position, action, side, price, qty);
        self.net_cma = new_cma;
        self.net_position = new_position;
        self.gain += realized_gain * unit;
    }
}

/// Borrowed view over the router's accounting + order book, built fresh
/// each tick to satisfy [`PositionView`] without `SwingStateMachine`
/// holding a back-reference into the router (SPEC_FULL.md §9, REDESIGN
/// FLAG 4 applied one level up).
struct PortfolioView<'a> {
    accounting: &'a Accounting,
    orders: &'a HashMap<u64, OrderRecord>,
}

impl PositionView for PortfolioView<'_> {
    fn position_qty(&self, side: Side) -> i64 {
        self.accounting.position_qty[side]
    }

    fn nlv(&self) -> Decimal {
        self.accounting.nlv()
    }

    fn gain(&self) -> Decimal {
        self.accounting.gain
    }

    fn principal(&self) -> Decimal {
        self.accounting.principal
    }

    fn has_open_orders(&self) -> bool {
        !self.orders.is_empty()
    }

    fn open_orders(&self) -> Vec<(u64, Decimal)> {
        self.orders.values().map(|o| (o.order_id, o.price)).collect()
    }
}

/// An order submitted to the broker but not yet acknowledged: the
/// correlation record kept between emitting an `OutboundEvent::Buy`/`Sell`
/// and receiving its `BuySellResponse`.
#[derive(Debug, Clone, Copy)]
struct PendingOrder {
    owner: OrderOwner,
    action: Action,
    side: Side,
}

/// Translates [`InboundEvent`]s into mutations of the strategy core and
/// collects the resulting [`OutboundEvent`]s.
pub struct EventRouter<C: TradingCalendar = AlwaysOpenCalendar> {
    contract: Contract,
    fsm: SwingStateMachine,
    session: SessionControl,
    calendar: C,
    accounting: Accounting,
    order_dict: HashMap<u64, OrderRecord>,
    pending: HashMap<(String, Action), PendingOrder>,
}

impl EventRouter<AlwaysOpenCalendar> {
    pub fn new(contract: Contract, config: SwingConfig, principal: Decimal) -> Self {
        Self::with_calendar(contract, config, principal, AlwaysOpenCalendar)
    }
}

impl<C: TradingCalendar> EventRouter<C> {
    pub fn with_calendar(contract: Contract, config: SwingConfig, principal: Decimal, calendar: C) -> Self {
        Self {
            contract,
            fsm: SwingStateMachine::new(config),
            session: SessionControl::new(),
            calendar,
            accounting: Accounting::new(principal),
            order_dict: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    pub fn start(&mut self) {
        self.session.start();
    }

    pub fn stop(&mut self) {
        self.session.stop();
    }

    pub fn session(&self) -> &SessionControl {
        &self.session
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn is_finished(&self) -> bool {
        self.fsm.is_finished()
    }

    /// Process one inbound event, returning whatever outbound events the
    /// strategy core wants to send as a result. Never panics: every error
    /// kind from SPEC_FULL.md §7 is handled by skipping the tick, logging
    /// and dropping, silently ignoring, or running a fail callback.
    pub fn dispatch(&mut self, event: InboundEvent) -> Vec<OutboundEvent> {
        match event {
            InboundEvent::MarketData {
                symbol,
                last,
                bid,
                ask,
                bid_vol,
                ask_vol,
                low_limit,
                high_limit,
                unit_size,
                tick_size,
            } => {
                if symbol != self.contract.symbol {
                    return Vec::new();
                }
                let update = MarketDataUpdate {
                    last,
                    bid,
                    ask,
                    bid_vol,
                    ask_vol,
                    low_limit,
                    high_limit,
                    unit: unit_size,
                    tick: tick_size,
                };
                match self.contract.update_market(update) {
                    Ok(()) => self.drive_tick(),
                    Err(err) => {
                        warn!(error = %err, "skipping tick: invalid market data update");
                        Vec::new()
                    }
                }
            }
            InboundEvent::Trade {
                order_id,
                trade_id,
                price,
                qty,
                create_time,
            } => {
                self.on_trade(order_id, trade_id, price, qty, create_time);
                Vec::new()
            }
            InboundEvent::OrderStatus { order_id, status } => {
                self.on_order_status(order_id, status.to_order_status());
                Vec::new()
            }
            InboundEvent::ProfitChanged {
                instrument_id, price, ..
            } => {
                debug!(instrument_id, %price, "profit changed (informational)");
                Vec::new()
            }
            InboundEvent::BuySellResponse(result) => self.on_buy_sell_response(result),
            InboundEvent::CancelResponse { order_id, accept_flag } => {
                debug!(?order_id, accept_flag, "cancel response received");
                Vec::new()
            }
        }
    }

    fn drive_tick(&mut self) -> Vec<OutboundEvent> {
        if !self.session.should_trade() {
            return Vec::new();
        }
        if self.contract.last.is_some() && !self.calendar.is_market_open(chrono::Utc::now()) {
            return Vec::new();
        }

        let view = PortfolioView {
            accounting: &self.accounting,
            orders: &self.order_dict,
        };
        let intents = self.fsm.on_tick(&self.contract, &view);

        if self.fsm.is_finished() {
            self.session.stop();
        }

        intents
            .into_iter()
            .filter_map(|intent| self.intent_to_outbound(intent))
            .collect()
    }

    fn intent_to_outbound(&mut self, intent: Intent) -> Option<OutboundEvent> {
        match intent {
            Intent::Limit {
                action,
                side,
                price,
                qty,
                owner,
            } => {
                if qty <= 0 {
                    return None;
                }
                if self.price_out_of_limit(price) {
                    error!(%price, %owner, "price out of contract limit, failing sub-machine");
                    self.fsm.on_buy_sell_fail(owner);
                    return None;
                }
                let tag = owner.to_string();
                self.pending
                    .insert((tag, action), PendingOrder { owner, action, side });
                Some(OutboundEvent::limit(action, side, price, qty, owner))
            }
            Intent::Cancel { order_id } => Some(OutboundEvent::cancel_order(order_id)),
            Intent::CancelAll => Some(OutboundEvent::cancel_all()),
        }
    }

    fn price_out_of_limit(&self, price: Decimal) -> bool {
        match (self.contract.low_limit, self.contract.high_limit) {
            (Some(low), Some(high)) => price < low || price > high,
            (Some(low), None) => price < low,
            (None, Some(high)) => price > high,
            (None, None) => false,
        }
    }

    fn on_buy_sell_response(&mut self, result: BuySellResult) -> Vec<OutboundEvent> {
        let (tag, action, accept_flag, acked) = match result {
            BuySellResult::Buy {
                tag,
                accept_flag,
                buy_orders,
            } => (tag, Action::Buy, accept_flag, buy_orders),
            BuySellResult::Sell {
                tag,
                accept_flag,
                sell_orders,
            } => (tag, Action::Sell, accept_flag, sell_orders),
        };

        let Some(pending) = self.pending.remove(&(tag.clone(), action)) else {
            warn!(%tag, %action, "buy/sell response for an order the router never submitted");
            return Vec::new();
        };

        if !accept_flag || acked.is_empty() {
            error!(%tag, "broker refused order");
            self.fsm.on_buy_sell_fail(pending.owner);
            return Vec::new();
        }

        for acked_order in acked {
            let record = OrderRecord::new(
                acked_order.order_id,
                chrono::Utc::now(),
                pending.action,
                pending.side,
                acked_order.price,
                acked_order.qty,
                pending.owner,
            );
            self.order_dict.insert(acked_order.order_id, record);
            self.fsm
                .on_buy_sell_success(pending.owner, acked_order.order_id, acked_order.price);
        }
        Vec::new()
    }

    fn on_trade(
        &mut self,
        order_id: u64,
        trade_id: u64,
        price: Decimal,
        qty: i64,
        create_time: chrono::DateTime<chrono::Utc>,
    ) {
        let Some(order) = self.order_dict.get_mut(&order_id) else {
            warn!(order_id, "trade for unknown order id, ignoring");
            return;
        };
        if order.trade_ids.contains(&trade_id) {
            debug!(trade_id, "duplicate trade id, ignoring");
            return;
        }
        let (action, side, owner) = (order.action, order.side, order.owner);
        order.record_trade(&TradeRecord {
            trade_id,
            order_id,
            price,
            qty,
            create_time,
        });

        self.accounting.on_trade(action, side, price, qty, self.contract.unit());
        self.fsm.on_trade_update(owner, action, side, price, qty, &self.contract);
    }

    fn on_order_status(&mut self, order_id: u64, status: Option<OrderStatus>) {
        let Some(status) = status else { return };
        let Some(order) = self.order_dict.get_mut(&order_id) else {
            debug!(order_id, "status for an order record already gone, no-op");
            return;
        };
        order.status = status;
        let owner = order.owner;
        self.fsm.on_order_status(owner, status);

        if status.is_terminal() {
            self.order_dict.remove(&order_id);
            info!(order_id, ?status, "order reached terminal status, discarded");
        }
    }
}
