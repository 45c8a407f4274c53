//! # SwingStateMachine
//!
//! The top-level strategy FSM: `Start -> GridOsc -> (Reversal | RiskyInit
//! -> RiskyOsc | Stop) -> Finish`. Grounded directly on
//! `original_source/swing_strategy.py::SwingStrategy`, styled after the
//! teacher's `core::engine::mod::Engine` processing loop — one
//! `process`-style entry point per inbound event, dispatched internally
//! by a `match` on the current state.

use crate::config::{SwingConfig, ZoneName};
use crate::grid_oscillator::{GridOscillator, GridOscillatorParams, ZoneState};
use crate::order_split::{calc_order_params, SplitResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use swing_core::order::{OrderOwner, OrderStatus, ZoneId};
use swing_core::side::{Action, Side, SideMap};
use swing_core::Contract;
use swing_order::{AdaptiveOrder, ModeRetryCounts, ModeTimeLimits, Signal};

const N_GRIDS: i64 = 8;
const N_GRIDS_CANCEL_ORDER: i64 = 12;
const TREND_REVERSAL_QTY_RATIO: &str = "0.4";
const RISKY_INIT_MIN_POSITION_RATIO: &str = "0.8";
const RISKY_INIT_CUT_QTY_RATIO_1: &str = "0.333333333333333333";
const RISKY_INIT_CUT_QTY_RATIO_2: &str = "0.25";
const RISKY_OSC_BUY_BACK_QTY_RATIO: &str = "0.5";
const RISKY_OSC_SELL_OFF_QTY_RATIO: &str = "0.333333333333333333";
const STOP_GAIN_LOWER_BOUND_TH: &str = "0.02";

/// Top-level lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwingState {
    Start,
    GridOsc,
    Reversal,
    RiskyInit,
    RiskyOsc,
    Stop,
    Finish,
}

/// A single outbound order intent the caller (`EventRouter`) should act
/// on — either place a fresh limit order, or cancel one already live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Limit {
        action: Action,
        side: Side,
        price: Decimal,
        qty: i64,
        owner: OrderOwner,
    },
    Cancel {
        order_id: u64,
    },
    CancelAll,
}

fn split_intents(split: SplitResult<OrderOwner>) -> Vec<Intent> {
    let mut intents = Vec::with_capacity(2);
    if split.sell_leg.qty > 0 {
        intents.push(Intent::Limit {
            action: split.sell_leg.action,
            side: split.sell_leg.side,
            price: split.sell_leg.price,
            qty: split.sell_leg.qty,
            owner: split.sell_leg.tag,
        });
    }
    if split.buy_leg.qty > 0 {
        intents.push(Intent::Limit {
            action: split.buy_leg.action,
            side: split.buy_leg.side,
            price: split.buy_leg.price,
            qty: split.buy_leg.qty,
            owner: split.buy_leg.tag,
        });
    }
    intents
}

fn signal_to_intent(signal: Signal) -> Option<Intent> {
    match signal {
        Signal::OpenOrder { action, side, price, qty, owner } => {
            Some(Intent::Limit { action, side, price, qty, owner })
        }
        Signal::Cancel { order_id: Some(id) } => Some(Intent::Cancel { order_id: id }),
        Signal::Cancel { order_id: None } => None,
        Signal::Close => None,
    }
}

/// Read-only access to the portfolio state the strategy needs every
/// tick. An external collaborator (SPEC_FULL.md §1 Non-goals: portfolio
/// bookkeeping is out of scope as an *implementation* here).
pub trait PositionView {
    fn position_qty(&self, side: Side) -> i64;
    fn nlv(&self) -> Decimal;
    fn gain(&self) -> Decimal;
    fn principal(&self) -> Decimal;
    /// `true` while any order placed by this session remains open.
    fn has_open_orders(&self) -> bool;
    /// Currently open orders' `(order_id, price)`, for the garbage-cancel
    /// sweep.
    fn open_orders(&self) -> Vec<(u64, Decimal)>;
}

fn decimal_str(s: &str) -> Decimal {
    s.parse().expect("constant decimal literal")
}

/// The top-level swing-trading session FSM.
#[derive(Debug, Clone)]
pub struct SwingStateMachine {
    config: SwingConfig,
    state: SwingState,
    long_short: Side,
    state_cleanup: bool,
    next_state_after_cleanup: Option<SwingState>,

    zones: Vec<GridOscillator>,
    start_zone: ZoneName,
    start_zone_mid_price: Decimal,
    active_zone: ZoneId,
    dec_peak: Option<Decimal>,

    reversal_orders: Vec<AdaptiveOrder>,

    risky_base_val: Decimal,
    risky_base_qty: i64,
    risky_cut_qty: i64,
    risky_cut_price: Decimal,
    risky_init_order_qty: i64,
    risky_init_orders: Vec<AdaptiveOrder>,
    risky_osc_zone: Option<GridOscillator>,

    max_gain: Option<Decimal>,
    stop_orders: Vec<AdaptiveOrder>,
}

impl SwingStateMachine {
    pub fn new(config: SwingConfig) -> Self {
        let long_short = config.direction;
        let start_zone = config.start_zone;
        let start_zone_mid_price = config.open_price;
        Self {
            config,
            state: SwingState::Start,
            long_short,
            state_cleanup: false,
            next_state_after_cleanup: None,
            zones: Vec::new(),
            start_zone,
            start_zone_mid_price,
            active_zone: ZoneId(0),
            dec_peak: None,
            reversal_orders: Vec::new(),
            risky_base_val: Decimal::ZERO,
            risky_base_qty: 0,
            risky_cut_qty: 0,
            risky_cut_price: Decimal::ZERO,
            risky_init_order_qty: 0,
            risky_init_orders: Vec::new(),
            risky_osc_zone: None,
            max_gain: None,
            stop_orders: Vec::new(),
        }
    }

    pub fn state(&self) -> SwingState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == SwingState::Finish
    }

    fn d(&self) -> Decimal {
        Decimal::from(self.long_short.sign())
    }

    fn zone(&self, id: ZoneId) -> &GridOscillator {
        &self.zones[id.0]
    }

    fn zone_mut(&mut self, id: ZoneId) -> &mut GridOscillator {
        &mut self.zones[id.0]
    }

    fn setup_zones(&mut self, start_zone: ZoneName, start_zone_mid_price: Decimal, contract: &Contract) {
        let d = self.d();
        let mut open_bound = start_zone_mid_price
            - d * (Decimal::from(N_GRIDS / 2) + Decimal::from(start_zone.index() as i64) * Decimal::from(N_GRIDS))
                * self.config.min_osc_height;
        let mut close_bound = open_bound + d * Decimal::from(N_GRIDS) * self.config.min_osc_height;

        let long_is_primary = self.long_short == Side::Long;
        self.zones.clear();
        for zone in ZoneName::ALL {
            let low_bound = if long_is_primary { open_bound } else { close_bound };
            let mut low_ext = false;
            let mut high_ext = false;
            if (zone.is_net() && long_is_primary) || (zone.is_dec() && !long_is_primary) {
                low_ext = true;
            }
            if (zone.is_dec() && long_is_primary) || (zone.is_net() && !long_is_primary) {
                high_ext = true;
            }
            let offset = self.config.offset(zone);
            let (qty_offset_long, qty_offset_short) = match self.long_short {
                Side::Long => (offset.open, offset.close),
                Side::Short => (offset.close, offset.open),
            };
            let (cap_min, cap_max) = match self.long_short {
                Side::Long => (0, i64::MAX),
                Side::Short => (i64::MIN, 0),
            };
            let params = GridOscillatorParams {
                tag: OrderOwner::Zone(ZoneId(zone.index())),
                low_bound,
                n_grids: N_GRIDS,
                grid_height: self.config.min_osc_height,
                low_ext,
                high_ext,
                trail_amt: self.config.trail_price_ticks,
                qty_base_long: self.config.base_volume,
                qty_base_short: self.config.base_volume,
                qty_offset_long,
                qty_offset_short,
                last_order_price: start_zone_mid_price,
                k_init: 0,
                qty_base_scaling: true,
                position_qty_cap_min: cap_min,
                position_qty_cap_max: cap_max,
                order_qty_cap_long: i64::MAX,
                order_qty_cap_short: i64::MAX,
            };
            self.zones.push(GridOscillator::new(params, contract));
            open_bound = close_bound;
            close_bound = open_bound + d * Decimal::from(N_GRIDS) * self.config.min_osc_height;
        }
        self.active_zone = ZoneId(start_zone.index());
    }

    fn is_trailing_stop_triggered(&mut self, portfolio: &dyn PositionView) -> bool {
        let gain = portfolio.gain();
        let principal = portfolio.principal();
        let gain_lower_bound =
            (principal * self.config.stopwin_base_percentage
                * (Decimal::ONE - self.config.trail_percentage - decimal_str(STOP_GAIN_LOWER_BOUND_TH)))
            .round_dp(2);
        let is_gain_valid = gain >= gain_lower_bound;
        if !is_gain_valid {
            self.max_gain = None;
        }
        self.max_gain = Some(self.max_gain.map_or(gain, |g| g.max(gain)));
        let max_gain = self.max_gain.expect("just set");
        let target_gain = (self.config.stopwin_base_percentage * principal).round_dp(2);
        let trailing_amount = (max_gain - gain).round_dp(2);
        let trailing_target = (self.config.trail_percentage * max_gain).round_dp(2);
        is_gain_valid && max_gain >= target_gain && trailing_amount >= trailing_target
    }

    fn begin_cleanup(&mut self, next: SwingState, portfolio: &dyn PositionView, intents: &mut Vec<Intent>) {
        if portfolio.has_open_orders() {
            self.state_cleanup = true;
            self.next_state_after_cleanup = Some(next);
            intents.push(Intent::CancelAll);
        } else {
            self.state = next;
            self.state_cleanup = false;
            self.next_state_after_cleanup = None;
        }
    }

    /// Drives the state machine by one tick. Returns the intents
    /// (limit orders to place, orders to cancel) the caller should act
    /// on.
    pub fn on_tick(&mut self, contract: &Contract, portfolio: &dyn PositionView) -> Vec<Intent> {
        let mut intents = Vec::new();
        let last = match contract.last {
            Some(last) => last,
            None => return intents,
        };

        if self.state == SwingState::Start {
            if !self.run_start(last) {
                return intents;
            }
        }

        let state_before = self.state;
        let blocked = match self.state {
            SwingState::GridOsc => self.grid_osc_transition(last, portfolio, &mut intents),
            SwingState::RiskyOsc => self.risky_osc_transition(portfolio, &mut intents),
            _ => false,
        };
        if blocked {
            return intents;
        }
        if self.state != state_before {
            tracing::debug!(from = ?state_before, to = ?self.state, "swing state transition");
        }

        match self.state {
            SwingState::GridOsc => self.run_grid_osc(contract, last, portfolio, &mut intents),
            SwingState::Reversal => self.run_reversal(contract, portfolio, &mut intents),
            SwingState::RiskyInit => self.run_risky_init(contract, portfolio, &mut intents),
            SwingState::RiskyOsc => self.run_risky_osc(contract, last, portfolio, &mut intents),
            SwingState::Stop => self.run_stop(contract, portfolio, &mut intents),
            SwingState::Finish => {}
            SwingState::Start => {}
        }
        intents
    }

    fn run_start(&mut self, last: Decimal) -> bool {
        if self.d() * (last - self.config.open_price) > Decimal::ZERO {
            return false;
        }
        if self.config.start_zone.is_net() {
            self.state = SwingState::Reversal;
            self.long_short = self.long_short.opposite();
        } else {
            self.state = SwingState::GridOsc;
        }
        true
    }

    fn grid_osc_transition(&mut self, last: Decimal, portfolio: &dyn PositionView, intents: &mut Vec<Intent>) -> bool {
        if self.zone(self.active_zone).is_blocked() {
            return true;
        }
        if self.state_cleanup {
            if !portfolio.has_open_orders() {
                self.state = self.next_state_after_cleanup.take().unwrap_or(SwingState::GridOsc);
                self.state_cleanup = false;
            }
            return self.state_cleanup;
        }
        if self.is_trailing_stop_triggered(portfolio) {
            self.begin_cleanup(SwingState::Stop, portfolio, intents);
            return self.state_cleanup;
        }
        let active_zone_name = ZoneName::from_index(self.active_zone.0);
        if active_zone_name.is_dec() {
            let d = self.d();
            let cmp = if self.long_short == Side::Long { last.max(self.dec_peak.unwrap_or(last)) } else { last.min(self.dec_peak.unwrap_or(last)) };
            self.dec_peak = Some(cmp);
            let dec_peak = self.dec_peak.expect("just set");
            let reversal_trail = d * (Decimal::ONE - last / dec_peak);
            if reversal_trail > self.config.reversal_trail_ratio {
                self.begin_cleanup(SwingState::Reversal, portfolio, intents);
                return self.state_cleanup;
            }
        } else if active_zone_name.is_net() {
            let target_val = (Decimal::ONE - self.config.risky_zone_activate_loss_ratio) * self.risky_base_val;
            let value_triggered = portfolio.nlv() < target_val;
            let position_qty = self.d() * Decimal::from(portfolio.position_qty(Side::Long) - portfolio.position_qty(Side::Short));
            let q_max = Decimal::from(self.config.open_volume);
            let risky_init_order_qty = if position_qty >= q_max {
                floor_i64(position_qty * decimal_str(RISKY_INIT_CUT_QTY_RATIO_1))
            } else if position_qty >= decimal_str(RISKY_INIT_MIN_POSITION_RATIO) * q_max {
                floor_i64(position_qty * decimal_str(RISKY_INIT_CUT_QTY_RATIO_2))
            } else {
                0
            };
            let risky_osc_min_order_qty = [RISKY_OSC_BUY_BACK_QTY_RATIO, RISKY_OSC_SELL_OFF_QTY_RATIO]
                .into_iter()
                .map(|r| floor_i64(decimal_str(r) * Decimal::from(risky_init_order_qty)))
                .min()
                .unwrap_or(0);
            if value_triggered && risky_init_order_qty > 0 && risky_osc_min_order_qty > 0 {
                self.risky_init_order_qty = risky_init_order_qty;
                self.risky_base_qty = position_qty.to_i64().unwrap_or(0);
                self.begin_cleanup(SwingState::RiskyInit, portfolio, intents);
                return self.state_cleanup;
            }
        }
        self.state_cleanup
    }

    fn risky_osc_transition(&mut self, portfolio: &dyn PositionView, intents: &mut Vec<Intent>) -> bool {
        if let Some(zone) = &self.risky_osc_zone {
            if zone.is_blocked() {
                return true;
            }
        }
        if self.state_cleanup {
            if !portfolio.has_open_orders() {
                self.state = self.next_state_after_cleanup.take().unwrap_or(SwingState::RiskyOsc);
                self.state_cleanup = false;
            }
            return self.state_cleanup;
        }

        let mut transitioned = true;
        if self.is_trailing_stop_triggered(portfolio) {
            self.begin_cleanup(SwingState::Stop, portfolio, intents);
        } else {
            let position_qty = self.d() * Decimal::from(portfolio.position_qty(Side::Long) - portfolio.position_qty(Side::Short));
            let back_to_grid = position_qty >= Decimal::from(self.risky_base_qty) || portfolio.nlv() > self.risky_base_val;
            if back_to_grid {
                self.begin_cleanup(SwingState::GridOsc, portfolio, intents);
            } else {
                transitioned = false;
            }
        }

        if transitioned && !self.state_cleanup {
            if let Some(risky_zone) = self.risky_osc_zone.take() {
                let active = self.active_zone;
                self.zone_mut(active).set_peak(risky_zone.peak());
                self.zone_mut(active).set_last_order_price(risky_zone.last_order_price());
            }
            self.risky_base_val = portfolio.nlv();
            self.risky_base_qty = (self.d() * Decimal::from(portfolio.position_qty(Side::Long) - portfolio.position_qty(Side::Short)))
                .to_i64()
                .unwrap_or(0);
            self.risky_cut_qty = 0;
            self.risky_cut_price = Decimal::ZERO;
        }
        self.state_cleanup
    }

    fn garbage_cancel(&self, last: Decimal, portfolio: &dyn PositionView, intents: &mut Vec<Intent>) {
        for (order_id, price) in portfolio.open_orders() {
            if (last - price).abs() > Decimal::from(N_GRIDS_CANCEL_ORDER) * self.config.min_osc_height {
                intents.push(Intent::Cancel { order_id });
            }
        }
    }

    fn run_grid_osc(&mut self, contract: &Contract, last: Decimal, portfolio: &dyn PositionView, intents: &mut Vec<Intent>) {
        if self.zones.is_empty() {
            let start_zone = self.start_zone;
            let mid = self.start_zone_mid_price;
            self.setup_zones(start_zone, mid, contract);
        }
        let active = self.active_zone;
        self.zone_mut(active).on_tick_update(last, contract);

        for side in [Side::Long, Side::Short] {
            let d = Decimal::from(side.sign());
            loop {
                let active_name = ZoneName::from_index(self.active_zone.0);
                let (_, high) = self.zone(self.active_zone).bounds();
                let (low, _) = self.zone(self.active_zone).bounds();
                let bound = if side == Side::Long { low } else { high };
                let extensible = if side == Side::Long {
                    (active_name.is_net() && self.long_short == Side::Long) || (active_name.is_dec() && self.long_short == Side::Short)
                } else {
                    (active_name.is_dec() && self.long_short == Side::Long) || (active_name.is_net() && self.long_short == Side::Short)
                };
                if extensible || d * (bound - last) < self.config.min_osc_height {
                    break;
                }
                let step: i64 = if self.long_short == Side::Long { -1 } else { 1 };
                let step = if side == Side::Long { step } else { -step };
                let next_index = self.active_zone.0 as i64 + step;
                if !(0..4).contains(&next_index) {
                    break;
                }
                let next_id = ZoneId(next_index as usize);
                let peak = self.zone(self.active_zone).peak();
                let last_order_price = self.zone(self.active_zone).last_order_price();
                self.zone_mut(next_id).set_last_order_price(last_order_price);
                self.zone_mut(next_id).set_peak(peak);
                self.zone_mut(next_id).on_tick_update(last, contract);
                self.active_zone = next_id;
            }
        }

        let pos_long = portfolio.position_qty(Side::Long);
        let pos_short = portfolio.position_qty(Side::Short);
        let active = self.active_zone;
        let (split, _, _) = self.zone_mut(active).on_tick_trade(last, pos_long, pos_short, contract);
        if let Some(split) = split {
            intents.extend(split_intents(split));
        }
        self.garbage_cancel(last, portfolio, intents);
    }

    fn run_reversal(&mut self, contract: &Contract, portfolio: &dyn PositionView, intents: &mut Vec<Intent>) {
        if self.reversal_orders.is_empty() {
            let last = contract.last.unwrap_or_default();
            let tick = contract.tick();
            let ph = self.config.min_osc_height;
            let mut max_slippage = to_slippage_ticks((Decimal::from(N_GRIDS) * ph / Decimal::TWO + ph) / tick) + 1;
            if !self.zones.is_empty() {
                let dec_zone = &self.zones[ZoneName::Dec.index()];
                let (low, high) = dec_zone.bounds();
                let inner_bound = if self.long_short == Side::Long { low } else { high };
                let alt = to_slippage_ticks(
                    (self.d() * (last - inner_bound) + ph) / tick,
                ) + 1;
                max_slippage = max_slippage.max(alt);
            }
            self.long_short = self.long_short.opposite();
            let working = portfolio.position_qty(self.long_short);
            let reverse = portfolio.position_qty(self.long_short.opposite());
            let order_qty = (decimal_str(TREND_REVERSAL_QTY_RATIO) * Decimal::from(self.config.open_volume))
                .round()
                .to_i64()
                .unwrap_or(0)
                - (working - reverse);
            let split = calc_order_params(
                Action::Buy,
                self.long_short,
                last,
                order_qty,
                OrderOwner::Reversal(0),
                Some(working),
                Some(reverse),
            );
            for (leg_index, leg) in [(0u8, split.sell_leg), (1u8, split.buy_leg)] {
                if leg.qty > 0 {
                    if let Ok(order) = AdaptiveOrder::new(
                        OrderOwner::Reversal(leg_index),
                        leg.action,
                        leg.side,
                        leg.qty,
                        leg.price,
                        tick,
                        3,
                        max_slippage,
                        ModeRetryCounts::new(1, u32::MAX, 0, 0),
                        ModeTimeLimits::default(),
                    ) {
                        self.reversal_orders.push(order);
                    }
                }
            }
        }

        let mut all_finished = true;
        for order in &mut self.reversal_orders {
            if let Some(signal) = order.on_tick(contract) {
                if let Some(intent) = signal_to_intent(signal) {
                    intents.push(intent);
                }
            }
            all_finished &= order.is_finished();
        }

        if all_finished && !self.reversal_orders.is_empty() {
            let mut filled_qty = 0i64;
            let mut filled_price = Decimal::ZERO;
            let fallback_price = self.reversal_orders[0].filled_price();
            for order in &self.reversal_orders {
                let new_qty = filled_qty + order.filled_qty();
                if new_qty > 0 {
                    filled_price = (filled_price * Decimal::from(filled_qty) + order.filled_price() * Decimal::from(order.filled_qty()))
                        / Decimal::from(new_qty);
                }
                filled_qty = new_qty;
            }
            let filled_price = contract.quantize(if filled_qty > 0 { filled_price } else { fallback_price });

            self.state = SwingState::GridOsc;
            self.zones.clear();
            self.start_zone = ZoneName::Net;
            self.start_zone_mid_price = filled_price;
            self.dec_peak = None;

            self.risky_base_val = portfolio.nlv();
            self.risky_base_qty = self.d().to_i64().unwrap_or(1)
                * (portfolio.position_qty(Side::Long) - portfolio.position_qty(Side::Short));
            self.risky_cut_qty = 0;
            self.risky_cut_price = Decimal::ZERO;
            self.risky_init_order_qty = 0;
            self.risky_init_orders.clear();
            self.risky_osc_zone = None;
            self.reversal_orders.clear();
        }
    }

    fn run_risky_init(&mut self, contract: &Contract, portfolio: &dyn PositionView, intents: &mut Vec<Intent>) {
        if self.risky_init_orders.is_empty() {
            let last = contract.last.unwrap_or_default();
            let working = portfolio.position_qty(self.long_short);
            let reverse = portfolio.position_qty(self.long_short.opposite());
            let split = calc_order_params(
                Action::Sell,
                self.long_short,
                last,
                self.risky_init_order_qty,
                OrderOwner::RiskyInit(0),
                Some(working),
                Some(reverse),
            );
            for (leg_index, leg) in [(0u8, split.sell_leg), (1u8, split.buy_leg)] {
                if leg.qty > 0 {
                    if let Ok(order) = AdaptiveOrder::new(
                        OrderOwner::RiskyInit(leg_index),
                        leg.action,
                        leg.side,
                        leg.qty,
                        leg.price,
                        contract.tick(),
                        3,
                        i64::MAX,
                        ModeRetryCounts::new(0, u32::MAX, 0, 0),
                        ModeTimeLimits::default(),
                    ) {
                        self.risky_init_orders.push(order);
                    }
                }
            }
        }

        let mut all_finished = true;
        for order in &mut self.risky_init_orders {
            if let Some(signal) = order.on_tick(contract) {
                if let Some(intent) = signal_to_intent(signal) {
                    intents.push(intent);
                }
            }
            all_finished &= order.is_finished();
        }

        if all_finished && !self.risky_init_orders.is_empty() {
            let mut qty = 0i64;
            let mut price = Decimal::ZERO;
            for order in &self.risky_init_orders {
                let new_qty = qty + order.filled_qty();
                if new_qty > 0 {
                    price = (price * Decimal::from(qty) + order.filled_price() * Decimal::from(order.filled_qty())) / Decimal::from(new_qty);
                }
                qty = new_qty;
            }
            self.risky_cut_price = contract.quantize(price);
            self.risky_cut_qty = qty;
            self.state = SwingState::RiskyOsc;
            self.risky_init_order_qty = 0;
            self.risky_init_orders.clear();
        }
    }

    fn run_risky_osc(&mut self, contract: &Contract, last: Decimal, portfolio: &dyn PositionView, intents: &mut Vec<Intent>) {
        if self.risky_osc_zone.is_none() {
            let low_bound = self.risky_cut_price
                - if self.long_short == Side::Long { Decimal::ONE } else { Decimal::ZERO } * self.config.min_osc_height * Decimal::from(N_GRIDS);
            let qa_buy_back = floor_i64(Decimal::from(self.risky_cut_qty) * decimal_str(RISKY_OSC_BUY_BACK_QTY_RATIO));
            let qa_sell_off = floor_i64(Decimal::from(self.risky_cut_qty) * decimal_str(RISKY_OSC_SELL_OFF_QTY_RATIO));
            let (qa_long, qa_short) = match self.long_short {
                Side::Long => (qa_buy_back, qa_sell_off),
                Side::Short => (qa_sell_off, qa_buy_back),
            };
            let pos_after_cut = portfolio.position_qty(Side::Long) - portfolio.position_qty(Side::Short);
            let (cap_min, cap_max) = match self.long_short {
                Side::Long => (pos_after_cut, self.risky_base_qty),
                Side::Short => (-self.risky_base_qty, pos_after_cut),
            };
            let params = GridOscillatorParams {
                tag: OrderOwner::Zone(self.active_zone),
                low_bound,
                n_grids: N_GRIDS,
                grid_height: self.config.min_osc_height,
                low_ext: true,
                high_ext: true,
                trail_amt: self.config.trail_price_ticks,
                qty_base_long: qa_long,
                qty_base_short: qa_short,
                qty_offset_long: 0,
                qty_offset_short: 0,
                last_order_price: self.risky_cut_price,
                k_init: 0,
                qty_base_scaling: false,
                position_qty_cap_min: cap_min,
                position_qty_cap_max: cap_max,
                order_qty_cap_long: i64::MAX,
                order_qty_cap_short: i64::MAX,
            };
            self.risky_osc_zone = Some(GridOscillator::new(params, contract));
        }

        let zone = self.risky_osc_zone.as_mut().expect("just ensured");
        zone.on_tick_update(last, contract);
        let pos_long = portfolio.position_qty(Side::Long);
        let pos_short = portfolio.position_qty(Side::Short);
        let (split, _, _) = zone.on_tick_trade(last, pos_long, pos_short, contract);
        if let Some(split) = split {
            intents.extend(split_intents(split));
        }
        self.garbage_cancel(last, portfolio, intents);
    }

    fn run_stop(&mut self, contract: &Contract, portfolio: &dyn PositionView, intents: &mut Vec<Intent>) {
        if self.stop_orders.is_empty() {
            let last = contract.last.unwrap_or_default();
            for side in [Side::Long, Side::Short] {
                let qty = portfolio.position_qty(side);
                if qty > 0 {
                    if let Ok(order) = AdaptiveOrder::new(
                        OrderOwner::Stop(side),
                        Action::Sell,
                        side,
                        qty,
                        last,
                        contract.tick(),
                        3,
                        i64::MAX,
                        ModeRetryCounts::new(1, u32::MAX, 0, 0),
                        ModeTimeLimits::default(),
                    ) {
                        self.stop_orders.push(order);
                    }
                }
            }
        }

        let mut all_finished = true;
        for order in &mut self.stop_orders {
            if let Some(signal) = order.on_tick(contract) {
                if let Some(intent) = signal_to_intent(signal) {
                    intents.push(intent);
                }
            }
            all_finished &= order.is_finished();
        }

        if all_finished {
            self.stop_orders.clear();
            self.state = SwingState::Finish;
        }
    }

    fn matching_order<'a>(
        orders: &'a mut [AdaptiveOrder],
        owner: OrderOwner,
    ) -> Option<&'a mut AdaptiveOrder> {
        orders.iter_mut().find(|o| o.owner() == owner)
    }

    pub fn on_buy_sell_success(&mut self, owner: OrderOwner, order_id: u64, price: Decimal) {
        match (self.state, owner) {
            (SwingState::GridOsc, OrderOwner::Zone(id)) => self.zone_mut(id).on_buy_sell_success(price),
            (SwingState::Reversal, OrderOwner::Reversal(_)) => {
                if let Some(order) = Self::matching_order(&mut self.reversal_orders, owner) {
                    order.on_buysell_success(order_id, price);
                }
            }
            (SwingState::RiskyInit, OrderOwner::RiskyInit(_)) => {
                if let Some(order) = Self::matching_order(&mut self.risky_init_orders, owner) {
                    order.on_buysell_success(order_id, price);
                }
            }
            (SwingState::RiskyOsc, OrderOwner::Zone(_)) => {
                if let Some(zone) = &mut self.risky_osc_zone {
                    zone.on_buy_sell_success(price);
                }
            }
            (SwingState::Stop, OrderOwner::Stop(_)) => {
                if let Some(order) = Self::matching_order(&mut self.stop_orders, owner) {
                    order.on_buysell_success(order_id, price);
                }
            }
            _ => {}
        }
    }

    pub fn on_buy_sell_fail(&mut self, owner: OrderOwner) {
        match (self.state, owner) {
            (SwingState::GridOsc, OrderOwner::Zone(id)) => self.zone_mut(id).on_buy_sell_fail(),
            (SwingState::Reversal, OrderOwner::Reversal(_)) => {
                if let Some(order) = Self::matching_order(&mut self.reversal_orders, owner) {
                    order.on_buysell_fail();
                }
            }
            (SwingState::RiskyInit, OrderOwner::RiskyInit(_)) => {
                if let Some(order) = Self::matching_order(&mut self.risky_init_orders, owner) {
                    order.on_buysell_fail();
                }
            }
            (SwingState::RiskyOsc, OrderOwner::Zone(_)) => {
                if let Some(zone) = &mut self.risky_osc_zone {
                    zone.on_buy_sell_fail();
                }
            }
            (SwingState::Stop, OrderOwner::Stop(_)) => {
                if let Some(order) = Self::matching_order(&mut self.stop_orders, owner) {
                    order.on_buysell_fail();
                }
            }
            _ => {}
        }
    }

    pub fn on_trade_update(&mut self, owner: OrderOwner, action: Action, side: Side, price: Decimal, qty: i64, contract: &Contract) {
        match (self.state, owner) {
            (SwingState::GridOsc, OrderOwner::Zone(id)) => self.zone_mut(id).on_trade_update(action, side, price, qty, contract),
            (SwingState::Reversal, OrderOwner::Reversal(_)) => {
                if let Some(order) = Self::matching_order(&mut self.reversal_orders, owner) {
                    order.on_trade_update(price, qty);
                }
            }
            (SwingState::RiskyInit, OrderOwner::RiskyInit(_)) => {
                if let Some(order) = Self::matching_order(&mut self.risky_init_orders, owner) {
                    order.on_trade_update(price, qty);
                }
            }
            (SwingState::RiskyOsc, OrderOwner::Zone(_)) => {
                if let Some(zone) = &mut self.risky_osc_zone {
                    zone.on_trade_update(action, side, price, qty, contract);
                }
            }
            (SwingState::Stop, OrderOwner::Stop(_)) => {
                if let Some(order) = Self::matching_order(&mut self.stop_orders, owner) {
                    order.on_trade_update(price, qty);
                }
            }
            _ => {}
        }
    }

    pub fn on_order_status(&mut self, owner: OrderOwner, status: OrderStatus) {
        match (self.state, owner) {
            (SwingState::Reversal, OrderOwner::Reversal(_)) => {
                if let Some(order) = Self::matching_order(&mut self.reversal_orders, owner) {
                    order.on_order_status(status);
                }
            }
            (SwingState::RiskyInit, OrderOwner::RiskyInit(_)) => {
                if let Some(order) = Self::matching_order(&mut self.risky_init_orders, owner) {
                    order.on_order_status(status);
                }
            }
            (SwingState::Stop, OrderOwner::Stop(_)) => {
                if let Some(order) = Self::matching_order(&mut self.stop_orders, owner) {
                    order.on_order_status(status);
                }
            }
            _ => {}
        }
    }
}

fn floor_i64(value: Decimal) -> i64 {
    value.floor().to_i64().unwrap_or(0)
}

fn to_slippage_ticks(value: Decimal) -> i64 {
    value.ceil().to_i64().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use swing_core::contract::MarketDataUpdate;

    struct FakePortfolio {
        long: i64,
        short: i64,
        nlv: Decimal,
        gain: Decimal,
        principal: Decimal,
        open: bool,
    }

    impl PositionView for FakePortfolio {
        fn position_qty(&self, side: Side) -> i64 {
            match side {
                Side::Long => self.long,
                Side::Short => self.short,
            }
        }
        fn nlv(&self) -> Decimal {
            self.nlv
        }
        fn gain(&self) -> Decimal {
            self.gain
        }
        fn principal(&self) -> Decimal {
            self.principal
        }
        fn has_open_orders(&self) -> bool {
            self.open
        }
        fn open_orders(&self) -> Vec<(u64, Decimal)> {
            Vec::new()
        }
    }

    fn config() -> SwingConfig {
        SwingConfig {
            direction: Side::Long,
            start_zone: ZoneName::Inc,
            open_price: dec!(100.0),
            reversal_trail_ratio: dec!(0.1),
            min_osc_height: dec!(1.0),
            trail_price_ticks: dec!(0.5),
            open_volume: 100,
            base_volume: 10,
            offsets: [crate::config::ZoneOffset::default(); 4],
            risky_zone_activate_loss_ratio: dec!(0.2),
            stopwin_base_percentage: dec!(0.1),
            trail_percentage: dec!(0.5),
        }
    }

    fn contract_at(last: Decimal) -> Contract {
        let mut c = Contract::new("WINFUT", 1, dec!(0.1), dec!(10)).unwrap();
        c.update_market(MarketDataUpdate {
            last: Some(last),
            bid: Some(last - dec!(0.1)),
            ask: Some(last + dec!(0.1)),
            ..Default::default()
        })
        .unwrap();
        c
    }

    /// SPEC_FULL.md §8: starting in `Start`, waiting for the trigger
    /// price before the session becomes active.
    #[test]
    fn start_waits_for_price_to_cross_open_price() {
        let mut fsm = SwingStateMachine::new(config());
        let portfolio = FakePortfolio { long: 0, short: 0, nlv: Decimal::ZERO, gain: Decimal::ZERO, principal: dec!(1000), open: false };
        assert!(fsm.on_tick(&contract_at(dec!(99.0)), &portfolio).is_empty());
        assert_eq!(fsm.state(), SwingState::Start);
        fsm.on_tick(&contract_at(dec!(100.0)), &portfolio);
        assert_eq!(fsm.state(), SwingState::GridOsc);
    }

    /// SPEC_FULL.md §8, scenario 5: cleanup handshake waits for
    /// `order_dict` to drain before applying the queued transition.
    #[test]
    fn cleanup_handshake_waits_for_open_orders_to_drain() {
        let mut fsm = SwingStateMachine::new(config());
        fsm.state = SwingState::GridOsc;
        fsm.state_cleanup = true;
        fsm.next_state_after_cleanup = Some(SwingState::Stop);
        let busy = FakePortfolio { long: 0, short: 0, nlv: Decimal::ZERO, gain: Decimal::ZERO, principal: dec!(1000), open: true };
        let mut intents = Vec::new();
        let blocked = fsm.grid_osc_transition(dec!(100.0), &busy, &mut intents);
        assert!(blocked);
        assert_eq!(fsm.state(), SwingState::GridOsc);

        let idle = FakePortfolio { long: 0, short: 0, nlv: Decimal::ZERO, gain: Decimal::ZERO, principal: dec!(1000), open: false };
        let blocked = fsm.grid_osc_transition(dec!(100.0), &idle, &mut intents);
        assert!(!blocked);
        assert_eq!(fsm.state(), SwingState::Stop);
    }
}
