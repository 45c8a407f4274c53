//! The `AdaptiveOrder` state machine itself.

use crate::mode::{Mode, ModeRetryCounts};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use swing_core::error::SwingError;
use swing_core::order::OrderOwner;
use swing_core::side::{Action, Side};
use swing_core::{Contract, OrderStatus};

/// Per-mode time limit on how long a `Pending` order may sit before being
/// cancelled and re-quoted. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeTimeLimits {
    pub patient: Option<Duration>,
    pub accelerated: Option<Duration>,
    pub urgent: Option<Duration>,
    pub panic: Option<Duration>,
}

impl ModeTimeLimits {
    fn get(&self, mode: Mode) -> Option<Duration> {
        match mode {
            Mode::Patient => self.patient,
            Mode::Accelerated => self.accelerated,
            Mode::Urgent => self.urgent,
            Mode::Panic => self.panic,
        }
    }
}

/// States of the `AdaptiveOrder` escalation machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    Req,
    Pending,
    Filled,
    Cancelled,
}

/// What the caller (`EventRouter`) should do in response to `on_tick` or a
/// broker callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Submit a fresh limit order at `price` for `qty`, tagged with
    /// `owner`.
    OpenOrder {
        action: Action,
        side: Side,
        price: Decimal,
        qty: i64,
        owner: OrderOwner,
    },
    /// Cancel the outstanding order. `order_id` is `None` when the order
    /// never reached the broker (e.g. the mode stack was exhausted while
    /// still in `Init`).
    Cancel { order_id: Option<u64> },
    /// The order is fully filled; the owning sub-machine should unwind.
    Close,
}

/// Escalates a single logical order through `Patient -> Accelerated ->
/// Urgent -> Panic` pricing until it fills, the price bound is breached,
/// or every mode is exhausted.
#[derive(Debug, Clone)]
pub struct AdaptiveOrder {
    owner: OrderOwner,
    action: Action,
    side: Side,
    order_qty_total: i64,
    order_price: Option<Decimal>,
    retry_step: i64,
    price_bound: Decimal,
    time_limits: ModeTimeLimits,
    mode_stack: Vec<(Mode, u32)>,

    state: State,
    filled_qty: i64,
    filled_price: Decimal,

    last_order_id: Option<u64>,
    last_order_time: Option<DateTime<Utc>>,
    last_order_price: Option<Decimal>,
    last_order_mode: Option<Mode>,
}

impl AdaptiveOrder {
    /// `d = +1` for Buy-Long or Sell-Short, else `-1` — exactly
    /// `action.effective_sign(side)`.
    fn direction(action: Action, side: Side) -> i64 {
        action.effective_sign(side)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner: OrderOwner,
        action: Action,
        side: Side,
        order_qty_total: i64,
        order_price: Decimal,
        tick: Decimal,
        retry_step: i64,
        max_slippage: i64,
        retries: ModeRetryCounts,
        time_limits: ModeTimeLimits,
    ) -> Result<Self, SwingError> {
        let mode_stack = retries.into_stack();
        if mode_stack.is_empty() {
            return Err(SwingError::EmptyModeStack);
        }
        let d = Self::direction(action, side);
        let price_bound = order_price + Decimal::from(d * max_slippage) * tick;
        Ok(Self {
            owner,
            action,
            side,
            order_qty_total,
            order_price: Some(order_price),
            retry_step,
            price_bound,
            time_limits,
            mode_stack,
            state: State::Init,
            filled_qty: 0,
            filled_price: Decimal::ZERO,
            last_order_id: None,
            last_order_time: None,
            last_order_price: None,
            last_order_mode: None,
        })
    }

    pub fn owner(&self) -> OrderOwner {
        self.owner
    }

    pub fn filled_qty(&self) -> i64 {
        self.filled_qty
    }

    pub fn filled_price(&self) -> Decimal {
        self.filled_price
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Filled | State::Cancelled)
    }

    pub fn is_filled(&self) -> bool {
        self.state == State::Filled
    }

    fn active_mode(&self) -> Option<Mode> {
        self.mode_stack.last().map(|(mode, _)| *mode)
    }

    fn mid_or_last(contract: &Contract) -> Decimal {
        contract.mid().unwrap_or_else(|| contract.last.unwrap_or_default())
    }

    /// Picks the more conservative of two candidate prices for a given
    /// direction: for `d == +1` (buying) that is the smaller of the two,
    /// for `d == -1` (selling) the larger.
    fn favorable(d: i64, a: Decimal, b: Decimal) -> Decimal {
        if d == 1 {
            a.min(b)
        } else {
            a.max(b)
        }
    }

    /// The opposite pick — `(max, min)[long_short]`, used by `Urgent`.
    fn unfavorable(d: i64, a: Decimal, b: Decimal) -> Decimal {
        if d == 1 {
            a.max(b)
        } else {
            a.min(b)
        }
    }

    fn candidate_price(&self, mode: Mode, contract: &Contract) -> Decimal {
        let d = Self::direction(self.action, self.side);
        let last = contract.last.unwrap_or_default();
        let tick = contract.tick();
        let mid = Self::mid_or_last(contract);
        match mode {
            Mode::Patient => {
                let mut price = Self::favorable(d, last, mid);
                if self.last_order_price.is_none() {
                    if let Some(user_price) = self.order_price {
                        price = Self::favorable(d, user_price, price);
                    }
                }
                price
            }
            Mode::Accelerated => Self::favorable(d, last + Decimal::from(d) * tick, mid),
            Mode::Urgent => Self::unfavorable(d, last + Decimal::from(d) * tick, mid),
            Mode::Panic => side_crossing_price(self.side, contract),
        }
    }

    /// Strictly crossed (or touching) the worst acceptable price.
    fn price_bound_breached(&self, contract: &Contract) -> bool {
        let d = Self::direction(self.action, self.side);
        let last = contract.last.unwrap_or_default();
        Decimal::from(d) * (last - self.price_bound) >= Decimal::ZERO
    }

    /// The externally-driven step: advances the machine by one market
    /// tick and returns what the caller should do, if anything.
    pub fn on_tick(&mut self, contract: &Contract) -> Option<Signal> {
        match self.state {
            State::Init => {
                if self.active_mode().is_none() || self.price_bound_breached(contract) {
                    self.state = State::Cancelled;
                    tracing::debug!(owner = %self.owner, "mode stack exhausted or price bound breached, cancelling");
                    return Some(Signal::Cancel {
                        order_id: self.last_order_id,
                    });
                }
                let mode = self.active_mode().expect("checked above");
                let price = contract.quantize(self.candidate_price(mode, contract));
                let qty = self.order_qty_total - self.filled_qty;
                self.state = State::Req;
                tracing::debug!(owner = %self.owner, %mode, %price, qty, "quoting next order");
                Some(Signal::OpenOrder {
                    action: self.action,
                    side: self.side,
                    price,
                    qty,
                    owner: self.owner,
                })
            }
            State::Req => None,
            State::Pending => {
                let d = Self::direction(self.action, self.side);
                let last = contract.last.unwrap_or_default();
                let tick = contract.tick();

                let time_expired = match (self.last_order_mode, self.last_order_time) {
                    (Some(mode), Some(submitted_at)) => match self.time_limits.get(mode) {
                        Some(limit) => Utc::now() - submitted_at > limit,
                        None => false,
                    },
                    _ => false,
                };
                let slipped = self
                    .last_order_price
                    .map(|p| Decimal::from(d) * (last - p) >= Decimal::from(self.retry_step) * tick)
                    .unwrap_or(false);
                let breached = self.price_bound_breached(contract);

                if time_expired || slipped || breached {
                    Some(Signal::Cancel {
                        order_id: self.last_order_id,
                    })
                } else {
                    None
                }
            }
            State::Filled => Some(Signal::Close),
            State::Cancelled => None,
        }
    }

    /// The broker accepted the order: `Req -> Pending`.
    pub fn on_buysell_success(&mut self, order_id: u64, price: Decimal) {
        if self.is_finished() {
            return;
        }
        self.last_order_id = Some(order_id);
        self.last_order_time = Some(Utc::now());
        self.last_order_price = Some(price);
        self.last_order_mode = self.active_mode();
        self.state = State::Pending;

        if let Some((_, retries)) = self.mode_stack.last_mut() {
            *retries = retries.saturating_sub(1);
        }
        while matches!(self.mode_stack.last(), Some((_, 0))) {
            self.mode_stack.pop();
        }
    }

    /// The broker rejected the request synchronously: `Req -> Init`, will
    /// re-quote at the same mode.
    pub fn on_buysell_fail(&mut self) {
        if self.is_finished() {
            return;
        }
        self.state = State::Init;
    }

    /// A fill arrived for this order.
    pub fn on_trade_update(&mut self, price: Decimal, qty: i64) {
        if self.is_finished() {
            return;
        }
        let new_filled = self.filled_qty + qty;
        if new_filled > 0 {
            self.filled_price =
                (self.filled_price * Decimal::from(self.filled_qty) + price * Decimal::from(qty))
                    / Decimal::from(new_filled);
        }
        self.filled_qty = new_filled;
    }

    /// A status update arrived for the broker order currently tracked.
    pub fn on_order_status(&mut self, status: OrderStatus) {
        if self.is_finished() {
            return;
        }
        if status == OrderStatus::Closed || self.filled_qty >= self.order_qty_total {
            self.state = State::Filled;
        } else {
            self.state = State::Init;
        }
    }
}

fn side_crossing_price(side: Side, contract: &Contract) -> Decimal {
    let bid = contract.bid.unwrap_or_default();
    let ask = contract.ask.unwrap_or_default();
    side.crossing_price(bid, ask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use swing_core::contract::MarketDataUpdate;
    use swing_core::order::ZoneId;

    fn contract_at(bid: Decimal, ask: Decimal, last: Decimal) -> Contract {
        let mut c = Contract::new("WINFUT", 1, dec!(0.1), dec!(10)).unwrap();
        c.update_market(MarketDataUpdate {
            bid: Some(bid),
            ask: Some(ask),
            last: Some(last),
            ..Default::default()
        })
        .unwrap();
        c
    }

    fn patient_accelerated(max_slippage: i64) -> AdaptiveOrder {
        AdaptiveOrder::new(
            OrderOwner::Zone(ZoneId(0)),
            Action::Buy,
            Side::Long,
            2,
            dec!(10.0),
            dec!(0.1),
            3,
            max_slippage,
            ModeRetryCounts::new(2, 3, 0, 0),
            ModeTimeLimits::default(),
        )
        .unwrap()
    }

    #[test]
    fn patient_fill_end_to_end() {
        let mut order = patient_accelerated(10);
        let contract = contract_at(dec!(9.9), dec!(10.1), dec!(10.0));

        let signal = order.on_tick(&contract).unwrap();
        match signal {
            Signal::OpenOrder { price, qty, .. } => {
                assert_eq!(price, dec!(10.0));
                assert_eq!(qty, 2);
            }
            other => panic!("expected OpenOrder, got {other:?}"),
        }

        order.on_buysell_success(1, dec!(10.0));
        assert!(order.on_tick(&contract).is_none());

        order.on_trade_update(dec!(10.0), 2);
        order.on_order_status(OrderStatus::Closed);
        assert!(order.is_filled());
        assert_eq!(order.on_tick(&contract), Some(Signal::Close));
    }

    #[test]
    fn escalation_to_accelerated_after_patient_exhausted() {
        let mut order = patient_accelerated(10);
        let contract = contract_at(dec!(9.9), dec!(10.1), dec!(10.0));

        order.on_tick(&contract).unwrap();
        order.on_buysell_success(1, dec!(10.0));

        // Market drifts unfavorably by >= retry_step ticks -> Cancel.
        let drifted = contract_at(dec!(9.95), dec!(10.15), dec!(10.05));
        assert_eq!(
            order.on_tick(&drifted),
            Some(Signal::Cancel { order_id: Some(1) })
        );

        order.on_order_status(OrderStatus::Cancelled);
        // Back in Init, patient retries now 1.
        order.on_tick(&drifted).unwrap();
        order.on_buysell_success(2, dec!(10.05));
        let drifted_again = contract_at(dec!(10.0), dec!(10.2), dec!(10.1));
        order.on_tick(&drifted_again);
        order.on_order_status(OrderStatus::Cancelled);
        // Second patient retry consumed here.
        order.on_tick(&drifted_again).unwrap();
        order.on_buysell_success(3, dec!(10.1));
        let drifted_thrice = contract_at(dec!(10.05), dec!(10.25), dec!(10.15));
        order.on_tick(&drifted_thrice);
        order.on_order_status(OrderStatus::Cancelled);

        // Patient exhausted (started with 2 retries, both consumed);
        // Accelerated should now be active.
        let signal = order.on_tick(&drifted_thrice).unwrap();
        match signal {
            Signal::OpenOrder { price, .. } => {
                // Accelerated: favorable(last + tick, mid)
                let expected = drifted_thrice.quantize(
                    (drifted_thrice.last.unwrap() + drifted_thrice.tick())
                        .min(drifted_thrice.mid().unwrap()),
                );
                assert_eq!(price, expected);
            }
            other => panic!("expected OpenOrder, got {other:?}"),
        }
    }

    #[test]
    fn at_price_bound_exactly_cancels_in_init() {
        let mut order = AdaptiveOrder::new(
            OrderOwner::Stop(Side::Long),
            Action::Buy,
            Side::Long,
            1,
            dec!(10.0),
            dec!(0.1),
            3,
            1,
            ModeRetryCounts::new(1, 0, 0, 0),
            ModeTimeLimits::default(),
        )
        .unwrap();
        // price_bound = 10.0 + 1*1*0.1 = 10.1; last exactly at bound.
        let contract = contract_at(dec!(10.0), dec!(10.2), dec!(10.1));
        assert_eq!(
            order.on_tick(&contract),
            Some(Signal::Cancel { order_id: None })
        );
    }

    #[test]
    fn empty_mode_stack_after_stripping_is_illegal() {
        let result = AdaptiveOrder::new(
            OrderOwner::Stop(Side::Long),
            Action::Buy,
            Side::Long,
            1,
            dec!(10.0),
            dec!(0.1),
            3,
            1,
            ModeRetryCounts::new(0, 0, 0, 0),
            ModeTimeLimits::default(),
        );
        assert_eq!(result.unwrap_err(), SwingError::EmptyModeStack);
    }

    #[test]
    fn filled_and_cancelled_are_terminal_no_further_transitions() {
        let mut order = patient_accelerated(10);
        let contract = contract_at(dec!(9.9), dec!(10.1), dec!(10.0));
        order.on_tick(&contract);
        order.on_buysell_success(1, dec!(10.0));
        order.on_trade_update(dec!(10.0), 2);
        order.on_order_status(OrderStatus::Closed);
        assert!(order.is_finished());

        // Further callbacks must not move it out of Filled.
        order.on_buysell_fail();
        assert!(order.is_finished());
    }
}
