//! # GridOscillator
//!
//! Oscillatory trading on a pre-defined price grid, with trailing
//! buy/sell triggers and a volume-offset scale that grows as the zone
//! accumulates profit. Grounded directly on
//! `original_source/grid_osc_strategy.py::GridOsc`.

use crate::order_split::{calc_order_params, SplitResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use swing_core::order::OrderOwner;
use swing_core::side::{Action, Side, SideMap};
use swing_core::Contract;

/// Lifecycle state of a zone's in-flight order, mirroring `AdaptiveOrder`'s
/// `Req`/pending-split vocabulary at the zone level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneState {
    Init,
    Req,
    Split,
}

/// One `(open_bound, close_bound)` swing-trading zone. Quantities and
/// bounds are keyed by [`Side`]: the `Long` slot holds the low-price /
/// long-open values, the `Short` slot the high-price / short-open values
/// — exactly the original's `direction in (0, 1)` convention, since
/// `Side::Long.sign() == 1 == 1 - 2*0` and `Side::Short.sign() == -1 ==
/// 1 - 2*1`.
#[derive(Debug, Clone)]
pub struct GridOscillator {
    tag: OrderOwner,
    n_grids: i64,
    grid_height: Decimal,
    bounds: SideMap<Decimal>,
    ext: SideMap<bool>,
    trail_amt: Decimal,
    qty_base: SideMap<i64>,
    qty_offset: SideMap<i64>,
    order_qty_scaling: bool,
    position_qty_caps: SideMap<i64>,
    order_qty_caps: SideMap<i64>,

    state: ZoneState,
    last_order_price: Decimal,
    peak: SideMap<Decimal>,
    position_qty: i64,
    cma_price: Decimal,
    k: i64,
    k_profit: Decimal,
    k_profit_th: Decimal,
}

#[allow(clippy::too_many_arguments)]
pub struct GridOscillatorParams {
    pub tag: OrderOwner,
    pub low_bound: Decimal,
    pub n_grids: i64,
    pub grid_height: Decimal,
    pub low_ext: bool,
    pub high_ext: bool,
    pub trail_amt: Decimal,
    pub qty_base_long: i64,
    pub qty_base_short: i64,
    pub qty_offset_long: i64,
    pub qty_offset_short: i64,
    pub last_order_price: Decimal,
    pub k_init: i64,
    pub qty_base_scaling: bool,
    pub position_qty_cap_min: i64,
    pub position_qty_cap_max: i64,
    pub order_qty_cap_long: i64,
    pub order_qty_cap_short: i64,
}

impl GridOscillatorParams {
    /// Unbounded order-quantity caps, matching the original's `2**64`
    /// default (`SPEC_FULL.md` §9.5's `Option`-sentinel policy does not
    /// apply here: these stay plain `i64::MAX`, they are genuine caps a
    /// caller can also set meaningfully, not "unknown").
    pub fn uncapped_order_qty(mut self) -> Self {
        self.order_qty_cap_long = i64::MAX;
        self.order_qty_cap_short = i64::MAX;
        self
    }
}

fn round_dp(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp(decimals)
}

impl GridOscillator {
    pub fn new(params: GridOscillatorParams, contract: &Contract) -> Self {
        let decimals = contract.decimals();
        let high_bound = round_dp(
            params.low_bound + Decimal::from(params.n_grids) * params.grid_height,
            decimals,
        );
        let bounds = SideMap::new(params.low_bound, high_bound);
        let qty_base = SideMap::new(params.qty_base_long, params.qty_base_short);
        let qty_offset = SideMap::new(params.qty_offset_long, params.qty_offset_short);
        let k_profit_th = Self::profit_threshold(
            &bounds,
            params.n_grids,
            &qty_base,
            params.k_init,
            &qty_offset,
            contract.unit(),
        );
        Self {
            tag: params.tag,
            n_grids: params.n_grids,
            grid_height: params.grid_height,
            bounds,
            ext: SideMap::new(params.low_ext, params.high_ext),
            trail_amt: params.trail_amt,
            qty_base,
            qty_offset,
            order_qty_scaling: params.qty_base_scaling,
            position_qty_caps: SideMap::new(params.position_qty_cap_min, params.position_qty_cap_max),
            order_qty_caps: SideMap::new(params.order_qty_cap_long, params.order_qty_cap_short),
            state: ZoneState::Init,
            last_order_price: params.last_order_price,
            peak: SideMap::new(params.last_order_price, params.last_order_price),
            position_qty: 0,
            cma_price: Decimal::ZERO,
            k: params.k_init,
            k_profit: Decimal::ZERO,
            k_profit_th,
        }
    }

    fn profit_threshold(
        bounds: &SideMap<Decimal>,
        n_grids: i64,
        qty_base: &SideMap<i64>,
        k: i64,
        qty_offset: &SideMap<i64>,
        unit: Decimal,
    ) -> Decimal {
        let min_qa = qty_base.long.min(qty_base.short);
        let min_qn = qty_offset.long.min(qty_offset.short);
        (bounds.short - bounds.long)
            * Decimal::from(n_grids * min_qa + k * min_qn)
            * unit
    }

    pub fn tag(&self) -> OrderOwner {
        self.tag
    }

    pub fn state(&self) -> ZoneState {
        self.state
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self.state, ZoneState::Req | ZoneState::Split)
    }

    pub fn bounds(&self) -> (Decimal, Decimal) {
        (self.bounds.long, self.bounds.short)
    }

    pub fn last_order_price(&self) -> Decimal {
        self.last_order_price
    }

    pub fn set_last_order_price(&mut self, price: Decimal) {
        self.last_order_price = price;
    }

    pub fn peak(&self) -> SideMap<Decimal> {
        self.peak
    }

    pub fn set_peak(&mut self, peak: SideMap<Decimal>) {
        self.peak = peak;
    }

    /// Expands a zone bound outward (never inward) when price has broken
    /// past it and that side is extensible.
    fn expand(&mut self, price: Decimal, decimals: u32, unit: Decimal) {
        for side in [Side::Long, Side::Short] {
            let d = Decimal::from(side.sign());
            if self.ext[side] && d * (price - self.bounds[side]) < Decimal::ZERO {
                let raw_steps = d * (self.bounds[side] - price) / self.grid_height;
                let n_grids_ext = ceil_to_i64(raw_steps);
                self.n_grids += n_grids_ext;
                self.bounds[side] = round_dp(
                    self.bounds[side] - d * Decimal::from(n_grids_ext) * self.grid_height,
                    decimals,
                );
                self.k_profit_th = Self::profit_threshold(
                    &self.bounds,
                    self.n_grids,
                    &self.qty_base,
                    self.k,
                    &self.qty_offset,
                    unit,
                );
                break;
            }
        }
    }

    /// Updates the running peak/valley and expands the zone if price has
    /// moved past an extensible bound.
    pub fn on_tick_update(&mut self, price: Decimal, contract: &Contract) {
        self.peak.long = self.peak.long.min(price);
        self.peak.short = self.peak.short.max(price);
        if self.ext.long || self.ext.short {
            self.expand(price, contract.decimals(), contract.unit());
        }
    }

    /// Evaluates the oscillation trigger for each side and, if met,
    /// returns the split order to submit. Only one side can trigger per
    /// call — whichever is checked first (`Long`, then `Short`).
    pub fn on_tick_trade(
        &mut self,
        trade_price: Decimal,
        position_long: i64,
        position_short: i64,
        contract: &Contract,
    ) -> (Option<SplitResult<OrderOwner>>, i64, i64) {
        if self.is_blocked() {
            return (None, position_long, position_short);
        }

        let decimals = contract.decimals();
        let position_qty = position_long - position_short;
        let pos_qty_caps = SideMap::new(
            self.position_qty_caps.short - position_qty,
            position_qty - self.position_qty_caps.long,
        );

        for side in [Side::Long, Side::Short] {
            let peak = self.peak[side];
            let d = Decimal::from(side.sign());
            let order_price_gap = round_dp(d * (self.last_order_price - trade_price), decimals);
            let trail_gap = round_dp(d * (trade_price - peak), decimals);
            if order_price_gap < self.grid_height || trail_gap < self.trail_amt {
                continue;
            }

            let raw_scale = d * (self.last_order_price - trade_price) / self.grid_height;
            let mut scale = floor_to_i64(raw_scale);
            if !self.order_qty_scaling {
                scale = scale.min(1);
            }
            let mut order_qty = if scale > 0 {
                scale * self.qty_base[side] + self.k * self.qty_offset[side]
            } else {
                0
            };
            order_qty = order_qty.min(pos_qty_caps[side]);
            order_qty = order_qty.min(self.order_qty_caps[side]);

            if order_qty > 0 {
                let action = if side == Side::Long { Action::Buy } else { Action::Sell };
                tracing::debug!(tag = %self.tag, %side, %action, order_qty, %trade_price, "zone trigger fired");
                let split = calc_order_params(
                    action,
                    Side::Long,
                    trade_price,
                    order_qty,
                    self.tag,
                    Some(position_long),
                    Some(position_short),
                );
                self.state = if split.is_split { ZoneState::Split } else { ZoneState::Req };
                let new_long = split.position_available.unwrap_or(position_long);
                let new_short = split.position_available_reverse.unwrap_or(position_short);
                return (Some(split), new_long, new_short);
            }
        }
        (None, position_long, position_short)
    }

    pub fn on_buy_sell_fail(&mut self) {
        self.state = match self.state {
            ZoneState::Split => ZoneState::Req,
            ZoneState::Req => ZoneState::Init,
            ZoneState::Init => ZoneState::Init,
        };
    }

    pub fn on_buy_sell_success(&mut self, order_price: Decimal) {
        self.state = match self.state {
            ZoneState::Split => ZoneState::Req,
            ZoneState::Req => ZoneState::Init,
            ZoneState::Init => ZoneState::Init,
        };
        self.last_order_price = order_price;
        self.peak = SideMap::new(order_price, order_price);
    }

    /// Folds a fill into the zone's netted position and profit-scaling
    /// counter `k`, which steps up once accumulated realized gain crosses
    /// `k_profit_th`.
    pub fn on_trade_update(
        &mut self,
        action: Action,
        side: Side,
        price: Decimal,
        qty: i64,
        contract: &Contract,
    ) {
        let (new_cma, new_position, realized_gain) =
            swing_core::position_math::update_two_way(self.cma_price, self.position_qty, action, side, price, qty);
        self.cma_price = new_cma;
        self.position_qty = new_position;
        self.k_profit += realized_gain * contract.unit();
        if self.k_profit > self.k_profit_th {
            self.k += 1;
            self.k_profit = Decimal::ZERO;
            let min_qn = self.qty_offset.long.min(self.qty_offset.short);
            self.k_profit_th += (self.bounds.short - self.bounds.long) * Decimal::from(min_qn) * contract.unit();
        }
    }

    pub fn position_qty(&self) -> i64 {
        self.position_qty
    }
}

fn ceil_to_i64(value: Decimal) -> i64 {
    value.ceil().to_i64().unwrap_or(i64::MAX)
}

fn floor_to_i64(value: Decimal) -> i64 {
    value.floor().to_i64().unwrap_or(i64::MIN)
}
