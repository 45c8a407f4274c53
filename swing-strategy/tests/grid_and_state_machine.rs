//! Drives the public surface of `GridOscillator` and `SwingStateMachine`
//! the way an external caller (the router) actually would: only through
//! their `pub` constructors and tick/callback methods, never touching
//! private fields.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use swing_core::contract::MarketDataUpdate;
use swing_core::order::{OrderOwner, ZoneId};
use swing_core::side::Side;
use swing_core::Contract;
use swing_strategy::{GridOscillator, GridOscillatorParams, PositionView, SwingConfig, SwingState, SwingStateMachine, ZoneName, ZoneOffset};

struct StubPortfolio {
    long: i64,
    short: i64,
    nlv: Decimal,
    gain: Decimal,
    principal: Decimal,
    open: bool,
}

impl PositionView for StubPortfolio {
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

fn swing_config() -> SwingConfig {
    SwingConfig {
        direction: Side::Long,
        start_zone: ZoneName::Inc,
        open_price: dec!(100.0),
        reversal_trail_ratio: dec!(0.1),
        min_osc_height: dec!(1.0),
        trail_price_ticks: dec!(0.5),
        open_volume: 100,
        base_volume: 10,
        offsets: [ZoneOffset::default(); 4],
        risky_zone_activate_loss_ratio: dec!(0.2),
        stopwin_base_percentage: dec!(0.1),
        trail_percentage: dec!(0.5),
    }
}

#[test]
fn state_machine_stays_dormant_until_the_market_crosses_open_price() {
    let mut fsm = SwingStateMachine::new(swing_config());
    let idle = StubPortfolio {
        long: 0,
        short: 0,
        nlv: Decimal::ZERO,
        gain: Decimal::ZERO,
        principal: dec!(100_000),
        open: false,
    };

    assert_eq!(fsm.state(), SwingState::Start);
    assert!(fsm.on_tick(&contract_at(dec!(95.0)), &idle).is_empty());
    assert_eq!(fsm.state(), SwingState::Start);

    fsm.on_tick(&contract_at(dec!(100.0)), &idle);
    assert_eq!(fsm.state(), SwingState::GridOsc);
    assert!(!fsm.is_finished());
}

#[test]
fn grid_oscillator_triggers_a_buy_after_a_sufficient_drop_then_resets_on_success() {
    let contract = Contract::new("WINFUT", 1, dec!(0.1), dec!(10)).unwrap();
    let params = GridOscillatorParams {
        tag: OrderOwner::Zone(ZoneId(0)),
        low_bound: dec!(100.0),
        n_grids: 8,
        grid_height: dec!(1.0),
        low_ext: false,
        high_ext: false,
        trail_amt: dec!(0.5),
        qty_base_long: 2,
        qty_base_short: 2,
        qty_offset_long: 1,
        qty_offset_short: 1,
        last_order_price: dec!(104.0),
        k_init: 0,
        qty_base_scaling: true,
        position_qty_cap_min: -100,
        position_qty_cap_max: 100,
        order_qty_cap_long: 1000,
        order_qty_cap_short: 1000,
    }
    .uncapped_order_qty();
    let mut zone = GridOscillator::new(params, &contract);

    zone.on_tick_update(dec!(101.0), &contract);
    let (split, new_long, new_short) = zone.on_tick_trade(dec!(101.0), 0, 0, &contract);
    let split = split.expect("a sufficient drop past grid and trail should trigger a buy");
    assert_eq!(split.buy_leg.qty, 2);
    assert_eq!((new_long, new_short), (0, 0));

    zone.on_buy_sell_success(dec!(101.0));
    assert_eq!(zone.last_order_price(), dec!(101.0));
    assert_eq!(zone.position_qty(), 0);
}
