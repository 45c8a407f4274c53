//! Exercises the position-accounting and contract-quantization primitives
//! together the way `EventRouter` actually chains them: a contract snapshot
//! drives pricing, a sequence of trades drives the one-way and two-way
//! position bookkeeping.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use swing_core::contract::MarketDataUpdate;
use swing_core::position_math::{update_one_way, update_two_way};
use swing_core::side::{Action, Side, SideMap};
use swing_core::Contract;

#[test]
fn contract_rejects_out_of_limit_last_but_keeps_prior_snapshot() {
    let mut contract = Contract::new("WINFUT", 1, dec!(0.1), dec!(10)).unwrap();
    contract
        .update_market(MarketDataUpdate {
            bid: Some(dec!(99.9)),
            ask: Some(dec!(100.1)),
            last: Some(dec!(100.0)),
            low_limit: Some(dec!(90.0)),
            high_limit: Some(dec!(110.0)),
            ..Default::default()
        })
        .unwrap();

    let result = contract.update_market(MarketDataUpdate {
        last: Some(dec!(111.0)),
        ..Default::default()
    });
    assert!(result.is_err());
    // The prior valid snapshot is untouched.
    assert_eq!(contract.last, Some(dec!(100.0)));
}

#[test]
fn one_way_and_two_way_accounting_agree_on_a_round_trip() {
    let mut qty = SideMap::splat(0i64);
    let mut one_way_cma = SideMap::splat(Decimal::ZERO);
    let mut net_cma = Decimal::ZERO;
    let mut net_position = 0i64;
    let mut realized = Decimal::ZERO;

    let trades = [
        (Action::Buy, dec!(100.0), 3i64),
        (Action::Buy, dec!(102.0), 2i64),
        (Action::Sell, dec!(105.0), 4i64),
    ];

    for (action, price, trade_qty) in trades {
        update_one_way(&mut qty, &mut one_way_cma, action, Side::Long, price, trade_qty);
        let (new_cma, new_position, gain) =
            update_two_way(net_cma, net_position, action, Side::Long, price, trade_qty);
        net_cma = new_cma;
        net_position = new_position;
        realized += gain;
    }

    // Same quantity remains open on both sides of the bookkeeping.
    assert_eq!(qty[Side::Long], net_position);
    assert_eq!(net_position, 1);
    // (100*3 + 102*2) / 5 = 100.8; sell 4 @ 105 realizes (105-100.8)*4 = 16.8
    assert_eq!(realized, dec!(16.8));
    assert_eq!(net_cma, dec!(100.8));
}

#[test]
fn flat_position_resets_one_way_cost_basis() {
    let mut qty = SideMap::splat(0i64);
    let mut cma = SideMap::splat(Decimal::ZERO);
    update_one_way(&mut qty, &mut cma, Action::Buy, Side::Short, dec!(50.0), 5);
    update_one_way(&mut qty, &mut cma, Action::Sell, Side::Short, dec!(55.0), 5);
    assert_eq!(qty[Side::Short], 0);
    assert_eq!(cma[Side::Short], Decimal::ZERO);
}
