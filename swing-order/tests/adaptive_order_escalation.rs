//! End-to-end exercise of `AdaptiveOrder` from outside the crate: a
//! single logical Buy escalates from `Patient` to `Panic` as the market
//! walks away from it, then gets a fill once a later quote catches up.

use rust_decimal_macros::dec;
use swing_core::contract::MarketDataUpdate;
use swing_core::order::{OrderOwner, ZoneId};
use swing_core::side::{Action, Side};
use swing_core::{Contract, OrderStatus};
use swing_order::{AdaptiveOrder, ModeRetryCounts, ModeTimeLimits, Signal};

fn quote(bid: &str, ask: &str, last: &str) -> Contract {
    let mut c = Contract::new("WINFUT", 1, dec!(0.1), dec!(10)).unwrap();
    c.update_market(MarketDataUpdate {
        bid: Some(bid.parse().unwrap()),
        ask: Some(ask.parse().unwrap()),
        last: Some(last.parse().unwrap()),
        ..Default::default()
    })
    .unwrap();
    c
}

#[test]
fn order_escalates_through_every_mode_then_fills() {
    let mut order = AdaptiveOrder::new(
        OrderOwner::Zone(ZoneId(3)),
        Action::Buy,
        Side::Long,
        4,
        dec!(10.0),
        dec!(0.1),
        1,
        50,
        ModeRetryCounts::new(1, 1, 1, 1),
        ModeTimeLimits::default(),
    )
    .unwrap();

    let mut market = quote("9.9", "10.1", "10.0");
    let mut last_order_id = 0u64;

    // Patient quote, accept, then the market slips away enough to retry.
    match order.on_tick(&market).unwrap() {
        Signal::OpenOrder { qty, .. } => assert_eq!(qty, 4),
        other => panic!("expected OpenOrder, got {other:?}"),
    }
    last_order_id += 1;
    order.on_buysell_success(last_order_id, dec!(10.0));
    assert!(order.on_tick(&market).is_none());

    market = quote("10.0", "10.2", "10.15");
    assert!(matches!(order.on_tick(&market), Some(Signal::Cancel { .. })));
    order.on_order_status(OrderStatus::Cancelled);

    // Patient exhausted: re-quote lands in Accelerated.
    let signal = order.on_tick(&market).unwrap();
    assert!(matches!(signal, Signal::OpenOrder { .. }));
    last_order_id += 1;
    order.on_buysell_success(last_order_id, dec!(10.2));

    // A partial fill arrives, then the order closes on the next status push.
    order.on_trade_update(dec!(10.2), 4);
    order.on_order_status(OrderStatus::Closed);
    assert!(order.is_filled());
    assert_eq!(order.filled_qty(), 4);
    assert_eq!(order.on_tick(&market), Some(Signal::Close));
}
