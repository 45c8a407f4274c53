//! Black-box exercise of `EventRouter::dispatch`, acting as a stand-in
//! broker: feeds market data, accepts whatever orders come back, and
//! confirms the router carries a fill through to a terminal order status
//! without panicking.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use swing_core::side::Action;
use swing_core::Contract;
use swing_router::{AckedOrder, BuySellResult, EventRouter, InboundEvent, OutboundEvent, RawOrderStatus};
use swing_strategy::{SwingConfig, ZoneName, ZoneOffset};

fn config() -> SwingConfig {
    SwingConfig {
        direction: swing_core::side::Side::Long,
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

fn tick(symbol: &str, bid: Decimal, ask: Decimal, last: Decimal) -> InboundEvent {
    InboundEvent::MarketData {
        symbol: symbol.to_string(),
        last: Some(last),
        bid: Some(bid),
        ask: Some(ask),
        bid_vol: Some(dec!(10)),
        ask_vol: Some(dec!(10)),
        low_limit: Some(dec!(50)),
        high_limit: Some(dec!(150)),
        unit_size: None,
        tick_size: None,
    }
}

#[test]
fn a_session_never_trades_before_start_is_called() {
    let contract = Contract::new("WINFUT", 1, dec!(0.1), dec!(10)).unwrap();
    let mut router = EventRouter::new(contract, config(), dec!(100_000));
    let out = router.dispatch(tick("WINFUT", dec!(99.9), dec!(100.1), dec!(100.0)));
    assert!(out.is_empty());
}

#[test]
fn accepted_fills_flow_through_to_a_terminal_order_without_panicking() {
    let contract = Contract::new("WINFUT", 1, dec!(0.1), dec!(10)).unwrap();
    let mut router = EventRouter::new(contract, config(), dec!(100_000));
    router.start();

    let mut order_id = 0u64;
    for last in [dec!(99.0), dec!(100.0), dec!(100.5), dec!(101.0), dec!(99.5)] {
        let outbound = router.dispatch(tick("WINFUT", last - dec!(0.1), last + dec!(0.1), last));
        for event in outbound {
            let (action, side, price, qty, tag, response) = match event {
                OutboundEvent::Buy { side, price, qty, tag } => {
                    order_id += 1;
                    let acked = AckedOrder {
                        order_id,
                        action: Action::Buy,
                        side,
                        price,
                        qty,
                    };
                    let response = BuySellResult::Buy {
                        tag: tag.clone(),
                        accept_flag: true,
                        buy_orders: vec![acked],
                    };
                    (Action::Buy, side, price, qty, tag, response)
                }
                OutboundEvent::Sell { side, price, qty, tag } => {
                    order_id += 1;
                    let acked = AckedOrder {
                        order_id,
                        action: Action::Sell,
                        side,
                        price,
                        qty,
                    };
                    let response = BuySellResult::Sell {
                        tag: tag.clone(),
                        accept_flag: true,
                        sell_orders: vec![acked],
                    };
                    (Action::Sell, side, price, qty, tag, response)
                }
                OutboundEvent::Cancel { .. } => continue,
            };
            let _ = (action, side, tag);

            router.dispatch(InboundEvent::BuySellResponse(response));
            router.dispatch(InboundEvent::Trade {
                order_id,
                trade_id: order_id,
                price,
                qty,
                create_time: chrono::Utc::now(),
            });
            router.dispatch(InboundEvent::OrderStatus {
                order_id,
                status: RawOrderStatus::Closed,
            });
        }
    }
    // Never panicked, and the session is still under our control.
    assert!(router.session().is_active() || router.is_finished());
}
