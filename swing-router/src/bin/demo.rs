//! Minimal demo wiring: builds a `Contract` and a `SwingConfig`, starts an
//! `EventRouter`, and feeds it a handful of synthetic market ticks and
//! fill events, printing whatever outbound events the strategy core
//! produces. Stands in for a real broker/bus integration — grounded on
//! `tucano`'s own top-level demo binaries, which wire a facade crate to a
//! toy event loop the same way.

use chrono::Utc;
use rust_decimal::Decimal;
use std::fs;
use std::str::FromStr;
use swing_core::Contract;
use swing_router::{AckedOrder, BuySellResult, EventRouter, InboundEvent, RawOrderStatus};
use swing_strategy::{SwingConfig, ZoneName, ZoneOffset};

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).expect("valid decimal literal")
}

fn demo_config() -> SwingConfig {
    SwingConfig {
        direction: swing_core::side::Side::Long,
        start_zone: ZoneName::Inc,
        open_price: d("100.00"),
        reversal_trail_ratio: d("0.05"),
        min_osc_height: d("1.00"),
        trail_price_ticks: d("2"),
        open_volume: 100,
        base_volume: 10,
        offsets: [ZoneOffset::default(); 4],
        risky_zone_activate_loss_ratio: d("0.10"),
        stopwin_base_percentage: d("0.05"),
        trail_percentage: d("0.30"),
    }
}

/// Loads a `SwingConfig` from a JSON file, falling back to the built-in
/// demo config if no path was given or the file can't be read/parsed.
fn load_config(path: Option<&str>) -> SwingConfig {
    let Some(path) = path else {
        return demo_config();
    };
    match fs::read_to_string(path).map(|raw| serde_json::from_str::<SwingConfig>(&raw)) {
        Ok(Ok(config)) => config,
        Ok(Err(err)) => {
            tracing::warn!(path, %err, "malformed config file, falling back to demo config");
            demo_config()
        }
        Err(err) => {
            tracing::warn!(path, %err, "couldn't read config file, falling back to demo config");
            demo_config()
        }
    }
}

fn main() {
    swing_router::init_logging();

    let config = load_config(std::env::args().nth(1).as_deref());
    config.validate().expect("demo config is internally consistent");
    tracing::debug!(
        config = %serde_json::to_string(&config).expect("SwingConfig always serializes"),
        "effective strategy config"
    );

    let contract = Contract::new("WINFUT", 1, d("0.5"), d("1")).expect("valid instrument spec");
    let mut router = EventRouter::new(contract, config, d("100000"));
    router.start();

    let ticks: &[(&str, &str, &str)] = &[
        ("99.5", "100.0", "100.0"),
        ("99.8", "100.3", "100.3"),
        ("100.2", "100.7", "100.7"),
        ("100.8", "101.3", "101.3"),
    ];

    for (bid, ask, last) in ticks {
        let outbound = router.dispatch(InboundEvent::MarketData {
            symbol: "WINFUT".to_string(),
            last: Some(d(last)),
            bid: Some(d(bid)),
            ask: Some(d(ask)),
            bid_vol: Some(d("50")),
            ask_vol: Some(d("50")),
            low_limit: Some(d("80")),
            high_limit: Some(d("120")),
            unit_size: None,
            tick_size: None,
        });

        for event in outbound {
            println!("outbound: {event:?}");
            if let swing_router::OutboundEvent::Buy { side, price, qty, tag } = &event {
                let order_id = 1;
                router.dispatch(InboundEvent::BuySellResponse(BuySellResult::Buy {
                    tag: tag.clone(),
                    accept_flag: true,
                    buy_orders: vec![AckedOrder {
                        order_id,
                        action: swing_core::side::Action::Buy,
                        side: *side,
                        price: *price,
                        qty: *qty,
                    }],
                }));
                router.dispatch(InboundEvent::Trade {
                    order_id,
                    trade_id: 1,
                    price: *price,
                    qty: *qty,
                    create_time: Utc::now(),
                });
                router.dispatch(InboundEvent::OrderStatus {
                    order_id,
                    status: RawOrderStatus::Closed,
                });
            }
        }
    }

    println!("session finished: {}", router.is_finished());
}
