//! # Inbound / outbound event vocabulary
//!
//! Tagged unions replacing the original's duck-typed event bus (SPEC_FULL.md
//! §9, REDESIGN FLAG 1). [`InboundEvent`] is everything the broker gateway
//! or event bus can hand to [`crate::router::EventRouter::dispatch`];
//! [`OutboundEvent`] is everything the router can hand back for the
//! gateway to actually send.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use swing_core::order::{OrderOwner, OrderStatus};
use swing_core::side::{Action, Side};

/// Raw order-status values recognized on the wire (SPEC_FULL.md §6).
/// `Executed` is folded into `Closed` per the spec; the remaining
/// non-terminal values (`Open`, `CancelSubmitted`, `PartialClosed`,
/// `NoCancel`) never change an [`OrderStatus`] — the order stays `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawOrderStatus {
    Open,
    Closed,
    Executed,
    Rejected,
    Cancelled,
    CancelSubmitted,
    PartialClosed,
    NoCancel,
    RepeatCancel,
}

impl RawOrderStatus {
    /// Maps the wire-level status down to the five-variant
    /// [`OrderStatus`] that `OrderRecord` tracks. `None` means "no
    /// change" — the caller leaves the record's current status alone.
    pub fn to_order_status(self) -> Option<OrderStatus> {
        match self {
            RawOrderStatus::Closed | RawOrderStatus::Executed => Some(OrderStatus::Closed),
            RawOrderStatus::Rejected => Some(OrderStatus::Rejected),
            RawOrderStatus::Cancelled => Some(OrderStatus::Cancelled),
            RawOrderStatus::RepeatCancel => Some(OrderStatus::RepeatCancel),
            RawOrderStatus::Open
            | RawOrderStatus::CancelSubmitted
            | RawOrderStatus::PartialClosed
            | RawOrderStatus::NoCancel => None,
        }
    }
}

/// One broker-acknowledged order leg, as echoed back on a [`BuySellResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckedOrder {
    pub order_id: u64,
    pub action: Action,
    pub side: Side,
    pub price: Decimal,
    pub qty: i64,
}

/// The broker's synchronous response to an outbound `Buy`/`Sell`/`Cancel`
/// request. `tag` round-trips the [`OrderOwner::to_string`] rendering
/// carried on the originating [`OutboundEvent`] so the router can
/// correlate the response back to the sub-machine that asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuySellResult {
    Buy {
        tag: String,
        accept_flag: bool,
        buy_orders: Vec<AckedOrder>,
    },
    Sell {
        tag: String,
        accept_flag: bool,
        sell_orders: Vec<AckedOrder>,
    },
}

/// Everything the strategy core can receive from the outside world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A top-of-book / instrument-spec snapshot update. `unit_size` and
    /// `tick_size` are `None` for "use the cached value", replacing the
    /// original's `-1.0` sentinel (SPEC_FULL.md §3, §9 REDESIGN FLAG 5).
    MarketData {
        symbol: String,
        last: Option<Decimal>,
        bid: Option<Decimal>,
        ask: Option<Decimal>,
        bid_vol: Option<Decimal>,
        ask_vol: Option<Decimal>,
        low_limit: Option<Decimal>,
        high_limit: Option<Decimal>,
        unit_size: Option<Decimal>,
        tick_size: Option<Decimal>,
    },
    /// A fill against one of the router's own outstanding orders.
    Trade {
        order_id: u64,
        trade_id: u64,
        price: Decimal,
        qty: i64,
        create_time: DateTime<Utc>,
    },
    /// A lifecycle status update for one of the router's own orders.
    OrderStatus { order_id: u64, status: RawOrderStatus },
    /// Informational mark-to-market notification; logged, not acted on.
    ProfitChanged {
        portfolio_id: String,
        account_id: String,
        instrument_id: u64,
        price: Decimal,
    },
    /// The broker's synchronous response to a prior `Buy`/`Sell` request.
    BuySellResponse(BuySellResult),
    /// The broker's synchronous response to a prior `Cancel` request.
    CancelResponse { order_id: Option<u64>, accept_flag: bool },
}

/// The broad class of orders a `Cancel` targets (SPEC_FULL.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelType {
    All,
    Open,
    Close,
    StopLoss,
    Orders,
}

/// Everything the strategy core can hand back to the broker gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    Buy {
        side: Side,
        price: Decimal,
        qty: i64,
        tag: String,
    },
    Sell {
        side: Side,
        price: Decimal,
        qty: i64,
        tag: String,
    },
    Cancel {
        cancel_type: CancelType,
        order_ids: Option<Vec<u64>>,
    },
}

impl OutboundEvent {
    pub fn limit(action: Action, side: Side, price: Decimal, qty: i64, owner: OrderOwner) -> Self {
        let tag = owner.to_string();
        match action {
            Action::Buy => OutboundEvent::Buy { side, price, qty, tag },
            Action::Sell => OutboundEvent::Sell { side, price, qty, tag },
        }
    }

    pub fn cancel_order(order_id: u64) -> Self {
        OutboundEvent::Cancel {
            cancel_type: CancelType::Orders,
            order_ids: Some(vec![order_id]),
        }
    }

    pub fn cancel_all() -> Self {
        OutboundEvent::Cancel {
            cancel_type: CancelType::All,
            order_ids: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executed_folds_into_closed() {
        assert_eq!(RawOrderStatus::Executed.to_order_status(), Some(OrderStatus::Closed));
    }

    #[test]
    fn non_terminal_statuses_mean_no_change() {
        assert_eq!(RawOrderStatus::Open.to_order_status(), None);
        assert_eq!(RawOrderStatus::PartialClosed.to_order_status(), None);
        assert_eq!(RawOrderStatus::CancelSubmitted.to_order_status(), None);
        assert_eq!(RawOrderStatus::NoCancel.to_order_status(), None);
    }
}
