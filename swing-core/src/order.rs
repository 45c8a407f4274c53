//! # Order and trade bookkeeping
//!
//! [`OrderOwner`] replaces free-form broker tag strings
//! (`'SWING_REVERSAL_SELL'`, `'SWING_STOP_long'`, ...) with a typed enum
//! whose [`std::fmt::Display`] impl still renders the legacy-shaped
//! string for the outbound broker tag field, so nothing observable to
//! the broker changes.

use crate::side::{Action, Side};
use chrono::{DateTime, Utc};
use derive_more::Display;
use rust_decimal::Decimal;

/// Opaque handle to a zone owned by a `SwingStateMachine`'s zone arena.
/// Carries no back-pointer to the strategy or the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("{_0}")]
pub struct ZoneId(pub usize);

/// Typed replacement for the original's free-form order tag strings. The
/// `Display` impl still renders the legacy-shaped broker tag string for
/// each variant, so nothing observable to the broker changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum OrderOwner {
    /// An order placed by a `GridOscillator` zone.
    #[display("SWING_ZONE_{_0}")]
    Zone(ZoneId),
    /// One leg (`0`-indexed) of a reversal's close-then-open pair.
    #[display("SWING_REVERSAL_{_0}")]
    Reversal(u8),
    /// One leg of a `RiskyInit` cut-down order.
    #[display("SWING_RISKY_INIT_{_0}")]
    RiskyInit(u8),
    /// The final liquidating order for `side` issued from the `Stop` state.
    #[display("SWING_STOP_{_0}")]
    Stop(Side),
}

/// Terminal and non-terminal lifecycle states of a broker order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Open,
    Closed,
    Rejected,
    Cancelled,
    RepeatCancel,
}

impl OrderStatus {
    /// `true` once the order will receive no further trade or status
    /// updates and its `OrderRecord` (and all its `TradeRecord`s) should be
    /// discarded.
    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Open)
    }
}

/// A single trade fill against an [`OrderRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRecord {
    pub trade_id: u64,
    pub order_id: u64,
    pub price: Decimal,
    pub qty: i64,
    pub create_time: DateTime<Utc>,
}

/// One outstanding broker order, owned by the strategy that placed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub order_id: u64,
    pub create_time: DateTime<Utc>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub action: Action,
    pub side: Side,
    pub price: Decimal,
    pub qty: i64,
    pub owner: OrderOwner,
    pub status: OrderStatus,
    pub filled_qty: i64,
    pub filled_price: Decimal,
    pub trade_ids: Vec<u64>,
}

impl OrderRecord {
    pub fn new(
        order_id: u64,
        create_time: DateTime<Utc>,
        action: Action,
        side: Side,
        price: Decimal,
        qty: i64,
        owner: OrderOwner,
    ) -> Self {
        Self {
            order_id,
            create_time,
            expiration_time: None,
            action,
            side,
            price,
            qty,
            owner,
            status: OrderStatus::Open,
            filled_qty: 0,
            filled_price: Decimal::ZERO,
            trade_ids: Vec::new(),
        }
    }

    /// The free-form broker-facing tag string for this order, rendered
    /// from its typed [`OrderOwner`].
    pub fn tag(&self) -> String {
        self.owner.to_string()
    }

    /// Apply a fill, maintaining the qty-weighted mean `filled_price`.
    /// Trades for an order that would overfill it are clamped to the
    /// remaining open quantity.
    pub fn record_trade(&mut self, trade: &TradeRecord) {
        let remaining = self.qty - self.filled_qty;
        let qty_trade = trade.qty.min(remaining.max(0));
        if qty_trade < trade.qty {
            tracing::warn!(
                order_id = self.order_id,
                trade_id = trade.trade_id,
                requested = trade.qty,
                applied = qty_trade,
                "clamping overfilling trade to remaining open quantity"
            );
        }
        if qty_trade <= 0 {
            return;
        }
        let new_filled = self.filled_qty + qty_trade;
        self.filled_price = (self.filled_price * Decimal::from(self.filled_qty)
            + trade.price * Decimal::from(qty_trade))
            / Decimal::from(new_filled);
        self.filled_qty = new_filled;
        self.trade_ids.push(trade.trade_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order() -> OrderRecord {
        OrderRecord::new(
            1,
            Utc::now(),
            Action::Buy,
            Side::Long,
            dec!(10.0),
            5,
            OrderOwner::Zone(ZoneId(0)),
        )
    }

    #[test]
    fn owner_renders_legacy_style_tag() {
        assert_eq!(OrderOwner::Stop(Side::Long).to_string(), "SWING_STOP_long");
        assert_eq!(OrderOwner::Reversal(0).to_string(), "SWING_REVERSAL_0");
    }

    #[test]
    fn record_trade_maintains_weighted_mean_invariant() {
        let mut o = order();
        o.record_trade(&TradeRecord {
            trade_id: 1,
            order_id: 1,
            price: dec!(10.0),
            qty: 2,
            create_time: Utc::now(),
        });
        o.record_trade(&TradeRecord {
            trade_id: 2,
            order_id: 1,
            price: dec!(10.2),
            qty: 3,
            create_time: Utc::now(),
        });
        assert_eq!(o.filled_qty, 5);
        assert!(o.filled_qty <= o.qty);
        // (10.0*2 + 10.2*3) / 5 = 10.12
        assert_eq!(o.filled_price, dec!(10.12));
    }

    #[test]
    fn record_trade_clamps_overfill() {
        let mut o = order();
        o.record_trade(&TradeRecord {
            trade_id: 1,
            order_id: 1,
            price: dec!(10.0),
            qty: 9,
            create_time: Utc::now(),
        });
        assert_eq!(o.filled_qty, o.qty);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!OrderStatus::Open.is_terminal());
        assert!(OrderStatus::Closed.is_terminal());
        assert!(OrderStatus::RepeatCancel.is_terminal());
    }
}
