//! Splits one logical order into a closing (sell-existing) leg and an
//! opening (buy-fresh) leg against the available position on each side.
//! Grounded on `original_source/strategy.py::calc_order_params`.

use rust_decimal::Decimal;
use swing_core::side::{Action, Side};

/// One leg of a (possibly) split order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLeg<Tag> {
    pub action: Action,
    pub side: Side,
    pub price: Decimal,
    pub qty: i64,
    pub tag: Tag,
}

/// The result of splitting a requested `(action, side, qty)` order against
/// the position currently available to close on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitResult<Tag> {
    pub sell_leg: OrderLeg<Tag>,
    pub buy_leg: OrderLeg<Tag>,
    pub position_available: Option<i64>,
    pub position_available_reverse: Option<i64>,
    /// `true` when both legs carry non-zero quantity — the caller must
    /// submit them as two separate broker orders and wait for both to
    /// settle before treating the zone as free again.
    pub is_split: bool,
}

/// Splits `qty` of `action` on `side` into a sell leg (closing `side`, or
/// the reverse side if `action` is `Buy`) and a buy leg, preferring to
/// close existing position before opening new exposure.
///
/// `position_available`/`position_available_reverse` are the open
/// quantities available to close on `side` and its opposite,
/// respectively. `None` means "no position tracked" — skip the split and
/// route the whole order to the natural leg for `action`.
pub fn calc_order_params<Tag: Copy>(
    action: Action,
    side: Side,
    price: Decimal,
    qty: i64,
    tag: Tag,
    position_available: Option<i64>,
    position_available_reverse: Option<i64>,
) -> SplitResult<Tag> {
    let reverse_side = side.opposite();
    let sell_side = if action == Action::Sell { side } else { reverse_side };
    let buy_side = if action == Action::Sell { reverse_side } else { side };

    let (sell_qty, buy_qty, position_available, position_available_reverse) =
        match (action, position_available, position_available_reverse) {
            (Action::Sell, None, reverse) => (qty, 0, None, reverse),
            (Action::Buy, avail, None) => (0, qty, avail, None),
            (Action::Sell, Some(avail), reverse) => {
                let sell_qty = qty.min(avail);
                let buy_qty = (qty - avail).max(0);
                (sell_qty, buy_qty, Some(avail - sell_qty), reverse)
            }
            (Action::Buy, avail, Some(avail_reverse)) => {
                let sell_qty = qty.min(avail_reverse);
                let buy_qty = (qty - avail_reverse).max(0);
                (sell_qty, buy_qty, avail, Some(avail_reverse - sell_qty))
            }
        };

    SplitResult {
        sell_leg: OrderLeg {
            action: Action::Sell,
            side: sell_side,
            price,
            qty: sell_qty,
            tag,
        },
        buy_leg: OrderLeg {
            action: Action::Buy,
            side: buy_side,
            price,
            qty: buy_qty,
            tag,
        },
        position_available,
        position_available_reverse,
        is_split: sell_qty > 0 && buy_qty > 0,
    }
}
