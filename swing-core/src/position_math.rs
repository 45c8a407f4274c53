//! # Position accounting primitives
//!
//! Two pure functions, with no side effects and no knowledge of contracts,
//! orders, or brokers: [`update_one_way`] tracks gross per-side exposure
//! (used for margin-style one-way accounting), and [`update_two_way`]
//! tracks a single netted position and its realized gain. Grounded
//! directly on `original_source/strategy.py::update_position_avg_price`
//! and `update_position_avg_price_2way`.

use crate::side::{Action, Side, SideMap};
use rust_decimal::Decimal;

/// Update a one-way (gross, per-side) position and its cumulative moving
/// average price in place.
///
/// On `Action::Buy`, the CMA of `side` is updated to the qty-weighted
/// average of the existing position and the new trade, and `qty_trade` is
/// added to `qty[side]`. On `Action::Sell`, `qty_trade` is subtracted from
/// `qty[side]` (the CMA is left untouched by a sell) and the CMA is reset
/// to zero once that side's quantity reaches zero.
pub fn update_one_way(
    qty: &mut SideMap<i64>,
    cma: &mut SideMap<Decimal>,
    action: Action,
    side: Side,
    price: Decimal,
    qty_trade: i64,
) {
    match action {
        Action::Buy => {
            let prev_qty = qty[side];
            let new_qty = prev_qty + qty_trade;
            if new_qty != 0 {
                cma[side] = (cma[side] * Decimal::from(prev_qty) + price * Decimal::from(qty_trade))
                    / Decimal::from(new_qty);
            }
            qty[side] = new_qty;
        }
        Action::Sell => {
            qty[side] -= qty_trade;
            if qty[side] == 0 {
                cma[side] = Decimal::ZERO;
            }
        }
    }
}

/// Update a two-way (netted) position and its CMA price, returning the
/// `(new_cma, new_position, realized_gain)` triple.
///
/// `realized_gain` is unscaled by the contract's `unit` — the caller
/// multiplies. It is non-zero only when the trade reduces the magnitude of
/// an existing position (a full or partial close, including a flip's
/// closing leg).
pub fn update_two_way(
    cma: Decimal,
    position: i64,
    action: Action,
    side: Side,
    price: Decimal,
    qty_trade: i64,
) -> (Decimal, i64, Decimal) {
    let signed_qty = qty_trade * action.effective_sign(side);
    let new_position = position + signed_qty;

    let new_cma = if new_position == 0 {
        Decimal::ZERO
    } else if position == 0 || position.signum() != new_position.signum() {
        // Flip, or opening from flat.
        price
    } else if position.signum() == signed_qty.signum() {
        // Adding to the existing position.
        (cma * Decimal::from(position) + price * Decimal::from(signed_qty))
            / Decimal::from(new_position)
    } else {
        // Partial close, same side: CMA is unchanged.
        cma
    };

    let is_reducing = position != 0 && position.signum() != signed_qty.signum();
    let realized_gain = if is_reducing {
        let closed_qty = position.abs().min(signed_qty.abs());
        (price - cma) * Decimal::from(position.signum()) * Decimal::from(closed_qty)
    } else {
        Decimal::ZERO
    };

    (new_cma, new_position, realized_gain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn one_way_buy_updates_cma_then_sell_leaves_it_until_flat() {
        let mut qty = SideMap::new(0i64, 0i64);
        let mut cma = SideMap::new(Decimal::ZERO, Decimal::ZERO);

        update_one_way(&mut qty, &mut cma, Action::Buy, Side::Long, dec!(10), 3);
        assert_eq!(qty[Side::Long], 3);
        assert_eq!(cma[Side::Long], dec!(10));

        update_one_way(&mut qty, &mut cma, Action::Buy, Side::Long, dec!(12), 2);
        assert_eq!(qty[Side::Long], 5);
        assert_eq!(cma[Side::Long], dec!(10.8));

        update_one_way(&mut qty, &mut cma, Action::Sell, Side::Long, dec!(999), 5);
        assert_eq!(qty[Side::Long], 0);
        assert_eq!(cma[Side::Long], Decimal::ZERO);
    }

    #[test]
    fn two_way_flip_gain_matches_worked_example() {
        let (cma, pos, gain) = update_two_way(Decimal::ZERO, 0, Action::Buy, Side::Long, dec!(10), 3);
        assert_eq!((cma, pos, gain), (dec!(10), 3, Decimal::ZERO));

        let (cma, pos, gain) = update_two_way(cma, pos, Action::Buy, Side::Long, dec!(12), 2);
        assert_eq!((cma, pos, gain), (dec!(10.8), 5, Decimal::ZERO));

        let (cma, pos, gain) = update_two_way(cma, pos, Action::Sell, Side::Long, dec!(15), 4);
        assert_eq!(cma, dec!(10.8));
        assert_eq!(pos, 1);
        assert_eq!(gain, dec!(16.8));

        let (cma, pos, gain) = update_two_way(cma, pos, Action::Sell, Side::Long, dec!(9), 2);
        assert_eq!(cma, dec!(9));
        assert_eq!(pos, -1);
        assert_eq!(gain, dec!(-1.8));
    }

    #[test]
    fn realized_gain_restricted_to_reducing_portion_sums_to_sell_minus_buy_cash() {
        // Buy 5@10, sell 3@12: closes 3 units at (12-10)=2 gain each = 6.
        let (cma, pos, gain) = update_two_way(Decimal::ZERO, 0, Action::Buy, Side::Long, dec!(10), 5);
        assert_eq!(gain, Decimal::ZERO);
        let (_cma, pos, gain) = update_two_way(cma, pos, Action::Sell, Side::Long, dec!(12), 3);
        assert_eq!(pos, 2);
        assert_eq!(gain, dec!(6));
    }

    #[test]
    fn opening_a_position_never_realizes_gain() {
        let (_cma, _pos, gain) =
            update_two_way(Decimal::ZERO, 0, Action::Sell, Side::Short, dec!(20), 4);
        assert_eq!(gain, Decimal::ZERO);
    }
}
