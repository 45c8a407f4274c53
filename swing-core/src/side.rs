//! Side/Action primitives and the small helpers that stand in for
//! `[long, short]`-indexed 2-tuples and hand-rolled sign arithmetic.

use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A position side: long or short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
pub enum Side {
    #[display("long")]
    Long,
    #[display("short")]
    Short,
}

impl Side {
    /// +1 for Long, -1 for Short. Replaces `d = 1 - 2*long_short`.
    pub fn sign(self) -> i64 {
        match self {
            Side::Long => 1,
            Side::Short => -1,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    /// The more favorable of `a` and `b` for this side: the higher price
    /// favors Long (you'd rather sell high / your book is worth more),
    /// the lower price favors Short. Replaces `(min, max)[long_short]`.
    pub fn favor(self, a: Decimal, b: Decimal) -> Decimal {
        match self {
            Side::Long => a.max(b),
            Side::Short => a.min(b),
        }
    }

    /// The less favorable of `a` and `b` for this side. Replaces
    /// `(max, min)[long_short]`.
    pub fn worsen(self, a: Decimal, b: Decimal) -> Decimal {
        match self {
            Side::Long => a.min(b),
            Side::Short => a.max(b),
        }
    }

    /// Index into an `(ask, bid)`-style pair by side: Long crosses at ask,
    /// Short crosses at bid.
    pub fn crossing_price(self, bid: Decimal, ask: Decimal) -> Decimal {
        match self {
            Side::Long => ask,
            Side::Short => bid,
        }
    }
}

/// A broker order action: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
pub enum Action {
    #[display("buy")]
    Buy,
    #[display("sell")]
    Sell,
}

impl Action {
    /// The effective sign of this action with respect to `side`: +1 if the
    /// action opens `side` (Buy-Long, Sell-Short), -1 if it closes `side`.
    pub fn effective_sign(self, side: Side) -> i64 {
        let opens = matches!(
            (self, side),
            (Action::Buy, Side::Long) | (Action::Sell, Side::Short)
        );
        if opens {
            1
        } else {
            -1
        }
    }

    /// `true` if this action, applied to `side`, opens (adds to) the
    /// position rather than closing it.
    pub fn opens(self, side: Side) -> bool {
        self.effective_sign(side) == 1
    }
}

/// A `[T; 2]` indexed by [`Side`], replacing the original's
/// `[long_value, short_value]` lists indexed by `0`/`1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SideMap<T> {
    pub long: T,
    pub short: T,
}

impl<T> SideMap<T> {
    pub fn new(long: T, short: T) -> Self {
        Self { long, short }
    }

    pub fn splat(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            long: value.clone(),
            short: value,
        }
    }

    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Long => &self.long,
            Side::Short => &self.short,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Long => &mut self.long,
            Side::Short => &mut self.short,
        }
    }
}

impl<T> Index<Side> for SideMap<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        self.get(side)
    }
}

impl<T> IndexMut<Side> for SideMap<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        self.get_mut(side)
    }
}
