//! # Contract — instrument identity and market snapshot
//!
//! An immutable identity (symbol, instrument id) plus a mutable top-of-book
//! snapshot, quantized to the instrument's tick size, following a
//! snapshot-with-validated-setters convention.

use crate::error::SwingError;
use crate::side::{Side, SideMap};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Sentinel-free update to a [`Contract`]'s market snapshot. `None` on
/// `tick`/`unit` means "use the cached value", rather than relying on an
/// out-of-band sentinel value to mean the same thing.
#[derive(Debug, Clone, Default)]
pub struct MarketDataUpdate {
    pub last: Option<Decimal>,
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub bid_vol: Option<Decimal>,
    pub ask_vol: Option<Decimal>,
    pub low_limit: Option<Decimal>,
    pub high_limit: Option<Decimal>,
    pub unit: Option<Decimal>,
    pub tick: Option<Decimal>,
}

/// Instrument identity plus its mutable top-of-book snapshot.
#[derive(Debug, Clone)]
pub struct Contract {
    pub symbol: String,
    pub instrument_id: u64,
    tick: Decimal,
    unit: Decimal,
    decimals: u32,
    pub last: Option<Decimal>,
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub bid_vol: Option<Decimal>,
    pub ask_vol: Option<Decimal>,
    pub low_limit: Option<Decimal>,
    pub high_limit: Option<Decimal>,
    pub margin_fee: SideMap<Option<Decimal>>,
}

impl Contract {
    pub fn new(
        symbol: impl Into<String>,
        instrument_id: u64,
        tick: Decimal,
        unit: Decimal,
    ) -> Result<Self, SwingError> {
        if tick <= Decimal::ZERO {
            return Err(SwingError::InvalidTickSize(tick.to_string()));
        }
        if unit <= Decimal::ZERO {
            return Err(SwingError::InvalidContractUnit(unit.to_string()));
        }
        Ok(Self {
            symbol: symbol.into(),
            instrument_id,
            tick,
            decimals: decimals_from_tick(tick),
            unit,
            last: None,
            bid: None,
            ask: None,
            bid_vol: None,
            ask_vol: None,
            low_limit: None,
            high_limit: None,
            margin_fee: SideMap::splat(None),
        })
    }

    pub fn tick(&self) -> Decimal {
        self.tick
    }

    pub fn unit(&self) -> Decimal {
        self.unit
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// `round(round(price/tick)*tick, decimals)` — the fixed-point
    /// quantization every outbound price must satisfy.
    pub fn quantize(&self, price: Decimal) -> Decimal {
        let steps = (price / self.tick).round();
        (steps * self.tick).round_dp(self.decimals)
    }

    /// Apply an inbound `MarketData` update. Non-numeric or non-positive
    /// `tick`/`unit` are rejected (`InvalidTickSize`/`InvalidContractUnit`);
    /// the caller (`EventRouter`) skips the tick on error rather than
    /// propagating a panic. Invariants `bid <= ask` and
    /// `low_limit <= last <= high_limit` are checked only among the
    /// fields present after the update.
    pub fn update_market(&mut self, update: MarketDataUpdate) -> Result<(), SwingError> {
        if let Some(tick) = update.tick {
            if tick <= Decimal::ZERO {
                warn!(symbol = %self.symbol, %tick, "rejecting non-positive tick size");
                return Err(SwingError::InvalidTickSize(tick.to_string()));
            }
            self.tick = tick;
            self.decimals = decimals_from_tick(tick);
        }
        if let Some(unit) = update.unit {
            if unit <= Decimal::ZERO {
                warn!(symbol = %self.symbol, %unit, "rejecting non-positive contract unit");
                return Err(SwingError::InvalidContractUnit(unit.to_string()));
            }
            self.unit = unit;
        }

        let next_last = update.last.or(self.last);
        let next_bid = update.bid.or(self.bid);
        let next_ask = update.ask.or(self.ask);
        let next_low = update.low_limit.or(self.low_limit);
        let next_high = update.high_limit.or(self.high_limit);

        if let (Some(bid), Some(ask)) = (next_bid, next_ask) {
            if bid > ask {
                return Err(SwingError::PriceOutOfLimit {
                    price: bid,
                    low: ask,
                    high: ask,
                });
            }
        }
        if let Some(last) = next_last {
            if let Some(low) = next_low {
                if last < low {
                    return Err(SwingError::PriceOutOfLimit {
                        price: last,
                        low,
                        high: next_high.unwrap_or(last),
                    });
                }
            }
            if let Some(high) = next_high {
                if last > high {
                    return Err(SwingError::PriceOutOfLimit {
                        price: last,
                        low: next_low.unwrap_or(last),
                        high,
                    });
                }
            }
        }

        self.last = next_last;
        self.bid = next_bid;
        self.ask = next_ask;
        self.bid_vol = update.bid_vol.or(self.bid_vol);
        self.ask_vol = update.ask_vol.or(self.ask_vol);
        self.low_limit = next_low;
        self.high_limit = next_high;
        debug!(symbol = %self.symbol, last = ?self.last, bid = ?self.bid, ask = ?self.ask, "market snapshot updated");
        Ok(())
    }

    pub fn set_margin_fee(&mut self, side: Side, fee: Decimal) {
        self.margin_fee[side] = Some(fee);
    }

    pub fn margin_fee(&self, side: Side) -> Result<Decimal, SwingError> {
        self.margin_fee[side].ok_or(SwingError::InvalidMarginFee)
    }

    /// The midpoint of the current bid/ask, quantized. `None` until both
    /// sides of the book are known.
    pub fn mid(&self) -> Option<Decimal> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) => Some(self.quantize((bid + ask) / Decimal::TWO)),
            _ => None,
        }
    }
}

/// Number of fractional digits in `tick`, e.g. `0.1 -> 1`, `0.05 -> 2`.
/// Computed from the tick rather than stored independently, avoiding the
/// two-source-of-truth risk the original has between `tick` and a
/// separately-tracked `decimal` field.
pub fn decimals_from_tick(tick: Decimal) -> u32 {
    tick.normalize().scale()
}
