//! Typed strategy configuration, deserialized via `serde` from the
//! recognized config keys. Parsing/IO of the surrounding config file is
//! an external collaborator's job — only the typed shape and its
//! validation live here, following a convention of typed config structs
//! over loose string-keyed maps.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use swing_core::error::SwingError;
use swing_core::side::Side;

/// One of the four fixed zone names laid out end-to-end by
/// `SwingStateMachine`'s zone plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneName {
    Net,
    Inc,
    Osc,
    Dec,
}

impl ZoneName {
    pub const ALL: [ZoneName; 4] = [ZoneName::Net, ZoneName::Inc, ZoneName::Osc, ZoneName::Dec];

    pub fn index(self) -> usize {
        match self {
            ZoneName::Net => 0,
            ZoneName::Inc => 1,
            ZoneName::Osc => 2,
            ZoneName::Dec => 3,
        }
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index]
    }

    pub fn is_net(self) -> bool {
        self == ZoneName::Net
    }

    pub fn is_dec(self) -> bool {
        self == ZoneName::Dec
    }
}

/// Per-zone open/close offset quantities, pre-scaled by the base
/// quantity at config time (`qa * OPEN_OFFSET_VOLUME[zone]` in the
/// original).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZoneOffset {
    pub open: i64,
    pub close: i64,
}

/// Strategy-level user parameters, deserialized from the recognized
/// config keys: `OPEN_PRICE`, `OPEN_VOLUME`, `BASE_VOLUME`,
/// `TRAIL_PRICE_TICKS`, `STOPWIN_BASE_PERCENTAGE`, `TRAIL_PERCENTAGE`,
/// `OPEN_OFFSET_VOLUME`/`CLOSE_OFFSET_VOLUME`, `START_ZONE`,
/// `TREND_REVERSAL_PRICE_TRAIL_RATIO`, `MIN_OSC_HEIGHT`,
/// `RISKY_ZONE_ACTIVATE_LOSS_RATIO`, `DIRECTION`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwingConfig {
    pub direction: Side,
    pub start_zone: ZoneName,
    /// Reference open price (`p0`).
    pub open_price: Decimal,
    /// Price-trailing ratio indicating trend reversal (`pls`).
    pub reversal_trail_ratio: Decimal,
    /// Minimum swing price height (`p_h`).
    pub min_osc_height: Decimal,
    /// Universal price-trailing amount in ticks (`p_t`).
    pub trail_price_ticks: Decimal,
    /// Max position quantity (`q_max`).
    pub open_volume: i64,
    /// Oscillatory base quantity (`qa`).
    pub base_volume: i64,
    pub offsets: [ZoneOffset; 4],
    /// Risky-zone activation loss ratio (`g_risky`).
    pub risky_zone_activate_loss_ratio: Decimal,
    /// Profit gain starting ratio for trailing stop (`g0`).
    pub stopwin_base_percentage: Decimal,
    /// Profit gain trailing ratio for trailing stop (`gt`).
    pub trail_percentage: Decimal,
}

impl SwingConfig {
    pub fn offset(&self, zone: ZoneName) -> ZoneOffset {
        self.offsets[zone.index()]
    }

    /// Rejects parameter combinations the strategy cannot safely run
    /// with (non-positive sizing, out-of-range ratios).
    pub fn validate(&self) -> Result<(), SwingError> {
        if self.open_volume <= 0 {
            return Err(SwingError::MalformedEvent("OPEN_VOLUME"));
        }
        if self.base_volume <= 0 {
            return Err(SwingError::MalformedEvent("BASE_VOLUME"));
        }
        if self.min_osc_height <= Decimal::ZERO {
            return Err(SwingError::MalformedEvent("MIN_OSC_HEIGHT"));
        }
        if self.stopwin_base_percentage <= Decimal::ZERO || self.trail_percentage <= Decimal::ZERO {
            return Err(SwingError::MalformedEvent("STOPWIN_BASE_PERCENTAGE"));
        }
        Ok(())
    }
}
