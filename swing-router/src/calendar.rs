//! Market-hours calendar collaborator. SPEC_FULL.md's Open Question
//! decision on `if_market_open`: kept as a trait with no provided default,
//! since a real implementation must consult the instrument's trading-hours
//! calendar — an external collaborator, not something this crate can know.

use chrono::{DateTime, Utc};

pub trait TradingCalendar {
    fn is_market_open(&self, at: DateTime<Utc>) -> bool;
}

/// Stand-in calendar that always reports the market open. This mirrors
/// the original's `if_market_open` stub exactly and is not fit for
/// production use — a real integration must supply its own
/// [`TradingCalendar`] backed by the instrument's actual session hours.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOpenCalendar;

impl TradingCalendar for AlwaysOpenCalendar {
    fn is_market_open(&self, _at: DateTime<Utc>) -> bool {
        true
    }
}
