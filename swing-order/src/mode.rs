//! Pricing-aggressiveness modes and the per-construction retry-count stack.

use std::fmt;

/// Ordered least-to-most aggressive. `Ord` reflects exactly that ordering,
/// so `Mode::Patient < Mode::Panic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mode {
    Patient,
    Accelerated,
    Urgent,
    Panic,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Patient => "patient",
            Mode::Accelerated => "accelerated",
            Mode::Urgent => "urgent",
            Mode::Panic => "panic",
        };
        write!(f, "{s}")
    }
}

/// Per-mode retry counts supplied at construction. Modes whose count is
/// `0` are stripped before the stack is consumed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeRetryCounts {
    pub patient: u32,
    pub accelerated: u32,
    pub urgent: u32,
    pub panic: u32,
}

impl ModeRetryCounts {
    pub fn new(patient: u32, accelerated: u32, urgent: u32, panic: u32) -> Self {
        Self {
            patient,
            accelerated,
            urgent,
            panic,
        }
    }

    /// Build the consumption order (most aggressive first, least
    /// aggressive last) with zero-retry modes already stripped. The
    /// *last* entry is the active one — `on_buysell_success` pops from the
    /// back, which is exactly "consumed top-to-bottom starting from the
    /// least aggressive that has retries left".
    pub(crate) fn into_stack(self) -> Vec<(Mode, u32)> {
        [
            (Mode::Panic, self.panic),
            (Mode::Urgent, self.urgent),
            (Mode::Accelerated, self.accelerated),
            (Mode::Patient, self.patient),
        ]
        .into_iter()
        .filter(|(_, retries)| *retries > 0)
        .collect()
    }
}
