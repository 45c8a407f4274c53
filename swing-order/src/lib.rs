#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::too_many_arguments)]

//! # 🎯 swing-order — the AdaptiveOrder escalation state machine
//!
//! Walks a single logical order through increasingly aggressive pricing
//! modes (patient → accelerated → urgent → panic) to minimize timing risk
//! while bounding slippage to a configured `price_bound`. Grounded
//! directly on `original_source/advanced_orders.py::AdaptiveOrder`.

pub mod adaptive_order;
pub mod mode;

pub use adaptive_order::{AdaptiveOrder, ModeTimeLimits, Signal};
pub use mode::{Mode, ModeRetryCounts};
