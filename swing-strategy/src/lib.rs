#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::too_many_arguments)]

//! # 📈 swing-strategy — zone-based swing trading state machine
//!
//! [`GridOscillator`] turns tick updates into buy/sell intents against a
//! dynamically extensible price grid; [`SwingStateMachine`] lays four of
//! them end to end (`Net`/`Inc`/`Osc`/`Dec`) and orchestrates the session
//! lifetime across reversal, risky-mode sizing, and trailing exit. Grounded
//! directly on `original_source/grid_osc_strategy.py` and
//! `original_source/swing_strategy.py`.

pub mod config;
pub mod grid_oscillator;
pub mod order_split;
pub mod swing_state;

pub use config::{SwingConfig, ZoneName, ZoneOffset};
pub use grid_oscillator::{GridOscillator, GridOscillatorParams, ZoneState};
pub use order_split::{calc_order_params, OrderLeg, SplitResult};
pub use swing_state::{Intent, PositionView, SwingState, SwingStateMachine};
