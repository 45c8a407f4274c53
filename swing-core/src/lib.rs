#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::too_many_arguments)]

//! # 🧮 swing-core — shared types for the swing-trading control plane
//!
//! Side/Action primitives, the [`Contract`] market snapshot, the
//! [`OrderRecord`]/[`TradeRecord`] broker-order bookkeeping, the pure
//! position-accounting functions in [`position_math`], and the aggregate
//! [`error::SwingError`] type shared by every other crate in the workspace.
//!
//! This crate has no async runtime dependency and performs no I/O: every
//! mutation here is a plain, synchronous function so it can be driven from
//! a single-threaded event-handler context without ever suspending.

pub mod contract;
pub mod error;
pub mod order;
pub mod position_math;
pub mod side;

pub use contract::Contract;
pub use error::SwingError;
pub use order::{OrderOwner, OrderRecord, OrderStatus, TradeRecord};
pub use position_math::{update_one_way, update_two_way};
pub use side::{Action, Side, SideMap};
