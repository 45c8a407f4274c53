#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::too_many_arguments)]

//! # 🔌 swing-router — event plumbing around the strategy core
//!
//! Everything that sits between a broker/bus integration and
//! `swing-strategy`'s `SwingStateMachine`: the [`event`] vocabulary
//! the strategy core actually speaks on the wire, the [`session`]
//! control flags a background supervisor flips, the [`calendar`]
//! collaborator the strategy core needs but cannot own, structured
//! [`logging`] setup, and the [`router::EventRouter`] that ties all of
//! it to one `dispatch` entry point. Grounded on `tucano-core::engine`'s
//! event-driven core wrapped by `tucano`'s facade re-exports.

pub mod calendar;
pub mod event;
pub mod logging;
pub mod router;
pub mod session;

pub use calendar::{AlwaysOpenCalendar, TradingCalendar};
pub use event::{AckedOrder, BuySellResult, CancelType, InboundEvent, OutboundEvent, RawOrderStatus};
pub use logging::{init_json_logging, init_logging};
pub use router::EventRouter;
pub use session::SessionControl;
