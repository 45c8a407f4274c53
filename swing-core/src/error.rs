//! # Error kinds
//!
//! Aggregate error type for the swing-trading control plane: one
//! `thiserror` enum covering every subsystem, in place of panics or
//! process exits. None of these are fatal on their own — callers skip
//! the tick, log and drop the event, or run the owning sub-machine's
//! fail callback. Only an explicit `stop()` deactivates a session.

use thiserror::Error;

/// Errors raised while updating a [`crate::Contract`] snapshot or
/// processing an inbound event against the strategy core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwingError {
    /// No cached margin/commission table is available yet for a side.
    #[error("no cached margin fee available for side")]
    InvalidMarginFee,

    /// `MarketData.tick_size` was non-numeric, zero, negative, or absent
    /// with no cached value to fall back on.
    #[error("invalid tick size: {0}")]
    InvalidTickSize(String),

    /// `MarketData.unit_size` was non-numeric, zero, negative, or absent
    /// with no cached value to fall back on.
    #[error("invalid contract unit: {0}")]
    InvalidContractUnit(String),

    /// An inbound event was missing a required field.
    #[error("malformed event: missing field `{0}`")]
    MalformedEvent(&'static str),

    /// A trade or status update referenced an `order_id` the core never
    /// recorded; it belongs to someone else and is silently ignored by the
    /// caller, but surfaced here so callers can choose to log it.
    #[error("unknown order id: {0}")]
    UnknownOrderId(u64),

    /// A buy/sell price fell outside `[low_limit, high_limit]`.
    #[error("price {price} out of limit [{low}, {high}]")]
    PriceOutOfLimit {
        price: rust_decimal::Decimal,
        low: rust_decimal::Decimal,
        high: rust_decimal::Decimal,
    },

    /// The broker reported the account had insufficient cash to open the
    /// requested order.
    #[error("insufficient cash for order")]
    InsufficientCash,

    /// The broker reported there was insufficient position to sell.
    #[error("insufficient position to sell")]
    InsufficientPositionToSell,

    /// The broker refused the order outright (`accept_flag = false`)
    /// without one of the more specific reasons above.
    #[error("broker refused order: {0}")]
    BrokerRefusal(String),

    /// Constructing an [`crate::order::OrderOwner`]-carrying sub-machine
    /// (e.g. an `AdaptiveOrder`) with an empty mode stack after stripping
    /// zero-retry modes. A mode stack with nothing left to retry has
    /// nothing to escalate through, so construction is rejected outright.
    #[error("adaptive order mode stack is empty after stripping zero-retry modes")]
    EmptyModeStack,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_non_empty() {
        let e = SwingError::InvalidTickSize("nan".into());
        assert!(!e.to_string().is_empty());
    }
}
