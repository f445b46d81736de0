//! Error Types for the Sensor Stream Aggregator
//!
//! ## Design Philosophy
//!
//! The aggregator sits between a radio link and a growing dataset, so its
//! errors follow a few rules:
//!
//! 1. **Small Size**: Every variant is a handful of bytes. Errors are created
//!    in the notification hot path and must be cheap to return and to count.
//!
//! 2. **No Heap Allocation**: Error payloads are inline — no `String`, only
//!    `&'static str` reasons and integers.
//!
//! 3. **Copy Semantics**: All error types implement `Copy` so they can be
//!    returned and recorded without move gymnastics.
//!
//! 4. **Terminal at the boundary**: None of these errors propagate back to
//!    the connection collaborator. A failed notification is dropped, counted
//!    and logged; the stream keeps flowing. See
//!    [`Aggregator::on_notification`](crate::aggregator::Aggregator::on_notification).
//!
//! ## Error Categories
//!
//! ### Protocol mismatches
//! - [`RegistryError::UnknownChannel`]: a notification arrived on a channel
//!   the table does not know. This is a firmware/app contract violation, not
//!   a transient fault, and is surfaced through a dedicated counter.
//! - The remaining [`RegistryError`] variants reject an invalid channel
//!   table at construction time.
//!
//! ### Corrupt samples
//! - [`DecodeError::TruncatedPayload`]: binary payload shorter than its rule
//!   requires.
//! - [`DecodeError::MalformedText`]: text payload that is not UTF-8, shorter
//!   than its sub-timestamp prefix, or otherwise unusable.
//!
//! ### Programming defects
//! - [`SeriesError::ConcurrentMutation`]: the store's label index and entry
//!   list disagree. This can only happen if the one-call-at-a-time
//!   serialization discipline is broken; it is debug-asserted rather than
//!   recovered from.

use thiserror_no_std::Error;

/// Result alias for operations that can fail anywhere in the aggregation path.
pub type AggregateResult<T> = Result<T, AggregateError>;

/// Channel table errors.
///
/// `UnknownChannel` is the only variant produced at runtime; the rest reject
/// a malformed table when it is built.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Channel id is not in the table — firmware/app protocol mismatch
    #[error("channel id is not in the table")]
    UnknownChannel,

    /// Table has no tick channel; readings could never be correlated
    #[error("table designates no tick channel")]
    NoTickChannel,

    /// Table designates more than one tick channel
    #[error("table designates more than one tick channel")]
    DuplicateTickChannel,

    /// Two table entries share a channel id
    #[error("duplicate channel id {0}")]
    DuplicateChannel(&'static str),

    /// Two table entries map to the same sensor label
    #[error("label {0} is mapped by more than one channel")]
    DuplicateLabel(&'static str),
}

/// Payload decode errors. One corrupt sample, never fatal.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Binary payload shorter than the rule's fixed width
    #[error("payload truncated: need {needed} bytes, got {got}")]
    TruncatedPayload {
        /// Bytes the decode rule requires
        needed: usize,
        /// Bytes actually received
        got: usize,
    },

    /// Text payload that cannot be split into sub-timestamp and value
    #[error("malformed text payload: {reason}")]
    MalformedText {
        /// What made the text unusable
        reason: &'static str,
    },
}

/// Series store invariant violations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesError {
    /// Label index and entry list disagree — broken serialization discipline
    #[error("series index out of sync with entries; interleaved mutation?")]
    ConcurrentMutation,
}

/// Union of everything that can go wrong while ingesting one notification.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateError {
    /// Channel resolution failed
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),

    /// Payload decode failed
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),

    /// Series store integrity check failed
    #[error("series: {0}")]
    Series(#[from] SeriesError),
}

#[cfg(feature = "defmt")]
impl defmt::Format for RegistryError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::UnknownChannel => defmt::write!(fmt, "unknown channel"),
            Self::NoTickChannel => defmt::write!(fmt, "no tick channel"),
            Self::DuplicateTickChannel => defmt::write!(fmt, "duplicate tick channel"),
            Self::DuplicateChannel(id) => defmt::write!(fmt, "duplicate channel {}", id),
            Self::DuplicateLabel(label) => defmt::write!(fmt, "duplicate label {}", label),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DecodeError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::TruncatedPayload { needed, got } =>
                defmt::write!(fmt, "truncated payload: need {}, got {}", needed, got),
            Self::MalformedText { reason } =>
                defmt::write!(fmt, "malformed text: {}", reason),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SeriesError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ConcurrentMutation => defmt::write!(fmt, "series index desync"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AggregateError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Registry(e) => defmt::write!(fmt, "registry: {}", e),
            Self::Decode(e) => defmt::write!(fmt, "decode: {}", e),
            Self::Series(e) => defmt::write!(fmt, "series: {}", e),
        }
    }
}
