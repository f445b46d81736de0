//! Notification Feeds — replay and synthetic event sources
//!
//! ## Overview
//!
//! The aggregator itself is push-based: the connection collaborator calls
//! [`Aggregator::on_notification`] once per received payload. This module
//! provides the pull side for everything that is *not* a live radio link:
//!
//! - [`MemoryFeed`] replays a recorded notification sequence, byte for byte,
//!   for regression tests and offline analysis of captured sessions.
//! - [`SyntheticFeed`] fabricates whole acquisition cycles against any
//!   channel table — one tick notification, then one reading per sensor
//!   channel — without a peripheral in sight. Deterministic by construction.
//!
//! Sources are polled with the `nb` non-blocking convention: `WouldBlock`
//! means nothing pending right now, `FeedError::Exhausted` means the source
//! is done for good.

use core::fmt::Write as _;

use thiserror_no_std::Error;

use crate::aggregator::Aggregator;
use crate::decode::DecodeRule;
use crate::registry::ChannelTable;

/// Longest channel id a feed can carry (a textual UUID)
pub const MAX_CHANNEL_ID: usize = 36;

/// Largest payload a feed can carry
pub const MAX_PAYLOAD: usize = 32;

/// One raw notification event: channel id plus opaque payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Channel the event arrived on
    pub channel_id: heapless::String<MAX_CHANNEL_ID>,
    /// Opaque payload bytes
    pub payload: heapless::Vec<u8, MAX_PAYLOAD>,
}

impl Notification {
    /// Create from borrowed parts; `None` if either exceeds its buffer
    pub fn new(channel_id: &str, payload: &[u8]) -> Option<Self> {
        let mut id = heapless::String::new();
        id.push_str(channel_id).ok()?;

        let mut buf = heapless::Vec::new();
        buf.extend_from_slice(payload).ok()?;

        Some(Self {
            channel_id: id,
            payload: buf,
        })
    }
}

/// Feed error types
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedError {
    /// Source has no more events, ever
    #[error("feed exhausted")]
    Exhausted,
    /// Event could not be rendered into a notification buffer
    #[error("feed format error: {0}")]
    Format(&'static str),
}

/// A pollable source of raw notifications
pub trait NotificationSource {
    /// Poll for the next notification (non-blocking)
    ///
    /// Returns:
    /// - `Ok(notification)`: next event ready
    /// - `Err(nb::Error::WouldBlock)`: try again later
    /// - `Err(nb::Error::Other(e))`: terminal error
    fn poll_next(&mut self) -> nb::Result<Notification, FeedError>;

    /// Hint about remaining events
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }
}

/// Replays a recorded notification sequence
pub struct MemoryFeed<'a> {
    notifications: &'a [Notification],
    position: usize,
}

impl<'a> MemoryFeed<'a> {
    /// Create a feed over a recorded sequence
    pub fn new(notifications: &'a [Notification]) -> Self {
        Self {
            notifications,
            position: 0,
        }
    }

    /// Events not yet replayed
    pub fn remaining(&self) -> usize {
        self.notifications.len() - self.position
    }
}

impl NotificationSource for MemoryFeed<'_> {
    fn poll_next(&mut self) -> nb::Result<Notification, FeedError> {
        match self.notifications.get(self.position) {
            Some(notification) => {
                self.position += 1;
                Ok(notification.clone())
            }
            None => Err(nb::Error::Other(FeedError::Exhausted)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

/// Fabricates acquisition cycles against a channel table
///
/// Each cycle emits every channel in table order. The sample for channel
/// `i` in cycle `c` is `c * 100 + i`: float channels carry it as an IEEE
/// float, text channels as a zero-padded 6-character string after a
/// zero-padded cycle stamp.
pub struct SyntheticFeed {
    table: ChannelTable,
    cycles: u32,
    cycle: u32,
    position: usize,
}

impl SyntheticFeed {
    /// Create a feed producing `cycles` full acquisition cycles
    pub fn new(table: ChannelTable, cycles: u32) -> Self {
        Self {
            table,
            cycles,
            cycle: 0,
            position: 0,
        }
    }

    fn render(&self, spec: &crate::registry::ChannelSpec) -> Result<Notification, FeedError> {
        let sample = self.cycle * 100 + self.position as u32;

        let mut payload = heapless::Vec::<u8, MAX_PAYLOAD>::new();
        match spec.rule {
            DecodeRule::FixedWidthFloat { width, endianness } => {
                use crate::decode::{Endianness, FloatWidth};
                match (width, endianness) {
                    (FloatWidth::Four, Endianness::Little) => payload
                        .extend_from_slice(&(sample as f32).to_le_bytes()),
                    (FloatWidth::Four, Endianness::Big) => payload
                        .extend_from_slice(&(sample as f32).to_be_bytes()),
                    (FloatWidth::Eight, Endianness::Little) => payload
                        .extend_from_slice(&f64::from(sample).to_le_bytes()),
                    (FloatWidth::Eight, Endianness::Big) => payload
                        .extend_from_slice(&f64::from(sample).to_be_bytes()),
                }
                .map_err(|_| FeedError::Format("float payload overflows buffer"))?;
            }
            DecodeRule::DelimitedText { stamp_len, .. } => {
                let mut text = heapless::String::<MAX_PAYLOAD>::new();
                write!(text, "{:0width$}", self.cycle, width = stamp_len as usize)
                    .and_then(|_| write!(text, "{:06}", sample))
                    .map_err(|_| FeedError::Format("text payload overflows buffer"))?;
                payload
                    .extend_from_slice(text.as_bytes())
                    .map_err(|_| FeedError::Format("text payload overflows buffer"))?;
            }
        }

        Notification::new(spec.uuid, &payload)
            .ok_or(FeedError::Format("channel id overflows buffer"))
    }
}

impl NotificationSource for SyntheticFeed {
    fn poll_next(&mut self) -> nb::Result<Notification, FeedError> {
        if self.cycle >= self.cycles {
            return Err(nb::Error::Other(FeedError::Exhausted));
        }

        let spec = self
            .table
            .as_slice()
            .get(self.position)
            .ok_or(nb::Error::Other(FeedError::Exhausted))?;

        let notification = self.render(spec).map_err(nb::Error::Other)?;

        self.position += 1;
        if self.position >= self.table.len() {
            self.position = 0;
            self.cycle += 1;
        }

        Ok(notification)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let per_cycle = self.table.len();
        let remaining = (self.cycles - self.cycle) as usize * per_cycle - self.position;
        (remaining, Some(remaining))
    }
}

impl Aggregator {
    /// Pump a source dry into the aggregator
    ///
    /// Consumes events until the source would block or is exhausted.
    /// Returns the number of notifications ingested (including any the
    /// aggregator itself dropped as unknown or corrupt).
    pub fn drain(&mut self, source: &mut impl NotificationSource) -> usize {
        let mut consumed = 0;
        loop {
            match source.poll_next() {
                Ok(notification) => {
                    self.on_notification(&notification.channel_id, &notification.payload);
                    consumed += 1;
                }
                Err(nb::Error::WouldBlock) | Err(nb::Error::Other(_)) => break,
            }
        }
        consumed
    }
}
