//! Aggregator Façade — the single entry point for the notification stream
//!
//! ## Overview
//!
//! Collaborators push three things at the core: raw notifications, decoded
//! connection lifecycle signals, and user reset requests. Everything else —
//! channel resolution, payload decode, tick correlation, series append —
//! happens inside [`Aggregator::on_notification`], one run-to-completion
//! critical section per call. That single-call discipline is what guarantees
//! a reading can never be attached to the wrong tick: the tick observed at
//! the start of a call is the tick the reading stores.
//!
//! ## State Machine
//!
//! Exactly two states:
//!
//! ```text
//! Idle ──connected──► Streaming
//!   ▲                    │
//!   └───disconnected─────┘   (disconnect also clears all data)
//! ```
//!
//! Disconnection always discards in-flight, uncorrelated data — a
//! reconnect starts a new acquisition session with a fresh tick space, so
//! stale pre-disconnect readings could never be correlated again.
//!
//! ## Error Policy
//!
//! No ingest failure propagates to the connection collaborator. Unknown
//! channels and corrupt payloads drop the one event, bump a counter and log
//! a warning; the stream keeps flowing. See [`AggregatorStats`].

use alloc::boxed::Box;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::decode::decode;
use crate::errors::AggregateError;
use crate::registry::{ChannelKind, ChannelTable};
use crate::series::{Dataset, Reading, SeriesStore};
use crate::tick::{Tick, TickCorrelator};
use crate::time::TimeSource;

// Macros for optional logging
#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {{ let _ = core::format_args!($($arg)*); }};
}

#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {{ let _ = core::format_args!($($arg)*); }};
}

/// Connection state of the acquisition session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No peripheral attached; dataset empty or frozen
    Idle,
    /// Notifications are being ingested
    Streaming,
}

/// Decoded lifecycle signal from the connection collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Link established; streaming begins
    Connected,
    /// Link lost or closed; session data is discarded
    Disconnected,
}

/// Diagnostic counters, readable at any time through a shared reference
///
/// Relaxed atomics: the counters order nothing, they only have to be
/// individually consistent.
pub struct AggregatorStats {
    /// Readings appended to the series store
    pub readings_stored: AtomicU32,
    /// Ticks minted from the timestamp channel
    pub ticks_observed: AtomicU32,
    /// Notifications dropped because the channel id was not in the table
    pub unknown_channel: AtomicU32,
    /// Notifications dropped because the payload would not decode
    pub decode_failures: AtomicU32,
    /// Series store integrity failures (programming defects)
    pub store_conflicts: AtomicU32,
}

impl AggregatorStats {
    const fn new() -> Self {
        Self {
            readings_stored: AtomicU32::new(0),
            ticks_observed: AtomicU32::new(0),
            unknown_channel: AtomicU32::new(0),
            decode_failures: AtomicU32::new(0),
            store_conflicts: AtomicU32::new(0),
        }
    }
}

/// What one successfully ingested notification did
enum Ingest {
    Tick,
    Stored,
}

/// The sensor stream aggregator
///
/// Owns all session state. Collaborators never touch the dataset directly;
/// they push events in and read [`snapshot`](Self::snapshot)s out.
pub struct Aggregator {
    table: ChannelTable,
    ticks: TickCorrelator,
    store: SeriesStore,
    lifecycle: Lifecycle,
    stats: AggregatorStats,
}

impl Aggregator {
    /// Create an aggregator over `table`, stamping ticks from `clock`
    pub fn new(table: ChannelTable, clock: Box<dyn TimeSource + Send>) -> Self {
        Self {
            table,
            ticks: TickCorrelator::new(clock),
            store: SeriesStore::new(),
            lifecycle: Lifecycle::Idle,
            stats: AggregatorStats::new(),
        }
    }

    /// Create an aggregator stamping ticks from the system clock
    #[cfg(feature = "std")]
    pub fn with_system_clock(table: ChannelTable) -> Self {
        Self::new(table, Box::new(crate::time::SystemClock))
    }

    /// Ingest one raw notification
    ///
    /// Resolve → decode → correlate-or-append, run to completion. Failures
    /// are terminal here: the event is dropped, counted and logged, and the
    /// dataset is left exactly as it was.
    pub fn on_notification(&mut self, channel_id: &str, payload: &[u8]) {
        match self.ingest(channel_id, payload) {
            Ok(Ingest::Tick) => {
                self.stats.ticks_observed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Ingest::Stored) => {
                self.stats.readings_stored.fetch_add(1, Ordering::Relaxed);
            }
            Err(AggregateError::Registry(_)) => {
                self.stats.unknown_channel.fetch_add(1, Ordering::Relaxed);
                log_warn!("dropped notification from unknown channel {}", channel_id);
            }
            Err(AggregateError::Decode(e)) => {
                self.stats.decode_failures.fetch_add(1, Ordering::Relaxed);
                log_warn!("dropped corrupt payload on channel {}: {}", channel_id, e);
            }
            Err(AggregateError::Series(e)) => {
                self.stats.store_conflicts.fetch_add(1, Ordering::Relaxed);
                log_warn!("series store rejected append: {}", e);
                debug_assert!(false, "series store desync: {}", e);
            }
        }
    }

    fn ingest(&mut self, channel_id: &str, payload: &[u8]) -> Result<Ingest, AggregateError> {
        let spec = *self.table.resolve(channel_id)?;
        let decoded = decode(spec.rule, payload)?;

        match spec.kind {
            ChannelKind::Tick => {
                self.ticks.observe_tick();
                Ok(Ingest::Tick)
            }
            ChannelKind::Sensor(label) => {
                let reading = Reading {
                    sub_timestamp: decoded.sub_timestamp,
                    value: decoded.value,
                    tick: self.ticks.current(),
                };
                self.store.append(label, reading)?;
                Ok(Ingest::Stored)
            }
        }
    }

    /// Apply a connection lifecycle signal
    pub fn on_lifecycle(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Connected => {
                log_debug!("session streaming");
                self.lifecycle = Lifecycle::Streaming;
            }
            LifecycleEvent::Disconnected => {
                log_debug!("session ended, discarding dataset");
                self.store.clear();
                self.ticks.clear();
                self.lifecycle = Lifecycle::Idle;
            }
        }
    }

    /// User-triggered clear: drop the dataset and the current tick
    ///
    /// Same data effect as a disconnect, without the lifecycle transition.
    pub fn reset(&mut self) {
        self.store.clear();
        self.ticks.clear();
    }

    /// Immutable dataset snapshot; safe to take mid-stream
    pub fn snapshot(&self) -> Dataset {
        self.store.as_dataset()
    }

    /// Current connection state
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// The active acquisition tick, if one has been observed this session
    pub fn current_tick(&self) -> Option<Tick> {
        self.ticks.current()
    }

    /// Diagnostic counters
    pub fn stats(&self) -> &AggregatorStats {
        &self.stats
    }

    /// Total readings stored since the last clear
    pub fn reading_count(&self) -> usize {
        self.store.reading_count()
    }
}
