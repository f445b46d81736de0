//! Sensor stream aggregation core for the BLEEP wireless sensor pod
//!
//! The pod streams multiplexed sensor readings over independent notification
//! channels — one per physical quantity, plus one carrying the shared
//! acquisition timestamp. This crate consumes those raw events, decodes each
//! payload per its channel's rule, correlates readings with the acquisition
//! tick that was current when they arrived, and maintains one append-only
//! time series per sensor label.
//!
//! Key constraints:
//! - Push-based: one synchronous, run-to-completion call per notification
//! - No reading lost or duplicated, whatever the interleaving across channels
//! - Snapshots never race appends (they are deep copies)
//!
//! ```
//! use bleep_core::{Aggregator, ChannelTable, SensorLabel};
//!
//! let mut aggregator = Aggregator::with_system_clock(ChannelTable::bleep());
//!
//! // Tick first, then a PM2.5 reading correlated to it
//! aggregator.on_notification("beb5483e-36e1-4688-b7f5-ea07361b26a8", b"023145");
//! aggregator.on_notification(
//!     "bf5a799d-26d0-410e-96b0-9ada1eb9f758",
//!     &23.5f32.to_le_bytes(),
//! );
//!
//! let dataset = aggregator.snapshot();
//! assert_eq!(dataset.get(SensorLabel::Pm25).unwrap().len(), 1);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

pub mod aggregator;
pub mod decode;
pub mod errors;
pub mod feed;
pub mod registry;
pub mod series;
pub mod tick;
pub mod time;

// Public API
pub use aggregator::{Aggregator, AggregatorStats, Lifecycle, LifecycleEvent};
pub use decode::{decode, DecodeRule, Decoded, Endianness, FloatWidth, StampStr, Value};
pub use errors::{AggregateError, AggregateResult, DecodeError, RegistryError, SeriesError};
pub use feed::{MemoryFeed, Notification, NotificationSource, SyntheticFeed};
pub use registry::{ChannelKind, ChannelSpec, ChannelTable, SensorLabel};
pub use series::{Dataset, Reading, SeriesEntry};
pub use tick::{Tick, TickCorrelator};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
