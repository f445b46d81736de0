//! Channel Registry — the static notification-channel contract
//!
//! ## Overview
//!
//! The peripheral exposes one notification channel per physical quantity,
//! each identified by a stable UUID, plus one channel that only carries the
//! acquisition-cycle timestamp. This module pins that contract down as a
//! read-only table resolved on every notification: channel id in,
//! [`ChannelSpec`] out.
//!
//! Making the table explicit replaces two habits of ad hoc stream handlers:
//! inferring the dataset shape from whichever notification happens to arrive
//! first, and re-checking "is this the timestamp channel?" at every call
//! site. Here the shape is known before the first byte arrives and the tick
//! designation is a single table property.
//!
//! ## Design Rationale
//!
//! Resolution is a linear search over a fixed slice. A peripheral exposes a
//! handful of channels (ten on the BLEEP pod); at that size a scan beats a
//! hash map on both memory and code size, and the table lives in flash on
//! embedded targets.

use crate::decode::{DecodeRule, Endianness, FloatWidth};
use crate::errors::RegistryError;

/// Sensor identity of a channel's readings
///
/// Closed set: the firmware contract enumerates exactly these quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum SensorLabel {
    /// GNSS latitude
    Latitude = 0,
    /// GNSS longitude
    Longitude = 1,
    /// GNSS altitude
    Altitude = 2,
    /// Fine particulate matter (PM2.5)
    Pm25 = 3,
    /// Relative humidity
    RelativeHumidity = 4,
    /// Air temperature
    Temperature = 5,
    /// Accelerometer X axis
    AccelerationX = 6,
    /// Accelerometer Y axis
    AccelerationY = 7,
    /// Accelerometer Z axis
    AccelerationZ = 8,
}

impl SensorLabel {
    /// Number of labels in the closed set
    pub const COUNT: usize = 9;

    /// Get human-readable name
    pub const fn name(&self) -> &'static str {
        match self {
            SensorLabel::Latitude => "latitude",
            SensorLabel::Longitude => "longitude",
            SensorLabel::Altitude => "altitude",
            SensorLabel::Pm25 => "pm25",
            SensorLabel::RelativeHumidity => "relative_humidity",
            SensorLabel::Temperature => "temperature",
            SensorLabel::AccelerationX => "acceleration_x",
            SensorLabel::AccelerationY => "acceleration_y",
            SensorLabel::AccelerationZ => "acceleration_z",
        }
    }

    /// Get expected unit of measurement
    pub const fn unit(&self) -> &'static str {
        match self {
            SensorLabel::Latitude | SensorLabel::Longitude => "°",
            SensorLabel::Altitude => "m",
            SensorLabel::Pm25 => "μg/m³",
            SensorLabel::RelativeHumidity => "%",
            SensorLabel::Temperature => "°C",
            SensorLabel::AccelerationX
            | SensorLabel::AccelerationY
            | SensorLabel::AccelerationZ => "m/s²",
        }
    }

    /// Dense index for table-backed lookups
    pub(crate) const fn index(&self) -> usize {
        *self as usize
    }
}

/// What a channel produces: acquisition ticks, or readings for one label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// The dedicated timestamp channel; produces ticks, never readings
    Tick,
    /// A sensor channel producing readings for this label
    Sensor(SensorLabel),
}

/// One channel's contract: identity, meaning, and wire layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSpec {
    /// Stable channel identifier (a characteristic UUID on the radio link)
    pub uuid: &'static str,
    /// Tick channel or sensor channel
    pub kind: ChannelKind,
    /// How this channel's payload bytes decode
    pub rule: DecodeRule,
}

/// Read-only channel table, fixed at process start
///
/// Validated on construction: exactly one tick channel, no duplicate ids,
/// no two channels feeding the same label.
#[derive(Debug, Clone, Copy)]
pub struct ChannelTable {
    specs: &'static [ChannelSpec],
    tick_idx: usize,
}

impl ChannelTable {
    /// Build a table from a static spec slice, validating the contract
    pub fn new(specs: &'static [ChannelSpec]) -> Result<Self, RegistryError> {
        let mut tick_idx = None;
        let mut label_seen = [false; SensorLabel::COUNT];

        for (i, spec) in specs.iter().enumerate() {
            for earlier in &specs[..i] {
                if earlier.uuid == spec.uuid {
                    return Err(RegistryError::DuplicateChannel(spec.uuid));
                }
            }

            match spec.kind {
                ChannelKind::Tick => {
                    if tick_idx.is_some() {
                        return Err(RegistryError::DuplicateTickChannel);
                    }
                    tick_idx = Some(i);
                }
                ChannelKind::Sensor(label) => {
                    if label_seen[label.index()] {
                        return Err(RegistryError::DuplicateLabel(label.name()));
                    }
                    label_seen[label.index()] = true;
                }
            }
        }

        let tick_idx = tick_idx.ok_or(RegistryError::NoTickChannel)?;
        Ok(Self { specs, tick_idx })
    }

    /// Resolve a channel id to its spec
    ///
    /// `UnknownChannel` means the firmware and this table disagree — callers
    /// must surface it as a countable diagnostic, never swallow it.
    pub fn resolve(&self, channel_id: &str) -> Result<&ChannelSpec, RegistryError> {
        self.specs
            .iter()
            .find(|spec| spec.uuid == channel_id)
            .ok_or(RegistryError::UnknownChannel)
    }

    /// Whether `channel_id` is the designated tick channel
    pub fn is_tick_channel(&self, channel_id: &str) -> bool {
        self.specs[self.tick_idx].uuid == channel_id
    }

    /// The designated tick channel's spec
    pub fn tick_channel(&self) -> &ChannelSpec {
        &self.specs[self.tick_idx]
    }

    /// Number of channels in the table
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the table is empty (it never is after validation)
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Iterate over all channel specs in table order
    pub fn iter(&self) -> core::slice::Iter<'_, ChannelSpec> {
        self.specs.iter()
    }

    /// The underlying spec slice, in table order
    pub fn as_slice(&self) -> &'static [ChannelSpec] {
        self.specs
    }

    /// The BLEEP pod's channel table
    ///
    /// Ten characteristics under one service: the tick channel first, then
    /// one fixed-width float channel per sensor quantity.
    pub fn bleep() -> Self {
        Self::new(&BLEEP_CHANNELS).expect("built-in BLEEP table is valid")
    }
}

const F32_LE: DecodeRule = DecodeRule::FixedWidthFloat {
    width: FloatWidth::Four,
    endianness: Endianness::Little,
};

/// Characteristic map of the BLEEP pod firmware
static BLEEP_CHANNELS: [ChannelSpec; 10] = [
    ChannelSpec {
        uuid: "beb5483e-36e1-4688-b7f5-ea07361b26a8",
        kind: ChannelKind::Tick,
        rule: DecodeRule::DelimitedText { stamp_len: 6, value_start: 6 },
    },
    ChannelSpec {
        uuid: "1c95d5e3-d8f7-413a-bf3d-7a2e5d7be87e",
        kind: ChannelKind::Sensor(SensorLabel::Latitude),
        rule: F32_LE,
    },
    ChannelSpec {
        uuid: "d7d85823-5304-4eb3-9671-3e571fac07b9",
        kind: ChannelKind::Sensor(SensorLabel::Longitude),
        rule: F32_LE,
    },
    ChannelSpec {
        uuid: "d2789cef-106f-4660-9e3f-584c12e2e3c7",
        kind: ChannelKind::Sensor(SensorLabel::Altitude),
        rule: F32_LE,
    },
    ChannelSpec {
        uuid: "bf5a799d-26d0-410e-96b0-9ada1eb9f758",
        kind: ChannelKind::Sensor(SensorLabel::Pm25),
        rule: F32_LE,
    },
    ChannelSpec {
        uuid: "c22b405e-2b7b-4632-831d-54523e169a01",
        kind: ChannelKind::Sensor(SensorLabel::RelativeHumidity),
        rule: F32_LE,
    },
    ChannelSpec {
        uuid: "ffdda8ad-60a2-4184-baff-5c79a2eccb8c",
        kind: ChannelKind::Sensor(SensorLabel::Temperature),
        rule: F32_LE,
    },
    ChannelSpec {
        uuid: "183b971a-79f5-4004-8182-31c88d910dca",
        kind: ChannelKind::Sensor(SensorLabel::AccelerationX),
        rule: F32_LE,
    },
    ChannelSpec {
        uuid: "90b77f62-003d-454e-97fc-8f597b42048c",
        kind: ChannelKind::Sensor(SensorLabel::AccelerationY),
        rule: F32_LE,
    },
    ChannelSpec {
        uuid: "86cef02b-8c15-457b-b480-52e6cc0bdd8c",
        kind: ChannelKind::Sensor(SensorLabel::AccelerationZ),
        rule: F32_LE,
    },
];
