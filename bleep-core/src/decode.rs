//! Payload Decoding for Notification Channels
//!
//! ## Overview
//!
//! Every notification carries an opaque byte payload whose layout is fixed by
//! the channel it arrived on. Two layouts exist on the wire:
//!
//! - **Fixed-width float**: the first 4 or 8 bytes are an IEEE-754 value in a
//!   configured endianness. The peripheral pads notifications to the ATT MTU,
//!   so trailing bytes beyond the width are ignored.
//! - **Delimited text**: a UTF-8 string whose leading characters are a short
//!   sub-timestamp minted on the peripheral, followed by a value substring at
//!   a fixed offset.
//!
//! Decoding is pure: the same rule and bytes always produce the same result,
//! which is what makes replaying recorded payload fixtures in tests
//! meaningful.
//!
//! ## Memory Model
//!
//! Decoded text lands in [`StampStr`], an inline, heap-free string capped at
//! [`MAX_STAMP_LEN`] bytes. BLE notifications fit in the default ATT MTU
//! (20 data bytes), so a 15-byte cap holds any sub-timestamp or value
//! substring the wire can legally carry.

use core::fmt;

use crate::errors::DecodeError;

/// Maximum length for inline decoded strings
///
/// Payload substrings longer than this cannot occur within the default ATT
/// MTU; longer input is rejected as malformed rather than truncated.
pub const MAX_STAMP_LEN: usize = 15;

/// Inline string for decoded sub-timestamps and text values
///
/// Avoids heap allocation in the notification hot path.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StampStr {
    len: u8,
    data: [u8; MAX_STAMP_LEN],
}

impl StampStr {
    /// Create from string slice; `None` if longer than [`MAX_STAMP_LEN`]
    pub fn new(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() > MAX_STAMP_LEN {
            return None;
        }

        let mut data = [0u8; MAX_STAMP_LEN];
        data[..bytes.len()].copy_from_slice(bytes);

        Some(Self {
            len: bytes.len() as u8,
            data,
        })
    }

    /// The empty string
    pub const fn empty() -> Self {
        Self {
            len: 0,
            data: [0u8; MAX_STAMP_LEN],
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> &str {
        // Only valid UTF-8 is stored by new(), so this never panics
        core::str::from_utf8(&self.data[..self.len as usize])
            .expect("StampStr contains invalid UTF-8")
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether the string is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for StampStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for StampStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for StampStr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A decoded sensor value
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Value {
    /// Numeric reading from a fixed-width float channel
    Float(f64),
    /// Text reading from a delimited-text channel
    Text(StampStr),
}

impl Value {
    /// Numeric value, if this is a float reading
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    /// Text value, if this is a text reading
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Float(_) => None,
            Value::Text(s) => Some(s.as_str()),
        }
    }
}

/// Width of a fixed-width float payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    /// 4-byte IEEE-754 single precision
    Four,
    /// 8-byte IEEE-754 double precision
    Eight,
}

impl FloatWidth {
    /// Width in bytes
    pub const fn bytes(self) -> usize {
        match self {
            FloatWidth::Four => 4,
            FloatWidth::Eight => 8,
        }
    }
}

/// Byte order of a fixed-width float payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// Least significant byte first (the BLEEP firmware default)
    Little,
    /// Most significant byte first
    Big,
}

/// How a channel's payload bytes become a typed reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeRule {
    /// First `width` bytes are an IEEE-754 float; trailing bytes ignored
    FixedWidthFloat {
        /// Payload width
        width: FloatWidth,
        /// Payload byte order
        endianness: Endianness,
    },
    /// UTF-8 text: sub-timestamp prefix, value substring at a fixed offset
    DelimitedText {
        /// Length of the sub-timestamp prefix in bytes
        stamp_len: u8,
        /// Offset where the value substring begins; clamped to `stamp_len`
        value_start: u8,
    },
}

/// One decoded payload: the peripheral-side sub-timestamp plus the value
///
/// Fixed-width float channels carry no textual stamp; their `sub_timestamp`
/// is empty and timing comes from the correlator's tick alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoded {
    /// Sub-timestamp minted on the peripheral (empty for binary channels)
    pub sub_timestamp: StampStr,
    /// The reading itself
    pub value: Value,
}

/// Decode a raw payload according to `rule`.
///
/// Pure and side-effect free: identical inputs always yield identical
/// results.
pub fn decode(rule: DecodeRule, bytes: &[u8]) -> Result<Decoded, DecodeError> {
    match rule {
        DecodeRule::FixedWidthFloat { width, endianness } => {
            decode_float(width, endianness, bytes)
        }
        DecodeRule::DelimitedText { stamp_len, value_start } => {
            decode_text(stamp_len as usize, value_start as usize, bytes)
        }
    }
}

fn decode_float(
    width: FloatWidth,
    endianness: Endianness,
    bytes: &[u8],
) -> Result<Decoded, DecodeError> {
    let needed = width.bytes();
    if bytes.len() < needed {
        return Err(DecodeError::TruncatedPayload {
            needed,
            got: bytes.len(),
        });
    }

    let value = match width {
        FloatWidth::Four => {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&bytes[..4]);
            let v = match endianness {
                Endianness::Little => f32::from_le_bytes(raw),
                Endianness::Big => f32::from_be_bytes(raw),
            };
            f64::from(v)
        }
        FloatWidth::Eight => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[..8]);
            match endianness {
                Endianness::Little => f64::from_le_bytes(raw),
                Endianness::Big => f64::from_be_bytes(raw),
            }
        }
    };

    Ok(Decoded {
        sub_timestamp: StampStr::empty(),
        value: Value::Float(value),
    })
}

fn decode_text(
    stamp_len: usize,
    value_start: usize,
    bytes: &[u8],
) -> Result<Decoded, DecodeError> {
    let text = core::str::from_utf8(bytes).map_err(|_| DecodeError::MalformedText {
        reason: "payload is not UTF-8",
    })?;

    if text.len() < stamp_len {
        return Err(DecodeError::MalformedText {
            reason: "shorter than sub-timestamp prefix",
        });
    }
    if !text.is_char_boundary(stamp_len) {
        return Err(DecodeError::MalformedText {
            reason: "prefix splits a multi-byte character",
        });
    }

    let sub_timestamp =
        StampStr::new(&text[..stamp_len]).ok_or(DecodeError::MalformedText {
            reason: "sub-timestamp exceeds inline capacity",
        })?;

    // The value begins at the fixed offset (never inside the stamp); text
    // shorter than the offset simply has an empty value.
    let value_start = value_start.max(stamp_len);
    let tail = match text.get(value_start..) {
        Some(t) => t.trim_end_matches(|c: char| c == '\0' || c.is_whitespace()),
        None => "",
    };
    let value = StampStr::new(tail).ok_or(DecodeError::MalformedText {
        reason: "value exceeds inline capacity",
    })?;

    Ok(Decoded {
        sub_timestamp,
        value: Value::Text(value),
    })
}
