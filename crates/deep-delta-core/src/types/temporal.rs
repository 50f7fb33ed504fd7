//! Tick-based temporal values.
//!
//! Date-times are carried as 100-nanosecond tick counts from the year-1
//! epoch, with a kind discriminator, matching the wire format exactly.
//! Conversions to calendar types go through chrono.

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Ticks per second (one tick is 100ns).
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks at the Unix epoch (1970-01-01T00:00:00) measured from year 1.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Mask selecting the tick payload inside a packed binary date-time.
const TICKS_MASK: i64 = 0x3FFF_FFFF_FFFF_FFFF;

/// Clock kind attached to a [`DateTime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DateTimeKind {
    /// No time-zone affinity
    Unspecified = 0,
    /// Coordinated universal time
    Utc = 1,
    /// Host-local time
    Local = 2,
}

impl DateTimeKind {
    /// Convert a packed 2-bit kind field.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            1 => DateTimeKind::Utc,
            2 => DateTimeKind::Local,
            _ => DateTimeKind::Unspecified,
        }
    }
}

/// A point in time: kind plus ticks from the year-1 epoch.
///
/// Equality is strict: both the kind and the tick count must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateTime {
    /// Clock kind
    pub kind: DateTimeKind,
    /// 100ns ticks from 0001-01-01T00:00:00
    pub ticks: i64,
}

impl DateTime {
    /// Construct from kind and ticks.
    pub fn new(kind: DateTimeKind, ticks: i64) -> Self {
        Self { kind, ticks }
    }

    /// UTC date-time from a chrono instant. Sub-100ns precision is
    /// truncated.
    pub fn from_chrono_utc(value: chrono::DateTime<Utc>) -> Self {
        let ticks = UNIX_EPOCH_TICKS
            + value.timestamp() * TICKS_PER_SECOND
            + i64::from(value.timestamp_subsec_nanos() / 100);
        Self {
            kind: DateTimeKind::Utc,
            ticks,
        }
    }

    /// Convert to a chrono UTC instant. `None` when the tick count lies
    /// outside chrono's representable range.
    pub fn to_chrono_utc(self) -> Option<chrono::DateTime<Utc>> {
        let unix_ticks = self.ticks - UNIX_EPOCH_TICKS;
        let secs = unix_ticks.div_euclid(TICKS_PER_SECOND);
        let nanos = (unix_ticks.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
        Utc.timestamp_opt(secs, nanos).single()
    }

    /// Pack kind and ticks into the single binary value used on the wire.
    pub fn to_binary(self) -> i64 {
        (self.ticks & TICKS_MASK) | ((self.kind as i64) << 62)
    }

    /// Unpack a wire binary value.
    pub fn from_binary(raw: i64) -> Self {
        Self {
            kind: DateTimeKind::from_bits(((raw >> 62) & 0b11) as u8),
            ticks: raw & TICKS_MASK,
        }
    }
}

/// A signed duration in 100ns ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSpan {
    /// Signed tick count
    pub ticks: i64,
}

impl TimeSpan {
    /// Construct from ticks.
    pub fn from_ticks(ticks: i64) -> Self {
        Self { ticks }
    }

    /// Construct from whole seconds.
    pub fn from_seconds(seconds: i64) -> Self {
        Self {
            ticks: seconds * TICKS_PER_SECOND,
        }
    }

    /// Convert to a chrono duration.
    pub fn to_chrono(self) -> chrono::Duration {
        chrono::Duration::microseconds(self.ticks / 10)
    }
}

/// A point in time with an explicit UTC offset in minutes.
///
/// Equality requires both the offset and the UTC instant to match;
/// `local_ticks` stores local time, so the UTC instant is
/// `local_ticks - offset_minutes * ticks-per-minute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateTimeOffset {
    /// Local-clock ticks from the year-1 epoch
    pub local_ticks: i64,
    /// Offset from UTC in minutes
    pub offset_minutes: i16,
}

impl DateTimeOffset {
    /// Construct from local ticks and an offset.
    pub fn new(local_ticks: i64, offset_minutes: i16) -> Self {
        Self {
            local_ticks,
            offset_minutes,
        }
    }

    /// The UTC tick count of this instant.
    pub fn utc_ticks(self) -> i64 {
        self.local_ticks - i64::from(self.offset_minutes) * 60 * TICKS_PER_SECOND
    }

    /// Structural equality used by comparison: same offset and same
    /// UTC instant.
    pub fn strict_eq(self, other: Self) -> bool {
        self.offset_minutes == other.offset_minutes && self.utc_ticks() == other.utc_ticks()
    }
}
