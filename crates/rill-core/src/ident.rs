// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Identifier types for trace messages and rush episodes.

/// Index of a rush episode within the message timeline.
///
/// Rush indices start at zero and advance exactly once per
/// emission-to-structure control transition. Plain `u64` keeps the
/// arithmetic at rush boundaries (±1 neighbor lookups) trivial.
pub type RushIndex = u64;

/// Thin wrapper around a trace message identifier.
///
/// The external producer assigns ids as a process-wide strictly increasing
/// integer sequence starting at zero. The core never assumes the sequence is
/// gapless across message *kinds*; only the emission id sequence it indexes
/// is navigated by ±1 arithmetic.
///
/// # Invariants
/// - Zero is a **valid** id (the producer's first message carries it).
/// - Ids are immutable once recorded; the same id never maps to two
///   different messages.
///
/// The `#[repr(transparent)]` attribute keeps `TraceId` layout-identical to
/// `u64` for interop with bindings that pass raw ids.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceId(u64);

impl TraceId {
    /// Constructs a `TraceId` from a raw `u64` value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the next id in the producer sequence.
    ///
    /// Returns `None` on overflow; producers never get anywhere near
    /// `u64::MAX` in a debugging session, but navigation treats the edge as
    /// a no-op rather than wrapping.
    #[must_use]
    pub const fn successor(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(next) => Some(Self(next)),
            None => None,
        }
    }

    /// Returns the previous id in the producer sequence.
    ///
    /// Returns `None` at id zero. This is the first-id edge: asking for the
    /// message before the very first one is a navigation no-op.
    #[must_use]
    pub const fn predecessor(self) -> Option<Self> {
        match self.0.checked_sub(1) {
            Some(prev) => Some(Self(prev)),
            None => None,
        }
    }
}

impl core::fmt::Display for TraceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Microsecond timestamp attached to a trace message by the producer.
///
/// Producers emit wall-clock milliseconds (possibly fractional); the wire
/// boundary converts to whole microseconds so the core can stay on integer
/// comparisons.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceInstant(u64);

impl TraceInstant {
    /// Constructs an instant from whole microseconds.
    #[must_use]
    pub const fn from_micros(value: u64) -> Self {
        Self(value)
    }

    /// Returns the instant as whole microseconds.
    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0
    }
}
