//! Closed date-time intervals used by domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a range's bounds are out of order.
#[derive(Debug, Error)]
#[error("date range start {start} is after end {end}")]
pub struct InvalidDateRange {
    /// The offending start bound.
    pub start: DateTime<Utc>,
    /// The offending end bound.
    pub end: DateTime<Utc>,
}

/// A closed interval `[start, end]` over UTC instants.
///
/// Payload conversion deserializes this type structurally, bound by bound,
/// rather than through a string conversion; the `start <= end` invariant
/// holds for every constructed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RangeBounds")]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeBounds {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RangeBounds> for DateRange {
    type Error = InvalidDateRange;

    fn try_from(bounds: RangeBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.start, bounds.end)
    }
}

impl DateRange {
    /// Creates a range over `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDateRange`] if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InvalidDateRange> {
        if start > end {
            return Err(InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Returns the inclusive lower bound.
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the inclusive upper bound.
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns `true` if `instant` falls within the interval, bounds
    /// included.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}
