use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A race time with centisecond precision.
///
/// Stored as a two-decimal `Decimal` so equality is exact: 24.80 and 24.81 are
/// different times and never compare equal through floating point rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwimTime(Decimal);

impl SwimTime {
    /// Returns `None` for zero or negative totals.
    pub fn from_centiseconds(centiseconds: i64) -> Option<Self> {
        (centiseconds > 0).then(|| Self(Decimal::new(centiseconds, 2)))
    }

    /// Rounds to centiseconds; returns `None` when the rounded value is not positive.
    pub fn from_seconds(seconds: Decimal) -> Option<Self> {
        let rounded = seconds.round_dp(2);
        (rounded > Decimal::ZERO).then_some(Self(rounded))
    }

    pub fn seconds(&self) -> Decimal {
        self.0
    }

    pub fn centiseconds(&self) -> i64 {
        (self.0 * Decimal::ONE_HUNDRED)
            .round()
            .to_i64()
            .unwrap_or_default()
    }
}

impl fmt::Display for SwimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.centiseconds();
        let minutes = total / 6000;
        let seconds = (total % 6000) / 100;
        let centis = total % 100;
        if minutes > 0 {
            write!(f, "{}:{:02}.{:02}", minutes, seconds, centis)
        } else {
            write!(f, "{}.{:02}", seconds, centis)
        }
    }
}
