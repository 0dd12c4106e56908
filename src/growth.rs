use crate::aggregate::extract;
use serde::Serialize;
use std::fmt;

/// Changes smaller than this (in percent) are reported as flat.
pub const NEUTRAL_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Positive,
    Negative,
    Neutral,
}

/// Period-over-period change of one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Growth {
    /// Signed change in percent, unrounded.
    pub percent: f64,
    /// `abs(percent)` rounded to one decimal.
    pub magnitude: f64,
    pub trend: Trend,
}

impl Growth {
    /// `None` when the earlier value is zero or not a number; there is
    /// nothing meaningful to compare against.
    pub fn between(current: f64, previous: f64) -> Option<Self> {
        if !current.is_finite() || !previous.is_finite() || previous == 0.0 {
            return None;
        }
        let percent = (current - previous) / previous * 100.0;
        let trend = if percent.abs() < NEUTRAL_THRESHOLD {
            Trend::Neutral
        } else if percent > 0.0 {
            Trend::Positive
        } else {
            Trend::Negative
        };
        Some(Self {
            percent,
            magnitude: (percent.abs() * 10.0).round() / 10.0,
            trend,
        })
    }

    /// Same as [`Growth::between`] on raw cell text; either side missing
    /// yields no indicator.
    pub fn from_raw(current: &str, previous: &str) -> Option<Self> {
        Self::between(extract(current)?, extract(previous)?)
    }
}

impl fmt::Display for Growth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.trend {
            Trend::Neutral => f.write_str("0%"),
            Trend::Positive => write!(f, "▲{:.1}%", self.magnitude),
            Trend::Negative => write!(f, "▼{:.1}%", self.magnitude),
        }
    }
}
