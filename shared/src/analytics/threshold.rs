use serde::{Deserialize, Serialize};
use std::fmt;

/// Accuracy at or above this percentage is rated high
pub const ACCURACY_HIGH_PCT: f64 = 70.0;
/// Accuracy at or above this percentage is rated medium
pub const ACCURACY_MEDIUM_PCT: f64 = 50.0;
/// Error rates below this percentage are rated low
pub const ERROR_RATE_LOW_PCT: f64 = 1.0;
/// Error rates below this percentage are rated medium
pub const ERROR_RATE_MEDIUM_PCT: f64 = 2.0;
/// Error counts above this are rated high
pub const ERROR_COUNT_HIGH: u64 = 100;
/// Error counts above this are rated medium
pub const ERROR_COUNT_MEDIUM: u64 = 50;

/// Badge band for a classified value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    High,
    Medium,
    Low,
}

impl Band {
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::High => "high",
            Band::Medium => "medium",
            Band::Low => "low",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accuracy in percent: >=70 high, >=50 medium, else low
pub fn classify_accuracy(pct: f64) -> Band {
    if pct >= ACCURACY_HIGH_PCT {
        Band::High
    } else if pct >= ACCURACY_MEDIUM_PCT {
        Band::Medium
    } else {
        Band::Low
    }
}

/// Error rate in percent: <1 low, <2 medium, else high
pub fn classify_error_rate(pct: f64) -> Band {
    if pct < ERROR_RATE_LOW_PCT {
        Band::Low
    } else if pct < ERROR_RATE_MEDIUM_PCT {
        Band::Medium
    } else {
        Band::High
    }
}

/// Absolute error count: >100 high, >50 medium, else low
pub fn classify_error_count(count: u64) -> Band {
    if count > ERROR_COUNT_HIGH {
        Band::High
    } else if count > ERROR_COUNT_MEDIUM {
        Band::Medium
    } else {
        Band::Low
    }
}
