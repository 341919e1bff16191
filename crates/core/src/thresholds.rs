//! Threshold classification for sensor readings.
//!
//! Pure logic, no database access. The writer and workers pass in the
//! thresholds they loaded at startup.

use serde::{Deserialize, Serialize};

/// Warning and critical bounds for one sensor. Any bound may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub min_warning: Option<f64>,
    pub max_warning: Option<f64>,
    pub min_critical: Option<f64>,
    pub max_critical: Option<f64>,
}

impl Thresholds {
    pub fn new(
        min_warning: Option<f64>,
        max_warning: Option<f64>,
        min_critical: Option<f64>,
        max_critical: Option<f64>,
    ) -> Self {
        Self {
            min_warning,
            max_warning,
            min_critical,
            max_critical,
        }
    }

    /// Check that every set bound is finite and no min exceeds its max.
    pub fn validate(&self) -> Result<(), String> {
        let named = [
            ("min_warning", self.min_warning),
            ("max_warning", self.max_warning),
            ("min_critical", self.min_critical),
            ("max_critical", self.max_critical),
        ];
        for (name, bound) in named {
            if let Some(v) = bound {
                if !v.is_finite() {
                    return Err(format!("{name} must be finite, got {v}"));
                }
            }
        }

        if let (Some(lo), Some(hi)) = (self.min_warning, self.max_warning) {
            if lo > hi {
                return Err(format!("min_warning {lo} exceeds max_warning {hi}"));
            }
        }
        if let (Some(lo), Some(hi)) = (self.min_critical, self.max_critical) {
            if lo > hi {
                return Err(format!("min_critical {lo} exceeds max_critical {hi}"));
            }
        }
        Ok(())
    }
}

/// Severity of a single reading, persisted as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum SensorStatus {
    Normal = 0,
    Warning = 1,
    Critical = 2,
}

impl SensorStatus {
    /// Integer code stored in `sensors.status` and `measurements.status`.
    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(SensorStatus::Normal),
            1 => Some(SensorStatus::Warning),
            2 => Some(SensorStatus::Critical),
            _ => None,
        }
    }

    pub fn is_alert(self) -> bool {
        self != SensorStatus::Normal
    }
}

/// Classify a reading against a sensor's thresholds.
///
/// Critical bounds are checked before warning bounds, min side before max
/// side. A value equal to a bound counts as a violation.
pub fn classify(value: f64, thresholds: &Thresholds) -> SensorStatus {
    if thresholds.min_critical.is_some_and(|t| value <= t) {
        return SensorStatus::Critical;
    }
    if thresholds.max_critical.is_some_and(|t| value >= t) {
        return SensorStatus::Critical;
    }
    if thresholds.min_warning.is_some_and(|t| value <= t) {
        return SensorStatus::Warning;
    }
    if thresholds.max_warning.is_some_and(|t| value >= t) {
        return SensorStatus::Warning;
    }
    SensorStatus::Normal
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
