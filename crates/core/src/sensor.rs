//! Sensor registry: static per-type generation parameters.
//!
//! Every sensor type the monitor knows about is a [`SensorType`] variant,
//! and all type-specific behaviour (random-walk step size, fallback bounds,
//! rounding, start value, sampling cadence, units) is resolved through
//! [`SensorType::profile`]. Adding a type is a compile error until every
//! `match` in this crate handles it.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::thresholds::Thresholds;
use crate::types::SensorId;

/// Kind of simulated sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Temperature,
    Humidity,
    AirQuality,
    Smoke,
    Gas,
    Motion,
    Sound,
    Tampering,
    WaterLeak,
    Light,
    /// Any type string the registry does not recognise.
    Other,
}

impl SensorType {
    /// Every known type, in seeding order.
    pub const ALL: [SensorType; 10] = [
        SensorType::Temperature,
        SensorType::Humidity,
        SensorType::AirQuality,
        SensorType::Smoke,
        SensorType::Gas,
        SensorType::Motion,
        SensorType::Sound,
        SensorType::Tampering,
        SensorType::WaterLeak,
        SensorType::Light,
    ];

    /// Canonical name as stored in `sensors.type`.
    pub fn as_str(self) -> &'static str {
        match self {
            SensorType::Temperature => "temperature",
            SensorType::Humidity => "humidity",
            SensorType::AirQuality => "air_quality",
            SensorType::Smoke => "smoke",
            SensorType::Gas => "gas",
            SensorType::Motion => "motion",
            SensorType::Sound => "sound",
            SensorType::Tampering => "tampering",
            SensorType::WaterLeak => "water_leak",
            SensorType::Light => "light",
            SensorType::Other => "other",
        }
    }

    /// Resolve a stored type name. Unknown names map to [`SensorType::Other`].
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "temperature" => SensorType::Temperature,
            "humidity" => SensorType::Humidity,
            "air_quality" => SensorType::AirQuality,
            "smoke" => SensorType::Smoke,
            "gas" => SensorType::Gas,
            "motion" => SensorType::Motion,
            "sound" => SensorType::Sound,
            "tampering" => SensorType::Tampering,
            "water_leak" => SensorType::WaterLeak,
            "light" => SensorType::Light,
            _ => SensorType::Other,
        }
    }

    /// Fixed generation parameters for this type.
    pub fn profile(self) -> SensorProfile {
        use Bound::{Fixed, Threshold};
        use InitialValue::{Constant, Uniform};

        let (change_range, min_bound, max_bound, initial, nominal_interval) = match self {
            SensorType::Temperature => (0.5, Threshold(15.0), Threshold(35.0), Uniform(20.0, 25.0), 1_000),
            SensorType::Humidity => (2.0, Threshold(20.0), Threshold(80.0), Uniform(40.0, 60.0), 1_000),
            SensorType::AirQuality => (50.0, Threshold(400.0), Threshold(1500.0), Uniform(400.0, 800.0), 1_000),
            SensorType::Smoke => (5.0, Fixed(0.0), Threshold(100.0), Uniform(0.0, 10.0), 1_000),
            SensorType::Gas => (10.0, Fixed(0.0), Threshold(200.0), Uniform(0.0, 20.0), 1_000),
            SensorType::Motion => (5.0, Threshold(0.0), Threshold(100.0), Constant(0.0), 100),
            SensorType::Sound => (5.0, Threshold(20.0), Threshold(80.0), Uniform(30.0, 50.0), 50),
            SensorType::Tampering => (0.05, Threshold(0.1), Threshold(0.4), Uniform(0.1, 0.2), 10),
            SensorType::WaterLeak => (1.0, Fixed(0.0), Fixed(1.0), Constant(0.0), 1_000),
            SensorType::Light => (20.0, Threshold(300.0), Threshold(600.0), Uniform(300.0, 400.0), 1_000),
            SensorType::Other => (5.0, Threshold(0.0), Threshold(100.0), Uniform(0.0, 50.0), 1_000),
        };

        let precision = match self {
            SensorType::Temperature | SensorType::Humidity | SensorType::Sound => 1,
            SensorType::Tampering => 4,
            _ => 2,
        };

        let (unit, normal_range) = match self {
            SensorType::Temperature => ("°C", (18.0, 25.0)),
            SensorType::Humidity => ("%", (30.0, 50.0)),
            SensorType::AirQuality => ("ppm", (400.0, 1000.0)),
            SensorType::Smoke => ("ppm", (0.0, 300.0)),
            SensorType::Gas => ("ppm", (0.0, 1000.0)),
            SensorType::Motion | SensorType::WaterLeak => ("binary", (0.0, 1.0)),
            SensorType::Sound => ("dB", (0.0, 70.0)),
            SensorType::Tampering => ("g/deg/s", (0.0, 0.5)),
            SensorType::Light => ("lux", (300.0, 500.0)),
            SensorType::Other => ("", (0.0, 100.0)),
        };

        SensorProfile {
            change_range,
            min_bound,
            max_bound,
            precision,
            initial,
            nominal_interval: Duration::from_millis(nominal_interval),
            unit,
            normal_range,
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

/// Where one side of the random-walk range comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// The sensor's warning threshold on that side, or this fallback when unset.
    Threshold(f64),
    /// Always this value, regardless of configured thresholds.
    Fixed(f64),
}

/// Distribution of a sensor's first generated value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitialValue {
    Constant(f64),
    /// Uniform over `[low, high]`.
    Uniform(f64, f64),
}

impl InitialValue {
    pub fn sample<R: Rng>(self, rng: &mut R) -> f64 {
        match self {
            InitialValue::Constant(v) => v,
            InitialValue::Uniform(low, high) if low < high => rng.random_range(low..=high),
            InitialValue::Uniform(low, _) => low,
        }
    }
}

/// Generation parameters for one sensor type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorProfile {
    /// Maximum absolute step per sample.
    pub change_range: f64,
    pub min_bound: Bound,
    pub max_bound: Bound,
    /// Decimal places kept on every generated value.
    pub precision: u32,
    pub initial: InitialValue,
    /// Sampling cadence before the slowdown multiplier is applied.
    pub nominal_interval: Duration,
    pub unit: &'static str,
    /// Typical operating range, used to pick alert wording.
    pub normal_range: (f64, f64),
}

impl SensorProfile {
    /// Resolve the random-walk range `[min, max]` for a sensor's thresholds.
    ///
    /// The warning threshold is the effective bound (not the critical one),
    /// unless the type pins that side to a fixed value.
    pub fn effective_bounds(&self, thresholds: &Thresholds) -> (f64, f64) {
        let min = match self.min_bound {
            Bound::Threshold(fallback) => thresholds.min_warning.unwrap_or(fallback),
            Bound::Fixed(v) => v,
        };
        let max = match self.max_bound {
            Bound::Threshold(fallback) => thresholds.max_warning.unwrap_or(fallback),
            Bound::Fixed(v) => v,
        };
        (min, max)
    }

    /// Sampling interval after applying `slowdown` to the nominal cadence.
    pub fn sampling_interval(&self, slowdown: f64) -> Duration {
        self.nominal_interval.mul_f64(slowdown.max(0.0))
    }
}

/// Immutable configuration for one simulated sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorConfig {
    pub sensor_id: SensorId,
    pub sensor_type: SensorType,
    pub sampling_interval: Duration,
    pub thresholds: Thresholds,
}

impl SensorConfig {
    /// Build a config whose interval is the type's nominal cadence times `slowdown`.
    pub fn new(sensor_id: SensorId, sensor_type: SensorType, thresholds: Thresholds, slowdown: f64) -> Self {
        Self {
            sensor_id,
            sensor_type,
            sampling_interval: sensor_type.profile().sampling_interval(slowdown),
            thresholds,
        }
    }

    /// Reject threshold sets that cannot drive a random walk.
    ///
    /// Thresholds must be finite, each min must not exceed its max, and the
    /// effective generation range must not be inverted.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.thresholds.validate().map_err(|reason| {
            CoreError::Validation(format!("sensor {}: {reason}", self.sensor_id))
        })?;

        let (min, max) = self.sensor_type.profile().effective_bounds(&self.thresholds);
        if min > max {
            return Err(CoreError::Validation(format!(
                "sensor {}: effective range [{min}, {max}] is inverted",
                self.sensor_id
            )));
        }
        Ok(())
    }
}
