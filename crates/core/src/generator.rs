//! Bounded random-walk value generation.
//!
//! [`ValueGenerator`] keeps the last value of every sensor and derives the
//! next one by adding a small uniform delta, clamping to the sensor's
//! effective range and rounding to the type's precision. Successive values
//! for a sensor are therefore correlated, like a physical quantity with
//! inertia.
//!
//! The generator is shared by every sensor worker (`Arc<ValueGenerator>`).
//! Its last-value table is split into shards, each behind its own lock, so
//! workers for different sensors rarely contend.

use std::collections::HashMap;

use parking_lot::Mutex;
use rand::Rng;

use crate::error::CoreError;
use crate::sensor::SensorType;
use crate::thresholds::Thresholds;
use crate::types::SensorId;

/// Default number of lock shards.
const DEFAULT_SHARDS: usize = 16;

/// Keyed store of last values plus the random-walk step.
#[derive(Debug)]
pub struct ValueGenerator {
    shards: Box<[Mutex<HashMap<SensorId, f64>>]>,
}

impl Default for ValueGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueGenerator {
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Create a generator with `shards` independent locks (at least one).
    pub fn with_shards(shards: usize) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| Mutex::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { shards }
    }

    fn shard(&self, sensor_id: SensorId) -> &Mutex<HashMap<SensorId, f64>> {
        let idx = sensor_id.rem_euclid(self.shards.len() as i64) as usize;
        &self.shards[idx]
    }

    /// Produce the next value for a sensor.
    ///
    /// The first call for a sensor seeds its last value from the type's
    /// initial distribution before stepping.
    pub fn next(
        &self,
        sensor_id: SensorId,
        sensor_type: SensorType,
        thresholds: &Thresholds,
    ) -> Result<f64, CoreError> {
        let profile = sensor_type.profile();
        let (min, max) = profile.effective_bounds(thresholds);

        // Also rejects NaN bounds.
        if !(min <= max) {
            return Err(CoreError::Generation {
                sensor_id,
                reason: format!("effective range [{min}, {max}] is invalid"),
            });
        }

        let mut rng = rand::rng();
        let mut values = self.shard(sensor_id).lock();

        let last = *values
            .entry(sensor_id)
            .or_insert_with(|| profile.initial.sample(&mut rng));

        let change = profile.change_range;
        let delta = if change > 0.0 {
            rng.random_range(-change..=change)
        } else {
            0.0
        };

        let value = random_walk_step(last, delta, (min, max), profile.precision);
        if !value.is_finite() {
            return Err(CoreError::Generation {
                sensor_id,
                reason: format!("non-finite value from last={last} delta={delta}"),
            });
        }

        values.insert(sensor_id, value);
        Ok(value)
    }

    /// Overwrite the last value of a sensor.
    pub fn seed(&self, sensor_id: SensorId, value: f64) {
        self.shard(sensor_id).lock().insert(sensor_id, value);
    }

    /// Last generated (or seeded) value of a sensor.
    pub fn last_value(&self, sensor_id: SensorId) -> Option<f64> {
        self.shard(sensor_id).lock().get(&sensor_id).copied()
    }
}

/// One deterministic random-walk step.
///
/// `last + delta`, clamped into `bounds` and rounded to `precision`
/// decimals. Bounds are expected to be ordered (`min <= max`).
pub fn random_walk_step(last: f64, delta: f64, bounds: (f64, f64), precision: u32) -> f64 {
    let (min, max) = bounds;
    let candidate = (last + delta).max(min).min(max);
    round_within(candidate, min, max, precision)
}

/// Round to `precision` decimals without leaving `[min, max]`.
///
/// If plain rounding lands outside the range the value snaps to the nearest
/// grid point inside it, or to the bound itself when no grid point fits.
pub fn round_within(value: f64, min: f64, max: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    let mut rounded = (value * factor).round() / factor;
    if rounded > max {
        rounded = (max * factor).floor() / factor;
    }
    if rounded < min {
        rounded = (min * factor).ceil() / factor;
    }
    rounded.max(min).min(max)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
