//! The unit of work moving through the ingestion pipeline.

use chrono::Utc;
use serde::Serialize;

use crate::thresholds::{classify, SensorStatus, Thresholds};
use crate::types::{SensorId, Timestamp};

/// One generated value plus its derived status and capture time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub sensor_id: SensorId,
    pub value: f64,
    pub status: SensorStatus,
    pub timestamp: Timestamp,
}

impl Reading {
    /// Classify `value` against `thresholds` and stamp it with the current time.
    pub fn classified(sensor_id: SensorId, value: f64, thresholds: &Thresholds) -> Self {
        Self {
            sensor_id,
            value,
            status: classify(value, thresholds),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classified_reading_carries_status() {
        let thresholds = Thresholds::new(None, None, None, Some(1.0));
        let reading = Reading::classified(9, 1.0, &thresholds);
        assert_eq!(reading.sensor_id, 9);
        assert_eq!(reading.status, SensorStatus::Critical);

        let reading = Reading::classified(9, 1.0, &Thresholds::default());
        assert_eq!(reading.status, SensorStatus::Normal);
    }
}
