//! Alert severity and human-readable alert descriptions.

use serde::{Deserialize, Serialize};

use crate::sensor::SensorType;
use crate::thresholds::SensorStatus;

/// Severity level stored on an alert row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Value reached a warning bound but no critical bound.
    Warning,
    /// Value reached a critical bound.
    Critical,
}

impl AlertSeverity {
    /// Severity for a reading status; `None` for [`SensorStatus::Normal`].
    pub fn from_status(status: SensorStatus) -> Option<Self> {
        match status {
            SensorStatus::Normal => None,
            SensorStatus::Warning => Some(AlertSeverity::Warning),
            SensorStatus::Critical => Some(AlertSeverity::Critical),
        }
    }

    /// Name stored in `alerts.severity`.
    pub fn as_str(self) -> &'static str {
        match self {
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "warning" => Some(AlertSeverity::Warning),
            "critical" => Some(AlertSeverity::Critical),
            _ => None,
        }
    }
}

/// Format a value with the sensor type's rounding precision.
pub fn format_value(sensor_type: SensorType, value: f64) -> String {
    let precision = sensor_type.profile().precision as usize;
    format!("{value:.precision$}")
}

/// Build the description stored with an alert.
///
/// Types with a two-sided normal range say "High" or "Low" depending on
/// whether the value is above the upper end of that range. Presence-style
/// sensors (motion, water leak) use a fixed message.
pub fn describe(sensor_type: SensorType, value: f64) -> String {
    let v = format_value(sensor_type, value);
    let above_normal = value > sensor_type.profile().normal_range.1;
    let direction = if above_normal { "High" } else { "Low" };

    match sensor_type {
        SensorType::Temperature => format!("{direction} temperature: {v}°C"),
        SensorType::Humidity => format!("{direction} humidity: {v}%"),
        SensorType::AirQuality => format!("High CO2 level: {v} ppm"),
        SensorType::Smoke => format!("High smoke level: {v} ppm"),
        SensorType::Gas => format!("High gas level: {v} ppm"),
        SensorType::Motion => "Unauthorized motion detected".to_string(),
        SensorType::Sound => format!("High sound level: {v} dB"),
        SensorType::Tampering => format!("Abnormal vibration: {v} g/deg/s"),
        SensorType::WaterLeak => "Water leak detected".to_string(),
        SensorType::Light => format!("{direction} light level: {v} lux"),
        SensorType::Other => format!("Abnormal reading: {v}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_and_low_temperature() {
        assert_eq!(describe(SensorType::Temperature, 30.0), "High temperature: 30.0°C");
        assert_eq!(describe(SensorType::Temperature, 14.0), "Low temperature: 14.0°C");
        assert_eq!(describe(SensorType::Temperature, 31.2), "High temperature: 31.2°C");
    }

    #[test]
    fn humidity_and_light_use_normal_upper_bound() {
        assert_eq!(describe(SensorType::Humidity, 65.0), "High humidity: 65.0%");
        assert_eq!(describe(SensorType::Humidity, 50.0), "Low humidity: 50.0%");
        assert_eq!(describe(SensorType::Light, 800.0), "High light level: 800.00 lux");
        assert_eq!(describe(SensorType::Light, 150.5), "Low light level: 150.50 lux");
    }

    #[test]
    fn direction_independent_messages() {
        assert_eq!(describe(SensorType::WaterLeak, 1.0), "Water leak detected");
        assert_eq!(describe(SensorType::WaterLeak, 0.0), "Water leak detected");
        assert_eq!(describe(SensorType::Motion, 1.0), "Unauthorized motion detected");
        assert_eq!(describe(SensorType::Smoke, 55.5), "High smoke level: 55.50 ppm");
    }

    #[test]
    fn tampering_keeps_four_decimals() {
        assert_eq!(
            describe(SensorType::Tampering, 0.5),
            "Abnormal vibration: 0.5000 g/deg/s"
        );
    }

    #[test]
    fn unknown_types_get_generic_message() {
        assert_eq!(describe(SensorType::Other, 42.0), "Abnormal reading: 42.00");
    }

    #[test]
    fn severity_from_status() {
        assert_eq!(AlertSeverity::from_status(SensorStatus::Normal), None);
        assert_eq!(
            AlertSeverity::from_status(SensorStatus::Warning),
            Some(AlertSeverity::Warning)
        );
        assert_eq!(
            AlertSeverity::from_status(SensorStatus::Critical),
            Some(AlertSeverity::Critical)
        );
    }

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&AlertSeverity::Critical).expect("serialize");
        assert_eq!(json, "\"critical\"");
        assert_eq!(AlertSeverity::from_name("warning"), Some(AlertSeverity::Warning));
    }
}
