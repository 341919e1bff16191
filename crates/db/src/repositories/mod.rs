//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Reads take `&SqlitePool`; writes that must join a transaction take
//! `&mut SqliteConnection` so callers can pass `&mut *tx`.

pub mod alert_repo;
pub mod measurement_repo;
pub mod reading_repo;
pub mod sensor_repo;

pub use alert_repo::AlertRepo;
pub use measurement_repo::MeasurementRepo;
pub use reading_repo::{ReadingRepo, RecordedReading};
pub use sensor_repo::SensorRepo;
