//! Sensor sampling and ingestion pipeline.
//!
//! One [`worker::SensorWorker`] task per sensor produces readings into a
//! bounded [`queue`]; a single [`writer::StorageWriter`] task consumes them
//! and persists each one through a [`store::ReadingStore`]. The
//! [`lifecycle::Monitor`] starts and stops the whole arrangement.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod queue;
pub mod store;
pub mod worker;
pub mod writer;

pub use config::{PersistFailurePolicy, PipelineConfig, ShutdownPolicy};
pub use error::PipelineError;
pub use lifecycle::{Monitor, ShutdownReport};
pub use store::{ReadingStore, SqliteStore, StoreError};
