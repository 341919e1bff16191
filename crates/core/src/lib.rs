//! Pure domain logic for the server-room monitor.
//!
//! Nothing in this crate touches the database or spawns tasks; the
//! pipeline and db crates build on these types.

pub mod alert;
pub mod error;
pub mod generator;
pub mod reading;
pub mod sensor;
pub mod thresholds;
pub mod types;
