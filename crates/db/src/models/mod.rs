//! Row structs and insert DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts

pub mod alert;
pub mod measurement;
pub mod sensor;
