//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches
//! - A filter struct for list queries where the table supports one

pub mod access_control;
pub mod cell;
pub mod emergency_procedure;
pub mod employee;
pub mod guard_duty;
pub mod prisoner;
pub mod security_alert;
pub mod security_log;
pub mod stats;
pub mod task;
pub mod visit;
pub mod visitor;
