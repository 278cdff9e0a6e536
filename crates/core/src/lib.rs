//! Domain types and rules shared by every cellblock crate.
//!
//! Nothing in here touches the database; repositories and services build
//! on these enums, state machines, and helpers.

pub mod error;
pub mod lifecycle;
pub mod permissions;
pub mod reference;
pub mod roles;
pub mod status;
pub mod types;
