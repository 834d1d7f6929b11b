//! Domain model for people and rooms.
//!
//! # Responsibility
//! - Define the canonical person and room records owned by the registry.
//! - Keep category/kind vocabulary in one place for parsing and rendering.
//!
//! # Invariants
//! - Every person is identified by a registry-assigned `PersonId`.
//! - Rooms reference occupants by id only; they never own people.

pub mod person;
pub mod room;
