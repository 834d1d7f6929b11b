//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract for registry state.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repositories move plain snapshots; registry invariants are checked by
//!   `Registry::from_snapshot`, never by SQL.

pub mod state_repo;
