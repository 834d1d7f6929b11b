//! Core domain logic for the Dojo room allocation tool.
//! This crate is the single source of truth for allocation invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod registry;
pub mod report;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::person::{Person, PersonCategory, PersonId};
pub use model::room::{Room, RoomKind};
pub use registry::{
    AddedPerson, Allocation, AllocationError, AllocationResult, Reallocation, Registry,
    RegistrySnapshot, RosterLoadReport, UnallocatedRecord,
};
pub use report::text::{render_allocations, render_room, render_unallocated, render_vacancies};
pub use repo::state_repo::{RepoError, RepoResult, SqliteStateRepository, StateRepository};
pub use service::state_service::{StateService, StateServiceError, StateSummary};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
