//! Registry save/load use-case service.
//!
//! # Responsibility
//! - Save a registry through a `StateRepository`.
//! - Load stored state into a fresh or existing registry.
//!
//! # Invariants
//! - Loading replaces registry state wholesale; there is no merge.
//! - A load that fails integrity checks leaves the target registry untouched.

use crate::registry::{AllocationError, Registry};
use crate::repo::state_repo::{RepoError, StateRepository};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from state save/load use-cases.
#[derive(Debug)]
pub enum StateServiceError {
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Stored state failed registry integrity checks.
    Allocation(AllocationError),
}

impl Display for StateServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Allocation(err) => write!(f, "{err}"),
        }
    }
}

impl StateServiceError {
    /// Stable machine-readable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Repo(err) => err.code(),
            Self::Allocation(err) => err.code(),
        }
    }
}

impl Error for StateServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Allocation(err) => Some(err),
        }
    }
}

impl From<RepoError> for StateServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<AllocationError> for StateServiceError {
    fn from(value: AllocationError) -> Self {
        Self::Allocation(value)
    }
}

/// Summary of one save or load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSummary {
    pub people: usize,
    pub rooms: usize,
    pub unallocated: usize,
}

/// Save/load facade over a state repository.
pub struct StateService<R: StateRepository> {
    repo: R,
}

impl<R: StateRepository> StateService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists the full registry state, replacing what was stored.
    pub fn save(&self, registry: &Registry) -> Result<StateSummary, StateServiceError> {
        let started_at = Instant::now();
        let snapshot = registry.snapshot();
        let summary = StateSummary {
            people: snapshot.people.len(),
            rooms: snapshot.rooms.len(),
            unallocated: snapshot.unallocated.len(),
        };

        if let Err(err) = self.repo.save_snapshot(&snapshot) {
            error!(
                "event=state_save module=service status=error duration_ms={} error_code={}",
                started_at.elapsed().as_millis(),
                err.code()
            );
            return Err(err.into());
        }

        info!(
            "event=state_save module=service status=ok duration_ms={} people={} rooms={} unallocated={}",
            started_at.elapsed().as_millis(),
            summary.people,
            summary.rooms,
            summary.unallocated
        );
        Ok(summary)
    }

    /// Builds a new registry from stored state.
    pub fn load(&self) -> Result<Registry, StateServiceError> {
        let mut registry = Registry::new();
        self.load_into(&mut registry)?;
        Ok(registry)
    }

    /// Replaces `registry` state with stored state.
    ///
    /// # Errors
    /// - `Repo` for storage failures or unparsable rows.
    /// - `Allocation(DataIntegrityFault)` when stored rows are inconsistent.
    pub fn load_into(&self, registry: &mut Registry) -> Result<StateSummary, StateServiceError> {
        let started_at = Instant::now();
        let result = self.repo.load_snapshot().map_err(StateServiceError::from).and_then(
            |snapshot| {
                let summary = StateSummary {
                    people: snapshot.people.len(),
                    rooms: snapshot.rooms.len(),
                    unallocated: snapshot.unallocated.len(),
                };
                registry.restore(snapshot)?;
                Ok(summary)
            },
        );

        match &result {
            Ok(summary) => info!(
                "event=state_load module=service status=ok duration_ms={} people={} rooms={} unallocated={}",
                started_at.elapsed().as_millis(),
                summary.people,
                summary.rooms,
                summary.unallocated
            ),
            Err(err) => error!(
                "event=state_load module=service status=error duration_ms={} error_code={}",
                started_at.elapsed().as_millis(),
                err.code()
            ),
        }
        result
    }
}
