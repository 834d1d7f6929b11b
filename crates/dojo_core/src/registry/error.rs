//! Allocation error taxonomy.

use crate::model::person::{PersonCategory, PersonId};
use crate::model::room::RoomKind;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AllocationResult<T> = Result<T, AllocationError>;

/// Errors returned by registry operations.
///
/// Every variant is produced before any state mutation, so a failed call
/// leaves the registry unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// A room with this name already exists (either kind).
    DuplicateName(String),
    /// Name is blank after trim.
    InvalidName,
    PersonNotFound(PersonId),
    RoomNotFound(String),
    /// Target room has no free place.
    RoomFull(String),
    /// Person already occupies the target room.
    AlreadyAssigned { person_id: PersonId, room: String },
    /// Person already holds a room of this kind; reallocate instead.
    AlreadyAllocated {
        person_id: PersonId,
        kind: RoomKind,
        room: String,
    },
    /// Category may not hold rooms of this kind (staff in a living space).
    InvalidCategoryForRoomKind {
        person_id: PersonId,
        category: PersonCategory,
        kind: RoomKind,
    },
    /// Roster line could not be parsed; the loader skips it.
    MalformedRecord {
        line_number: usize,
        line: String,
        reason: String,
    },
    /// Persisted state is internally inconsistent; the load is aborted.
    DataIntegrityFault(String),
}

impl Display for AllocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "a room called `{name}` already exists"),
            Self::InvalidName => write!(f, "name must not be blank"),
            Self::PersonNotFound(id) => write!(f, "person not found: {id}"),
            Self::RoomNotFound(name) => write!(f, "room not found: `{name}`"),
            Self::RoomFull(name) => write!(f, "room `{name}` is already full"),
            Self::AlreadyAssigned { person_id, room } => {
                write!(f, "person {person_id} is already in room `{room}`")
            }
            Self::AlreadyAllocated {
                person_id,
                kind,
                room,
            } => write!(
                f,
                "person {person_id} already has the {kind} `{room}`; reallocate instead"
            ),
            Self::InvalidCategoryForRoomKind {
                person_id,
                category,
                kind,
            } => write!(
                f,
                "person {person_id} is {category} and cannot hold a {kind}"
            ),
            Self::MalformedRecord {
                line_number,
                line,
                reason,
            } => write!(f, "line {line_number} `{line}` skipped: {reason}"),
            Self::DataIntegrityFault(details) => write!(f, "data integrity fault: {details}"),
        }
    }
}

impl AllocationError {
    /// Stable machine-readable code for log lines. Never embeds names.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateName(_) => "duplicate_name",
            Self::InvalidName => "invalid_name",
            Self::PersonNotFound(_) => "person_not_found",
            Self::RoomNotFound(_) => "room_not_found",
            Self::RoomFull(_) => "room_full",
            Self::AlreadyAssigned { .. } => "already_assigned",
            Self::AlreadyAllocated { .. } => "already_allocated",
            Self::InvalidCategoryForRoomKind { .. } => "invalid_category_for_room_kind",
            Self::MalformedRecord { .. } => "malformed_record",
            Self::DataIntegrityFault(_) => "data_integrity_fault",
        }
    }
}

impl Error for AllocationError {}

#[cfg(test)]
mod tests {
    use super::AllocationError;

    #[test]
    fn codes_do_not_carry_room_names() {
        let errors = [
            AllocationError::RoomNotFound("Secret Room".to_string()),
            AllocationError::DuplicateName("Secret Room".to_string()),
            AllocationError::RoomFull("Secret Room".to_string()),
            AllocationError::DataIntegrityFault("room `Secret Room` over capacity".to_string()),
        ];
        for err in &errors {
            assert!(err.to_string().contains("Secret Room"));
            assert!(!err.code().contains("Secret"));
        }
        assert_eq!(errors[0].code(), "room_not_found");
        assert_eq!(errors[3].code(), "data_integrity_fault");
    }
}
