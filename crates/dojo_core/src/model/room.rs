//! Room domain model.
//!
//! # Responsibility
//! - Define offices and living spaces with their capacities.
//! - Keep the ordered occupant list for one room.
//!
//! # Invariants
//! - `occupants.len() <= capacity` after every registry operation.
//! - `occupants` never contains the same id twice.
//! - Occupant order is assignment order.

use crate::model::person::PersonId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const OFFICE_CAPACITY: u32 = 6;
const LIVING_SPACE_CAPACITY: u32 = 4;

/// Room kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Office,
    LivingSpace,
}

impl RoomKind {
    /// Both kinds in report order.
    pub const ALL: [RoomKind; 2] = [RoomKind::Office, RoomKind::LivingSpace];

    /// Capacity used when a room is created without an explicit override.
    pub fn default_capacity(self) -> u32 {
        match self {
            Self::Office => OFFICE_CAPACITY,
            Self::LivingSpace => LIVING_SPACE_CAPACITY,
        }
    }

    /// Stable lowercase label used in reports and storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Office => "office",
            Self::LivingSpace => "livingspace",
        }
    }
}

impl Display for RoomKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a room kind label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoomKindError(pub String);

impl Display for ParseRoomKindError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown room kind `{}`; expected office|livingspace",
            self.0
        )
    }
}

impl Error for ParseRoomKindError {}

impl FromStr for RoomKind {
    type Err = ParseRoomKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "office" => Ok(Self::Office),
            "livingspace" | "living_space" | "living-space" => Ok(Self::LivingSpace),
            _ => Err(ParseRoomKindError(value.to_string())),
        }
    }
}

/// Office or living space with its current occupants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Unique among all rooms of either kind.
    pub name: String,
    pub kind: RoomKind,
    pub capacity: u32,
    /// Occupant ids in assignment order.
    pub occupants: Vec<PersonId>,
}

impl Room {
    /// Creates an empty room with the kind's default capacity.
    pub fn new(kind: RoomKind, name: impl Into<String>) -> Self {
        Self::with_capacity(kind, name, kind.default_capacity())
    }

    /// Creates an empty room with an explicit capacity.
    ///
    /// Used when restoring persisted rooms whose capacity was overridden.
    pub fn with_capacity(kind: RoomKind, name: impl Into<String>, capacity: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            capacity,
            occupants: Vec::new(),
        }
    }

    /// Number of free places left.
    pub fn vacancies(&self) -> u32 {
        let taken = u32::try_from(self.occupants.len()).unwrap_or(u32::MAX);
        self.capacity.saturating_sub(taken)
    }

    pub fn has_vacancy(&self) -> bool {
        self.vacancies() > 0
    }

    pub fn contains(&self, person_id: PersonId) -> bool {
        self.occupants.contains(&person_id)
    }
}
