//! Person domain model.
//!
//! # Responsibility
//! - Define the person record and its category vocabulary.
//! - Expose the living-space capability flag used by allocation rules.
//!
//! # Invariants
//! - `id` is assigned by the registry and never changes for a person.
//! - Only categories with `may_hold_living_space()` enter living-space state.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Stable identifier for a registered person.
///
/// Issued from a monotonically increasing registry counter.
pub type PersonId = u64;

/// Person category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonCategory {
    /// Eligible for office and living-space allocation.
    Fellow,
    /// Eligible for office allocation only.
    Staff,
}

impl PersonCategory {
    /// Returns whether people of this category may occupy a living space.
    pub fn may_hold_living_space(self) -> bool {
        match self {
            Self::Fellow => true,
            Self::Staff => false,
        }
    }

    /// Stable lowercase label used in reports and storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fellow => "fellow",
            Self::Staff => "staff",
        }
    }
}

impl Display for PersonCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a category label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCategoryError(pub String);

impl Display for ParseCategoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown person category `{}`; expected fellow|staff",
            self.0
        )
    }
}

impl Error for ParseCategoryError {}

impl FromStr for PersonCategory {
    type Err = ParseCategoryError;

    /// Parses `fellow`/`staff` case-insensitively.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fellow" => Ok(Self::Fellow),
            "staff" => Ok(Self::Staff),
            _ => Err(ParseCategoryError(value.to_string())),
        }
    }
}

/// Registered person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Registry-assigned identifier.
    pub id: PersonId,
    /// Display name, typically `"<first> <last>"`.
    pub full_name: String,
    pub category: PersonCategory,
}

impl Person {
    /// Creates a person record with a caller-provided id.
    ///
    /// Id issuance belongs to the registry; this constructor does not check
    /// uniqueness.
    pub fn new(id: PersonId, category: PersonCategory, full_name: impl Into<String>) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            category,
        }
    }

    /// Shortcut for `self.category.may_hold_living_space()`.
    pub fn may_hold_living_space(&self) -> bool {
        self.category.may_hold_living_space()
    }
}

#[cfg(test)]
mod tests {
    use super::{Person, PersonCategory};

    #[test]
    fn only_fellows_may_hold_living_space() {
        assert!(PersonCategory::Fellow.may_hold_living_space());
        assert!(!PersonCategory::Staff.may_hold_living_space());
        assert!(!Person::new(3, PersonCategory::Staff, "Ken Obi").may_hold_living_space());
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("FELLOW".parse::<PersonCategory>(), Ok(PersonCategory::Fellow));
        assert_eq!(" staff ".parse::<PersonCategory>(), Ok(PersonCategory::Staff));
        let err = "intern".parse::<PersonCategory>().unwrap_err();
        assert!(err.to_string().contains("intern"));
    }
}
