//! Bulk roster loading from text.
//!
//! # Responsibility
//! - Parse `first last TYPE [ACCOMMODATION]` lines and register each person.
//! - Skip malformed lines and report them instead of failing the load.
//!
//! # Invariants
//! - `TYPE` matching is case-sensitive (`FELLOW` or `STAFF`).
//! - A fourth token requests accommodation for fellows only; staff requests
//!   are accepted and ignored.

use super::{AddedPerson, AllocationError, Registry};
use crate::model::person::PersonCategory;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

static ROSTER_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<first>\S+)\s+(?P<last>\S+)\s+(?P<kind>\S+)(?:\s+(?P<accommodation>\S+))?$")
        .expect("valid roster line regex")
});

/// Outcome of one roster load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterLoadReport {
    /// People registered, in file order.
    pub added: Vec<AddedPerson>,
    /// `AllocationError::MalformedRecord` for every skipped line.
    pub skipped: Vec<AllocationError>,
}

#[derive(Debug, PartialEq, Eq)]
struct RosterEntry<'a> {
    first_name: &'a str,
    last_name: &'a str,
    category: PersonCategory,
    wants_accommodation: bool,
}

impl Registry {
    /// Registers every well-formed roster line in order.
    ///
    /// Blank lines are ignored; malformed lines are collected in
    /// `RosterLoadReport::skipped`.
    pub fn load_from_text(&mut self, text: &str) -> RosterLoadReport {
        let mut report = RosterLoadReport::default();

        for (index, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            match parse_roster_line(line) {
                Ok(entry) => report.added.push(self.add_person(
                    entry.first_name,
                    entry.last_name,
                    entry.category,
                    entry.wants_accommodation,
                )),
                Err(reason) => {
                    let line_number = index + 1;
                    warn!(
                        "event=roster_line_skipped module=registry status=error line={} error_code=malformed_record",
                        line_number
                    );
                    report.skipped.push(AllocationError::MalformedRecord {
                        line_number,
                        line: line.to_string(),
                        reason,
                    });
                }
            }
        }

        info!(
            "event=roster_load module=registry status=ok added={} skipped={}",
            report.added.len(),
            report.skipped.len()
        );
        report
    }
}

fn parse_roster_line(line: &str) -> Result<RosterEntry<'_>, String> {
    let captures = ROSTER_LINE_RE
        .captures(line)
        .ok_or_else(|| "expected `first last TYPE [ACCOMMODATION]`".to_string())?;

    let (Some(first), Some(last), Some(kind)) = (
        captures.name("first"),
        captures.name("last"),
        captures.name("kind"),
    ) else {
        return Err("expected `first last TYPE [ACCOMMODATION]`".to_string());
    };
    let category = match kind.as_str() {
        "FELLOW" => PersonCategory::Fellow,
        "STAFF" => PersonCategory::Staff,
        other => return Err(format!("unknown person type `{other}`")),
    };
    let wants_accommodation =
        captures.name("accommodation").is_some() && category.may_hold_living_space();

    Ok(RosterEntry {
        first_name: first.as_str(),
        last_name: last.as_str(),
        category,
        wants_accommodation,
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_roster_line, RosterEntry};
    use crate::model::person::PersonCategory;

    #[test]
    fn fourth_token_requests_accommodation_for_fellows() {
        let entry = parse_roster_line("OLUWAFEMI SULE FELLOW Y").unwrap();
        assert_eq!(
            entry,
            RosterEntry {
                first_name: "OLUWAFEMI",
                last_name: "SULE",
                category: PersonCategory::Fellow,
                wants_accommodation: true,
            }
        );
        assert!(!parse_roster_line("DOMINIC WALTERS STAFF").unwrap().wants_accommodation);
    }

    #[test]
    fn staff_accommodation_request_is_ignored() {
        let entry = parse_roster_line("LEIGH RILEY STAFF Y").unwrap();
        assert_eq!(entry.category, PersonCategory::Staff);
        assert!(!entry.wants_accommodation);
    }

    #[test]
    fn type_is_case_sensitive_and_token_count_is_checked() {
        assert!(parse_roster_line("TANA LOPEZ fellow").is_err());
        assert!(parse_roster_line("TANA LOPEZ").is_err());
        assert!(parse_roster_line("TANA LOPEZ FELLOW Y EXTRA").is_err());
        assert!(parse_roster_line("TANA LOPEZ INTERN").unwrap_err().contains("INTERN"));
    }
}
