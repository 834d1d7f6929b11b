//! Command set shared by one-shot invocations and the interactive shell.
//!
//! # Responsibility
//! - Map parsed commands onto registry, report and state-service calls.
//! - Render user-facing confirmation lines.
//!
//! # Invariants
//! - One `Session` owns exactly one registry for the process lifetime.
//! - A failing command leaves the registry untouched.

use clap::Subcommand;
use dojo_core::db::{open_db, open_existing_db, DbError};
use dojo_core::{
    render_allocations, render_room, render_unallocated, render_vacancies, AllocationError,
    PersonCategory, PersonId, Registry, RepoError, RoomKind, SqliteStateRepository, StateService,
    StateServiceError,
};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter, Write as _};
use std::path::{Path, PathBuf};

const DEFAULT_ROSTER_FILE: &str = "input.txt";
const DEFAULT_DB_FILE: &str = "dojo.db";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create one or more rooms of the same kind
    CreateRoom {
        /// `office` or `livingspace`
        kind: RoomKind,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Register a person and place them in random rooms
    AddPerson {
        first_name: String,
        last_name: String,
        /// `fellow` or `staff`
        category: PersonCategory,
        /// `Y` to request a living space (fellows only)
        wants_accommodation: Option<String>,
    },
    /// Place an unallocated person into a random room of a kind
    AllocatePerson { person_id: PersonId, kind: RoomKind },
    /// Move a person into a named room
    ReallocatePerson {
        person_id: PersonId,
        room_name: String,
    },
    /// Remove a person and free their places
    RemovePerson { person_id: PersonId },
    /// Delete a room and unallocate its occupants
    DeleteRoom { name: String },
    RenameRoom { old_name: String, new_name: String },
    RenamePerson {
        person_id: PersonId,
        first_name: String,
        last_name: String,
    },
    /// Look up ids for a full name
    GetPersonId { first_name: String, last_name: String },
    /// Print the occupants of one room
    PrintRoom { name: String },
    /// Print every room with its occupants, optionally to a file
    PrintAllocations { file: Option<String> },
    /// Print people missing an office or living space, optionally to a file
    PrintUnallocated { file: Option<String> },
    /// Print rooms with free places
    PrintVacantRooms,
    /// Load people from a roster file
    LoadPeople {
        #[arg(default_value = DEFAULT_ROSTER_FILE)]
        file: PathBuf,
    },
    /// Save the whole registry to a SQLite database
    SaveState {
        #[arg(default_value = DEFAULT_DB_FILE)]
        db: PathBuf,
    },
    /// Replace the registry with state stored in a SQLite database
    LoadState {
        #[arg(default_value = DEFAULT_DB_FILE)]
        db: PathBuf,
    },
    /// Start the interactive shell
    Shell,
}

impl Command {
    /// Stable name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create_room",
            Self::AddPerson { .. } => "add_person",
            Self::AllocatePerson { .. } => "allocate_person",
            Self::ReallocatePerson { .. } => "reallocate_person",
            Self::RemovePerson { .. } => "remove_person",
            Self::DeleteRoom { .. } => "delete_room",
            Self::RenameRoom { .. } => "rename_room",
            Self::RenamePerson { .. } => "rename_person",
            Self::GetPersonId { .. } => "get_person_id",
            Self::PrintRoom { .. } => "print_room",
            Self::PrintAllocations { .. } => "print_allocations",
            Self::PrintUnallocated { .. } => "print_unallocated",
            Self::PrintVacantRooms => "print_vacant_rooms",
            Self::LoadPeople { .. } => "load_people",
            Self::SaveState { .. } => "save_state",
            Self::LoadState { .. } => "load_state",
            Self::Shell => "shell",
        }
    }
}

/// Failures surfaced to the CLI user.
#[derive(Debug)]
pub enum CliError {
    Allocation(AllocationError),
    State(StateServiceError),
    Io { path: PathBuf, message: String },
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allocation(err) => write!(f, "{err}"),
            Self::State(err) => write!(f, "{err}"),
            Self::Io { path, message } => write!(f, "`{}`: {message}", path.display()),
        }
    }
}

impl CliError {
    /// Stable machine-readable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Allocation(err) => err.code(),
            Self::State(err) => err.code(),
            Self::Io { .. } => "io_error",
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Allocation(err) => Some(err),
            Self::State(err) => Some(err),
            Self::Io { .. } => None,
        }
    }
}

impl From<AllocationError> for CliError {
    fn from(value: AllocationError) -> Self {
        Self::Allocation(value)
    }
}

impl From<StateServiceError> for CliError {
    fn from(value: StateServiceError) -> Self {
        Self::State(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::State(StateServiceError::Repo(value))
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::from(RepoError::Db(value))
    }
}

/// Registry plus the directory report files are written into.
pub struct Session {
    registry: Registry,
    output_dir: PathBuf,
}

impl Session {
    pub fn new(output_dir: PathBuf) -> Self {
        Self::with_registry(Registry::new(), output_dir)
    }

    pub fn with_registry(registry: Registry, output_dir: PathBuf) -> Self {
        Self {
            registry,
            output_dir,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs one command and returns the text to show the user.
    pub fn execute(&mut self, command: Command) -> Result<String, CliError> {
        let name = command.name();
        let result = self.dispatch(command);
        match &result {
            Ok(_) => info!("event=cli_command module=cli status=ok command={name}"),
            Err(err) => error!(
                "event=cli_command module=cli status=error command={name} error_code={}",
                err.code()
            ),
        }
        result
    }

    fn dispatch(&mut self, command: Command) -> Result<String, CliError> {
        match command {
            Command::CreateRoom { kind, names } => Ok(self.create_rooms(kind, &names)),
            Command::AddPerson {
                first_name,
                last_name,
                category,
                wants_accommodation,
            } => Ok(self.add_person(
                &first_name,
                &last_name,
                category,
                wants_accommodation.as_deref().is_some_and(is_yes),
            )),
            Command::AllocatePerson { person_id, kind } => {
                let placed = self.registry.allocate_person(person_id, kind)?;
                let full_name = self.full_name(person_id)?;
                Ok(match placed {
                    Some(room) => placed_line(&full_name, kind, &room),
                    None => unavailable_line(&full_name, kind),
                })
            }
            Command::ReallocatePerson {
                person_id,
                room_name,
            } => {
                let moved = self.registry.reallocate_person(person_id, &room_name)?;
                let full_name = self.full_name(person_id)?;
                Ok(match moved.from {
                    Some(from) => format!("{full_name} has been moved from {from} to {}.\n", moved.to),
                    None => placed_line(&full_name, moved.kind, &moved.to),
                })
            }
            Command::RemovePerson { person_id } => {
                let person = self.registry.remove_person(person_id)?;
                Ok(format!(
                    "{} - id: {} has been removed.\n",
                    person.full_name, person.id
                ))
            }
            Command::DeleteRoom { name } => {
                let room = self.registry.delete_room(&name)?;
                Ok(format!(
                    "Room {} has been deleted. {} occupant(s) are now unallocated.\n",
                    room.name,
                    room.occupants.len()
                ))
            }
            Command::RenameRoom { old_name, new_name } => {
                self.registry.rename_room(&old_name, &new_name)?;
                Ok(format!("Room {old_name} has been renamed to {}.\n", new_name.trim()))
            }
            Command::RenamePerson {
                person_id,
                first_name,
                last_name,
            } => {
                let full_name = format!("{} {}", first_name.trim(), last_name.trim());
                self.registry.rename_person(person_id, &full_name)?;
                Ok(format!("Person {person_id} has been renamed to {full_name}.\n"))
            }
            Command::GetPersonId {
                first_name,
                last_name,
            } => Ok(self.person_ids(&format!("{first_name} {last_name}"))),
            Command::PrintRoom { name } => Ok(render_room(&self.registry, &name)?),
            Command::PrintAllocations { file } => {
                let report = render_allocations(&self.registry);
                self.with_optional_file(report, file.as_deref())
            }
            Command::PrintUnallocated { file } => {
                let report = render_unallocated(&self.registry);
                self.with_optional_file(report, file.as_deref())
            }
            Command::PrintVacantRooms => Ok(render_vacancies(&self.registry)),
            Command::LoadPeople { file } => self.load_people(&file),
            Command::SaveState { db } => {
                let conn = open_db(&db)?;
                let service = StateService::new(SqliteStateRepository::try_new(&conn)?);
                let summary = service.save(&self.registry)?;
                Ok(format!(
                    "Saved {} people and {} rooms to {}.\n",
                    summary.people,
                    summary.rooms,
                    db.display()
                ))
            }
            Command::LoadState { db } => {
                let conn = open_existing_db(&db)?;
                let service = StateService::new(SqliteStateRepository::try_new(&conn)?);
                let summary = service.load_into(&mut self.registry)?;
                Ok(format!(
                    "Loaded {} people and {} rooms from {}.\n",
                    summary.people,
                    summary.rooms,
                    db.display()
                ))
            }
            Command::Shell => Ok("Already in the interactive shell.\n".to_string()),
        }
    }

    /// Creates each named room; a duplicate name is reported and the rest
    /// are still created.
    fn create_rooms(&mut self, kind: RoomKind, names: &[String]) -> String {
        let mut output = String::new();
        for name in names {
            match self.registry.create_room(name, kind) {
                Ok(room) => {
                    let _ = writeln!(
                        output,
                        "{} called {} has been successfully created!",
                        article_label(kind),
                        room.name
                    );
                }
                Err(err) => {
                    let _ = writeln!(output, "Sorry. {err}");
                }
            }
        }
        output
    }

    fn add_person(
        &mut self,
        first_name: &str,
        last_name: &str,
        category: PersonCategory,
        wants_accommodation: bool,
    ) -> String {
        let added = self
            .registry
            .add_person(first_name, last_name, category, wants_accommodation);
        let full_name = &added.person.full_name;
        let mut output = format!(
            "{} {} - id: {} has been successfully added.\n",
            category_title(category),
            full_name,
            added.person.id
        );

        if wants_accommodation {
            if category.may_hold_living_space() {
                output.push_str(&match &added.living_space {
                    Some(room) => placed_line(full_name, RoomKind::LivingSpace, room),
                    None => unavailable_line(full_name, RoomKind::LivingSpace),
                });
            } else {
                output.push_str("Sorry. Staff cannot be allocated a living space.\n");
            }
        }
        output.push_str(&match &added.office {
            Some(room) => placed_line(full_name, RoomKind::Office, room),
            None => unavailable_line(full_name, RoomKind::Office),
        });
        output
    }

    fn load_people(&mut self, path: &Path) -> Result<String, CliError> {
        let text = std::fs::read_to_string(path).map_err(|err| CliError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let report = self.registry.load_from_text(&text);

        let mut output = format!(
            "Loaded {} people from {}.\n",
            report.added.len(),
            path.display()
        );
        for skipped in &report.skipped {
            let _ = writeln!(output, "Skipped {skipped}");
        }
        Ok(output)
    }

    fn person_ids(&self, full_name: &str) -> String {
        let matches = self.registry.find_people_by_name(full_name);
        if matches.is_empty() {
            return format!("No person called {full_name} exists.\n");
        }
        let mut output = String::new();
        for person in matches {
            let _ = writeln!(
                output,
                "{} - id: {} ({})",
                person.full_name, person.id, person.category
            );
        }
        output
    }

    fn full_name(&self, person_id: PersonId) -> Result<String, CliError> {
        Ok(self.registry.get_person_by_id(person_id)?.full_name.clone())
    }

    fn with_optional_file(&self, report: String, file: Option<&str>) -> Result<String, CliError> {
        let Some(file) = file else {
            return Ok(report);
        };
        let path = self.output_dir.join(file);
        std::fs::write(&path, &report).map_err(|err| CliError::Io {
            path: path.clone(),
            message: err.to_string(),
        })?;
        Ok(format!(
            "{report}The report has been written to the file - {}\n",
            path.display()
        ))
    }
}

fn is_yes(value: &str) -> bool {
    value.eq_ignore_ascii_case("y")
}

fn kind_label(kind: RoomKind) -> &'static str {
    match kind {
        RoomKind::Office => "office",
        RoomKind::LivingSpace => "living space",
    }
}

fn article_label(kind: RoomKind) -> &'static str {
    match kind {
        RoomKind::Office => "An office",
        RoomKind::LivingSpace => "A living space",
    }
}

fn category_title(category: PersonCategory) -> &'static str {
    match category {
        PersonCategory::Fellow => "Fellow",
        PersonCategory::Staff => "Staff",
    }
}

fn placed_line(full_name: &str, kind: RoomKind, room: &str) -> String {
    format!(
        "{full_name} has been allocated the {} {room}.\n",
        kind_label(kind)
    )
}

fn unavailable_line(full_name: &str, kind: RoomKind) -> String {
    format!(
        "Sorry. No {} is currently available for {full_name}.\n",
        kind_label(kind)
    )
}

#[cfg(test)]
mod tests {
    use super::{CliError, Command, Session};
    use dojo_core::{AllocationError, PersonCategory, RoomKind};

    fn session(dir: &std::path::Path) -> Session {
        Session::new(dir.to_path_buf())
    }

    #[test]
    fn create_room_reports_duplicates_and_keeps_going() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        let output = session
            .execute(Command::CreateRoom {
                kind: RoomKind::Office,
                names: vec!["Blue".into(), "Blue".into(), "Red".into()],
            })
            .unwrap();

        assert!(output.starts_with("An office called Blue has been successfully created!\n"));
        assert!(output.contains("Sorry. "));
        assert!(output.ends_with("An office called Red has been successfully created!\n"));
        assert_eq!(session.registry().room_count(), 2);
    }

    #[test]
    fn add_person_places_fellow_and_refuses_staff_accommodation() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        session
            .execute(Command::CreateRoom {
                kind: RoomKind::LivingSpace,
                names: vec!["Mara".into()],
            })
            .unwrap();

        let fellow = session
            .execute(Command::AddPerson {
                first_name: "Ann".into(),
                last_name: "Lee".into(),
                category: PersonCategory::Fellow,
                wants_accommodation: Some("y".into()),
            })
            .unwrap();
        assert_eq!(
            fellow,
            "Fellow Ann Lee - id: 1 has been successfully added.\n\
             Ann Lee has been allocated the living space Mara.\n\
             Sorry. No office is currently available for Ann Lee.\n"
        );

        let staff = session
            .execute(Command::AddPerson {
                first_name: "Ken".into(),
                last_name: "Obi".into(),
                category: PersonCategory::Staff,
                wants_accommodation: Some("Y".into()),
            })
            .unwrap();
        assert!(staff.contains("Staff cannot be allocated a living space"));
    }

    #[test]
    fn failing_command_surfaces_allocation_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        let err = session
            .execute(Command::ReallocatePerson {
                person_id: 9,
                room_name: "Blue".into(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            CliError::Allocation(AllocationError::PersonNotFound(9))
        ));
    }

    #[test]
    fn error_codes_omit_user_supplied_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        let err = session
            .execute(Command::PrintRoom {
                name: "Private Suite".into(),
            })
            .unwrap_err();
        assert!(err.to_string().contains("Private Suite"));
        assert_eq!(err.code(), "room_not_found");

        let io = CliError::Io {
            path: dir.path().join("Private Suite.txt"),
            message: "denied".into(),
        };
        assert_eq!(io.code(), "io_error");
    }

    #[test]
    fn report_file_lands_in_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        let output = session
            .execute(Command::PrintAllocations {
                file: Some("allocations.txt".into()),
            })
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("allocations.txt")).unwrap();
        assert_eq!(written, "No rooms exist. Please create a room and try again\n");
        assert!(output.starts_with(&written));
    }

    #[test]
    fn state_survives_save_and_load_commands() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("dojo.db");
        let mut first = session(dir.path());
        first
            .execute(Command::CreateRoom {
                kind: RoomKind::Office,
                names: vec!["Blue".into()],
            })
            .unwrap();
        first
            .execute(Command::AddPerson {
                first_name: "Ann".into(),
                last_name: "Lee".into(),
                category: PersonCategory::Fellow,
                wants_accommodation: None,
            })
            .unwrap();
        first
            .execute(Command::SaveState { db: db.clone() })
            .unwrap();

        let mut second = session(dir.path());
        let output = second.execute(Command::LoadState { db }).unwrap();
        assert!(output.starts_with("Loaded 1 people and 1 rooms"));
        assert_eq!(
            second.registry().snapshot(),
            first.registry().snapshot()
        );
    }

    #[test]
    fn loading_missing_database_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        let result = session.execute(Command::LoadState {
            db: dir.path().join("absent.db"),
        });
        assert!(matches!(result, Err(CliError::State(_))));
    }

    #[test]
    fn load_people_reports_skipped_lines() {
        let dir = tempfile::tempdir().unwrap();
        let roster = dir.path().join("input.txt");
        std::fs::write(&roster, "ANN LEE FELLOW Y\nbroken\nKEN OBI STAFF\n").unwrap();
        let mut session = session(dir.path());

        let output = session
            .execute(Command::LoadPeople { file: roster })
            .unwrap();
        assert!(output.starts_with("Loaded 2 people from "));
        assert_eq!(output.matches("Skipped ").count(), 1);
        assert_eq!(session.registry().person_count(), 2);
    }
}
