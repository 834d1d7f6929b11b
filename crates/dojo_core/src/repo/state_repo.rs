//! Registry state repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist a full `RegistrySnapshot` and read it back.
//! - Keep SQL details and column encodings inside the persistence boundary.
//!
//! # Invariants
//! - `save_snapshot` replaces all stored state in one transaction.
//! - Read paths reject unparsable persisted values instead of masking them.
//! - Room order and occupant order survive a save/load cycle.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::person::{Person, PersonCategory, PersonId};
use crate::model::room::{Room, RoomKind};
use crate::registry::{RegistrySnapshot, UnallocatedRecord};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for state persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "state repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted state: {message}"),
        }
    }
}

impl RepoError {
    /// Stable machine-readable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(_) => "db_error",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for whole-registry persistence.
pub trait StateRepository {
    /// Replaces stored state with `snapshot`.
    fn save_snapshot(&self, snapshot: &RegistrySnapshot) -> RepoResult<()>;
    /// Reads stored state. An empty store yields an empty snapshot.
    fn load_snapshot(&self) -> RepoResult<RegistrySnapshot>;
}

/// SQLite-backed state repository.
pub struct SqliteStateRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStateRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl StateRepository for SqliteStateRepository<'_> {
    fn save_snapshot(&self, snapshot: &RegistrySnapshot) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(
            "DELETE FROM unallocated;
             DELETE FROM rooms;
             DELETE FROM people;",
        )?;

        {
            let mut insert_person = tx.prepare(
                "INSERT INTO people (person_id, full_name, category) VALUES (?1, ?2, ?3);",
            )?;
            for person in &snapshot.people {
                insert_person.execute(params![
                    id_to_db(person.id)?,
                    person.full_name.as_str(),
                    person.category.as_str(),
                ])?;
            }

            let mut insert_room = tx.prepare(
                "INSERT INTO rooms (room_name, kind, capacity, occupant_ids, position)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
            )?;
            for (position, room) in snapshot.rooms.iter().enumerate() {
                insert_room.execute(params![
                    room.name.as_str(),
                    room.kind.as_str(),
                    room.capacity,
                    join_occupant_ids(&room.occupants),
                    i64::try_from(position).unwrap_or(i64::MAX),
                ])?;
            }

            let mut insert_unallocated =
                tx.prepare("INSERT INTO unallocated (person_id, missing) VALUES (?1, ?2);")?;
            for record in &snapshot.unallocated {
                insert_unallocated
                    .execute(params![id_to_db(record.person_id)?, record.missing.as_str()])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn load_snapshot(&self) -> RepoResult<RegistrySnapshot> {
        let mut snapshot = RegistrySnapshot::default();

        let mut stmt = self
            .conn
            .prepare("SELECT person_id, full_name, category FROM people ORDER BY person_id ASC;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            snapshot.people.push(parse_person_row(row)?);
        }

        let mut stmt = self.conn.prepare(
            "SELECT room_name, kind, capacity, occupant_ids
             FROM rooms
             ORDER BY position ASC, room_name ASC;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            snapshot.rooms.push(parse_room_row(row)?);
        }

        let mut stmt = self.conn.prepare(
            "SELECT person_id, missing
             FROM unallocated
             ORDER BY CASE missing WHEN 'office' THEN 0 ELSE 1 END, person_id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let person_id = id_from_db(row.get("person_id")?, "unallocated.person_id")?;
            let missing_text: String = row.get("missing")?;
            let missing = parse_room_kind(&missing_text, "unallocated.missing")?;
            snapshot.unallocated.push(UnallocatedRecord { person_id, missing });
        }

        Ok(snapshot)
    }
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let id = id_from_db(row.get("person_id")?, "people.person_id")?;
    let category_text: String = row.get("category")?;
    let category = match category_text.as_str() {
        "fellow" => PersonCategory::Fellow,
        "staff" => PersonCategory::Staff,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid category `{other}` in people.category"
            )))
        }
    };
    Ok(Person::new(id, category, row.get::<_, String>("full_name")?))
}

fn parse_room_row(row: &Row<'_>) -> RepoResult<Room> {
    let name: String = row.get("room_name")?;
    let kind_text: String = row.get("kind")?;
    let kind = parse_room_kind(&kind_text, "rooms.kind")?;
    let capacity_raw: i64 = row.get("capacity")?;
    let capacity = u32::try_from(capacity_raw).map_err(|_| {
        RepoError::InvalidData(format!("invalid capacity `{capacity_raw}` in rooms.capacity"))
    })?;
    let occupants_text: String = row.get("occupant_ids")?;

    let mut room = Room::with_capacity(kind, name, capacity);
    room.occupants = split_occupant_ids(&occupants_text)?;
    Ok(room)
}

fn parse_room_kind(value: &str, column: &'static str) -> RepoResult<RoomKind> {
    match value {
        "office" => Ok(RoomKind::Office),
        "livingspace" => Ok(RoomKind::LivingSpace),
        other => Err(RepoError::InvalidData(format!(
            "invalid room kind `{other}` in {column}"
        ))),
    }
}

fn join_occupant_ids(ids: &[PersonId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn split_occupant_ids(value: &str) -> RepoResult<Vec<PersonId>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<PersonId>().map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid occupant id `{part}` in rooms.occupant_ids"
                ))
            })
        })
        .collect()
}

fn id_to_db(id: PersonId) -> RepoResult<i64> {
    i64::try_from(id)
        .map_err(|_| RepoError::InvalidData(format!("person id {id} exceeds storage range")))
}

fn id_from_db(value: i64, column: &'static str) -> RepoResult<PersonId> {
    PersonId::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid person id `{value}` in {column}")))
}
