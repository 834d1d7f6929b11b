//! In-memory allocation registry.
//!
//! # Responsibility
//! - Own every person and room record plus per-person allocation status.
//! - Place people into rooms with free capacity and move them between rooms.
//! - Answer membership questions (with/without office or living space).
//!
//! # Invariants
//! - A person's status names room X for a kind iff X lists them as occupant.
//! - Room occupancy never exceeds capacity.
//! - Staff never hold a living space.
//! - Person ids are issued from a counter and never reused.
//! - Every check runs before the first mutation of an operation.

pub mod error;
mod roster;
mod snapshot;

pub use error::{AllocationError, AllocationResult};
pub use roster::RosterLoadReport;
pub use snapshot::{RegistrySnapshot, UnallocatedRecord};

use crate::model::person::{Person, PersonCategory, PersonId};
use crate::model::room::{Room, RoomKind};
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Formatter};

/// Internal room key. Stable across renames; never exposed.
type RoomKey = u64;

#[derive(Debug, Clone)]
struct PersonEntry {
    person: Person,
    office: Option<RoomKey>,
    living_space: Option<RoomKey>,
}

impl PersonEntry {
    fn new(person: Person) -> Self {
        Self {
            person,
            office: None,
            living_space: None,
        }
    }

    fn slot(&self, kind: RoomKind) -> Option<RoomKey> {
        match kind {
            RoomKind::Office => self.office,
            RoomKind::LivingSpace => self.living_space,
        }
    }

    fn slot_mut(&mut self, kind: RoomKind) -> &mut Option<RoomKey> {
        match kind {
            RoomKind::Office => &mut self.office,
            RoomKind::LivingSpace => &mut self.living_space,
        }
    }

    fn eligible_for(&self, kind: RoomKind) -> bool {
        kind == RoomKind::Office || self.person.may_hold_living_space()
    }
}

/// Room names currently held by one person.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allocation {
    pub office: Option<String>,
    /// Always `None` for staff.
    pub living_space: Option<String>,
}

impl Allocation {
    pub fn room(&self, kind: RoomKind) -> Option<&str> {
        match kind {
            RoomKind::Office => self.office.as_deref(),
            RoomKind::LivingSpace => self.living_space.as_deref(),
        }
    }
}

/// Result of `add_person`: the new record and where it was placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedPerson {
    pub person: Person,
    pub office: Option<String>,
    pub living_space: Option<String>,
}

/// Result of a successful reallocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reallocation {
    pub person_id: PersonId,
    pub kind: RoomKind,
    /// `None` when the person was unallocated for this kind.
    pub from: Option<String>,
    pub to: String,
}

/// Single-owner store of people, rooms and their assignment relation.
///
/// Not internally synchronized. Callers sharing one registry across threads
/// must wrap it in a single lock since operations span several collections.
pub struct Registry {
    people: BTreeMap<PersonId, PersonEntry>,
    rooms: BTreeMap<RoomKey, Room>,
    room_keys: HashMap<String, RoomKey>,
    next_person_id: PersonId,
    next_room_key: RoomKey,
    rng: StdRng,
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("people", &self.people.len())
            .field("rooms", &self.rooms.len())
            .field("next_person_id", &self.next_person_id)
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an empty registry with an entropy-seeded placement RNG.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates an empty registry whose random placement is reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            people: BTreeMap::new(),
            rooms: BTreeMap::new(),
            room_keys: HashMap::new(),
            next_person_id: 1,
            next_room_key: 1,
            rng,
        }
    }

    /// Creates a room with the kind's default capacity.
    ///
    /// # Errors
    /// - `InvalidName` when `name` is blank.
    /// - `DuplicateName` when any room (either kind) already uses `name`.
    pub fn create_room(&mut self, name: &str, kind: RoomKind) -> AllocationResult<&Room> {
        let name = normalize_name(name)?;
        if self.room_keys.contains_key(name.as_str()) {
            return Err(AllocationError::DuplicateName(name));
        }

        let key = self.insert_room(Room::new(kind, name));
        let room = &self.rooms[&key];
        info!(
            "event=room_create module=registry status=ok kind={} capacity={}",
            room.kind, room.capacity
        );
        Ok(room)
    }

    /// Registers a person and tries to place them.
    ///
    /// Fellows asking for accommodation are placed into a random living space
    /// with a vacancy first; everybody is then placed into a random office with
    /// a vacancy. Missing capacity leaves the person unallocated; creation
    /// itself never fails.
    pub fn add_person(
        &mut self,
        first_name: &str,
        last_name: &str,
        category: PersonCategory,
        wants_accommodation: bool,
    ) -> AddedPerson {
        let id = self.next_person_id;
        self.next_person_id += 1;
        let full_name = format!("{} {}", first_name.trim(), last_name.trim())
            .trim()
            .to_string();
        self.people
            .insert(id, PersonEntry::new(Person::new(id, category, full_name)));

        let living_space = if wants_accommodation && category.may_hold_living_space() {
            self.place(id, RoomKind::LivingSpace)
        } else {
            None
        };
        let office = self.place(id, RoomKind::Office);

        info!(
            "event=person_add module=registry status=ok person_id={} category={} office={} living_space={}",
            id,
            category,
            office.is_some(),
            living_space.is_some()
        );

        let person = self.people[&id].person.clone();
        AddedPerson {
            person,
            office,
            living_space,
        }
    }

    /// Places an unallocated person into a random room of `kind` with a
    /// vacancy.
    ///
    /// Returns `Ok(None)` when no room of that kind has a free place; the
    /// person stays unallocated.
    ///
    /// # Errors
    /// - `PersonNotFound`, `InvalidCategoryForRoomKind`, `AlreadyAllocated`.
    pub fn allocate_person(
        &mut self,
        person_id: PersonId,
        kind: RoomKind,
    ) -> AllocationResult<Option<String>> {
        let entry = self
            .people
            .get(&person_id)
            .ok_or(AllocationError::PersonNotFound(person_id))?;
        if !entry.eligible_for(kind) {
            return Err(AllocationError::InvalidCategoryForRoomKind {
                person_id,
                category: entry.person.category,
                kind,
            });
        }
        if let Some(key) = entry.slot(kind) {
            return Err(AllocationError::AlreadyAllocated {
                person_id,
                kind,
                room: self.room_name(key),
            });
        }

        let placed = self.place(person_id, kind);
        info!(
            "event=person_allocate module=registry status=ok person_id={} kind={} placed={}",
            person_id,
            kind,
            placed.is_some()
        );
        Ok(placed)
    }

    /// Moves a person into `target_room`, out of their current room of the
    /// same kind or out of the unallocated state.
    ///
    /// # Errors
    /// - `PersonNotFound`, `RoomNotFound`.
    /// - `AlreadyAssigned` when the person already occupies the target.
    /// - `RoomFull` when the target has no free place.
    /// - `InvalidCategoryForRoomKind` for staff into a living space.
    pub fn reallocate_person(
        &mut self,
        person_id: PersonId,
        target_room: &str,
    ) -> AllocationResult<Reallocation> {
        let entry = self
            .people
            .get(&person_id)
            .ok_or(AllocationError::PersonNotFound(person_id))?;
        let key = self.room_key(target_room)?;
        let room = &self.rooms[&key];
        if room.contains(person_id) {
            return Err(AllocationError::AlreadyAssigned {
                person_id,
                room: room.name.clone(),
            });
        }
        if !room.has_vacancy() {
            return Err(AllocationError::RoomFull(room.name.clone()));
        }
        let kind = room.kind;
        if !entry.eligible_for(kind) {
            return Err(AllocationError::InvalidCategoryForRoomKind {
                person_id,
                category: entry.person.category,
                kind,
            });
        }

        let from = self.unassign(person_id, kind).map(|old| self.room_name(old));
        self.assign(person_id, key);
        let to = self.room_name(key);

        info!(
            "event=person_reallocate module=registry status=ok person_id={} kind={} from_unallocated={}",
            person_id,
            kind,
            from.is_none()
        );
        Ok(Reallocation {
            person_id,
            kind,
            from,
            to,
        })
    }

    /// Removes a person from every room and from the registry.
    pub fn remove_person(&mut self, person_id: PersonId) -> AllocationResult<Person> {
        if !self.people.contains_key(&person_id) {
            return Err(AllocationError::PersonNotFound(person_id));
        }

        for kind in RoomKind::ALL {
            self.unassign(person_id, kind);
        }
        let entry = self
            .people
            .remove(&person_id)
            .ok_or(AllocationError::PersonNotFound(person_id))?;

        info!(
            "event=person_remove module=registry status=ok person_id={}",
            person_id
        );
        Ok(entry.person)
    }

    /// Deletes a room; its occupants become unallocated for that kind.
    pub fn delete_room(&mut self, name: &str) -> AllocationResult<Room> {
        let key = self.room_key(name)?;
        self.room_keys.remove(name);
        let room = self
            .rooms
            .remove(&key)
            .ok_or_else(|| AllocationError::RoomNotFound(name.to_string()))?;

        for person_id in &room.occupants {
            if let Some(entry) = self.people.get_mut(person_id) {
                let slot = entry.slot_mut(room.kind);
                if *slot == Some(key) {
                    *slot = None;
                }
            }
        }

        info!(
            "event=room_delete module=registry status=ok kind={} released={}",
            room.kind,
            room.occupants.len()
        );
        Ok(room)
    }

    /// Renames a room, keeping names unique across both kinds.
    ///
    /// Renaming a room to its current name is a no-op.
    pub fn rename_room(&mut self, old_name: &str, new_name: &str) -> AllocationResult<()> {
        let key = self.room_key(old_name)?;
        let new_name = normalize_name(new_name)?;
        if new_name == old_name {
            return Ok(());
        }
        if self.room_keys.contains_key(new_name.as_str()) {
            return Err(AllocationError::DuplicateName(new_name));
        }

        self.room_keys.remove(old_name);
        self.room_keys.insert(new_name.clone(), key);
        if let Some(room) = self.rooms.get_mut(&key) {
            room.name = new_name;
        }
        info!("event=room_rename module=registry status=ok");
        Ok(())
    }

    /// Replaces a person's full name.
    pub fn rename_person(&mut self, person_id: PersonId, new_name: &str) -> AllocationResult<()> {
        let entry = self
            .people
            .get_mut(&person_id)
            .ok_or(AllocationError::PersonNotFound(person_id))?;
        entry.person.full_name = normalize_name(new_name)?;
        info!(
            "event=person_rename module=registry status=ok person_id={}",
            person_id
        );
        Ok(())
    }

    pub fn get_person_by_id(&self, person_id: PersonId) -> AllocationResult<&Person> {
        self.people
            .get(&person_id)
            .map(|entry| &entry.person)
            .ok_or(AllocationError::PersonNotFound(person_id))
    }

    /// Returns every person whose full name matches exactly, ordered by id.
    ///
    /// Names are not unique; callers disambiguate by id.
    pub fn find_people_by_name(&self, full_name: &str) -> Vec<&Person> {
        let wanted = full_name.trim();
        self.people()
            .filter(|person| person.full_name == wanted)
            .collect()
    }

    /// Rooms with at least one free place, offices first.
    pub fn list_vacant_rooms(&self) -> Vec<&Room> {
        self.rooms().filter(|room| room.has_vacancy()).collect()
    }

    pub fn room(&self, name: &str) -> Option<&Room> {
        self.room_keys.get(name).and_then(|key| self.rooms.get(key))
    }

    /// All rooms, offices first, each kind in creation order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> + '_ {
        RoomKind::ALL
            .into_iter()
            .flat_map(move |kind| self.rooms_of_kind(kind))
    }

    /// Rooms of one kind in creation order.
    pub fn rooms_of_kind(&self, kind: RoomKind) -> impl Iterator<Item = &Room> + '_ {
        self.rooms.values().filter(move |room| room.kind == kind)
    }

    /// All people ordered by id.
    pub fn people(&self) -> impl Iterator<Item = &Person> + '_ {
        self.people.values().map(|entry| &entry.person)
    }

    pub fn person_count(&self) -> usize {
        self.people.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty() && self.rooms.is_empty()
    }

    /// Current room names held by a person, or `None` for unknown ids.
    pub fn allocation(&self, person_id: PersonId) -> Option<Allocation> {
        self.people.get(&person_id).map(|entry| Allocation {
            office: entry.office.map(|key| self.room_name(key)),
            living_space: entry.living_space.map(|key| self.room_name(key)),
        })
    }

    /// People eligible for `kind` who hold no room of that kind, ordered by id.
    ///
    /// For living spaces this only ever contains fellows.
    pub fn unallocated(&self, kind: RoomKind) -> Vec<&Person> {
        self.people
            .values()
            .filter(|entry| entry.eligible_for(kind) && entry.slot(kind).is_none())
            .map(|entry| &entry.person)
            .collect()
    }

    /// People holding a room of `kind`, ordered by id.
    pub fn allocated(&self, kind: RoomKind) -> Vec<&Person> {
        self.people
            .values()
            .filter(|entry| entry.slot(kind).is_some())
            .map(|entry| &entry.person)
            .collect()
    }

    fn insert_room(&mut self, room: Room) -> RoomKey {
        let key = self.next_room_key;
        self.next_room_key += 1;
        self.room_keys.insert(room.name.clone(), key);
        self.rooms.insert(key, room);
        key
    }

    fn room_key(&self, name: &str) -> AllocationResult<RoomKey> {
        self.room_keys
            .get(name)
            .copied()
            .ok_or_else(|| AllocationError::RoomNotFound(name.to_string()))
    }

    fn room_name(&self, key: RoomKey) -> String {
        self.rooms
            .get(&key)
            .map(|room| room.name.clone())
            .unwrap_or_default()
    }

    /// Picks a uniformly random vacant room of `kind` and assigns the person.
    fn place(&mut self, person_id: PersonId, kind: RoomKind) -> Option<String> {
        let candidates: Vec<RoomKey> = self
            .rooms
            .iter()
            .filter(|(_, room)| room.kind == kind && room.has_vacancy())
            .map(|(key, _)| *key)
            .collect();
        let key = candidates.choose(&mut self.rng).copied()?;
        self.assign(person_id, key);
        Some(self.room_name(key))
    }

    /// Adds the person to the room and records it in their status.
    ///
    /// Callers have already checked vacancy, eligibility and that the person
    /// holds no other room of this kind.
    fn assign(&mut self, person_id: PersonId, key: RoomKey) {
        let Some(room) = self.rooms.get_mut(&key) else {
            return;
        };
        room.occupants.push(person_id);
        if let Some(entry) = self.people.get_mut(&person_id) {
            *entry.slot_mut(room.kind) = Some(key);
        }
    }

    /// Clears the person's room of `kind`, returning the room they left.
    fn unassign(&mut self, person_id: PersonId, kind: RoomKind) -> Option<RoomKey> {
        let entry = self.people.get_mut(&person_id)?;
        let key = entry.slot_mut(kind).take()?;
        if let Some(room) = self.rooms.get_mut(&key) {
            room.occupants.retain(|occupant| *occupant != person_id);
        }
        Some(key)
    }
}

fn normalize_name(name: &str) -> AllocationResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AllocationError::InvalidName);
    }
    Ok(trimmed.to_string())
}
