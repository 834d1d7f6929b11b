//! Flat registry snapshot for persistence.
//!
//! # Responsibility
//! - Export registry state as plain records (people, rooms, unallocated).
//! - Rebuild a registry from records, rejecting inconsistent data.
//!
//! # Invariants
//! - Restored people keep their original ids; new ids continue after the max.
//! - Any integrity violation aborts the rebuild; the target is left untouched.

use super::{AllocationError, AllocationResult, PersonEntry, Registry};
use crate::model::person::{Person, PersonId};
use crate::model::room::{Room, RoomKind};
use log::{error, info};
use serde::{Deserialize, Serialize};

/// One "missing room" marker: the person holds no room of `missing` kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnallocatedRecord {
    pub person_id: PersonId,
    pub missing: RoomKind,
}

/// Complete, storage-agnostic registry state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Ordered by id.
    pub people: Vec<Person>,
    /// Creation order; occupants in assignment order.
    pub rooms: Vec<Room>,
    /// Offices first, then living spaces, each ordered by person id.
    pub unallocated: Vec<UnallocatedRecord>,
}

impl Registry {
    /// Exports the current state.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut unallocated = Vec::new();
        for kind in RoomKind::ALL {
            unallocated.extend(self.unallocated(kind).into_iter().map(|person| {
                UnallocatedRecord {
                    person_id: person.id,
                    missing: kind,
                }
            }));
        }

        RegistrySnapshot {
            people: self.people().cloned().collect(),
            rooms: self.rooms.values().cloned().collect(),
            unallocated,
        }
    }

    /// Builds a new registry from a snapshot.
    ///
    /// People are restored first, then rooms (resolving occupant ids), then
    /// unallocated records are checked against the derived occupancy.
    ///
    /// # Errors
    /// - `DataIntegrityFault` for unknown occupant ids, duplicate ids or room
    ///   names, over-capacity rooms, people in two rooms of one kind, staff in
    ///   a living space, or unallocated records that contradict occupancy.
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> AllocationResult<Self> {
        let mut registry = Self::new();
        if let Err(err) = registry.rebuild(snapshot) {
            error!(
                "event=snapshot_restore module=registry status=error error_code={}",
                err.code()
            );
            return Err(err);
        }
        info!(
            "event=snapshot_restore module=registry status=ok people={} rooms={}",
            registry.people.len(),
            registry.rooms.len()
        );
        Ok(registry)
    }

    /// Replaces this registry's state wholesale with the snapshot.
    ///
    /// The placement RNG is kept. On error nothing changes.
    pub fn restore(&mut self, snapshot: RegistrySnapshot) -> AllocationResult<()> {
        let mut rebuilt = Self::from_snapshot(snapshot)?;
        std::mem::swap(&mut rebuilt.rng, &mut self.rng);
        *self = rebuilt;
        Ok(())
    }

    fn rebuild(&mut self, snapshot: RegistrySnapshot) -> AllocationResult<()> {
        for person in snapshot.people {
            if self.people.contains_key(&person.id) {
                return Err(fault(format!("duplicate person id {}", person.id)));
            }
            self.next_person_id = self.next_person_id.max(person.id.saturating_add(1));
            self.people.insert(person.id, PersonEntry::new(person));
        }

        for room in snapshot.rooms {
            self.restore_room(room)?;
        }

        for record in snapshot.unallocated {
            let entry = self.people.get(&record.person_id).ok_or_else(|| {
                fault(format!(
                    "unallocated record for unknown person id {}",
                    record.person_id
                ))
            })?;
            if !entry.eligible_for(record.missing) {
                return Err(fault(format!(
                    "{} {} cannot be tracked for a {}",
                    entry.person.category, record.person_id, record.missing
                )));
            }
            if entry.slot(record.missing).is_some() {
                return Err(fault(format!(
                    "person {} is recorded without a {} but occupies one",
                    record.person_id, record.missing
                )));
            }
        }

        Ok(())
    }

    fn restore_room(&mut self, room: Room) -> AllocationResult<()> {
        if room.name.trim().is_empty() {
            return Err(fault("room with blank name".to_string()));
        }
        if self.room_keys.contains_key(room.name.as_str()) {
            return Err(fault(format!("duplicate room name `{}`", room.name)));
        }
        if room.occupants.len() as u64 > u64::from(room.capacity) {
            return Err(fault(format!(
                "room `{}` lists {} occupants for capacity {}",
                room.name,
                room.occupants.len(),
                room.capacity
            )));
        }

        let key = self.next_room_key;
        for person_id in &room.occupants {
            let entry = self.people.get_mut(person_id).ok_or_else(|| {
                fault(format!(
                    "room `{}` lists unknown occupant id {}",
                    room.name, person_id
                ))
            })?;
            if !entry.eligible_for(room.kind) {
                return Err(fault(format!(
                    "{} {} cannot occupy {} `{}`",
                    entry.person.category, person_id, room.kind, room.name
                )));
            }
            let slot = entry.slot_mut(room.kind);
            if slot.is_some() {
                return Err(fault(format!(
                    "person {} occupies more than one {}",
                    person_id, room.kind
                )));
            }
            *slot = Some(key);
        }

        self.insert_room(room);
        Ok(())
    }
}

fn fault(details: String) -> AllocationError {
    AllocationError::DataIntegrityFault(details)
}

#[cfg(test)]
mod tests {
    use super::{RegistrySnapshot, UnallocatedRecord};
    use crate::model::person::{Person, PersonCategory};
    use crate::model::room::{Room, RoomKind};
    use crate::registry::{AllocationError, Registry};

    fn office_with(occupants: Vec<u64>) -> Room {
        let mut room = Room::new(RoomKind::Office, "Blue");
        room.occupants = occupants;
        room
    }

    #[test]
    fn unknown_occupant_id_is_a_fault() {
        let snapshot = RegistrySnapshot {
            people: vec![Person::new(1, PersonCategory::Staff, "Ken Obi")],
            rooms: vec![office_with(vec![1, 42])],
            unallocated: Vec::new(),
        };
        let err = Registry::from_snapshot(snapshot).unwrap_err();
        assert!(matches!(err, AllocationError::DataIntegrityFault(ref msg) if msg.contains("42")));
    }

    #[test]
    fn restore_failure_leaves_state_untouched() {
        let mut registry = Registry::with_seed(3);
        registry.create_room("Green", RoomKind::Office).unwrap();

        let snapshot = RegistrySnapshot {
            people: vec![Person::new(1, PersonCategory::Staff, "Ken Obi")],
            rooms: vec![office_with(vec![1])],
            unallocated: vec![UnallocatedRecord {
                person_id: 1,
                missing: RoomKind::Office,
            }],
        };
        assert!(registry.restore(snapshot).is_err());
        assert!(registry.room("Green").is_some());
        assert_eq!(registry.person_count(), 0);
    }

    #[test]
    fn restored_ids_continue_after_max() {
        let snapshot = RegistrySnapshot {
            people: vec![
                Person::new(4, PersonCategory::Fellow, "Ann Lee"),
                Person::new(9, PersonCategory::Staff, "Ken Obi"),
            ],
            rooms: Vec::new(),
            unallocated: Vec::new(),
        };
        let mut registry = Registry::from_snapshot(snapshot).unwrap();
        let added = registry.add_person("New", "Comer", PersonCategory::Staff, false);
        assert_eq!(added.person.id, 10);
    }

    #[test]
    fn staff_in_living_space_is_a_fault() {
        let mut room = Room::new(RoomKind::LivingSpace, "Mara");
        room.occupants = vec![1];
        let snapshot = RegistrySnapshot {
            people: vec![Person::new(1, PersonCategory::Staff, "Ken Obi")],
            rooms: vec![room],
            unallocated: Vec::new(),
        };
        assert!(matches!(
            Registry::from_snapshot(snapshot),
            Err(AllocationError::DataIntegrityFault(_))
        ));
    }
}
