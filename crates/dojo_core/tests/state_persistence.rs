use dojo_core::db::{open_db, open_db_in_memory, open_existing_db};
use dojo_core::{
    AllocationError, PersonCategory, Registry, RepoError, RoomKind, SqliteStateRepository,
    StateService, StateServiceError,
};
use rusqlite::{params, Connection};

fn populated_registry() -> Registry {
    let mut registry = Registry::with_seed(11);
    registry.create_room("Blue", RoomKind::Office).unwrap();
    registry.create_room("Mara", RoomKind::LivingSpace).unwrap();
    registry.create_room("Red", RoomKind::Office).unwrap();
    registry.add_person("Ann", "Lee", PersonCategory::Fellow, true);
    registry.add_person("Ken", "Obi", PersonCategory::Staff, false);
    registry.add_person("Jo", "Doe", PersonCategory::Fellow, false);
    for index in 0..10 {
        registry.add_person("Staff", &index.to_string(), PersonCategory::Staff, false);
    }
    registry
}

#[test]
fn save_then_load_round_trips_registry_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dojo.db");
    let registry = populated_registry();

    {
        let conn = open_db(&path).unwrap();
        let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());
        let summary = service.save(&registry).unwrap();
        assert_eq!(summary.people, 13);
        assert_eq!(summary.rooms, 3);
    }

    let conn = open_existing_db(&path).unwrap();
    let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());
    let loaded = service.load().unwrap();

    assert_eq!(loaded.snapshot(), registry.snapshot());
    assert_eq!(
        loaded.unallocated(RoomKind::Office).len(),
        registry.unallocated(RoomKind::Office).len()
    );
    let ann = loaded.find_people_by_name("Ann Lee")[0];
    assert_eq!(ann.category, PersonCategory::Fellow);
    assert_eq!(
        loaded.allocation(ann.id).unwrap().living_space.as_deref(),
        Some("Mara")
    );
}

#[test]
fn loaded_registry_keeps_issuing_fresh_ids() {
    let conn = open_db_in_memory().unwrap();
    let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());
    let registry = populated_registry();
    let max_id = registry.people().map(|person| person.id).max().unwrap();
    service.save(&registry).unwrap();

    let mut loaded = service.load().unwrap();
    let added = loaded.add_person("New", "Comer", PersonCategory::Staff, false);
    assert_eq!(added.person.id, max_id + 1);
}

#[test]
fn saving_replaces_previous_state() {
    let conn = open_db_in_memory().unwrap();
    let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());
    service.save(&populated_registry()).unwrap();

    let mut smaller = Registry::new();
    smaller.create_room("Oculus", RoomKind::Office).unwrap();
    smaller.add_person("Solo", "Person", PersonCategory::Staff, false);
    service.save(&smaller).unwrap();

    let loaded = service.load().unwrap();
    assert_eq!(loaded.snapshot(), smaller.snapshot());
    assert!(loaded.room("Blue").is_none());
}

#[test]
fn load_into_replaces_existing_state_wholesale() {
    let conn = open_db_in_memory().unwrap();
    let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());
    let saved = populated_registry();
    service.save(&saved).unwrap();

    let mut current = Registry::new();
    current.create_room("Scratch", RoomKind::Office).unwrap();
    service.load_into(&mut current).unwrap();

    assert!(current.room("Scratch").is_none());
    assert_eq!(current.snapshot(), saved.snapshot());
}

#[test]
fn unknown_occupant_id_aborts_the_load() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO people (person_id, full_name, category) VALUES (?1, ?2, ?3);",
        params![1, "Ann Lee", "fellow"],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO rooms (room_name, kind, capacity, occupant_ids, position)
         VALUES ('Blue', 'office', 6, '1,55', 0);",
        [],
    )
    .unwrap();

    let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());
    let mut current = Registry::new();
    current.create_room("Keep", RoomKind::Office).unwrap();

    let err = service.load_into(&mut current).unwrap_err();
    assert!(matches!(
        err,
        StateServiceError::Allocation(AllocationError::DataIntegrityFault(_))
    ));
    assert!(current.room("Keep").is_some());
    assert_eq!(current.person_count(), 0);
}

#[test]
fn contradicting_unallocated_record_aborts_the_load() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO people (person_id, full_name, category) VALUES (1, 'Ken Obi', 'staff');
         INSERT INTO rooms (room_name, kind, capacity, occupant_ids, position)
         VALUES ('Blue', 'office', 6, '1', 0);
         INSERT INTO unallocated (person_id, missing) VALUES (1, 'office');",
    )
    .unwrap();

    let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());
    assert!(matches!(
        service.load(),
        Err(StateServiceError::Allocation(AllocationError::DataIntegrityFault(_)))
    ));
}

#[test]
fn persisted_capacity_override_is_restored() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO people (person_id, full_name, category) VALUES (4, 'Ann Lee', 'fellow');
         INSERT INTO rooms (room_name, kind, capacity, occupant_ids, position)
         VALUES ('Mara', 'livingspace', 1, '4', 0);
         INSERT INTO unallocated (person_id, missing) VALUES (4, 'office');",
    )
    .unwrap();

    let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());
    let mut loaded = service.load().unwrap();

    assert_eq!(loaded.room("Mara").unwrap().capacity, 1);
    let added = loaded.add_person("Jo", "Doe", PersonCategory::Fellow, true);
    assert_eq!(added.living_space, None);
    assert_eq!(added.person.id, 5);
}

#[test]
fn unparsable_occupant_ids_are_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO rooms (room_name, kind, capacity, occupant_ids, position)
         VALUES ('Blue', 'office', 6, '1,abc', 0);",
        [],
    )
    .unwrap();

    let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());
    assert!(matches!(
        service.load(),
        Err(StateServiceError::Repo(RepoError::InvalidData(_)))
    ));
}

#[test]
fn repository_requires_migrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    match SqliteStateRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        }) => {
            assert_eq!(expected_version, 1);
            assert_eq!(actual_version, 0);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection must be rejected"),
    }
}
