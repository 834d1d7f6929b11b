use dojo_core::{Person, PersonCategory, Registry, RegistrySnapshot, RoomKind};
use serde_json::json;

#[test]
fn person_serializes_with_snake_case_category() {
    let person = Person::new(3, PersonCategory::Fellow, "Ann Lee");
    let value = serde_json::to_value(&person).unwrap();
    assert_eq!(
        value,
        json!({"id": 3, "full_name": "Ann Lee", "category": "fellow"})
    );
}

#[test]
fn snapshot_survives_json_encoding() {
    let mut registry = Registry::new();
    registry.create_room("Mara", RoomKind::LivingSpace).unwrap();
    registry.add_person("Ann", "Lee", PersonCategory::Fellow, true);

    let snapshot = registry.snapshot();
    let encoded = serde_json::to_string(&snapshot).unwrap();
    assert!(encoded.contains("\"living_space\""));

    let decoded: RegistrySnapshot = serde_json::from_str(&encoded).unwrap();
    assert_eq!(snapshot, decoded);
    let restored = Registry::from_snapshot(decoded).unwrap();
    assert_eq!(restored.room("Mara").unwrap().occupants.len(), 1);
}
