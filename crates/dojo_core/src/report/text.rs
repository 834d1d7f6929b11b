//! Line-oriented report renderers.
//!
//! # Invariants
//! - Room blocks list occupants in assignment order.
//! - Offices are rendered before living spaces.

use crate::model::room::{Room, RoomKind};
use crate::registry::{AllocationError, AllocationResult, Registry};
use std::fmt::Write;

const RULE_WIDTH: usize = 50;

pub const NO_ROOMS_MESSAGE: &str = "No rooms exist. Please create a room and try again\n";
pub const NO_OCCUPANTS_MESSAGE: &str = "This room has no occupants.\n";
pub const NO_VACANCIES_MESSAGE: &str = "Sorry there are no vacant rooms at the moment.\n";
pub const NO_PEOPLE_MESSAGE: &str = "There are no people in the Dojo currently.\n";

/// Renders one room block: header, rule, then one occupant per line.
pub fn render_room(registry: &Registry, name: &str) -> AllocationResult<String> {
    let room = registry
        .room(name)
        .ok_or_else(|| AllocationError::RoomNotFound(name.to_string()))?;
    let mut output = String::new();
    push_room_block(&mut output, registry, room);
    Ok(output)
}

/// Renders every room, each block followed by a blank line.
pub fn render_allocations(registry: &Registry) -> String {
    if registry.room_count() == 0 {
        return NO_ROOMS_MESSAGE.to_string();
    }

    let mut output = String::new();
    for room in registry.rooms() {
        push_room_block(&mut output, registry, room);
        output.push('\n');
    }
    output
}

/// Renders people without living spaces (fellows) and without offices.
pub fn render_unallocated(registry: &Registry) -> String {
    if registry.person_count() == 0 {
        return NO_PEOPLE_MESSAGE.to_string();
    }

    let mut output = String::new();
    let without_living_space = registry.unallocated(RoomKind::LivingSpace);
    if !without_living_space.is_empty() {
        output.push_str("People without living spaces:\n");
        for person in without_living_space {
            let _ = writeln!(output, "\t{} - {}", person.full_name, person.category);
        }
    } else if registry.people().any(|person| person.may_hold_living_space()) {
        output.push_str("Every fellow has a living space in the Dojo.\n\n");
    }

    let without_office = registry.unallocated(RoomKind::Office);
    if !without_office.is_empty() {
        output.push_str("People without offices:\n");
        for person in without_office {
            let _ = writeln!(output, "\t{} - {}", person.full_name, person.category);
        }
    } else {
        output.push_str("Everyone has an office in the Dojo.\n");
    }
    output
}

/// Renders one line per room with spare capacity.
pub fn render_vacancies(registry: &Registry) -> String {
    let vacant = registry.list_vacant_rooms();
    if vacant.is_empty() {
        return NO_VACANCIES_MESSAGE.to_string();
    }

    let mut output = String::new();
    for room in vacant {
        let _ = writeln!(output, "{} - Vacant spaces {}", room.name, room.vacancies());
    }
    output
}

fn push_room_block(output: &mut String, registry: &Registry, room: &Room) {
    let _ = writeln!(output, "{} - {}", room.name, room.kind);
    output.push_str(&"-".repeat(RULE_WIDTH));
    output.push('\n');

    if room.occupants.is_empty() {
        output.push_str(NO_OCCUPANTS_MESSAGE);
        return;
    }
    for person_id in &room.occupants {
        if let Ok(person) = registry.get_person_by_id(*person_id) {
            output.push_str(&person.full_name);
            output.push('\n');
        }
    }
}
