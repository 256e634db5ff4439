//! Pure translation from Tiko wire shapes into the dashboard model. Total: never fails.

use crate::models::domain::{self, Mode, ModeAndRooms, ModeTemperatures, RoomModeUpdate, TemperatureAdjustment};
use crate::models::tiko;

pub const DEFAULT_ROOM_COLOR: &str = "#bb86fc";

/// First set flag in [`Mode::ALL`] order, or `None` when no flag is set.
///
/// The provider is expected to set at most one flag. When it sets several, the earliest mode in
/// canonical order wins so the result never depends on field order in the payload.
pub fn mode_from_flags(flags: Option<&tiko::ModeFlags>) -> Option<Mode> {
    let flags = flags?;
    Mode::ALL.into_iter().find(|mode| flag_for(flags, *mode))
}

fn flag_for(flags: &tiko::ModeFlags, mode: Mode) -> bool {
    match mode {
        Mode::Comfort => flags.comfort,
        Mode::Boost => flags.boost,
        Mode::Sleep => flags.sleep,
        Mode::Absence => flags.absence,
        Mode::Frost => flags.frost,
        Mode::DisableHeating => flags.disable_heating,
        Mode::Passive => flags.passive,
        Mode::Summer => flags.summer,
        Mode::Bypass => flags.bypass,
    }
}

pub fn room_from_wire(room: &tiko::Room) -> domain::Room {
    // Device names are user-editable, room names are not.
    let device_name = room
        .devices
        .as_deref()
        .and_then(|devices| devices.first())
        .and_then(|d| d.name.as_deref())
        .filter(|name| !name.is_empty());
    let name = device_name
        .or(room.name.as_deref())
        .unwrap_or_default()
        .to_string();

    domain::Room {
        id: room.id.0.to_string(),
        name,
        color: room
            .color
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_ROOM_COLOR.to_string()),
        current_temperature_degrees: room.current_temperature_degrees.unwrap_or(0.0),
        target_temperature_degrees: room.target_temperature_degrees.unwrap_or(0.0),
        mode: mode_from_flags(room.mode.as_ref()),
        humidity: room.humidity.unwrap_or(0.0),
        is_heating: room.status.as_ref().is_some_and(|s| s.heating_operating),
    }
}

pub fn mode_and_rooms_from_wire(property: Option<&tiko::Property>) -> ModeAndRooms {
    let Some(property) = property else {
        return ModeAndRooms::empty();
    };
    ModeAndRooms {
        mode: mode_from_flags(property.mode.as_ref()),
        rooms: property
            .rooms
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(room_from_wire)
            .collect(),
    }
}

pub fn mode_temperatures_from_wire(temps: Option<&tiko::ModesTemperatures>) -> ModeTemperatures {
    temps
        .map(|t| ModeTemperatures {
            sleep: t.sleep,
            absence: t.absence,
            comfort: t.comfort,
            frost: t.frost,
        })
        .unwrap_or_default()
}

pub fn room_mode_update_from_wire(payload: Option<&tiko::RoomModePayload>) -> RoomModeUpdate {
    RoomModeUpdate {
        room_id: payload.and_then(|p| p.id).map(|id| id.0),
        mode: mode_from_flags(payload.and_then(|p| p.mode.as_ref())),
        modes_temperatures: mode_temperatures_from_wire(payload.and_then(|p| p.modes_temperatures.as_ref())),
    }
}

pub fn temperature_adjustment_from_wire(payload: Option<&tiko::AdjustTemperaturePayload>) -> TemperatureAdjustment {
    payload
        .and_then(|p| p.adjust_temperature.as_ref())
        .map(|a| TemperatureAdjustment {
            active: a.active.unwrap_or(false),
            end_date_time: a.end_date_time.clone(),
            temperature: a.temperature,
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn load_fixture() -> tiko::PropertyModeAndRoomsData {
        let json = std::fs::read_to_string("tests/data/mode-and-rooms.json").expect("fixture present");
        serde_json::from_str(&json).expect("parse property payload")
    }

    fn flags(value: serde_json::Value) -> tiko::ModeFlags {
        serde_json::from_value(value).expect("mode flags")
    }

    #[test]
    fn single_flag_maps_to_its_mode() {
        let absence = flags(json!({
            "comfort": false, "boost": false, "sleep": false, "absence": true, "frost": false,
            "disableHeating": false, "passive": false, "summer": false, "bypass": false
        }));
        assert_eq!(mode_from_flags(Some(&absence)), Some(Mode::Absence));

        let disable = flags(json!({"disableHeating": true}));
        assert_eq!(mode_from_flags(Some(&disable)), Some(Mode::DisableHeating));
    }

    #[test]
    fn no_flag_or_no_record_maps_to_none() {
        assert_eq!(mode_from_flags(Some(&tiko::ModeFlags::default())), None);
        assert_eq!(mode_from_flags(None), None);
    }

    #[test]
    fn several_flags_pick_first_in_canonical_order() {
        // payload order deliberately differs from canonical order
        let both = flags(json!({"bypass": true, "frost": true, "sleep": true}));
        assert_eq!(mode_from_flags(Some(&both)), Some(Mode::Sleep));

        for (i, mode) in Mode::ALL.into_iter().enumerate() {
            let mut value = serde_json::Map::new();
            for later in &Mode::ALL[i..] {
                value.insert(later.as_str().to_string(), json!(true));
            }
            let set = flags(serde_json::Value::Object(value));
            assert_eq!(mode_from_flags(Some(&set)), Some(mode));
        }
    }

    #[test]
    fn room_defaults_when_fields_missing() {
        let room: tiko::Room = serde_json::from_value(json!({"id": 12, "name": "Room 3"})).expect("room");
        let mapped = room_from_wire(&room);
        assert_eq!(mapped.id, "12");
        assert_eq!(mapped.name, "Room 3");
        assert_eq!(mapped.color, DEFAULT_ROOM_COLOR);
        assert_eq!(mapped.target_temperature_degrees, 0.0);
        assert_eq!(mapped.current_temperature_degrees, 0.0);
        assert_eq!(mapped.humidity, 0.0);
        assert_eq!(mapped.mode, None);
        assert!(!mapped.is_heating);
    }

    #[test]
    fn room_prefers_first_device_name() {
        let room: tiko::Room = serde_json::from_value(json!({
            "id": 3,
            "name": "Room 3",
            "devices": [{"name": "Office"}, {"name": "Spare"}]
        }))
        .expect("room");
        assert_eq!(room_from_wire(&room).name, "Office");

        let unnamed: tiko::Room =
            serde_json::from_value(json!({"id": 3, "name": "Room 3", "devices": [{"name": null}]})).expect("room");
        assert_eq!(room_from_wire(&unnamed).name, "Room 3");
    }

    #[test]
    fn fixture_maps_property_and_rooms_in_order() {
        let data = load_fixture();
        let snapshot = mode_and_rooms_from_wire(data.property.as_ref());
        assert_eq!(snapshot.mode, Some(Mode::Comfort));
        let ids = snapshot.rooms.iter().map(|r| r.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["101", "102", "103"]);

        let living = &snapshot.rooms[0];
        assert_eq!(living.name, "Salon radiator");
        assert_eq!(living.color, "#03dac6");
        assert_eq!(living.current_temperature_degrees, 20.5);
        assert_eq!(living.target_temperature_degrees, 21.0);
        assert_eq!(living.humidity, 48.0);
        assert_eq!(living.mode, None);
        assert!(living.is_heating);

        let bedroom = &snapshot.rooms[1];
        assert_eq!(bedroom.name, "Bedroom");
        assert_eq!(bedroom.mode, Some(Mode::Frost));
        assert!(!bedroom.is_heating);

        let bare = &snapshot.rooms[2];
        assert_eq!(bare.color, DEFAULT_ROOM_COLOR);
        assert_eq!(bare.target_temperature_degrees, 0.0);
    }

    #[test]
    fn missing_property_maps_to_empty_snapshot() {
        assert_eq!(mode_and_rooms_from_wire(None), ModeAndRooms::empty());
    }

    #[test]
    fn write_payloads_map_to_results() {
        let payload: tiko::RoomModePayload = serde_json::from_value(json!({
            "id": 5,
            "mode": {"boost": true},
            "modesTemperatures": {"sleep": 17.0, "comfort": 20.5}
        }))
        .expect("payload");
        let update = room_mode_update_from_wire(Some(&payload));
        assert_eq!(update.room_id, Some(5));
        assert_eq!(update.mode, Some(Mode::Boost));
        assert_eq!(update.modes_temperatures.comfort, Some(20.5));
        assert_eq!(update.modes_temperatures.frost, None);

        let adjust: tiko::AdjustTemperaturePayload = serde_json::from_value(json!({
            "id": 5,
            "adjustTemperature": {"active": true, "endDateTime": "2024-01-01T12:00:00Z", "temperature": 22.5}
        }))
        .expect("payload");
        let mapped = temperature_adjustment_from_wire(Some(&adjust));
        assert!(mapped.active);
        assert_eq!(mapped.temperature, Some(22.5));
        assert_eq!(temperature_adjustment_from_wire(None), TemperatureAdjustment::default());
    }
}
