//! GraphQL documents for the subset of the Tiko API the dashboard uses.

use crate::models::domain::Mode;
use crate::models::tiko::{PropertyId, RoomId};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Query => f.write_str("query"),
            OperationKind::Mutation => f.write_str("mutation"),
        }
    }
}

/// A ready-to-send operation. Built once per logical call and reused verbatim on retry.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphqlOperation {
    pub kind: OperationKind,
    pub name: &'static str,
    pub document: &'static str,
    pub variables: Value,
}

impl GraphqlOperation {
    pub fn body(&self) -> Value {
        json!({
            "operationName": self.name,
            "query": self.document,
            "variables": self.variables,
        })
    }
}

const LOG_IN: &str = r#"mutation LogIn($email: String!, $password: String!, $langCode: String, $retainSession: Boolean) {
  logIn(input: {email: $email, password: $password, langCode: $langCode, retainSession: $retainSession}) {
    user {
      id
      properties {
        id
      }
    }
    token
  }
}"#;

const GET_PROPERTY_MODE_AND_ROOMS: &str = r#"query GET_PROPERTY_MODE_AND_ROOMS($id: Int!, $excludeRooms: [Int]) {
  property(id: $id) {
    id
    mode
    mboxDisconnected
    rooms(excludeRooms: $excludeRooms) {
      id
      name
      type
      color
      heaters
      hasTemperatureSchedule
      currentTemperatureDegrees
      targetTemperatureDegrees
      humidity
      sensors
      mode {
        comfort
        boost
        sleep
        absence
        frost
        disableHeating
        passive
        summer
        bypass
      }
      modesTemperatures {
        sleep
        absence
        comfort
        frost
      }
      devices {
        name
      }
      ...Status
    }
  }
}
fragment Status on RoomType {
  status {
    disconnected
    heaterDisconnected
    heatingOperating
    sensorBatteryLow
    sensorDisconnected
    temporaryAdjustment
  }
}"#;

const ACTIVATE_HOUSE_MODE: &str = r#"mutation ACTIVATE_HOUSE_MODE($propertyId: Int!, $mode: String!, $endDatetime: DateTime) {
  activateHouseMode(input: {propertyId: $propertyId, mode: $mode, endDatetime: $endDatetime}) {
    mode {
      comfort
      absence
      frost
      disableHeating
      passive
      bypass
    }
  }
}"#;

const ACTIVATE_ROOM_MODE: &str = r#"mutation ACTIVATE_ROOM_MODE($propertyId: Int!, $roomId: Int!, $mode: String, $endDatetime: DateTime) {
  activateRoomMode(input: {propertyId: $propertyId, roomId: $roomId, mode: $mode, endDatetime: $endDatetime}) {
    id
    mode {
      comfort
      absence
      sleep
      boost
      frost
      disableHeating
      passive
      summer
      bypass
    }
    modesTemperatures {
      sleep
      absence
      comfort
      frost
    }
  }
}"#;

const SET_ROOM_ADJUST_TEMPERATURE: &str = r#"mutation SET_PROPERTY_ROOM_ADJUST_TEMPERATURE($propertyId: Int!, $roomId: Int!, $temperature: Float!) {
  setRoomAdjustTemperature(input: {propertyId: $propertyId, roomId: $roomId, temperature: $temperature}) {
    id
    adjustTemperature {
      active
      endDateTime
      temperature
    }
  }
}"#;

pub fn log_in(email: &str, password: &str, lang_code: &str) -> GraphqlOperation {
    GraphqlOperation {
        kind: OperationKind::Mutation,
        name: "LogIn",
        document: LOG_IN,
        variables: json!({
            "email": email,
            "password": password,
            "langCode": lang_code,
            "retainSession": true,
        }),
    }
}

pub fn property_mode_and_rooms(property_id: PropertyId, exclude_rooms: &[RoomId]) -> GraphqlOperation {
    let mut variables = Map::new();
    variables.insert("id".into(), json!(property_id.0));
    if !exclude_rooms.is_empty() {
        variables.insert(
            "excludeRooms".into(),
            Value::Array(exclude_rooms.iter().map(|r| json!(r.0)).collect()),
        );
    }
    GraphqlOperation {
        kind: OperationKind::Query,
        name: "GET_PROPERTY_MODE_AND_ROOMS",
        document: GET_PROPERTY_MODE_AND_ROOMS,
        variables: Value::Object(variables),
    }
}

/// `mode: None` is sent as the literal string `"false"`, which clears the property mode.
pub fn activate_house_mode(property_id: PropertyId, mode: Option<Mode>, until: Option<DateTime<Utc>>) -> GraphqlOperation {
    let mut variables = Map::new();
    variables.insert("propertyId".into(), json!(property_id.0));
    variables.insert("mode".into(), json!(mode.map(Mode::as_str).unwrap_or("false")));
    if let Some(end) = until {
        variables.insert("endDatetime".into(), json!(format_datetime(end)));
    }
    GraphqlOperation {
        kind: OperationKind::Mutation,
        name: "ACTIVATE_HOUSE_MODE",
        document: ACTIVATE_HOUSE_MODE,
        variables: Value::Object(variables),
    }
}

/// `mode: None` omits the variable, returning the room to its schedule.
pub fn activate_room_mode(
    property_id: PropertyId,
    room_id: RoomId,
    mode: Option<Mode>,
    until: Option<DateTime<Utc>>,
) -> GraphqlOperation {
    let mut variables = Map::new();
    variables.insert("propertyId".into(), json!(property_id.0));
    variables.insert("roomId".into(), json!(room_id.0));
    if let Some(mode) = mode {
        variables.insert("mode".into(), json!(mode.as_str()));
    }
    if let Some(end) = until {
        variables.insert("endDatetime".into(), json!(format_datetime(end)));
    }
    GraphqlOperation {
        kind: OperationKind::Mutation,
        name: "ACTIVATE_ROOM_MODE",
        document: ACTIVATE_ROOM_MODE,
        variables: Value::Object(variables),
    }
}

pub fn set_room_adjust_temperature(property_id: PropertyId, room_id: RoomId, temperature: f64) -> GraphqlOperation {
    GraphqlOperation {
        kind: OperationKind::Mutation,
        name: "SET_PROPERTY_ROOM_ADJUST_TEMPERATURE",
        document: SET_ROOM_ADJUST_TEMPERATURE,
        variables: json!({
            "propertyId": property_id.0,
            "roomId": room_id.0,
            "temperature": temperature,
        }),
    }
}

fn format_datetime(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn house_mode_none_is_sent_as_false() {
        let op = activate_house_mode(PropertyId(9), None, None);
        assert_eq!(op.variables, json!({"propertyId": 9, "mode": "false"}));

        let until = Utc.with_ymd_and_hms(2026, 1, 2, 18, 30, 0).unwrap();
        let op = activate_house_mode(PropertyId(9), Some(Mode::Absence), Some(until));
        assert_eq!(
            op.variables,
            json!({"propertyId": 9, "mode": "absence", "endDatetime": "2026-01-02T18:30:00Z"})
        );
    }

    #[test]
    fn room_mode_none_omits_mode() {
        let op = activate_room_mode(PropertyId(9), RoomId(3), None, None);
        assert_eq!(op.variables, json!({"propertyId": 9, "roomId": 3}));

        let op = activate_room_mode(PropertyId(9), RoomId(3), Some(Mode::DisableHeating), None);
        assert_eq!(op.variables["mode"], "disableHeating");
        assert_eq!(op.kind, OperationKind::Mutation);
    }

    #[test]
    fn read_excludes_rooms_only_when_given() {
        assert_eq!(property_mode_and_rooms(PropertyId(9), &[]).variables, json!({"id": 9}));
        assert_eq!(
            property_mode_and_rooms(PropertyId(9), &[RoomId(1), RoomId(4)]).variables,
            json!({"id": 9, "excludeRooms": [1, 4]})
        );
    }

    #[test]
    fn body_carries_operation_name_and_document() {
        let op = set_room_adjust_temperature(PropertyId(9), RoomId(3), 21.5);
        let body = op.body();
        assert_eq!(body["operationName"], "SET_PROPERTY_ROOM_ADJUST_TEMPERATURE");
        assert!(body["query"].as_str().unwrap().contains("setRoomAdjustTemperature"));
        assert_eq!(body["variables"]["temperature"], 21.5);

        let login = log_in("me@example.com", "pw", "en");
        assert_eq!(login.variables["retainSession"], true);
    }
}
