//! Wire shapes of the Tiko GraphQL API.
//!
//! Notes
//! - Fields the dashboard does not rely on are still modeled so payloads decode faithfully.
//! - Almost everything is optional: the provider omits fields freely and the mapper applies defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =====================
// Scalar ID newtype wrappers
// =====================

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub i64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub i64);

// =====================
// GraphQL envelope
// =====================

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlError {
    #[serde(default)]
    pub message: Option<String>,
    /// Provider status code, e.g. `PERMISSION_DENIED`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub extensions: Option<GraphqlErrorExtensions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlErrorExtensions {
    #[serde(default)]
    pub code: Option<String>,
}

impl GraphqlError {
    /// Provider status, preferring the top-level `status` over `extensions.code`.
    pub fn code(&self) -> Option<&str> {
        self.status
            .as_deref()
            .or_else(|| self.extensions.as_ref().and_then(|e| e.code.as_deref()))
    }
}

// =====================
// Mode flags
// =====================

/// One boolean per heating mode; the provider sets at most one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModeFlags {
    pub comfort: bool,
    pub boost: bool,
    pub sleep: bool,
    pub absence: bool,
    pub frost: bool,
    pub disable_heating: bool,
    pub passive: bool,
    pub summer: bool,
    pub bypass: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModesTemperatures {
    pub sleep: Option<f64>,
    pub absence: Option<f64>,
    pub comfort: Option<f64>,
    pub frost: Option<f64>,
}

// =====================
// Log in
// =====================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogInData {
    pub log_in: LogInPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogInPayload {
    pub token: String,
    pub user: LogInUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogInUser {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub properties: Vec<PropertyRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyRef {
    pub id: PropertyId,
}

// =====================
// Property mode and rooms
// =====================

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyModeAndRoomsData {
    pub property: Option<Property>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Option<PropertyId>,
    pub mode: Option<ModeFlags>,
    pub mbox_disconnected: Option<bool>,
    #[serde(default)]
    pub rooms: Option<Vec<Room>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub room_type: Option<i64>,
    pub color: Option<String>,
    pub heaters: Option<i64>,
    pub has_temperature_schedule: Option<bool>,
    pub current_temperature_degrees: Option<f64>,
    pub target_temperature_degrees: Option<f64>,
    pub humidity: Option<f64>,
    pub sensors: Option<i64>,
    pub mode: Option<ModeFlags>,
    pub modes_temperatures: Option<ModesTemperatures>,
    pub status: Option<RoomStatus>,
    #[serde(default)]
    pub devices: Option<Vec<Device>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomStatus {
    pub disconnected: bool,
    pub heater_disconnected: bool,
    pub heating_operating: bool,
    pub sensor_battery_low: bool,
    pub sensor_disconnected: bool,
    pub temporary_adjustment: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    pub name: Option<String>,
}

// =====================
// Mutations
// =====================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateHouseModeData {
    pub activate_house_mode: Option<HouseModePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HouseModePayload {
    pub mode: Option<ModeFlags>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRoomModeData {
    pub activate_room_mode: Option<RoomModePayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomModePayload {
    pub id: Option<RoomId>,
    pub mode: Option<ModeFlags>,
    pub modes_temperatures: Option<ModesTemperatures>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRoomAdjustTemperatureData {
    pub set_room_adjust_temperature: Option<AdjustTemperaturePayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustTemperaturePayload {
    pub id: Option<RoomId>,
    pub adjust_temperature: Option<AdjustTemperature>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustTemperature {
    pub active: Option<bool>,
    pub end_date_time: Option<String>,
    pub temperature: Option<f64>,
}
