//! Dashboard-facing model. Values are built fresh per read and serialized as-is to the UI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mutually exclusive heating regime of the property or of a single room.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    Comfort,
    Boost,
    Sleep,
    Absence,
    Frost,
    DisableHeating,
    Passive,
    Summer,
    Bypass,
}

impl Mode {
    /// Canonical order; also the tie-break order when several flags are set.
    pub const ALL: [Mode; 9] = [
        Mode::Comfort,
        Mode::Boost,
        Mode::Sleep,
        Mode::Absence,
        Mode::Frost,
        Mode::DisableHeating,
        Mode::Passive,
        Mode::Summer,
        Mode::Bypass,
    ];

    /// Name used on the wire and in the dashboard JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Comfort => "comfort",
            Mode::Boost => "boost",
            Mode::Sleep => "sleep",
            Mode::Absence => "absence",
            Mode::Frost => "frost",
            Mode::DisableHeating => "disableHeating",
            Mode::Passive => "passive",
            Mode::Summer => "summer",
            Mode::Bypass => "bypass",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMode(pub String);

impl fmt::Display for UnknownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mode {:?}", self.0)
    }
}

impl std::error::Error for UnknownMode {}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub name: String,
    pub color: String,
    pub current_temperature_degrees: f64,
    pub target_temperature_degrees: f64,
    pub mode: Option<Mode>,
    pub humidity: f64,
    pub is_heating: bool,
}

/// Single read snapshot. Room order is whatever the provider returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModeAndRooms {
    pub mode: Option<Mode>,
    pub rooms: Vec<Room>,
}

impl ModeAndRooms {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeTemperatures {
    pub sleep: Option<f64>,
    pub absence: Option<f64>,
    pub comfort: Option<f64>,
    pub frost: Option<f64>,
}

/// Result of activating a room mode, as reported back by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomModeUpdate {
    pub room_id: Option<i64>,
    pub mode: Option<Mode>,
    pub modes_temperatures: ModeTemperatures,
}

/// Temporary temperature override of a room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureAdjustment {
    pub active: bool,
    pub end_date_time: Option<String>,
    pub temperature: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_names_round_trip_through_from_str() {
        for mode in Mode::ALL {
            assert_eq!(mode.as_str().parse::<Mode>(), Ok(mode));
            assert_eq!(serde_json::to_value(mode).expect("serialize"), mode.as_str());
        }
        assert_eq!("Comfort".parse::<Mode>(), Err(UnknownMode("Comfort".to_string())));
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let snapshot = ModeAndRooms {
            mode: None,
            rooms: vec![Room {
                id: "7".into(),
                name: "Office".into(),
                color: "#bb86fc".into(),
                current_temperature_degrees: 19.5,
                target_temperature_degrees: 20.0,
                mode: Some(Mode::DisableHeating),
                humidity: 41.0,
                is_heating: true,
            }],
        };
        let json = serde_json::to_value(&snapshot).expect("serialize");
        assert_eq!(json["mode"], serde_json::Value::Null);
        assert_eq!(json["rooms"][0]["currentTemperatureDegrees"], 19.5);
        assert_eq!(json["rooms"][0]["mode"], "disableHeating");
        assert_eq!(json["rooms"][0]["isHeating"], true);
    }
}
