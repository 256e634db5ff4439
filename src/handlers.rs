//! JSON endpoints of the dashboard backend, as plain functions of (method, body).
//!
//! Each handler validates the request shape, delegates to [`TikoClient`] and answers with a status
//! code and a JSON body. Reads never fail towards the UI: a failed read yields an empty snapshot.

use chrono::{DateTime, Utc};
use http::{Method, StatusCode};
use log::error;
use serde_json::{Value, json};

use crate::client::TikoClient;
use crate::models::domain::{Mode, ModeAndRooms};
use crate::models::tiko::RoomId;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        ApiResponse {
            status: StatusCode::OK,
            body,
        }
    }

    fn error(status: StatusCode, message: impl Into<String>) -> Self {
        ApiResponse {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    fn success() -> Self {
        Self::ok(json!({ "success": true }))
    }

    fn method_not_allowed() -> Self {
        Self::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }
}

/// `GET /api/mode_and_rooms`
pub fn mode_and_rooms(client: &TikoClient, method: &Method) -> ApiResponse {
    if *method != Method::GET {
        return ApiResponse::method_not_allowed();
    }
    let snapshot = client.get_mode_and_rooms().unwrap_or_else(|e| {
        error!("Failed to get mode and rooms: {}", e);
        ModeAndRooms::empty()
    });
    match serde_json::to_value(&snapshot) {
        Ok(body) => ApiResponse::ok(body),
        Err(e) => ApiResponse::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode mode and rooms: {}", e),
        ),
    }
}

/// `PUT /api/mode` with `{room_id?: integer, mode?: Mode|null, end_datetime?: RFC3339}`.
/// Without a room id (or with `0`) the mode applies to the whole property.
pub fn mode(client: &TikoClient, method: &Method, body: &Value) -> ApiResponse {
    if *method != Method::PUT {
        return ApiResponse::method_not_allowed();
    }

    let mode = match body.get("mode") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => match s.parse::<Mode>() {
            Ok(m) => Some(m),
            Err(_) => return ApiResponse::error(StatusCode::BAD_REQUEST, "Mode must be a Mode or null"),
        },
        Some(_) => return ApiResponse::error(StatusCode::BAD_REQUEST, "Mode must be a Mode or null"),
    };
    let room_id = match present(body, "room_id").map(Value::as_i64) {
        None => None,
        Some(Some(v)) => Some(v),
        Some(None) => return ApiResponse::error(StatusCode::BAD_REQUEST, "Room ID must be a number"),
    };
    let until = match optional_datetime(body, "end_datetime") {
        Ok(v) => v,
        Err(()) => {
            return ApiResponse::error(StatusCode::BAD_REQUEST, "end_datetime must be an RFC 3339 timestamp");
        }
    };

    let result = match room_id {
        Some(room_id) => client.set_room_mode(RoomId(room_id), mode, until).map(|_| ()),
        None => client.set_mode(mode, until).map(|_| ()),
    };
    match result {
        Ok(()) => ApiResponse::success(),
        Err(e) => {
            error!("Failed to set mode: {}", e);
            ApiResponse::error(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to set mode: {}", e))
        }
    }
}

/// `PUT /api/temperature` with `{room_id: integer, temperature: number}`.
pub fn temperature(client: &TikoClient, method: &Method, body: &Value) -> ApiResponse {
    if *method != Method::PUT {
        return ApiResponse::method_not_allowed();
    }

    let Some(room_id) = present(body, "room_id") else {
        return ApiResponse::error(StatusCode::BAD_REQUEST, "room_id is required");
    };
    let Some(temperature) = body.get("temperature").and_then(Value::as_f64) else {
        return ApiResponse::error(StatusCode::BAD_REQUEST, "Temperature must be a number");
    };
    let Some(room_id) = room_id.as_i64() else {
        return ApiResponse::error(StatusCode::BAD_REQUEST, "Room ID must be a number");
    };

    match client.set_room_temperature(RoomId(room_id), temperature) {
        Ok(_) => ApiResponse::success(),
        Err(e) => {
            error!("Failed to set temperature: {}", e);
            ApiResponse::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to set temperature: {}", e),
            )
        }
    }
}

/// `body[key]` unless it is absent or an empty value (`null`, `false`, `0`, `""`).
fn present<'a>(body: &'a Value, key: &str) -> Option<&'a Value> {
    body.get(key).filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

fn optional_datetime(body: &Value, key: &str) -> Result<Option<DateTime<Utc>>, ()> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|d| Some(d.with_timezone(&Utc)))
            .map_err(|_| ()),
        Some(_) => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::transport::testing::{ScriptedConnector, login_ok, ok, operation_name, status};
    use std::sync::Arc;

    fn client(connector: Arc<ScriptedConnector>) -> TikoClient {
        TikoClient::with_connector(
            Some(Credentials {
                email: "me@example.com".into(),
                password: "pw".into(),
            }),
            "en",
            connector,
        )
    }

    fn healthy() -> Arc<ScriptedConnector> {
        ScriptedConnector::new(|req| match operation_name(req) {
            Some("LogIn") => login_ok("tok", 1),
            Some("GET_PROPERTY_MODE_AND_ROOMS") => ok(json!({"data": {"property": {
                "id": 1,
                "mode": {"summer": true},
                "rooms": [{"id": 4, "name": "Kitchen"}]
            }}})),
            Some("ACTIVATE_HOUSE_MODE") => ok(json!({"data": {"activateHouseMode": {"mode": {}}}})),
            Some("ACTIVATE_ROOM_MODE") => ok(json!({"data": {"activateRoomMode": {"id": 4}}})),
            Some("SET_PROPERTY_ROOM_ADJUST_TEMPERATURE") => {
                ok(json!({"data": {"setRoomAdjustTemperature": {"id": 4}}}))
            }
            other => panic!("unexpected operation {:?}", other),
        })
    }

    #[test]
    fn read_returns_snapshot_json() {
        let res = mode_and_rooms(&client(healthy()), &Method::GET);
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["mode"], "summer");
        assert_eq!(res.body["rooms"][0]["name"], "Kitchen");
        assert_eq!(res.body["rooms"][0]["color"], "#bb86fc");
    }

    #[test]
    fn read_failure_yields_empty_snapshot() {
        let connector = ScriptedConnector::new(|req| match operation_name(req) {
            Some("LogIn") => login_ok("tok", 1),
            _ => status(500, "boom"),
        });
        let res = mode_and_rooms(&client(connector), &Method::GET);
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body, json!({"mode": null, "rooms": []}));
    }

    #[test]
    fn wrong_methods_are_rejected() {
        let c = client(healthy());
        assert_eq!(mode_and_rooms(&c, &Method::POST).status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(mode(&c, &Method::GET, &json!({})).status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(temperature(&c, &Method::POST, &json!({})).status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn mode_routes_on_room_id() {
        let connector = healthy();
        let c = client(connector.clone());

        let res = mode(&c, &Method::PUT, &json!({"mode": "frost"}));
        assert_eq!(res, ApiResponse::success());
        let res = mode(&c, &Method::PUT, &json!({"room_id": 4, "mode": null, "end_datetime": "2026-01-01T10:00:00+01:00"}));
        assert_eq!(res.status, StatusCode::OK);

        let res = mode(&c, &Method::PUT, &json!({"room_id": 0, "mode": "comfort"}));
        assert_eq!(res, ApiResponse::success());

        assert_eq!(connector.count("ACTIVATE_HOUSE_MODE"), 2);
        assert_eq!(connector.count("ACTIVATE_ROOM_MODE"), 1);
        let room_req = connector
            .requests()
            .into_iter()
            .find(|r| operation_name(r) == Some("ACTIVATE_ROOM_MODE"))
            .expect("room mode request");
        assert_eq!(
            room_req.body["variables"],
            json!({"propertyId": 1, "roomId": 4, "endDatetime": "2026-01-01T09:00:00Z"})
        );
    }

    #[test]
    fn mode_validates_types() {
        let c = client(healthy());
        let res = mode(&c, &Method::PUT, &json!({"mode": 3}));
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["error"], "Mode must be a Mode or null");
        assert_eq!(mode(&c, &Method::PUT, &json!({"mode": "turbo"})).status, StatusCode::BAD_REQUEST);
        let res = mode(&c, &Method::PUT, &json!({"room_id": "4"}));
        assert_eq!(res.body["error"], "Room ID must be a number");
        assert_eq!(
            mode(&c, &Method::PUT, &json!({"end_datetime": "tomorrow"})).status,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn temperature_validates_and_delegates() {
        let connector = healthy();
        let c = client(connector.clone());

        let res = temperature(&c, &Method::PUT, &json!({"temperature": 20}));
        assert_eq!(res.body["error"], "room_id is required");
        let res = temperature(&c, &Method::PUT, &json!({"room_id": 4, "temperature": "warm"}));
        assert_eq!(res.body["error"], "Temperature must be a number");
        let res = temperature(&c, &Method::PUT, &json!({"room_id": 0, "temperature": 20}));
        assert_eq!(res.body["error"], "room_id is required");
        let res = temperature(&c, &Method::PUT, &json!({"room_id": 4.5, "temperature": 20}));
        assert_eq!(res.body["error"], "Room ID must be a number");
        // temperature is checked before the room id type
        let res = temperature(&c, &Method::PUT, &json!({"room_id": "4", "temperature": null}));
        assert_eq!(res.body["error"], "Temperature must be a number");
        assert_eq!(connector.count("SET_PROPERTY_ROOM_ADJUST_TEMPERATURE"), 0);

        let res = temperature(&c, &Method::PUT, &json!({"room_id": 4, "temperature": 21.5}));
        assert_eq!(res, ApiResponse::success());
        assert_eq!(connector.count("SET_PROPERTY_ROOM_ADJUST_TEMPERATURE"), 1);
    }

    #[test]
    fn write_failure_is_server_error() {
        let connector = ScriptedConnector::new(|req| match operation_name(req) {
            Some("LogIn") => login_ok("tok", 1),
            _ => ok(json!({"errors": [{"message": "Room not found", "status": "NOT_FOUND"}]})),
        });
        let res = temperature(&client(connector), &Method::PUT, &json!({"room_id": 9, "temperature": 19}));
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            res.body["error"],
            "Failed to set temperature: provider error NOT_FOUND: Room not found"
        );
    }
}
