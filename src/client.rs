//! Blocking client for the Tiko heating API (GraphQL).
//!
//! - One shared login session per client; see [`crate::session`].
//! - Requests that hit an expired session re-authenticate and retry once; see [`crate::retry`].
//! - Results are mapped to the dashboard model in [`crate::models::domain`].

use chrono::{DateTime, Utc};
use log::debug;
use std::sync::Arc;

use crate::config::{Config, Credentials};
use crate::dispatch::RequestDispatcher;
use crate::mapper;
use crate::models::domain::{Mode, ModeAndRooms, RoomModeUpdate, TemperatureAdjustment};
use crate::models::tiko::{self, PropertyId, RoomId};
use crate::queries;
use crate::retry::RetryCoordinator;
use crate::session::SessionManager;
use crate::transport::{Connector, UreqConnector};

/// Provider status that marks an expired or revoked session.
pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";

#[derive(Debug, Clone, PartialEq)]
pub enum TikoClientError {
    /// Credentials are not configured. Never retried.
    Config(String),
    /// The provider rejected the login.
    Auth(String),
    /// The session expired mid-request.
    PermissionDenied(String),
    /// HTTP 502 from the provider's gateway.
    Gateway(String),
    Http { status: u16, message: String },
    /// GraphQL error other than permission denied.
    Provider { code: Option<String>, message: String },
    Transport(String),
    Json(String),
}

impl TikoClientError {
    /// Errors that mean "log in again and the same request may succeed".
    pub fn is_session_expiry(&self) -> bool {
        matches!(self, TikoClientError::PermissionDenied(_) | TikoClientError::Gateway(_))
    }
}

impl core::fmt::Display for TikoClientError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TikoClientError::Config(s) => write!(f, "config error: {}", s),
            TikoClientError::Auth(s) => write!(f, "auth error: {}", s),
            TikoClientError::PermissionDenied(s) => write!(f, "permission denied: {}", s),
            TikoClientError::Gateway(s) => write!(f, "gateway error (http 502): {}", s),
            TikoClientError::Http { status, message } => write!(f, "http {}: {}", status, message),
            TikoClientError::Provider { code: Some(code), message } => write!(f, "provider error {}: {}", code, message),
            TikoClientError::Provider { code: None, message } => write!(f, "provider error: {}", message),
            TikoClientError::Transport(s) => write!(f, "transport error: {}", s),
            TikoClientError::Json(s) => write!(f, "json error: {}", s),
        }
    }
}

impl std::error::Error for TikoClientError {}

pub struct TikoClient {
    retry: RetryCoordinator,
}

impl TikoClient {
    pub fn new(cfg: &Config) -> Self {
        Self::with_connector(
            cfg.credentials.clone(),
            &cfg.lang_code,
            Arc::new(UreqConnector::from_config(cfg)),
        )
    }

    pub fn with_connector(credentials: Option<Credentials>, lang_code: &str, connector: Arc<dyn Connector>) -> Self {
        let session = Arc::new(SessionManager::new(credentials, lang_code, connector));
        TikoClient {
            retry: RetryCoordinator::new(RequestDispatcher::new(session)),
        }
    }

    pub fn session(&self) -> &SessionManager {
        self.retry.dispatcher().session()
    }

    /// Property of the logged-in account; logs in when no session exists yet.
    pub fn property_id(&self) -> Result<PropertyId, TikoClientError> {
        Ok(self.session().ensure_authenticated(false)?.property_id)
    }

    pub fn get_mode_and_rooms(&self) -> Result<ModeAndRooms, TikoClientError> {
        self.get_mode_and_rooms_excluding(&[])
    }

    pub fn get_mode_and_rooms_excluding(&self, exclude_rooms: &[RoomId]) -> Result<ModeAndRooms, TikoClientError> {
        let property_id = self.property_id()?;
        let data: tiko::PropertyModeAndRoomsData = self
            .retry
            .call(&queries::property_mode_and_rooms(property_id, exclude_rooms))?;
        let snapshot = mapper::mode_and_rooms_from_wire(data.property.as_ref());
        debug!(
            "Property {}: mode={}, rooms={}",
            property_id.0,
            snapshot.mode.map(Mode::as_str).unwrap_or("-"),
            snapshot.rooms.len()
        );
        Ok(snapshot)
    }

    /// Activate a property-wide mode (`None` clears it). Returns the mode the provider reports back.
    pub fn set_mode(&self, mode: Option<Mode>, until: Option<DateTime<Utc>>) -> Result<Option<Mode>, TikoClientError> {
        let property_id = self.property_id()?;
        let data: tiko::ActivateHouseModeData = self
            .retry
            .call(&queries::activate_house_mode(property_id, mode, until))?;
        Ok(mapper::mode_from_flags(
            data.activate_house_mode.as_ref().and_then(|p| p.mode.as_ref()),
        ))
    }

    /// Activate a room mode (`None` returns the room to its schedule).
    pub fn set_room_mode(
        &self,
        room_id: RoomId,
        mode: Option<Mode>,
        until: Option<DateTime<Utc>>,
    ) -> Result<RoomModeUpdate, TikoClientError> {
        let property_id = self.property_id()?;
        let data: tiko::ActivateRoomModeData = self
            .retry
            .call(&queries::activate_room_mode(property_id, room_id, mode, until))?;
        Ok(mapper::room_mode_update_from_wire(data.activate_room_mode.as_ref()))
    }

    pub fn set_room_temperature(&self, room_id: RoomId, temperature: f64) -> Result<TemperatureAdjustment, TikoClientError> {
        let property_id = self.property_id()?;
        let data: tiko::SetRoomAdjustTemperatureData = self
            .retry
            .call(&queries::set_room_adjust_temperature(property_id, room_id, temperature))?;
        Ok(mapper::temperature_adjustment_from_wire(
            data.set_room_adjust_temperature.as_ref(),
        ))
    }
}
