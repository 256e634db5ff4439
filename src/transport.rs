//! One HTTP exchange with the GraphQL endpoint, behind a trait so sessions can be exercised offline.
//!
//! A [`Connector`] hands out a fresh [`Transport`] for every login session: cookie affinity is bound
//! to the client instance, so a forced re-authentication never reuses the previous one.

use crate::client::TikoClientError;
use crate::config::Config;
use http::header::SET_COOKIE;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    /// `Authorization` header value, absent before login.
    pub authorization: Option<String>,
    /// `Cookie` header value, absent when the jar is empty.
    pub cookie: Option<String>,
    /// GraphQL request document (`operationName`, `query`, `variables`).
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Raw `Set-Cookie` header values, one entry per header line.
    pub set_cookies: Vec<String>,
    pub body: String,
}

pub trait Transport: Send + Sync {
    /// Perform one POST. Non-2xx statuses are returned as responses, only I/O failures are errors.
    fn send(&self, request: &OutgoingRequest) -> Result<TransportResponse, TikoClientError>;
}

pub trait Connector: Send + Sync {
    fn connect(&self) -> Arc<dyn Transport>;
}

/// Blocking transport on top of a dedicated `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
    endpoint: String,
}

impl UreqTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build();
        UreqTransport {
            agent: ureq::Agent::new_with_config(config),
            endpoint: endpoint.into(),
        }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &OutgoingRequest) -> Result<TransportResponse, TikoClientError> {
        let mut req = self.agent.post(&self.endpoint).header("Accept", "application/json");
        if let Some(auth) = &request.authorization {
            req = req.header("Authorization", auth.as_str());
        }
        if let Some(cookie) = &request.cookie {
            req = req.header("Cookie", cookie.as_str());
        }

        let mut res = req
            .send_json(&request.body)
            .map_err(|e| TikoClientError::Transport(e.to_string()))?;

        let status = res.status().as_u16();
        let set_cookies = res
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let body = res
            .body_mut()
            .read_to_string()
            .map_err(|e| TikoClientError::Transport(e.to_string()))?;

        Ok(TransportResponse {
            status,
            set_cookies,
            body,
        })
    }
}

pub struct UreqConnector {
    endpoint: String,
    timeout: Duration,
}

impl UreqConnector {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        UreqConnector {
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.graphql_url(), cfg.request_timeout)
    }
}

impl Connector for UreqConnector {
    fn connect(&self) -> Arc<dyn Transport> {
        Arc::new(UreqTransport::new(self.endpoint.clone(), self.timeout))
    }
}
