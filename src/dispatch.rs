//! Executes single GraphQL operations on the current session and classifies their failures.

use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::client::{PERMISSION_DENIED, TikoClientError};
use crate::models::tiko::GraphqlResponse;
use crate::queries::GraphqlOperation;
use crate::session::{SessionLease, SessionManager};
use crate::transport::{OutgoingRequest, TransportResponse};

const MAX_ERROR_BODY: usize = 512;

pub struct RequestDispatcher {
    session: Arc<SessionManager>,
}

impl RequestDispatcher {
    pub fn new(session: Arc<SessionManager>) -> Self {
        RequestDispatcher { session }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Run `operation` once on the current session, logging in first if needed. No retries.
    pub fn execute<T: DeserializeOwned>(&self, operation: &GraphqlOperation) -> Result<T, TikoClientError> {
        let lease = self.session.acquire(false)?;
        self.execute_on(&lease, operation)
    }

    /// Run `operation` once on an already leased session.
    pub(crate) fn execute_on<T: DeserializeOwned>(
        &self,
        lease: &SessionLease,
        operation: &GraphqlOperation,
    ) -> Result<T, TikoClientError> {
        debug!(
            "Dispatch: {} {} (generation {})",
            operation.kind, operation.name, lease.generation
        );
        let data = exchange(&self.session, lease, operation)?;
        decode_data(operation.name, data)
    }
}

/// Send `operation` over the lease's transport and merge returned cookies into the session.
/// Returns the `data` member of a successful response.
pub(crate) fn exchange(
    session: &SessionManager,
    lease: &SessionLease,
    operation: &GraphqlOperation,
) -> Result<Value, TikoClientError> {
    let request = OutgoingRequest {
        authorization: lease.authorization(),
        cookie: lease.cookie.clone(),
        body: operation.body(),
    };
    let response = lease.transport.send(&request)?;
    session.store_cookies(lease.generation, &response.set_cookies);
    interpret_response(&response)
}

/// Map a raw response onto the error taxonomy.
///
/// Order matters: a 502 is a gateway failure whatever the body says, and a GraphQL error wins over
/// the HTTP status because the provider reports `PERMISSION_DENIED` with varying statuses.
pub(crate) fn interpret_response(response: &TransportResponse) -> Result<Value, TikoClientError> {
    if response.status == 502 {
        return Err(TikoClientError::Gateway(truncate(&response.body)));
    }

    let envelope = serde_json::from_str::<GraphqlResponse>(&response.body);
    let ok_status = (200..300).contains(&response.status);

    if let Ok(GraphqlResponse {
        errors: Some(errors), ..
    }) = &envelope
        && let Some(first) = errors.first()
    {
        let message = first
            .message
            .clone()
            .unwrap_or_else(|| "unspecified provider error".to_string());
        return Err(match first.code() {
            Some(PERMISSION_DENIED) => TikoClientError::PermissionDenied(message),
            code => TikoClientError::Provider {
                code: code.map(str::to_string),
                message,
            },
        });
    }

    if !ok_status {
        return Err(TikoClientError::Http {
            status: response.status,
            message: truncate(&response.body),
        });
    }

    match envelope {
        Ok(GraphqlResponse {
            data: Some(data), ..
        }) if !data.is_null() => Ok(data),
        Ok(_) => Err(TikoClientError::Provider {
            code: None,
            message: "response carried no data".to_string(),
        }),
        Err(e) => Err(TikoClientError::Json(format!("invalid GraphQL response: {}", e))),
    }
}

/// Decode the `data` member, reporting the JSON path of any mismatch.
pub(crate) fn decode_data<T: DeserializeOwned>(operation: &str, data: Value) -> Result<T, TikoClientError> {
    serde_path_to_error::deserialize(data)
        .map_err(|e| TikoClientError::Json(format!("{} at {}: {}", operation, e.path(), e.inner())))
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
