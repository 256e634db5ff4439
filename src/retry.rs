//! Retry policy around [`RequestDispatcher`]: on a session-expiry error, replace the expired session
//! once and replay the operation on it. Everything else, including a second failure, is returned
//! unchanged.

use log::{error, warn};
use serde::de::DeserializeOwned;

use crate::client::TikoClientError;
use crate::dispatch::RequestDispatcher;
use crate::queries::GraphqlOperation;

pub struct RetryCoordinator {
    dispatcher: RequestDispatcher,
}

impl RetryCoordinator {
    pub fn new(dispatcher: RequestDispatcher) -> Self {
        RetryCoordinator { dispatcher }
    }

    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }

    pub fn call<T: DeserializeOwned>(&self, operation: &GraphqlOperation) -> Result<T, TikoClientError> {
        let session = self.dispatcher.session();
        let lease = session.acquire(false)?;
        match self.dispatcher.execute_on(&lease, operation) {
            Ok(value) => Ok(value),
            Err(e) if e.is_session_expiry() => {
                warn!(
                    "Retry: {} {} failed ({}); re-authenticating and retrying once",
                    operation.kind, operation.name, e
                );
                // Callers that failed on the same session share one replacement login.
                session.reauthenticate_after(lease.generation)?;
                self.dispatcher.execute(operation).inspect_err(|e| {
                    error!(
                        "Retry: {} {} failed again after re-authentication: {}",
                        operation.kind, operation.name, e
                    )
                })
            }
            Err(e) => {
                error!("Request {} {} failed: {}", operation.kind, operation.name, e);
                Err(e)
            }
        }
    }
}
