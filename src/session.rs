//! Login session shared by every request of a [`crate::client::TikoClient`].
//!
//! State machine: `Unauthenticated -> Authenticating -> Authenticated`, back to `Authenticating` on a
//! forced re-authentication and to `Unauthenticated` when a login fails.
//!
//! - At most one login is in flight. Concurrent callers block on a condition variable and observe
//!   the outcome of that login instead of starting their own.
//! - Token, property id, cookie jar and transport are replaced together under one lock, and each login
//!   bumps a generation counter. Readers get a consistent [`SessionLease`]; cookies returned to a lease
//!   of an older generation are dropped.
//! - Requests that fail on an expired session re-authenticate against the generation they ran on, so
//!   callers that fail together share one replacement login.
//! - Ordinary requests only take the lock briefly to read the lease or merge cookies.

use log::{debug, info, warn};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::client::TikoClientError;
use crate::config::Credentials;
use crate::cookies::CookieJar;
use crate::dispatch;
use crate::models::tiko::{LogInData, PropertyId};
use crate::queries;
use crate::transport::{Connector, Transport};

/// Token and property id of a logged-in session. Always set or cleared together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAuth {
    pub token: String,
    pub property_id: PropertyId,
}

/// Consistent view of the session used to issue one request.
#[derive(Clone)]
pub struct SessionLease {
    /// `None` only for the login request itself.
    pub auth: Option<SessionAuth>,
    pub cookie: Option<String>,
    pub transport: Arc<dyn Transport>,
    pub generation: u64,
}

impl SessionLease {
    pub fn authorization(&self) -> Option<String> {
        self.auth.as_ref().map(|a| format!("Token {}", a.token))
    }
}

#[derive(Debug, Clone, Copy)]
enum Refresh {
    IfMissing,
    Always,
    /// Log in unless the session is already newer than this generation.
    Superseding(u64),
}

struct SessionState {
    auth: Option<SessionAuth>,
    cookies: CookieJar,
    transport: Arc<dyn Transport>,
    generation: u64,
    authenticating: bool,
}

impl SessionState {
    fn lease(&self) -> SessionLease {
        SessionLease {
            auth: self.auth.clone(),
            cookie: self.cookies.header_value(),
            transport: Arc::clone(&self.transport),
            generation: self.generation,
        }
    }
}

pub struct SessionManager {
    credentials: Option<Credentials>,
    lang_code: String,
    connector: Arc<dyn Connector>,
    state: Mutex<SessionState>,
    login_finished: Condvar,
}

impl SessionManager {
    pub fn new(credentials: Option<Credentials>, lang_code: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        let transport = connector.connect();
        SessionManager {
            credentials,
            lang_code: lang_code.into(),
            connector,
            state: Mutex::new(SessionState {
                auth: None,
                cookies: CookieJar::new(),
                transport,
                generation: 0,
                authenticating: false,
            }),
            login_finished: Condvar::new(),
        }
    }

    /// Return the current token/property pair, logging in first when there is none or when `force_reauth`.
    pub fn ensure_authenticated(&self, force_reauth: bool) -> Result<SessionAuth, TikoClientError> {
        self.acquire(force_reauth)?
            .auth
            .ok_or_else(|| TikoClientError::Auth("login produced no session".to_string()))
    }

    /// Current token/property pair without logging in.
    #[cfg(test)]
    pub fn current(&self) -> Option<SessionAuth> {
        self.lock().auth.clone()
    }

    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// `Cookie` header value the next request would carry.
    #[cfg(test)]
    pub fn cookie_header(&self) -> Option<String> {
        self.lock().cookies.header_value()
    }

    /// Lease an authenticated session for one request.
    pub(crate) fn acquire(&self, force_reauth: bool) -> Result<SessionLease, TikoClientError> {
        self.lease_with(if force_reauth { Refresh::Always } else { Refresh::IfMissing })
    }

    /// Replace the session a request of generation `stale` found expired.
    ///
    /// If a login that started after that request already replaced the session, its result is reused
    /// instead of logging in again.
    pub(crate) fn reauthenticate_after(&self, stale: u64) -> Result<SessionAuth, TikoClientError> {
        self.lease_with(Refresh::Superseding(stale))?
            .auth
            .ok_or_else(|| TikoClientError::Auth("login produced no session".to_string()))
    }

    fn lease_with(&self, refresh: Refresh) -> Result<SessionLease, TikoClientError> {
        let mut state = self.lock();
        let reusable = match refresh {
            Refresh::IfMissing => state.auth.is_some(),
            Refresh::Always => false,
            Refresh::Superseding(stale) => state.generation > stale && state.auth.is_some(),
        };
        if reusable {
            return Ok(state.lease());
        }

        let Some(credentials) = self.credentials.as_ref() else {
            return Err(TikoClientError::Config(
                "TIKO_USERNAME and TIKO_PASSWORD are required".to_string(),
            ));
        };

        if state.authenticating {
            debug!("Session: waiting for in-flight login");
            while state.authenticating {
                state = self
                    .login_finished
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            return match state.auth {
                Some(_) => Ok(state.lease()),
                None => Err(TikoClientError::Auth("concurrent login attempt failed".to_string())),
            };
        }

        // Start from scratch: a new token must never travel with cookies of the previous session.
        state.auth = None;
        state.cookies.clear();
        state.transport = self.connector.connect();
        state.generation += 1;
        state.authenticating = true;
        let lease = state.lease();
        drop(state);

        info!("Session: logging in (generation {})", lease.generation);
        let outcome = self.log_in(credentials, &lease);

        let mut state = self.lock();
        state.authenticating = false;
        let result = match outcome {
            Ok(auth) => {
                info!(
                    "Session: logged in to property {} (generation {})",
                    auth.property_id.0, lease.generation
                );
                state.auth = Some(auth);
                Ok(state.lease())
            }
            Err(e) => {
                warn!("Session: login failed: {}", e);
                state.cookies.clear();
                Err(e)
            }
        };
        drop(state);
        self.login_finished.notify_all();
        result
    }

    /// Merge `Set-Cookie` values received on a lease of `generation`.
    pub(crate) fn store_cookies(&self, generation: u64, set_cookies: &[String]) {
        if set_cookies.is_empty() {
            return;
        }
        let mut state = self.lock();
        if state.generation != generation {
            debug!(
                "Session: dropping {} cookie header(s) from superseded generation {} (current {})",
                set_cookies.len(),
                generation,
                state.generation
            );
            return;
        }
        for header in set_cookies {
            state.cookies.merge_set_cookie(header);
        }
    }

    fn log_in(&self, credentials: &Credentials, lease: &SessionLease) -> Result<SessionAuth, TikoClientError> {
        let operation = queries::log_in(&credentials.email, &credentials.password, &self.lang_code);
        let data = dispatch::exchange(self, lease, &operation).map_err(into_auth_error)?;
        let LogInData { log_in } = dispatch::decode_data(operation.name, data).map_err(into_auth_error)?;
        let property = log_in
            .user
            .properties
            .first()
            .ok_or_else(|| TikoClientError::Auth("account has no properties".to_string()))?;
        Ok(SessionAuth {
            token: log_in.token,
            property_id: property.id,
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn into_auth_error(e: TikoClientError) -> TikoClientError {
    match e {
        TikoClientError::Transport(_) | TikoClientError::Auth(_) | TikoClientError::Config(_) => e,
        other => TikoClientError::Auth(other.to_string()),
    }
}
