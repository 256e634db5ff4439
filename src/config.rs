//! Minimal runtime configuration helpers.
//! Everything comes from the process environment (optionally seeded from an env file).

use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://particuliers-tiko.fr";
pub const DEFAULT_LANG_CODE: &str = "en";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const GRAPHQL_PATH: &str = "/api/v3/graphql/";

/// Account credentials used for the `LogIn` mutation.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Provider origin, without trailing slash.
    pub base_url: String,
    /// `None` when either `TIKO_USERNAME` or `TIKO_PASSWORD` is unset; login then fails with a config error.
    pub credentials: Option<Credentials>,
    pub lang_code: String,
    /// Global timeout for a single HTTP exchange.
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let credentials = match (get("TIKO_USERNAME"), get("TIKO_PASSWORD")) {
            (Some(email), Some(password)) => Some(Credentials { email, password }),
            _ => None,
        };

        let base_url = get("TIKO_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(format!("TIKO_BASE_URL must be an http(s) URL, got {}", base_url));
        }

        let lang_code = get("TIKO_LANG_CODE").unwrap_or_else(|| DEFAULT_LANG_CODE.to_string());

        let request_timeout_secs = match get("TIKO_REQUEST_TIMEOUT_SECS") {
            Some(s) => match s.parse::<u64>() {
                Ok(v) if v > 0 => v,
                _ => return Err("TIKO_REQUEST_TIMEOUT_SECS must be a positive integer".to_string()),
            },
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Config {
            base_url,
            credentials,
            lang_code,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    pub fn graphql_url(&self) -> String {
        format!("{}{}", self.base_url, GRAPHQL_PATH)
    }
}
