//! Types for sign-in and session state

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Sign-in form state. Never persisted.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Create credentials from a username and password
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sign-in response
#[derive(Debug, Clone, Deserialize)]
pub struct SignInResponse {
    /// Whether the API accepted the credentials
    #[serde(default)]
    pub success: Option<bool>,

    /// Human readable result
    #[serde(default)]
    pub message: Option<String>,

    /// The account id
    #[serde(default)]
    pub uid: Option<String>,

    /// The issued token
    #[serde(default)]
    pub token: Option<String>,

    /// The server's own expiry in epoch milliseconds. Informational only;
    /// the client applies its fixed window instead.
    #[serde(default)]
    pub expired: Option<i64>,
}

/// The authenticated state derived from a token and its expiry
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// The raw token, sent as-is in `Authorization`
    pub token: String,

    /// When the session stops being valid, in epoch milliseconds
    pub expires_at_epoch_ms: i64,

    /// Whether the session has been confirmed by the server
    pub is_authenticated: bool,
}

impl Session {
    /// Create a session expiring `window` after `now_ms`
    pub fn starting_at(token: String, now_ms: i64, window: Duration) -> Self {
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        Self {
            token,
            expires_at_epoch_ms: now_ms.saturating_add(window_ms),
            is_authenticated: true,
        }
    }

    /// Check if the session has expired at `now_ms`
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_epoch_ms
    }

    /// Time left before expiry, or `None` once expired
    pub fn remaining_at(&self, now_ms: i64) -> Option<Duration> {
        remaining_until(self.expires_at_epoch_ms, now_ms)
    }

    /// The expiry as a UTC timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.expires_at_epoch_ms).single()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("expires_at_epoch_ms", &self.expires_at_epoch_ms)
            .field("is_authenticated", &self.is_authenticated)
            .finish()
    }
}

/// Time between `now_ms` and `expires_at_ms`, or `None` if that is not in
/// the future
pub(crate) fn remaining_until(expires_at_ms: i64, now_ms: i64) -> Option<Duration> {
    let left = expires_at_ms.checked_sub(now_ms)?;
    if left > 0 {
        Some(Duration::from_millis(left as u64))
    } else {
        None
    }
}
