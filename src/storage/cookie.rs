//! Cookie persistence with browser expiry semantics

use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use std::sync::Arc;

use super::Storage;
use crate::error::StorageError;

const COOKIE_KEY_PREFIX: &str = "cookie:";

/// A single cookie as written by the session manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Expiry in epoch milliseconds, truncated to whole seconds
    pub expires_at_epoch_ms: i64,
    pub path: String,
    pub same_site: String,
    pub secure: bool,
}

impl Cookie {
    /// A cross-site, secure, root-path cookie expiring at `expires_at_epoch_ms`
    pub fn session(name: &str, value: &str, expires_at_epoch_ms: i64) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            expires_at_epoch_ms: expires_at_epoch_ms - expires_at_epoch_ms.rem_euclid(1000),
            path: "/".to_string(),
            same_site: "None".to_string(),
            secure: true,
        }
    }

    /// Whether the cookie is past its expiry at `now_ms`
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_epoch_ms
    }

    fn expires(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.expires_at_epoch_ms).single()
    }

    /// Parse a `Set-Cookie` style string as produced by the `Display` impl
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(';').map(str::trim);
        let (name, value) = parts.next()?.split_once('=')?;

        let mut cookie = Cookie {
            name: name.trim().to_string(),
            value: value.trim().to_string(),
            expires_at_epoch_ms: 0,
            path: "/".to_string(),
            same_site: "Lax".to_string(),
            secure: false,
        };
        let mut has_expiry = false;

        for attr in parts {
            let (key, val) = attr.split_once('=').unwrap_or((attr, ""));
            match key.to_ascii_lowercase().as_str() {
                "expires" => {
                    let at = DateTime::parse_from_rfc2822(val).ok()?;
                    cookie.expires_at_epoch_ms = at.timestamp_millis();
                    has_expiry = true;
                }
                "path" => cookie.path = val.to_string(),
                "samesite" => cookie.same_site = val.to_string(),
                "secure" => cookie.secure = true,
                _ => {}
            }
        }

        // Session-lifetime cookies are never written by this crate
        if !has_expiry || cookie.name.is_empty() {
            return None;
        }
        Some(cookie)
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(expires) = self.expires() {
            write!(f, "; expires={}", expires.format("%a, %d %b %Y %H:%M:%S GMT"))?;
        }
        write!(f, "; path={}; SameSite={}", self.path, self.same_site)?;
        if self.secure {
            write!(f, "; Secure")?;
        }
        Ok(())
    }
}

/// Cookie store kept inside a [`Storage`]. Expired cookies are invisible,
/// the way a browser drops them.
#[derive(Clone)]
pub struct CookieJar {
    storage: Arc<dyn Storage>,
}

impl CookieJar {
    /// Create a jar over `storage`
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    fn key(name: &str) -> String {
        format!("{}{}", COOKIE_KEY_PREFIX, name)
    }

    /// Write a cookie, replacing one with the same name
    pub fn set(&self, cookie: &Cookie) -> Result<(), StorageError> {
        self.storage.set_item(&Self::key(&cookie.name), &cookie.to_string())
    }

    /// The cookie named `name`, if it exists and has not expired at `now_ms`
    pub fn get(&self, name: &str, now_ms: i64) -> Result<Option<Cookie>, StorageError> {
        let raw = match self.storage.get_item(&Self::key(name))? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        Ok(Cookie::parse(&raw).filter(|c| !c.is_expired_at(now_ms)))
    }

    /// The value of the cookie named `name`; empty values count as absent
    pub fn value(&self, name: &str, now_ms: i64) -> Result<Option<String>, StorageError> {
        Ok(self
            .get(name, now_ms)?
            .map(|c| c.value)
            .filter(|v| !v.is_empty()))
    }

    /// Drop the cookie named `name`
    pub fn remove(&self, name: &str) -> Result<(), StorageError> {
        self.storage.remove_item(&Self::key(name))
    }
}
