//! Shared session state: the default authorization credential, the current
//! session and the storage they are persisted to

use log::{debug, warn};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::types::Session;
use crate::clock::{Clock, SystemClock};
use crate::error::StorageError;
use crate::storage::{Cookie, CookieJar, Storage, EXPIRATION_KEY, TOKEN_KEY};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Session state owned by one client instance and shared between the session
/// manager and the catalog client. Nothing here is global.
pub struct SessionContext {
    storage: Arc<dyn Storage>,
    cookies: CookieJar,
    clock: Arc<dyn Clock>,
    default_authorization: RwLock<Option<String>>,
    session: RwLock<Option<Session>>,
    // Held across every change that touches both storage and memory
    transition: Mutex<()>,
}

impl SessionContext {
    /// Create a context over `storage` using the system clock
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    /// Create a context over `storage` with an explicit clock
    pub fn with_clock(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cookies: CookieJar::new(storage.clone()),
            storage,
            clock,
            default_authorization: RwLock::new(None),
            session: RwLock::new(None),
            transition: Mutex::new(()),
        }
    }

    fn transition(&self) -> MutexGuard<'_, ()> {
        self.transition
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The current time according to the context's clock
    pub fn now_ms(&self) -> i64 {
        self.clock.now_epoch_ms()
    }

    /// The credential attached to requests that do not pass one explicitly
    pub fn default_authorization(&self) -> Option<String> {
        read(&self.default_authorization).clone()
    }

    /// Replace the default authorization credential
    pub fn set_default_authorization(&self, token: Option<String>) {
        *write(&self.default_authorization) = token;
    }

    /// The in-memory session, if one is established
    pub fn session(&self) -> Option<Session> {
        read(&self.session).clone()
    }

    /// Whether an authenticated session is established
    pub fn is_authenticated(&self) -> bool {
        read(&self.session)
            .as_ref()
            .map(|s| s.is_authenticated)
            .unwrap_or(false)
    }

    /// Token from durable storage
    pub fn stored_token(&self) -> Result<Option<String>, StorageError> {
        Ok(self
            .storage
            .get_item(TOKEN_KEY)?
            .filter(|t| !t.is_empty()))
    }

    /// Token from the cookie jar; expired cookies yield `None`
    pub fn cookie_token(&self) -> Result<Option<String>, StorageError> {
        self.cookies.value(TOKEN_KEY, self.now_ms())
    }

    /// Token from durable storage, falling back to the cookie
    pub fn usable_token(&self) -> Result<Option<String>, StorageError> {
        match self.stored_token()? {
            Some(token) => Ok(Some(token)),
            None => self.cookie_token(),
        }
    }

    /// Stored expiry in epoch milliseconds. Unparsable values count as
    /// missing.
    pub fn stored_expiry(&self) -> Result<Option<i64>, StorageError> {
        let raw = self.storage.get_item(EXPIRATION_KEY)?;
        Ok(raw.and_then(|value| match value.trim().parse::<i64>() {
            Ok(ms) => Some(ms),
            Err(_) => {
                warn!("ignoring unparsable {} value {:?}", EXPIRATION_KEY, value);
                None
            }
        }))
    }

    /// Persist `session` to storage and the cookie, then make it the current
    /// one with its token as the default credential
    pub(crate) fn start(&self, session: Session) -> Result<(), StorageError> {
        let _guard = self.transition();
        self.persist(&session)?;
        self.set_current(session);
        Ok(())
    }

    /// Make `session` the current one and its token the default credential
    pub(crate) fn establish(&self, session: Session) {
        let _guard = self.transition();
        self.set_current(session);
    }

    /// Remove every trace of the session. Storage failures are logged and do
    /// not stop the in-memory state from being cleared.
    pub(crate) fn clear(&self) {
        let _guard = self.transition();
        self.wipe();
    }

    /// Clear the session if the stored expiry is not later than
    /// `expires_at_ms`. A newer sign-in moves the stored expiry forward and
    /// is left alone. Returns whether anything was cleared.
    pub(crate) fn expire(&self, expires_at_ms: i64) -> bool {
        let _guard = self.transition();
        match self.stored_expiry() {
            Ok(Some(stored)) if stored > expires_at_ms => {
                debug!("expiry for {} superseded by {}", expires_at_ms, stored);
                false
            }
            _ => {
                self.wipe();
                true
            }
        }
    }

    fn persist(&self, session: &Session) -> Result<(), StorageError> {
        self.storage.set_item(TOKEN_KEY, &session.token)?;
        self.storage
            .set_item(EXPIRATION_KEY, &session.expires_at_epoch_ms.to_string())?;
        self.cookies.set(&Cookie::session(
            TOKEN_KEY,
            &session.token,
            session.expires_at_epoch_ms,
        ))?;
        Ok(())
    }

    fn set_current(&self, session: Session) {
        self.set_default_authorization(Some(session.token.clone()));
        *write(&self.session) = Some(session);
    }

    fn wipe(&self) {
        for key in [TOKEN_KEY, EXPIRATION_KEY] {
            if let Err(err) = self.storage.remove_item(key) {
                warn!("failed to remove {} from storage: {}", key, err);
            }
        }
        if let Err(err) = self.cookies.remove(TOKEN_KEY) {
            warn!("failed to remove {} cookie: {}", TOKEN_KEY, err);
        }
        self.set_default_authorization(None);
        *write(&self.session) = None;
        debug!("session state cleared");
    }
}
