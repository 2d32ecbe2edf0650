//! Sign-in and session lifetime management

mod context;
mod expiry;
mod types;

use log::{debug, info, warn};
use reqwest::Client;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::AdminConfig;
use crate::error::{AuthError, StorageError, SESSION_EXPIRED_NOTICE};
use crate::fetch::Fetch;
use crate::prompt::Prompt;

pub use context::*;
pub use expiry::*;
pub use types::*;

use types::remaining_until;

/// Owns login state, the token and its expiry timer
pub struct SessionManager {
    config: Arc<AdminConfig>,
    client: Client,
    context: Arc<SessionContext>,
    prompt: Arc<dyn Prompt>,
    expiry: Mutex<Option<ExpiryTimer>>,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(
        config: Arc<AdminConfig>,
        client: Client,
        context: Arc<SessionContext>,
        prompt: Arc<dyn Prompt>,
    ) -> Self {
        Self {
            config,
            client,
            context,
            prompt,
            expiry: Mutex::new(None),
        }
    }

    fn expiry_slot(&self) -> MutexGuard<'_, Option<ExpiryTimer>> {
        self.expiry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The shared session context
    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// Get the current session
    pub fn session(&self) -> Option<Session> {
        self.context.session()
    }

    /// Whether an expiry timer is armed and has not fired yet
    pub fn has_pending_expiry(&self) -> bool {
        self.expiry_slot()
            .as_ref()
            .map(|t| !t.is_finished())
            .unwrap_or(false)
    }

    /// Sign in with a username and password.
    ///
    /// The session lasts for the configured window from now, whatever expiry
    /// the server reports. Any previous expiry timer is replaced. A window
    /// that has already run out ends the session on the spot, with the
    /// expiry notice, and returns [`AuthError::Expired`].
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let response = Fetch::post(&self.client, &self.config.signin_url())
            .json(credentials)?
            .execute::<SignInResponse>()
            .await?;

        if response.success == Some(false) {
            return Err(AuthError::InvalidCredentials(
                response.message.unwrap_or_else(|| "sign-in rejected".to_string()),
            ));
        }
        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::InvalidCredentials("no token in sign-in response".to_string()))?;

        let now = self.context.now_ms();
        let session = Session::starting_at(token, now, self.config.session_window);
        self.context.start(session.clone())?;

        if !self.arm_expiry(session.expires_at_epoch_ms, now) {
            warn!("session window {:?} elapsed at sign-in", self.config.session_window);
            if self.context.expire(session.expires_at_epoch_ms) {
                self.prompt.notify(SESSION_EXPIRED_NOTICE).await;
            }
            return Err(AuthError::Expired);
        }

        info!("signed in as {}", credentials.username);
        Ok(session)
    }

    /// Pick up a session left by an earlier run.
    ///
    /// A stored expiry in the past clears everything and notifies the user.
    /// A future one arms the expiry timer. A token found in the cookie
    /// becomes the default credential and is checked with the server; the
    /// session is returned only if that check passes.
    pub async fn restore_session(&self) -> Option<Session> {
        let now = self.context.now_ms();
        let token = self.context.cookie_token().unwrap_or_else(log_storage_error);

        match self.context.stored_expiry().unwrap_or_else(log_storage_error) {
            Some(expires_at) if expires_at <= now => {
                info!("stored session expired at {}", expires_at);
                self.reset();
                self.prompt.notify(SESSION_EXPIRED_NOTICE).await;
                return None;
            }
            Some(expires_at) => {
                self.arm_expiry(expires_at, now);
            }
            None => debug!("no stored session expiry"),
        }

        let token = token?;
        self.context.set_default_authorization(Some(token));

        match self.check_session().await {
            Ok(()) => self.context.session(),
            Err(err) => {
                warn!("restored session rejected: {}", err);
                None
            }
        }
    }

    /// Ask the server whether the stored session is still valid.
    ///
    /// Fails without a request when the token or expiry is missing or the
    /// expiry has passed. Any failure clears the session.
    pub async fn check_session(&self) -> Result<(), AuthError> {
        match self.probe().await {
            Ok(session) => {
                self.context.establish(session);
                Ok(())
            }
            Err(err) => {
                warn!("session check failed: {}", err);
                self.reset();
                Err(err)
            }
        }
    }

    async fn probe(&self) -> Result<Session, AuthError> {
        let token = self.context.stored_token()?.ok_or(AuthError::MissingSession)?;
        let expires_at = self.context.stored_expiry()?.ok_or(AuthError::MissingSession)?;
        if self.context.now_ms() >= expires_at {
            return Err(AuthError::Expired);
        }

        let authorization = self.context.default_authorization().unwrap_or_else(|| token.clone());
        let response = Fetch::post(&self.client, &self.config.check_url())
            .authorization(Some(&authorization))
            .execute_raw()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::CheckFailed(status));
        }

        Ok(Session {
            token,
            expires_at_epoch_ms: expires_at,
            is_authenticated: true,
        })
    }

    /// Sign out locally: forget the token and expiry, unset the default
    /// credential and cancel the expiry timer
    pub fn logout(&self) {
        self.reset();
        info!("signed out");
    }

    fn reset(&self) {
        self.expiry_slot().take();
        self.context.clear();
    }

    /// Replace the expiry timer. Returns `false`, leaving no timer, when
    /// `expires_at` is not in the future.
    fn arm_expiry(&self, expires_at: i64, now: i64) -> bool {
        let mut slot = self.expiry_slot();
        match remaining_until(expires_at, now) {
            Some(after) => {
                debug!("session expires in {:?}", after);
                *slot = Some(ExpiryTimer::arm(
                    self.context.clone(),
                    self.prompt.clone(),
                    after,
                    expires_at,
                ));
                true
            }
            None => {
                slot.take();
                false
            }
        }
    }
}

fn log_storage_error<T>(err: StorageError) -> Option<T> {
    warn!("session storage unavailable: {}", err);
    None
}
