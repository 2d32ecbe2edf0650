//! Catalog admin client
//!
//! A Rust client for a product catalog admin API: sign in with a token,
//! keep the session alive for a fixed window, and list, create and delete
//! products.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod fetch;
pub mod prompt;
pub mod session;
pub mod storage;

use log::info;
use reqwest::Client;
use std::sync::Arc;

use crate::catalog::{CatalogClient, Product};
use crate::clock::{Clock, SystemClock};
use crate::config::AdminConfig;
use crate::error::Error;
use crate::prompt::Prompt;
use crate::session::{Credentials, SessionContext, SessionManager};
use crate::storage::Storage;

/// The main entry point: one session context shared by the session manager
/// and the catalog client
pub struct CatalogAdmin {
    /// Client configuration
    pub config: Arc<AdminConfig>,
    /// HTTP client used for requests
    pub http_client: Client,
    context: Arc<SessionContext>,
    session: SessionManager,
    catalog: CatalogClient,
    prompt: Arc<dyn Prompt>,
}

impl CatalogAdmin {
    /// Create a new client
    ///
    /// # Arguments
    ///
    /// * `config` - API location and session settings
    /// * `storage` - Where the token and expiry are persisted
    /// * `prompt` - Receives notices and answers confirmations
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use catalog_admin::{CatalogAdmin, config::AdminConfig};
    /// use catalog_admin::prompt::AutoPrompt;
    /// use catalog_admin::storage::MemoryStorage;
    ///
    /// let config = AdminConfig::new("https://api.example.com", "my-shop").unwrap();
    /// let admin = CatalogAdmin::new(
    ///     config,
    ///     Arc::new(MemoryStorage::new()),
    ///     Arc::new(AutoPrompt::accepting()),
    /// ).unwrap();
    /// ```
    pub fn new(
        config: AdminConfig,
        storage: Arc<dyn Storage>,
        prompt: Arc<dyn Prompt>,
    ) -> Result<Self, Error> {
        Self::new_with_clock(config, storage, prompt, Arc::new(SystemClock))
    }

    /// Create a new client with an explicit clock
    pub fn new_with_clock(
        config: AdminConfig,
        storage: Arc<dyn Storage>,
        prompt: Arc<dyn Prompt>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let config = Arc::new(config);
        let context = Arc::new(SessionContext::with_clock(storage, clock));

        let session = SessionManager::new(
            config.clone(),
            http_client.clone(),
            context.clone(),
            prompt.clone(),
        );
        let catalog = CatalogClient::new(
            config.clone(),
            http_client.clone(),
            context.clone(),
            prompt.clone(),
        );

        Ok(Self {
            config,
            http_client,
            context,
            session,
            catalog,
            prompt,
        })
    }

    /// Get a reference to the session manager
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Get a reference to the catalog client
    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// Get a reference to the shared session context
    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// Sign in, then load the product list
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Vec<Product>, Error> {
        self.session.login(credentials).await?;
        Ok(self.catalog.list_products().await?)
    }

    /// Pick up a stored session and, if it is still valid, load the product
    /// list. `Ok(None)` means the user has to sign in.
    pub async fn resume(&self) -> Result<Option<Vec<Product>>, Error> {
        match self.session.restore_session().await {
            Some(_) => Ok(Some(self.catalog.list_products().await?)),
            None => {
                info!("no session to resume");
                Ok(None)
            }
        }
    }

    /// Sign out and drop the cached catalog
    pub fn logout(&self) {
        self.session.logout();
        self.catalog.clear_cache();
    }

    /// Show an error to the user
    pub async fn report(&self, err: &Error) {
        self.prompt.notify(&err.user_message()).await;
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::catalog::{NewProductDraft, Product, ProductForm};
    pub use crate::config::AdminConfig;
    pub use crate::error::{ApiError, AuthError, Error};
    pub use crate::prompt::Prompt;
    pub use crate::session::{Credentials, Session};
    pub use crate::storage::{FileStorage, MemoryStorage, Storage};
    pub use crate::CatalogAdmin;
}
