//! Configuration options for the catalog admin client

use std::env;
use std::time::Duration;
use url::Url;

use crate::error::Error;

/// Environment variable holding the API base URL
pub const ENV_API_URL: &str = "CATALOG_API_URL";

/// Environment variable holding the API path segment
pub const ENV_API_PATH: &str = "CATALOG_API_PATH";

/// Environment variable overriding the session window, in seconds
pub const ENV_SESSION_WINDOW: &str = "CATALOG_SESSION_WINDOW_SECS";

/// Fixed lifetime of a signed-in session, regardless of the server's expiry
pub const DEFAULT_SESSION_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Configuration for the catalog admin client
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// The base URL of the remote API, without a trailing slash
    pub base_url: String,

    /// The per-account path segment used by the product routes
    pub api_path: String,

    /// How long a session stays valid after sign-in
    pub session_window: Duration,

    /// The request timeout
    pub request_timeout: Option<Duration>,
}

impl AdminConfig {
    /// Create a new configuration, validating the base URL
    pub fn new(base_url: &str, api_path: &str) -> Result<Self, Error> {
        let parsed = Url::parse(base_url)?;
        if parsed.cannot_be_a_base() {
            return Err(Error::config(format!("{} cannot be used as a base URL", base_url)));
        }
        if api_path.trim().is_empty() {
            return Err(Error::config("api_path cannot be empty"));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_path: api_path.trim_matches('/').to_string(),
            session_window: DEFAULT_SESSION_WINDOW,
            request_timeout: Some(Duration::from_secs(30)),
        })
    }

    /// Build the configuration from environment variables
    pub fn from_env() -> Result<Self, Error> {
        let base_url = env::var(ENV_API_URL)
            .map_err(|_| Error::config(format!("{} environment variable not found", ENV_API_URL)))?;
        let api_path = env::var(ENV_API_PATH)
            .map_err(|_| Error::config(format!("{} environment variable not found", ENV_API_PATH)))?;

        let mut config = Self::new(&base_url, &api_path)?;

        if let Ok(raw) = env::var(ENV_SESSION_WINDOW) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                Error::config(format!("{} must be a whole number of seconds, got {:?}", ENV_SESSION_WINDOW, raw))
            })?;
            if secs == 0 {
                return Err(Error::config(format!("{} must be at least 1 second", ENV_SESSION_WINDOW)));
            }
            config = config.with_session_window(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Set the session window
    pub fn with_session_window(mut self, value: Duration) -> Self {
        self.session_window = value;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    pub(crate) fn signin_url(&self) -> String {
        format!("{}/v2/admin/signin", self.base_url)
    }

    pub(crate) fn check_url(&self) -> String {
        format!("{}/api/user/check", self.base_url)
    }

    pub(crate) fn products_url(&self) -> String {
        format!("{}/v2/api/{}/admin/products", self.base_url, self.api_path)
    }

    pub(crate) fn product_url(&self) -> String {
        format!("{}/v2/api/{}/admin/product", self.base_url, self.api_path)
    }

    pub(crate) fn product_item_url(&self, id: &str) -> Result<String, url::ParseError> {
        let mut url = Url::parse(&self.product_url())?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(id);
        Ok(url.to_string())
    }
}
