//! Error handling for the catalog admin client

use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// Notice shown for every sign-in or session failure. The server detail is
/// deliberately not surfaced.
pub const LOGIN_FAILED_NOTICE: &str = "Login failed";

/// Notice shown when the session timer fires or a past expiry is found.
pub const SESSION_EXPIRED_NOTICE: &str = "Your session has expired, please sign in again";

/// Notice shown when a catalog operation is attempted without a token.
pub const NOT_AUTHENTICATED_NOTICE: &str = "Token is invalid, please sign in first";

/// Generic notice for catalog failures without a server-provided message.
pub const REQUEST_FAILED_NOTICE: &str = "Request failed, please try again later";

/// Errors raised by sign-in, session checks and session restore
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Missing session")]
    MissingSession,

    #[error("Session expired")]
    Expired,

    #[error("Session check failed with status {0}")]
    CheckFailed(StatusCode),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// The message shown to the user. Always generic.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Expired => SESSION_EXPIRED_NOTICE.to_string(),
            _ => LOGIN_FAILED_NOTICE.to_string(),
        }
    }
}

/// Errors raised by catalog list/create/delete requests
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Invalid draft: {0}")]
    InvalidDraft(String),

    #[error("Request rejected with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// The message shown to the user: the server's own message when it sent
    /// one, a generic notice otherwise.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::NotAuthenticated => NOT_AUTHENTICATED_NOTICE.to_string(),
            ApiError::InvalidDraft(detail) => detail.clone(),
            ApiError::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Network(err) => err.to_string(),
            _ => REQUEST_FAILED_NOTICE.to_string(),
        }
    }
}

/// Errors raised by the durable storage backends
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Unified error type for the catalog admin client
#[derive(Error, Debug)]
pub enum Error {
    /// Sign-in and session errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Catalog request errors
    #[error("Catalog error: {0}")]
    Api(#[from] ApiError),

    /// Durable storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// The message shown to the user for this error
    pub fn user_message(&self) -> String {
        match self {
            Error::Auth(err) => err.user_message(),
            Error::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
