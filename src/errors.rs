/*!
 * Error types for the better-translator application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a translation backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when sending an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// The request did not complete within the client timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Failed to parse the API response body
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Well-formed response that lacks an expected field
    #[error("API response missing '{0}' field")]
    MissingField(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Classify a reqwest transport error
    pub fn from_transport(context: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(format!("{}: {}", context, error))
        } else if error.is_connect() {
            Self::ConnectionError(format!("{}: {}", context, error))
        } else if error.is_decode() {
            Self::ParseError(format!("{}: {}", context, error))
        } else {
            Self::RequestFailed(format!("{}: {}", context, error))
        }
    }

    /// Map a non-success HTTP status and body to an error
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }

    /// Whether this error is a well-formed response with the wrong shape
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::ParseError(_) | Self::MissingField(_))
    }
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the backend
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Chunking options that cannot be honoured
    #[error("Invalid translation options: {0}")]
    InvalidOptions(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid or unsupported configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the translation cache
    #[error("Cache error: {0}")]
    Cache(String),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a backend
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(format!("{:#}", error))
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
