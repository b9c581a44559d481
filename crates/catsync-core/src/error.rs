use std::time::Duration;

use thiserror::Error;

/// Application-wide error types.
///
/// This enum represents all possible errors that can occur in catsync.
/// It uses the `thiserror` crate for ergonomic error handling and automatic conversion
/// from underlying library errors.
///
/// # Error Conversion
///
/// Some errors automatically convert from their source types using the `#[from]` attribute:
/// - `sqlx::Error` → `AppError::DatabaseError`
/// - `serde_json::Error` → `AppError::SerializationError`
///
/// HTTP errors are mapped by the clients into `ClientError`, `NetworkError`,
/// `Timeout` or `IndexError` so that the core does not depend on `reqwest`.
///
/// # Examples
///
/// ```no_run
/// use catsync_core::error::AppError;
///
/// fn example() -> Result<(), AppError> {
///     Err(AppError::Generic("Something went wrong".to_string()))
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Database operation failed.
    ///
    /// Wraps errors from SQLx, including connection failures and query errors
    /// raised while reading the identifier list.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Catalog API request failed.
    ///
    /// Covers non-success HTTP statuses and transport failures that are not
    /// connection or timeout errors.
    #[error("API Client error: {0}")]
    ClientError(String),

    /// Search index request failed.
    #[error("Search index error: {0}")]
    IndexError(String),

    /// JSON serialization or deserialization failed.
    ///
    /// Typically raised when a catalog API body does not match the entity schema.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// API response contained no data.
    #[error("Empty response from API")]
    EmptyResponse,

    /// Network or connection error.
    ///
    /// DNS resolution failures, refused connections, or an unreachable host.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic application error for cases not covered by specific variants.
    ///
    /// Use this sparingly - prefer creating specific error variants
    /// for better error handling and debugging.
    #[error("Error: {0}")]
    Generic(String),
}

impl AppError {
    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::DatabaseError(e) => {
                if e.to_string().contains("connection") {
                    "Cannot connect to the catalog database.\n   Check --db-host, --db-user, --db-pass and --db-name.".to_string()
                } else {
                    format!("Database error: {}", e)
                }
            }
            AppError::ClientError(msg) => {
                if msg.contains("401") || msg.contains("403") {
                    format!(
                        "Catalog API rejected the request: {}\n   Check the --key value.",
                        msg
                    )
                } else {
                    format!("API error: {}", msg)
                }
            }
            AppError::IndexError(msg) => {
                format!(
                    "Search index error: {}\n   Check --domain, --port and the index credentials.",
                    msg
                )
            }
            AppError::NetworkError(msg) => {
                format!("Network error: {}\n   Check your network connection.", msg)
            }
            AppError::Timeout(secs) => {
                format!(
                    "Request timed out after {} seconds.\n   The remote service may be overloaded. Try again later.",
                    secs
                )
            }
            AppError::EmptyResponse => {
                "The API returned no data. The service may be temporarily unavailable.".to_string()
            }
            AppError::ConfigError(msg) => {
                format!("Configuration error: {}\n   Check the command-line flags.", msg)
            }
            _ => self.to_string(),
        }
    }

    /// Timeout for an elapsed `deadline`, rounded up to whole seconds.
    ///
    /// A sub-second deadline reports as 1 second rather than 0.
    pub fn timeout_after(deadline: Duration) -> Self {
        let secs = deadline.as_nanos().div_ceil(1_000_000_000);
        AppError::Timeout(u64::try_from(secs).unwrap_or(u64::MAX))
    }

    /// Returns true if this error came from an elapsed deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::Timeout(_))
    }
}
