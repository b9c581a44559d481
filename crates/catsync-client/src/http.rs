//! Shared `reqwest` plumbing for the catalog and index clients.

use catsync_core::HttpConfig;
use catsync_core::error::AppError;
use reqwest::{Client, Url};

/// Builds an HTTP client from the shared timeouts and user agent.
pub(crate) fn build_client(config: &HttpConfig) -> Result<Client, AppError> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|e| AppError::ClientError(e.to_string()))
}

/// Parses a base URL and makes sure relative joins append to its path.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, AppError> {
    let mut url = Url::parse(raw).map_err(|_| AppError::InvalidUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::InvalidUrl(raw.to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Maps a transport failure to the matching `AppError` variant.
///
/// Status errors are handled by the callers, which know whether the request
/// went to the catalog API or the index.
pub(crate) fn transport_error(e: reqwest::Error, config: &HttpConfig) -> AppError {
    if e.is_timeout() {
        AppError::timeout_after(config.timeout)
    } else if e.is_connect() {
        AppError::NetworkError(format!("Connection failed: {}", e))
    } else {
        AppError::ClientError(e.to_string())
    }
}
