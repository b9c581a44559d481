//! Catalog API client for fetching categories and parts by identifier.
//!
//! The API serves one entity per request:
//!
//! ```text
//! GET {base}/category/{id}?key={api_key}
//! GET {base}/part/{id}?key={api_key}
//! ```
//!
//! Only a success status with a body that decodes into the entity schema is
//! accepted; anything else is a fetch error for that identifier.

use catsync_core::error::AppError;
use catsync_core::traits::EntityFetcher;
use catsync_core::{EntityId, EntityKind, EntityRecord, HttpConfig};
use reqwest::{Client, Url};

/// Default base URL of the product-data API.
pub const DEFAULT_CATALOG_API_URL: &str = "http://goapi.curtmfg.com";

/// HTTP client for the product-data API.
///
/// # Examples
///
/// ```no_run
/// use catsync_client::CatalogApiClient;
/// use catsync_core::{EntityKind, HttpConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CatalogApiClient::new("http://goapi.curtmfg.com", "secret", &HttpConfig::default())?;
/// let part = client.get_entity(EntityKind::Part, 11000).await?;
/// println!("Fetched part {}", part.id());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CatalogApiClient {
    client: Client,
    base_url: Url,
    api_key: String,
    http_config: HttpConfig,
}

impl CatalogApiClient {
    /// Creates a new catalog API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, e.g. <http://goapi.curtmfg.com>
    /// * `api_key` - Sent as the `key` query parameter on every request
    /// * `http_config` - Timeouts and user agent
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if the URL is invalid or not HTTP(S).
    /// Returns `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: &str, http_config: &HttpConfig) -> Result<Self, AppError> {
        Ok(Self {
            client: crate::http::build_client(http_config)?,
            base_url: crate::http::parse_base_url(base_url)?,
            api_key: api_key.to_string(),
            http_config: http_config.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the request URL for one entity, including the API key.
    fn entity_url(&self, kind: EntityKind, id: EntityId) -> Result<Url, AppError> {
        let mut url = self
            .base_url
            .join(&format!("{}/{}", kind.as_str(), id))
            .map_err(|e| AppError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    /// Fetches and decodes a single entity.
    ///
    /// # Errors
    ///
    /// - `AppError::ClientError` on a non-success status
    /// - `AppError::Timeout` / `AppError::NetworkError` on transport failures
    /// - `AppError::EmptyResponse` on an empty body
    /// - `AppError::SerializationError` when the body does not match the schema
    pub async fn get_entity(
        &self,
        kind: EntityKind,
        id: EntityId,
    ) -> Result<EntityRecord, AppError> {
        let url = self.entity_url(kind, id)?;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| crate::http::transport_error(e.without_url(), &self.http_config))?;

        let status = resp.status();
        if !status.is_success() {
            // The URL carries the API key, so only the path is reported.
            return Err(AppError::ClientError(format!(
                "HTTP {} fetching {} {}",
                status.as_u16(),
                kind,
                id
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| crate::http::transport_error(e.without_url(), &self.http_config))?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::EmptyResponse);
        }

        let record = EntityRecord::from_json(kind, &body)?;
        tracing::trace!(%kind, entity_id = id, "Fetched entity");
        Ok(record)
    }
}

impl EntityFetcher for CatalogApiClient {
    async fn fetch(&self, kind: EntityKind, id: EntityId) -> Result<EntityRecord, AppError> {
        self.get_entity(kind, id).await
    }
}
