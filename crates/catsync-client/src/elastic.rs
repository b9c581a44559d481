//! Elasticsearch client for the typed document API.
//!
//! Documents live under `/{index}/{type}/{id}` where the type is the entity
//! kind (`category` or `part`). Requests used:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | exists    | `HEAD /{index}/{type}/{id}` |
//! | update    | `POST /{index}/{type}/{id}/_update` with a script replacing `_source` |
//! | index     | `PUT /{index}/{type}/{id}` with the record |
//! | search    | `POST /{index}/_search` with a `query_string` query |

use catsync_core::error::AppError;
use catsync_core::traits::{SearchHit, SearchIndex};
use catsync_core::{EntityId, EntityKind, EntityRecord, HttpConfig};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Value, json};

/// Default index name.
pub const DEFAULT_INDEX: &str = "curt";

/// Replaces the stored source with `params.doc`. A `{"doc": ..}` body would
/// merge instead, keeping keys the catalog no longer returns.
const REPLACE_SOURCE_SCRIPT: &str = "ctx._source.clear(); ctx._source.putAll(params.doc)";

/// Connection settings for the search engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSettings {
    /// Host name or IP. A full `http(s)://` URL is accepted as well.
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub index: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9200,
            username: None,
            password: None,
            index: DEFAULT_INDEX.to_string(),
        }
    }
}

impl IndexSettings {
    /// Returns the root URL of the search engine.
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            self.host.clone()
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_index")]
    index: String,
    #[serde(rename = "_type", default)]
    doc_type: Option<String>,
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: Value,
}

impl From<RawHit> for SearchHit {
    fn from(hit: RawHit) -> Self {
        SearchHit {
            index: hit.index,
            doc_type: hit.doc_type,
            id: hit.id,
            score: hit.score,
            source: hit.source,
        }
    }
}

/// HTTP client for an Elasticsearch index.
///
/// Cheap to clone: the underlying connection pool is shared.
#[derive(Clone)]
pub struct ElasticsearchClient {
    client: Client,
    base_url: Url,
    settings: IndexSettings,
    http_config: HttpConfig,
}

impl ElasticsearchClient {
    /// Creates a client with the default HTTP configuration.
    pub fn new(settings: IndexSettings) -> Result<Self, AppError> {
        Self::with_http_config(settings, &HttpConfig::default())
    }

    /// Creates a client with custom timeouts.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if host and port do not form a valid URL.
    pub fn with_http_config(
        settings: IndexSettings,
        http_config: &HttpConfig,
    ) -> Result<Self, AppError> {
        Ok(Self {
            client: crate::http::build_client(http_config)?,
            base_url: crate::http::parse_base_url(&settings.base_url())?,
            settings,
            http_config: http_config.clone(),
        })
    }

    pub fn index_name(&self) -> &str {
        &self.settings.index
    }

    fn document_url(&self, kind: EntityKind, id: EntityId, suffix: &str) -> Result<Url, AppError> {
        self.base_url
            .join(&format!(
                "{}/{}/{}{}",
                self.settings.index,
                kind.as_str(),
                id,
                suffix
            ))
            .map_err(|e| AppError::InvalidUrl(e.to_string()))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.settings.username {
            Some(user) if !user.is_empty() => {
                request.basic_auth(user, self.settings.password.as_deref())
            }
            _ => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AppError> {
        self.authorized(request)
            .send()
            .await
            .map_err(|e| match crate::http::transport_error(e, &self.http_config) {
                AppError::ClientError(msg) => AppError::IndexError(msg),
                other => other,
            })
    }

    /// Turns a non-success response into an `IndexError` carrying the body.
    async fn check(resp: Response, action: &str) -> Result<Response, AppError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(AppError::IndexError(format!(
            "HTTP {} on {}: {}",
            status.as_u16(),
            action,
            body.trim()
        )))
    }

    /// Checks whether a document exists.
    pub async fn document_exists(&self, kind: EntityKind, id: EntityId) -> Result<bool, AppError> {
        let url = self.document_url(kind, id, "")?;
        let resp = self.send(self.client.head(url)).await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(AppError::IndexError(format!(
                "HTTP {} checking {} {}",
                status.as_u16(),
                kind,
                id
            ))),
        }
    }

    /// Replaces the source of an existing document with the full record.
    ///
    /// Fails with `IndexError` when the document does not exist.
    pub async fn update_document(
        &self,
        kind: EntityKind,
        id: EntityId,
        record: &EntityRecord,
    ) -> Result<(), AppError> {
        let url = self.document_url(kind, id, "/_update")?;
        let body = replace_source_body(record)?;
        let resp = self.send(self.client.post(url).json(&body)).await?;
        Self::check(resp, &format!("update of {} {}", kind, id)).await?;
        tracing::trace!(%kind, entity_id = id, "Updated document");
        Ok(())
    }

    /// Inserts or replaces a document.
    pub async fn index_document(
        &self,
        kind: EntityKind,
        id: EntityId,
        record: &EntityRecord,
    ) -> Result<(), AppError> {
        let url = self.document_url(kind, id, "")?;
        let resp = self.send(self.client.put(url).json(record)).await?;
        Self::check(resp, &format!("index of {} {}", kind, id)).await?;
        tracing::trace!(%kind, entity_id = id, "Indexed document");
        Ok(())
    }

    /// Runs a `query_string` search across all document types of the index.
    pub async fn query(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, AppError> {
        let url = self
            .base_url
            .join(&format!("{}/_search", self.settings.index))
            .map_err(|e| AppError::InvalidUrl(e.to_string()))?;
        let body = json!({
            "query": { "query_string": { "query": query } },
            "size": limit,
        });

        let resp = self.send(self.client.post(url).json(&body)).await?;
        let resp = Self::check(resp, "search").await?;
        let parsed: SearchResponse = resp
            .json()
            .await
            .map_err(|e| AppError::IndexError(format!("Failed to parse search response: {}", e)))?;

        Ok(parsed.hits.hits.into_iter().map(SearchHit::from).collect())
    }
}

/// Body of a scripted update that swaps in the whole record.
fn replace_source_body(record: &EntityRecord) -> Result<Value, AppError> {
    let doc = serde_json::to_value(record)?;
    Ok(json!({
        "script": {
            "lang": "painless",
            "source": REPLACE_SOURCE_SCRIPT,
            "params": { "doc": doc },
        }
    }))
}

impl SearchIndex for ElasticsearchClient {
    async fn exists(&self, kind: EntityKind, id: EntityId) -> Result<bool, AppError> {
        self.document_exists(kind, id).await
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: EntityId,
        record: &EntityRecord,
    ) -> Result<(), AppError> {
        self.update_document(kind, id, record).await
    }

    async fn index(
        &self,
        kind: EntityKind,
        id: EntityId,
        record: &EntityRecord,
    ) -> Result<(), AppError> {
        self.index_document(kind, id, record).await
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, AppError> {
        self.query(query, limit).await
    }
}
