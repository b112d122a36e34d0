use async_trait::async_trait;
use elasticsearch::{
    http::{
        response::Response,
        transport::{BuildError, SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{IndicesCreateParts, IndicesExistsParts},
    params::Refresh,
    Elasticsearch, IndexParts, SearchParts,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::config::ElasticsearchConfig;
use crate::models::Post;

/// Document field holding the post coordinates.
pub const LOCATION_FIELD: &str = "location";

#[derive(Debug, Error)]
pub enum ElasticsearchError {
    #[error("invalid Elasticsearch URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to build transport: {0}")]
    TransportBuild(#[from] BuildError),
    #[error("transport error: {0}")]
    Transport(#[from] elasticsearch::Error),
    #[error("Elasticsearch responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ElasticsearchError {
    /// True when the client could not be set up at all, as opposed to a
    /// request that failed once sent.
    pub fn is_initialization(&self) -> bool {
        matches!(
            self,
            ElasticsearchError::InvalidUrl(_) | ElasticsearchError::TransportBuild(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Kilometers,
}

impl DistanceUnit {
    fn suffix(self) -> &'static str {
        match self {
            DistanceUnit::Kilometers => "km",
        }
    }
}

/// Search radius, rendered in Elasticsearch distance notation (`200km`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance {
    pub value: f64,
    pub unit: DistanceUnit,
}

impl Distance {
    pub fn km(value: f64) -> Self {
        Self {
            value,
            unit: DistanceUnit::Kilometers,
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// Geo-distance filter around a center point.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoDistanceQuery {
    pub field: String,
    pub lat: f64,
    pub lon: f64,
    pub distance: Distance,
}

impl GeoDistanceQuery {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            lat: 0.0,
            lon: 0.0,
            distance: Distance::km(0.0),
        }
    }

    pub fn lat(mut self, lat: f64) -> Self {
        self.lat = lat;
        self
    }

    pub fn lon(mut self, lon: f64) -> Self {
        self.lon = lon;
        self
    }

    pub fn distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }

    /// The `geo_distance` clause on its own.
    pub fn source(&self) -> Value {
        let mut clause = Map::new();
        clause.insert("distance".to_string(), json!(self.distance.to_string()));
        clause.insert(
            self.field.clone(),
            json!({ "lat": self.lat, "lon": self.lon }),
        );
        json!({ "geo_distance": clause })
    }

    /// Full search request body.
    pub fn to_search_body(&self) -> Value {
        json!({ "query": self.source() })
    }
}

/// Storage and lookup of posts in a document index.
#[async_trait]
pub trait PostIndex: Send + Sync {
    /// Run a geo-distance query against `index` and return the raw `_source`
    /// of every hit.
    async fn search(
        &self,
        index: &str,
        query: &GeoDistanceQuery,
    ) -> Result<Vec<Value>, ElasticsearchError>;

    /// Store a post in `index`, returning the id it was stored under.
    async fn index_post(&self, index: &str, post: &Post) -> Result<String, ElasticsearchError>;
}

#[derive(Clone)]
pub struct ElasticsearchClient {
    client: Elasticsearch,
    request_timeout: Duration,
}

impl ElasticsearchClient {
    /// Build a client for a single Elasticsearch node. No request is sent.
    pub fn new(url: &str, request_timeout: Duration) -> Result<Self, ElasticsearchError> {
        let parsed = Url::parse(url)?;
        let pool = SingleNodeConnectionPool::new(parsed);
        let transport = TransportBuilder::new(pool).build()?;
        let client = Elasticsearch::new(transport);

        Ok(Self {
            client,
            request_timeout,
        })
    }

    /// Build a client from configuration and, when `ensure_index` is set,
    /// try to create the post index.
    ///
    /// Only an invalid URL or transport fails here. A node that cannot be
    /// reached during bootstrap is logged and left to fail per request.
    pub async fn connect(config: &ElasticsearchConfig) -> Result<Self, ElasticsearchError> {
        let instance = Self::new(&config.url, config.request_timeout)?;
        if config.ensure_index {
            if let Err(err) = instance.ensure_post_index(&config.post_index).await {
                tracing::warn!(
                    error = %err,
                    index = %config.post_index,
                    "Post index bootstrap failed, continuing without it"
                );
            }
        }
        Ok(instance)
    }

    /// Create `index` with a `geo_point` mapping for the location field
    /// unless it already exists.
    pub async fn ensure_post_index(&self, index: &str) -> Result<(), ElasticsearchError> {
        let exists = self
            .bounded(async {
                let response = self
                    .client
                    .indices()
                    .exists(IndicesExistsParts::Index(&[index]))
                    .send()
                    .await?;
                Ok::<_, ElasticsearchError>(response.status_code().is_success())
            })
            .await?;

        if exists {
            return Ok(());
        }

        let body = post_index_mapping();
        self.bounded(async {
            let response = self
                .client
                .indices()
                .create(IndicesCreateParts::Index(index))
                .body(body)
                .send()
                .await?;
            ensure_success(response).await?;
            Ok::<_, ElasticsearchError>(())
        })
        .await?;

        tracing::info!(index, "Created post index");
        Ok(())
    }

    /// Run `request` under the configured request timeout.
    async fn bounded<F, T>(&self, request: F) -> Result<T, ElasticsearchError>
    where
        F: Future<Output = Result<T, ElasticsearchError>>,
    {
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(ElasticsearchError::Timeout(self.request_timeout)),
        }
    }
}

fn post_index_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "user": { "type": "keyword" },
                "message": { "type": "text" },
                LOCATION_FIELD: { "type": "geo_point" },
                "url": { "type": "keyword" },
                "type": { "type": "keyword" },
                "face": { "type": "float" }
            }
        }
    })
}

#[async_trait]
impl PostIndex for ElasticsearchClient {
    async fn search(
        &self,
        index: &str,
        query: &GeoDistanceQuery,
    ) -> Result<Vec<Value>, ElasticsearchError> {
        self.bounded(async {
            let response = self
                .client
                .search(SearchParts::Index(&[index]))
                .pretty(true)
                .body(query.to_search_body())
                .send()
                .await?;
            let response = ensure_success(response).await?;
            let search_response: SearchResponse = response.json().await?;
            Ok::<_, ElasticsearchError>(search_response.source_documents())
        })
        .await
    }

    async fn index_post(&self, index: &str, post: &Post) -> Result<String, ElasticsearchError> {
        let id = Uuid::new_v4().to_string();
        self.bounded(async {
            let response = self
                .client
                .index(IndexParts::IndexId(index, &id))
                .refresh(Refresh::True)
                .body(post)
                .send()
                .await?;
            ensure_success(response).await?;
            Ok::<_, ElasticsearchError>(())
        })
        .await?;
        Ok(id)
    }
}

async fn ensure_success(response: Response) -> Result<Response, ElasticsearchError> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ElasticsearchError::Status {
        status: status.as_u16(),
        body,
    })
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: InnerHits,
}

#[derive(Debug, Deserialize)]
struct InnerHits {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: Option<Value>,
}

impl SearchResponse {
    fn source_documents(self) -> Vec<Value> {
        self.hits.hits.into_iter().filter_map(|hit| hit.source).collect()
    }
}
