//! Search backend contract.
//!
//! A [`Connector`] establishes a live [`SearchBackend`] handle; the gateway
//! only ever talks to the backend through that handle. Two implementations
//! exist: a remote Elasticsearch cluster reached over REST and an embedded
//! tantivy index.

pub mod elasticsearch;
pub mod local;

use crate::config::{BackendConfig, BackendKind};
use crate::error::BackendResult;
use crate::model::Document;
use async_trait::async_trait;
use std::sync::Arc;

pub use elasticsearch::{ElasticsearchBackend, ElasticsearchConnector};
pub use local::{LocalBackend, LocalConnector};

/// Fuzzy match of one text against several fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiMatchQuery {
    pub text: String,
    pub fields: Vec<String>,
    pub fuzziness: u8,
    pub minimum_should_match: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: MultiMatchQuery,
    pub from: u64,
    pub size: u64,
}

/// Raw backend answer: metadata plus stored sources in relevance order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    pub took_millis: u64,
    pub total_hits: u64,
    pub hits: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemFailure {
    pub id: String,
    pub status: u16,
    pub reason: String,
}

/// Outcome of a bulk write the backend accepted as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub took_millis: u64,
    pub items: usize,
    pub failures: Vec<BulkItemFailure>,
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Writes all documents in one request.
    async fn bulk_index(&self, documents: &[Document]) -> BackendResult<BulkReport>;

    async fn search(&self, request: &SearchRequest) -> BackendResult<SearchHits>;

    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self) -> BackendResult<Arc<dyn SearchBackend>>;

    /// Human readable target, used in logs.
    fn endpoint(&self) -> String;
}

pub fn connector_from_config(config: &BackendConfig) -> Arc<dyn Connector> {
    match config.kind {
        BackendKind::Elasticsearch => Arc::new(ElasticsearchConnector::new(
            config.url.clone(),
            config.index_name.clone(),
            config.max_result_window,
        )),
        BackendKind::Local => match &config.index_path {
            Some(path) => Arc::new(LocalConnector::on_disk(path)),
            None => Arc::new(LocalConnector::in_memory()),
        },
    }
}
