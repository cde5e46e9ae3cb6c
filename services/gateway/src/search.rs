use crate::backend::{MultiMatchQuery, SearchHits, SearchRequest};
use crate::connection::ConnectionManager;
use crate::error::{GatewayError, Result};
use crate::model::{DocumentResponse, SearchQuery, SearchResult};
use std::sync::Arc;
use std::time::Instant;

pub const SEARCH_FIELDS: [&str; 2] = ["title", "content"];
pub const FUZZINESS: u8 = 2;
pub const MINIMUM_SHOULD_MATCH: usize = 2;

pub struct SearchService {
    connections: Arc<ConnectionManager>,
}

impl SearchService {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult> {
        if query.text.is_empty() {
            return Err(GatewayError::InvalidQuery("Query not specified".to_string()));
        }

        let backend = self.connections.handle().map_err(|e| {
            tracing::error!("Cannot search for {:?}: {}", query.text, e);
            GatewayError::from(e)
        })?;

        let started = Instant::now();
        let hits = backend.search(&build_request(query)).await.map_err(|e| {
            tracing::error!("Search for {:?} failed: {}", query.text, e);
            GatewayError::BackendUnavailable(e.to_string())
        })?;
        crate::metrics::record_search(backend.name(), started.elapsed());

        Ok(project(hits))
    }
}

pub fn build_request(query: &SearchQuery) -> SearchRequest {
    SearchRequest {
        query: MultiMatchQuery {
            text: query.text.clone(),
            fields: SEARCH_FIELDS.iter().map(|field| field.to_string()).collect(),
            fuzziness: FUZZINESS,
            minimum_should_match: MINIMUM_SHOULD_MATCH,
        },
        from: query.skip,
        size: query.take,
    }
}

/// Maps raw hits to responses in the order the backend ranked them.
pub fn project(hits: SearchHits) -> SearchResult {
    let documents = hits
        .hits
        .into_iter()
        .filter_map(|source| {
            if !source.is_object() {
                tracing::warn!("Skipping search hit without an object source: {}", source);
                return None;
            }
            match serde_json::from_value::<DocumentResponse>(source) {
                Ok(document) => Some(document),
                Err(e) => {
                    tracing::warn!("Skipping undecodable search hit: {}", e);
                    None
                }
            }
        })
        .collect();

    SearchResult {
        elapsed_millis: hits.took_millis,
        total_hits: hits.total_hits,
        documents,
    }
}
