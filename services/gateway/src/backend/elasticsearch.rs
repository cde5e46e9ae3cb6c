use crate::backend::{
    BulkItemFailure, BulkReport, Connector, SearchBackend, SearchHits, SearchRequest,
};
use crate::error::{BackendError, BackendResult};
use crate::model::Document;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ElasticsearchBackend {
    client: Client,
    base_url: String,
    index_name: String,
    max_result_window: u64,
}

impl ElasticsearchBackend {
    fn index_url(&self, endpoint: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.index_name, endpoint)
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    async fn bulk_index(&self, documents: &[Document]) -> BackendResult<BulkReport> {
        let body = bulk_body(documents)?;

        let response = self
            .client
            .post(self.index_url("_bulk"))
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        decode_bulk_response(&bytes)
    }

    async fn search(&self, request: &SearchRequest) -> BackendResult<SearchHits> {
        let body = search_body(request, self.max_result_window);

        let response = self
            .client
            .post(self.index_url("_search"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        decode_search_response(&bytes)
    }

    fn name(&self) -> &'static str {
        "elasticsearch"
    }
}

pub struct ElasticsearchConnector {
    base_url: String,
    index_name: String,
    max_result_window: u64,
}

impl ElasticsearchConnector {
    pub fn new(base_url: String, index_name: String, max_result_window: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            index_name,
            max_result_window,
        }
    }
}

#[async_trait]
impl Connector for ElasticsearchConnector {
    /// Builds a client and pings the cluster root; a handle is only handed out
    /// once the cluster answers.
    async fn connect(&self) -> BackendResult<Arc<dyn SearchBackend>> {
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;

        let response = client.get(&self.base_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(Arc::new(ElasticsearchBackend {
            client,
            base_url: self.base_url.clone(),
            index_name: self.index_name.clone(),
            max_result_window: self.max_result_window,
        }))
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url, self.index_name)
    }
}

/// NDJSON body of a `_bulk` request: one index action per document.
pub fn bulk_body(documents: &[Document]) -> BackendResult<String> {
    let mut body = String::new();
    for document in documents {
        let action = json!({ "index": { "_id": document.id } });
        body.push_str(&serde_json::to_string(&action)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(document)?);
        body.push('\n');
    }
    Ok(body)
}

/// Keeps `from + size` inside the cluster's result window. A page that starts
/// past the window asks for no hits, only the total.
pub fn clamp_page(from: u64, size: u64, max_result_window: u64) -> (u64, u64) {
    if from >= max_result_window {
        return (0, 0);
    }
    (from, size.min(max_result_window - from))
}

pub fn search_body(request: &SearchRequest, max_result_window: u64) -> Value {
    let (from, size) = clamp_page(request.from, request.size, max_result_window);
    json!({
        "from": from,
        "size": size,
        "query": {
            "multi_match": {
                "query": request.query.text,
                "fields": request.query.fields,
                "fuzziness": request.query.fuzziness.to_string(),
                "minimum_should_match": request.query.minimum_should_match.to_string(),
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct BulkResponseBody {
    #[serde(default)]
    took: u64,
    #[serde(default)]
    items: Vec<HashMap<String, BulkItemBody>>,
}

#[derive(Debug, Deserialize)]
struct BulkItemBody {
    #[serde(rename = "_id", default)]
    id: String,
    #[serde(default)]
    status: u16,
    #[serde(default)]
    error: Option<Value>,
}

pub fn decode_bulk_response(bytes: &[u8]) -> BackendResult<BulkReport> {
    let body: BulkResponseBody = serde_json::from_slice(bytes)?;

    let mut failures = Vec::new();
    for item in body.items.iter().flat_map(|entry| entry.values()) {
        if item.error.is_none() && item.status < 300 {
            continue;
        }
        let reason = match &item.error {
            Some(Value::Object(error)) => error
                .get("reason")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(error.clone()).to_string()),
            Some(other) => other.to_string(),
            None => format!("status {}", item.status),
        };
        failures.push(BulkItemFailure {
            id: item.id.clone(),
            status: item.status,
            reason,
        });
    }

    Ok(BulkReport {
        took_millis: body.took,
        items: body.items.len(),
        failures,
    })
}

#[derive(Debug, Deserialize)]
struct SearchResponseBody {
    #[serde(default)]
    took: u64,
    hits: HitsBody,
}

#[derive(Debug, Deserialize)]
struct HitsBody {
    #[serde(default)]
    total: Option<TotalHits>,
    #[serde(default)]
    hits: Vec<HitBody>,
}

/// Older clusters report a bare number, newer ones `{value, relation}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Count(u64),
    Object { value: u64 },
}

#[derive(Debug, Deserialize)]
struct HitBody {
    #[serde(rename = "_source", default)]
    source: Value,
}

pub fn decode_search_response(bytes: &[u8]) -> BackendResult<SearchHits> {
    let body: SearchResponseBody = serde_json::from_slice(bytes)?;

    let total_hits = match body.hits.total {
        Some(TotalHits::Count(value)) | Some(TotalHits::Object { value }) => value,
        None => 0,
    };

    Ok(SearchHits {
        took_millis: body.took,
        total_hits,
        hits: body.hits.hits.into_iter().map(|hit| hit.source).collect(),
    })
}
