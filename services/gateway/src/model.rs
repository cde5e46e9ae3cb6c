use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SKIP: u64 = 0;
pub const DEFAULT_TAKE: u64 = 10;

/// A document as it is written to the search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Builds a stored document from caller input, assigning a fresh id.
    pub fn from_request(request: DocumentRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id: new_document_id(),
            title: request.title,
            content: request.content,
            created_at,
        }
    }
}

/// 128-bit UUIDv4 rendered without hyphens.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Projection of a stored document returned by search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub skip: u64,
    pub take: u64,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            skip: DEFAULT_SKIP,
            take: DEFAULT_TAKE,
        }
    }

    /// Builds a query from raw request parameters. Pagination values that are
    /// missing or not non-negative integers fall back to their defaults.
    pub fn from_params(text: Option<&str>, skip: Option<&str>, take: Option<&str>) -> Self {
        Self {
            text: text.unwrap_or_default().to_string(),
            skip: parse_or_default(skip, DEFAULT_SKIP),
            take: parse_or_default(take, DEFAULT_TAKE),
        }
    }

    pub fn with_page(mut self, skip: u64, take: u64) -> Self {
        self.skip = skip;
        self.take = take;
        self
    }
}

fn parse_or_default(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub elapsed_millis: u64,
    pub total_hits: u64,
    pub documents: Vec<DocumentResponse>,
}

/// Wire shape of a search answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub time: String,
    pub hit: String,
    pub documents: Vec<DocumentResponse>,
}

impl From<SearchResult> for SearchResponse {
    fn from(result: SearchResult) -> Self {
        SearchResponse {
            time: result.elapsed_millis.to_string(),
            hit: result.total_hits.to_string(),
            documents: result.documents,
        }
    }
}
