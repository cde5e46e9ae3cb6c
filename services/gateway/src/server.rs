use crate::config::Config;
use crate::connection::ConnectionManager;
use crate::error::{error_response, GatewayError, StoreError};
use crate::ingest::IngestionService;
use crate::model::{DocumentRequest, SearchQuery, SearchResponse};
use crate::search::SearchService;
use crate::store::{DocumentStore, KeyValueStore};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

const MALFORMED_BODY: &str = "Malformed request body";
const QUERY_NOT_SPECIFIED: &str = "Query not specified";

#[derive(Clone)]
pub struct AppState {
    pub ingestion: Arc<IngestionService>,
    pub search: Arc<SearchService>,
    pub kv: Arc<KeyValueStore>,
    pub store: Arc<DocumentStore>,
}

impl AppState {
    pub fn new(connections: Arc<ConnectionManager>, config: &Config) -> Result<Self, StoreError> {
        Ok(Self {
            ingestion: Arc::new(IngestionService::new(
                Arc::clone(&connections),
                config.backend.bulk_failure_policy,
            )),
            search: Arc::new(SearchService::new(connections)),
            kv: Arc::new(KeyValueStore::open(&config.redis.url)?),
            store: Arc::new(DocumentStore::open(
                &config.store.url,
                config.store.key_prefix.clone(),
            )?),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_liveness))
        .route("/documents", post(handle_create_documents))
        .route("/search", get(handle_search))
        .route("/redis", get(handle_redis))
        .route("/couchbase", get(handle_store_get))
        .route("/couchbaseInsert", post(handle_store_insert))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub skip: Option<String>,
    pub take: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StoreInsertRequest {
    #[serde(rename = "Key", alias = "key")]
    pub key: String,
    #[serde(rename = "Values", alias = "values", default)]
    pub values: Vec<String>,
}

async fn handle_liveness() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn handle_create_documents(
    State(state): State<AppState>,
    payload: Result<Json<Vec<DocumentRequest>>, JsonRejection>,
) -> Result<StatusCode, GatewayError> {
    let Json(batch) = payload.map_err(|rejection| {
        tracing::debug!("Rejected document batch: {}", rejection);
        GatewayError::MalformedRequest(MALFORMED_BODY.to_string())
    })?;

    let ids = state.ingestion.ingest(batch).await?;
    tracing::info!("Indexed {} documents", ids.len());
    Ok(StatusCode::OK)
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, GatewayError> {
    let query = SearchQuery::from_params(
        params.query.as_deref(),
        params.skip.as_deref(),
        params.take.as_deref(),
    );
    let result = state.search.search(&query).await?;
    Ok(Json(SearchResponse::from(result)))
}

async fn handle_redis(State(state): State<AppState>) -> Response {
    if let Err(e) = state.kv.set("key", "value").await {
        tracing::error!("Redis set failed: {}", e);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to insert in redis");
    }

    match state.kv.get("key").await {
        Ok(value) => Json(json!({ "key": value })).into_response(),
        Err(e) => {
            tracing::error!("Redis get failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get from redis")
        }
    }
}

async fn handle_store_get(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let key = match params.query.as_deref() {
        Some(key) if !key.is_empty() => key,
        _ => return error_response(StatusCode::BAD_REQUEST, QUERY_NOT_SPECIFIED),
    };

    match state.store.get(key).await {
        Ok(value) => Json(value).into_response(),
        Err(StoreError::KeyNotFound(_)) => error_response(StatusCode::NOT_FOUND, "key not found"),
        Err(e) => {
            tracing::error!("Document store get for {} failed: {}", key, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "cannot get from store")
        }
    }
}

async fn handle_store_insert(
    State(state): State<AppState>,
    payload: Result<Json<StoreInsertRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, MALFORMED_BODY);
    };

    match state.store.put(&request.key, &json!(request.values)).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            tracing::error!("Document store insert for {} failed: {}", request.key, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "cannot insert into store")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalConnector;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tokio::sync::watch;
    use tower::ServiceExt;

    async fn app() -> Router {
        let (_tx, rx) = watch::channel(false);
        let connections =
            ConnectionManager::connect(Arc::new(LocalConnector::in_memory()), Default::default(), rx)
                .await;

        let mut config = Config::default();
        config.redis.url = "redis://127.0.0.1:1".to_string();
        config.store.url = "redis://127.0.0.1:1".to_string();
        router(AppState::new(connections, &config).unwrap())
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_liveness() {
        let response = app().await.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_create_then_search() {
        let app = app().await;

        let response = app
            .clone()
            .oneshot(post_json(
                "/documents",
                r#"[{"title":"Alpha Report","content":"quarterly results"}]"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());

        let response = app.oneshot(get("/search?query=Alphaa")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["hit"], "1");
        assert!(body["time"].as_str().unwrap().parse::<u64>().is_ok());
        let documents = body["documents"].as_array().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["title"], "Alpha Report");
        assert_eq!(documents[0]["content"], "quarterly results");
        assert!(documents[0]["id"].as_str().is_some());
        assert!(documents[0]["createdAt"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let response = app()
            .await
            .oneshot(post_json("/documents", r#"{"title": "not an array"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Malformed request body"})
        );
    }

    #[tokio::test]
    async fn test_missing_query() {
        let app = app().await;
        for uri in ["/search", "/search?query=", "/search?skip=1&take=2"] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(
                body_json(response).await,
                json!({"error": "Query not specified"})
            );
        }
    }

    #[tokio::test]
    async fn test_search_without_matches_has_empty_documents() {
        let response = app()
            .await
            .oneshot(get("/search?query=nothing&skip=abc&take=-4"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["hit"], "0");
        assert_eq!(body["documents"], json!([]));
    }

    #[tokio::test]
    async fn test_search_while_disconnected_is_server_error() {
        let (_tx, rx) = watch::channel(true);
        let connections = ConnectionManager::connect(
            Arc::new(LocalConnector::on_disk("/proc/gateway-index")),
            Default::default(),
            rx,
        )
        .await;
        let mut config = Config::default();
        config.redis.url = "redis://127.0.0.1:1".to_string();
        config.store.url = "redis://127.0.0.1:1".to_string();
        let app = router(AppState::new(connections, &config).unwrap());

        let response = app.oneshot(get("/search?query=alpha")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Something went wrong"})
        );
    }

    #[tokio::test]
    async fn test_redis_unreachable() {
        let response = app().await.oneshot(get("/redis")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Failed to insert in redis"})
        );
    }

    #[tokio::test]
    async fn test_store_validation() {
        let app = app().await;

        let response = app.clone().oneshot(get("/couchbase")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(post_json("/couchbaseInsert", r#"{"Values": ["a"]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Malformed request body"})
        );
    }
}
