use crate::backend::{BulkReport, Connector, SearchBackend, SearchHits, SearchRequest};
use crate::error::BackendResult;
use crate::index::{self, IndexManager};
use crate::model::Document;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Search backend over an embedded tantivy index.
pub struct LocalBackend {
    manager: IndexManager,
}

impl LocalBackend {
    pub fn new(manager: IndexManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl SearchBackend for LocalBackend {
    async fn bulk_index(&self, documents: &[Document]) -> BackendResult<BulkReport> {
        let manager = self.manager.clone();
        let documents = documents.to_vec();
        let started = Instant::now();

        let items = tokio::task::spawn_blocking(move || {
            index::batch_add_documents(&manager, &documents)
        })
        .await??;

        Ok(BulkReport {
            took_millis: started.elapsed().as_millis() as u64,
            items,
            failures: Vec::new(),
        })
    }

    async fn search(&self, request: &SearchRequest) -> BackendResult<SearchHits> {
        let manager = self.manager.clone();
        let request = request.clone();

        tokio::task::spawn_blocking(move || {
            index::search(&manager, &request.query, request.from, request.size)
        })
        .await?
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Opens the embedded index. On disk, a connect fails while another process
/// holds the index lock and succeeds once it is released.
pub struct LocalConnector {
    path: Option<PathBuf>,
}

impl LocalConnector {
    pub fn in_memory() -> Self {
        Self { path: None }
    }

    pub fn on_disk(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

#[async_trait]
impl Connector for LocalConnector {
    async fn connect(&self) -> BackendResult<Arc<dyn SearchBackend>> {
        let path = self.path.clone();
        let manager = tokio::task::spawn_blocking(move || match path {
            Some(path) => IndexManager::open_or_create(path),
            None => IndexManager::create_in_ram(),
        })
        .await??;

        Ok(Arc::new(LocalBackend::new(manager)))
    }

    fn endpoint(&self) -> String {
        match &self.path {
            Some(path) => format!("local index at {}", path.display()),
            None => "in-memory local index".to_string(),
        }
    }
}
