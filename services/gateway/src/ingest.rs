use crate::backend::BulkReport;
use crate::config::BulkFailurePolicy;
use crate::connection::ConnectionManager;
use crate::error::{GatewayError, Result};
use crate::model::{Document, DocumentRequest};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

pub struct IngestionService {
    connections: Arc<ConnectionManager>,
    policy: BulkFailurePolicy,
}

impl IngestionService {
    pub fn new(connections: Arc<ConnectionManager>, policy: BulkFailurePolicy) -> Self {
        Self {
            connections,
            policy,
        }
    }

    /// Assigns ids and timestamps to the batch and writes it with one bulk
    /// request. Returns the ids in request order.
    pub async fn ingest(&self, batch: Vec<DocumentRequest>) -> Result<Vec<String>> {
        if batch.is_empty() {
            tracing::debug!("Empty document batch, nothing to index");
            return Ok(Vec::new());
        }

        let backend = self.connections.handle().map_err(|e| {
            tracing::error!("Cannot index {} documents: {}", batch.len(), e);
            GatewayError::from(e)
        })?;

        let documents: Vec<Document> = batch
            .into_iter()
            .map(|request| Document::from_request(request, Utc::now()))
            .collect();
        let ids: Vec<String> = documents.iter().map(|doc| doc.id.clone()).collect();

        let started = Instant::now();
        let report = backend.bulk_index(&documents).await.map_err(|e| {
            tracing::error!("Bulk index of {} documents failed: {}", documents.len(), e);
            if e.is_transport() {
                GatewayError::BackendUnavailable(e.to_string())
            } else {
                GatewayError::IngestionFailed(e.to_string())
            }
        })?;

        crate::metrics::record_bulk(
            backend.name(),
            documents.len(),
            report.failures.len(),
            started.elapsed(),
        );

        self.check_items(&report, documents.len())?;
        Ok(ids)
    }

    fn check_items(&self, report: &BulkReport, submitted: usize) -> Result<()> {
        if report.failures.is_empty() {
            return Ok(());
        }

        for failure in &report.failures {
            tracing::warn!(
                "Document {} was not indexed (status {}): {}",
                failure.id,
                failure.status,
                failure.reason
            );
        }

        match self.policy {
            BulkFailurePolicy::Lenient => {
                tracing::warn!(
                    "Accepting bulk request with {} of {} documents failed",
                    report.failures.len(),
                    submitted
                );
                Ok(())
            }
            BulkFailurePolicy::Strict => Err(GatewayError::IngestionFailed(format!(
                "{} of {} documents failed to index",
                report.failures.len(),
                submitted
            ))),
        }
    }
}
