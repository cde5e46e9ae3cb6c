//! Tracing setup and the gateway's metric set.
//!
//! Call sites record through the helpers below so every metric carries the
//! same names and labels. Without an installed recorder they are no-ops.

use metrics::Unit;
use std::time::Duration;

pub const SEARCH_REQUESTS: &str = "gateway_search_requests_total";
pub const SEARCH_DURATION: &str = "gateway_search_duration_seconds";
pub const INDEXED_DOCUMENTS: &str = "gateway_index_documents_total";
pub const INDEX_ITEM_FAILURES: &str = "gateway_index_item_failures_total";
pub const INDEX_DURATION: &str = "gateway_index_duration_seconds";
pub const CONNECT_ATTEMPTS: &str = "gateway_backend_connect_attempts_total";

const DEFAULT_LOG_FILTER: &str = "search_gateway=debug,tower_http=debug";

pub const ALL_METRICS: [&str; 6] = [
    SEARCH_REQUESTS,
    SEARCH_DURATION,
    INDEXED_DOCUMENTS,
    INDEX_ITEM_FAILURES,
    INDEX_DURATION,
    CONNECT_ATTEMPTS,
];

/// `RUST_LOG` wins; otherwise the gateway and HTTP trace layer log at debug.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub fn init_metrics() {
    metrics::describe_counter!(SEARCH_REQUESTS, Unit::Count, "Search requests that reached a backend");
    metrics::describe_histogram!(SEARCH_DURATION, Unit::Seconds, "Backend search latency");
    metrics::describe_counter!(INDEXED_DOCUMENTS, Unit::Count, "Documents sent in accepted bulk writes");
    metrics::describe_counter!(
        INDEX_ITEM_FAILURES,
        Unit::Count,
        "Documents the backend refused inside an accepted bulk write"
    );
    metrics::describe_histogram!(INDEX_DURATION, Unit::Seconds, "Bulk write latency");
    metrics::describe_counter!(CONNECT_ATTEMPTS, Unit::Count, "Backend connection attempts by outcome");
}

pub fn record_search(backend: &'static str, elapsed: Duration) {
    metrics::counter!(SEARCH_REQUESTS, "backend" => backend).increment(1);
    metrics::histogram!(SEARCH_DURATION, "backend" => backend).record(elapsed.as_secs_f64());
}

pub fn record_bulk(backend: &'static str, documents: usize, failures: usize, elapsed: Duration) {
    metrics::counter!(INDEXED_DOCUMENTS, "backend" => backend).increment(documents as u64);
    if failures > 0 {
        metrics::counter!(INDEX_ITEM_FAILURES, "backend" => backend).increment(failures as u64);
    }
    metrics::histogram!(INDEX_DURATION, "backend" => backend).record(elapsed.as_secs_f64());
}

pub fn record_connect_attempt(succeeded: bool) {
    let outcome = if succeeded { "success" } else { "failure" };
    metrics::counter!(CONNECT_ATTEMPTS, "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names() {
        let unique: HashSet<&str> = ALL_METRICS.iter().copied().collect();
        assert_eq!(unique.len(), ALL_METRICS.len());

        for name in ALL_METRICS {
            assert!(name.starts_with("gateway_"), "{}", name);
            assert!(name.ends_with("_total") || name.ends_with("_seconds"), "{}", name);
        }
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        init_metrics();
        record_search("local", Duration::from_millis(3));
        record_bulk("local", 4, 1, Duration::from_millis(8));
        record_connect_attempt(false);
    }
}
