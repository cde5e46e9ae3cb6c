use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub redis: RedisConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub address: SocketAddr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Elasticsearch,
    Local,
}

/// How item-level failures inside a successful bulk response are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkFailurePolicy {
    /// Only a rejected batch fails the call; failed items are logged.
    #[default]
    Lenient,
    /// Any failed item fails the whole call.
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub url: String,
    pub index_name: String,
    /// Directory of the local index. `None` keeps the index in memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_path: Option<String>,
    pub retry_delay_ms: u64,
    pub bulk_failure_policy: BulkFailurePolicy,
    pub max_result_window: u64,
}

impl BackendConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            kind: BackendKind::Elasticsearch,
            url: "http://elasticsearch:9200".to_string(),
            index_name: "documents".to_string(),
            index_path: None,
            retry_delay_ms: 3000,
            bulk_failure_policy: BulkFailurePolicy::Lenient,
            max_result_window: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    pub key_prefix: String,
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Config::default();

        if let Ok(address) = std::env::var("SERVER_ADDRESS") {
            config.server.address = address.parse()?;
        }
        if let Ok(kind) = std::env::var("BACKEND_KIND") {
            config.backend.kind = match kind.to_lowercase().as_str() {
                "local" => BackendKind::Local,
                "elasticsearch" => BackendKind::Elasticsearch,
                other => anyhow::bail!("unknown backend kind: {}", other),
            };
        }
        if let Ok(url) = std::env::var("ELASTICSEARCH_URL") {
            config.backend.url = url;
        }
        if let Ok(index_name) = std::env::var("ELASTICSEARCH_INDEX") {
            config.backend.index_name = index_name;
        }
        if let Ok(index_path) = std::env::var("INDEX_PATH") {
            config.backend.index_path = Some(index_path);
        }
        if let Ok(delay) = std::env::var("BACKEND_RETRY_DELAY_MS") {
            config.backend.retry_delay_ms = delay.parse().unwrap_or(3000);
        }
        if let Ok(policy) = std::env::var("BULK_FAILURE_POLICY") {
            config.backend.bulk_failure_policy = match policy.to_lowercase().as_str() {
                "strict" => BulkFailurePolicy::Strict,
                _ => BulkFailurePolicy::Lenient,
            };
        }
        if let Ok(window) = std::env::var("MAX_RESULT_WINDOW") {
            config.backend.max_result_window = window.parse().unwrap_or(10_000);
        }
        if let Ok(redis_url) = std::env::var("REDIS_URL") {
            config.redis.url = redis_url;
        }
        if let Ok(store_url) = std::env::var("STORE_URL") {
            config.store.url = store_url;
        }
        if let Ok(prefix) = std::env::var("STORE_KEY_PREFIX") {
            config.store.key_prefix = prefix;
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            },
            backend: BackendConfig::default(),
            redis: RedisConfig {
                url: "redis://redis-master:6379".to_string(),
            },
            store: StoreConfig {
                url: "redis://redis-master:6379/1".to_string(),
                key_prefix: "documents".to_string(),
            },
        }
    }
}
