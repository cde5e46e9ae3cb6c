//! Key-value passthrough stores behind the demo endpoints.
//!
//! Both stores share one lazily opened, auto-reconnecting Redis connection per
//! store instead of connecting on every request.

use crate::error::StoreError;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde_json::Value;
use tokio::sync::OnceCell;

pub struct SharedConnection {
    client: Client,
    connection: OnceCell<ConnectionManager>,
}

impl SharedConnection {
    /// Validates the URL; no connection is made until first use.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::open(url)?,
            connection: OnceCell::new(),
        })
    }

    async fn get(&self) -> Result<ConnectionManager, StoreError> {
        let connection = self
            .connection
            .get_or_try_init(|| ConnectionManager::new(self.client.clone()))
            .await?;
        Ok(connection.clone())
    }
}

/// Plain string values, used by the Redis round-trip endpoint.
pub struct KeyValueStore {
    shared: SharedConnection,
}

impl KeyValueStore {
    pub fn open(url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            shared: SharedConnection::open(url)?,
        })
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.shared.get().await?;
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<String, StoreError> {
        let mut conn = self.shared.get().await?;
        let value: Option<String> = conn.get(key).await?;
        value.ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }
}

/// JSON documents addressed by key, under a configurable prefix.
pub struct DocumentStore {
    shared: SharedConnection,
    key_prefix: String,
}

impl DocumentStore {
    pub fn open(url: &str, key_prefix: impl Into<String>) -> Result<Self, StoreError> {
        Ok(Self {
            shared: SharedConnection::open(url)?,
            key_prefix: key_prefix.into(),
        })
    }

    fn make_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }

    pub async fn put(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(value)?;
        let mut conn = self.shared.get().await?;
        let _: () = conn.set(self.make_key(key), serialized).await?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Value, StoreError> {
        let mut conn = self.shared.get().await?;
        let serialized: Option<String> = conn.get(self.make_key(key)).await?;
        match serialized {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Err(StoreError::KeyNotFound(key.to_string())),
        }
    }
}
