//! Lifecycle of the search backend handle.
//!
//! The gateway starts serving before the backend is reachable. The manager
//! tries once at startup; if that fails a supervised task keeps retrying on a
//! fixed delay until a handle can be published. Requests never wait for it:
//! [`ConnectionManager::handle`] answers immediately with the current handle
//! or [`ConnectionError::NotConnected`].

use crate::backend::{Connector, SearchBackend};
use crate::config::BackendConfig;
use crate::error::{BackendResult, ConnectionError};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub enum ConnectionState {
    Disconnected,
    /// An attempt is running or a retry is scheduled.
    Connecting,
    Connected(Arc<dyn SearchBackend>),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }
}

impl fmt::Debug for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected(backend) => write!(f, "Connected({})", backend.name()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub retry_delay: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(3),
        }
    }
}

impl From<&BackendConfig> for ConnectionOptions {
    fn from(config: &BackendConfig) -> Self {
        Self {
            retry_delay: config.retry_delay(),
        }
    }
}

pub struct ConnectionManager {
    state: watch::Sender<ConnectionState>,
    retry_task: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    /// Attempts a connection right away. On failure the retry task is started
    /// and the manager is returned without a handle.
    ///
    /// The retry task stops when `shutdown` turns `true`.
    pub async fn connect(
        connector: Arc<dyn Connector>,
        options: ConnectionOptions,
        shutdown: watch::Receiver<bool>,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(ConnectionState::Connecting);
        let manager = Arc::new(Self {
            state,
            retry_task: Mutex::new(None),
        });

        match attempt(connector.as_ref(), 1).await {
            Ok(backend) => {
                manager.publish(backend);
                return manager;
            }
            Err(_) if *shutdown.borrow() => {
                manager.state.send_replace(ConnectionState::Disconnected);
                return manager;
            }
            Err(_) => {}
        }

        let task = tokio::spawn(Arc::clone(&manager).retry_until_connected(
            connector,
            options.retry_delay,
            shutdown,
        ));
        *manager.lock_retry_task() = Some(task);
        manager
    }

    /// A manager that already holds `backend`.
    pub fn connected(backend: Arc<dyn SearchBackend>) -> Arc<Self> {
        let (state, _) = watch::channel(ConnectionState::Connected(backend));
        Arc::new(Self {
            state,
            retry_task: Mutex::new(None),
        })
    }

    /// The current handle. Never waits for a pending reconnect.
    pub fn handle(&self) -> Result<Arc<dyn SearchBackend>, ConnectionError> {
        match &*self.state.borrow() {
            ConnectionState::Connected(backend) => Ok(Arc::clone(backend)),
            _ => Err(ConnectionError::NotConnected),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change, including the publish.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Waits for the retry task, if one was started, to finish.
    pub async fn join_retry_task(&self) {
        let task = self.lock_retry_task().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!("Backend reconnect task failed: {}", e);
            }
        }
    }

    fn publish(&self, backend: Arc<dyn SearchBackend>) {
        tracing::info!("Search backend connected ({})", backend.name());
        self.state.send_replace(ConnectionState::Connected(backend));
    }

    fn lock_retry_task(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.retry_task.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn retry_until_connected(
        self: Arc<Self>,
        connector: Arc<dyn Connector>,
        retry_delay: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut attempt_number = 1u64;
        loop {
            tokio::select! {
                _ = tokio::time::sleep(retry_delay) => {}
                _ = shutdown_signal(&mut shutdown) => break,
            }

            attempt_number += 1;
            tokio::select! {
                result = attempt(connector.as_ref(), attempt_number) => {
                    if let Ok(backend) = result {
                        self.publish(backend);
                        return;
                    }
                }
                _ = shutdown_signal(&mut shutdown) => break,
            }
        }

        tracing::info!("Backend reconnect loop stopped by shutdown");
        self.state.send_replace(ConnectionState::Disconnected);
    }
}

async fn attempt(connector: &dyn Connector, attempt_number: u64) -> BackendResult<Arc<dyn SearchBackend>> {
    tracing::debug!("Connecting to {} (attempt {})", connector.endpoint(), attempt_number);

    let result = connector.connect().await;
    crate::metrics::record_connect_attempt(result.is_ok());
    result.map_err(|e| {
        tracing::warn!(
            "Failed to connect to {} (attempt {}): {}",
            connector.endpoint(),
            attempt_number,
            e
        );
        e
    })
}

/// Resolves once shutdown is requested. A dropped sender never resolves.
async fn shutdown_signal(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
