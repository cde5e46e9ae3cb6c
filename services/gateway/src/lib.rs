pub mod backend;
pub mod config;
pub mod connection;
pub mod error;
pub mod index;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod search;
pub mod server;
pub mod store;

pub use config::Config;
pub use connection::{ConnectionManager, ConnectionOptions, ConnectionState};
pub use error::{BackendError, ConnectionError, ErrorKind, GatewayError, Result, StoreError};
pub use crate::metrics::{init_logging, init_metrics};
pub use server::{router, AppState};
