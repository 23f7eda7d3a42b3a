use std::{path::PathBuf, sync::Arc};

use auth::{AuthError, BearerSecret};
use store::{FingerprintStore, InMemoryStore, SqliteStore, StoreError};
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
pub const DEFAULT_HTTP_QUEUE_CAPACITY_PER_WORKER: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing bearer secret: set FINGERPRINT_SECRET_KEY or SECRET_KEY")]
    MissingSecret,
    #[error("invalid bearer secret: {0}")]
    InvalidSecret(#[from] AuthError),
    #[error("FINGERPRINT_HTTP_WORKERS must be a positive integer, got '{0}'")]
    InvalidWorkerCount(String),
    #[error("FINGERPRINT_HTTP_QUEUE_CAPACITY must be a positive integer, got '{0}'")]
    InvalidQueueCapacity(String),
    #[error("FINGERPRINT_TRANSPORT_RUNTIME must be 'std' or 'axum', got '{0}'")]
    InvalidTransportRuntime(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportRuntime {
    Std,
    Axum,
}

impl TransportRuntime {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Std => "std",
            Self::Axum => "axum",
        }
    }

    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "std" => Ok(Self::Std),
            "axum" => Ok(Self::Axum),
            _ => Err(ConfigError::InvalidTransportRuntime(raw.to_string())),
        }
    }
}

/// Everything the process reads from its environment, resolved once at
/// startup and handed to the transport by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    pub secret: BearerSecret,
    /// SQLite database file; `None` keeps rows in memory for the process lifetime.
    pub db_path: Option<PathBuf>,
    pub bind_addr: String,
    pub http_workers: usize,
    /// Accepted connections the std transport may hold while every worker is busy.
    pub http_queue_capacity: usize,
    pub transport_runtime: TransportRuntime,
}

impl CollectorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup_with_fallback(&lookup, "FINGERPRINT_SECRET_KEY", "SECRET_KEY")
            .ok_or(ConfigError::MissingSecret)?;
        let secret = BearerSecret::new(secret)?;

        let db_path = lookup_with_fallback(&lookup, "FINGERPRINT_DB_PATH", "DB_PATH")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        let bind_addr = lookup("FINGERPRINT_BIND")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let http_workers = match lookup("FINGERPRINT_HTTP_WORKERS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(workers) if workers > 0 => workers,
                _ => return Err(ConfigError::InvalidWorkerCount(raw)),
            },
            None => default_http_workers(),
        };

        let http_queue_capacity = match lookup("FINGERPRINT_HTTP_QUEUE_CAPACITY") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(capacity) if capacity > 0 => capacity,
                _ => return Err(ConfigError::InvalidQueueCapacity(raw)),
            },
            None => default_http_queue_capacity(http_workers),
        };

        let transport_runtime = match lookup("FINGERPRINT_TRANSPORT_RUNTIME") {
            Some(raw) => TransportRuntime::parse(&raw)?,
            None => TransportRuntime::Std,
        };

        Ok(Self {
            secret,
            db_path,
            bind_addr,
            http_workers,
            http_queue_capacity,
            transport_runtime,
        })
    }

    pub fn open_store(&self) -> Result<Arc<dyn FingerprintStore>, StoreError> {
        match self.db_path.as_ref() {
            Some(path) => Ok(Arc::new(SqliteStore::open(path)?)),
            None => Ok(Arc::new(InMemoryStore::new())),
        }
    }
}

fn lookup_with_fallback<F>(lookup: &F, primary: &str, fallback: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(primary)
        .filter(|value| !value.is_empty())
        .or_else(|| lookup(fallback))
}

fn default_http_workers() -> usize {
    std::thread::available_parallelism()
        .map(|parallelism| parallelism.get().clamp(1, 32))
        .unwrap_or(4)
}

fn default_http_queue_capacity(worker_count: usize) -> usize {
    worker_count
        .saturating_mul(DEFAULT_HTTP_QUEUE_CAPACITY_PER_WORKER)
        .max(worker_count)
}
