pub mod api;
pub mod config;
pub mod transport;
#[cfg(feature = "async-transport")]
pub mod transport_axum;

pub use config::{CollectorConfig, ConfigError, TransportRuntime};
pub use transport::{CollectorRuntime, SharedRuntime};
