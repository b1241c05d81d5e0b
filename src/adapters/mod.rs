//! Concrete adapter implementations for ports.

pub mod artifact_payload;
pub mod csv_adapter;
pub mod env;
pub mod export_cache;
pub mod file_artifact_adapter;
pub mod file_config_adapter;
#[cfg(feature = "http")]
pub mod http_fetcher;
pub mod news_probe;
pub mod redact;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
