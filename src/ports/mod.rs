//! Port traits separating the engine from I/O.

pub mod artifact_port;
pub mod config_port;
pub mod export_port;
pub mod news_port;
