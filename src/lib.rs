//! premarket: pre-market equities screener.
//!
//! Hexagonal architecture: the filter–score–rank engine in [`domain`], port
//! traits in [`ports`], concrete I/O in [`adapters`], wiring in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod logging;
pub mod ports;
