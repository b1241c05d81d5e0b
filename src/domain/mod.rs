//! Core engine: pure, synchronous, no I/O.

pub mod config_validation;
pub mod error;
pub mod feature;
pub mod field;
pub mod filter;
pub mod market_time;
pub mod normalizer;
pub mod pipeline;
pub mod record;
pub mod scoring;
pub mod selection;
pub mod strategy;
pub mod summary;
