//! News probe that knows nothing. Every symbol stays neutral.

use crate::ports::news_port::{NewsPort, NewsSignal};
use std::collections::HashMap;

#[derive(Debug, Default, Clone, Copy)]
pub struct NeutralNewsProbe;

impl NewsPort for NeutralNewsProbe {
    fn probe(&self, symbols: &[String]) -> HashMap<String, NewsSignal> {
        tracing::debug!(symbols = symbols.len(), "neutral news probe");
        HashMap::new()
    }
}
