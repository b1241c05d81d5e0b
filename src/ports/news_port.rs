//! News freshness probe port.

use std::collections::HashMap;

/// Latest headline age for one symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewsSignal {
    pub hours_since_latest: f64,
}

pub trait NewsPort {
    /// Signals for whichever of `symbols` the source knows about. Symbols
    /// absent from the map stay neutral.
    fn probe(&self, symbols: &[String]) -> HashMap<String, NewsSignal>;
}

/// `max(0, 1 - min(hours, window) / window)`: 1 for breaking news, 0 once
/// the headline is older than the window.
pub fn freshness(hours_since_latest: f64, window_hours: u32) -> Option<f64> {
    if !hours_since_latest.is_finite() || window_hours == 0 {
        return None;
    }
    let window = f64::from(window_hours);
    let age = hours_since_latest.max(0.0).min(window);
    Some((1.0 - age / window).max(0.0))
}
