//! Raw and normalized security records.

use chrono::NaiveDate;
use serde::Serialize;

/// Sector bucket for rows whose export carries no sector.
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// One export row: vendor column name → raw cell text, in export column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    columns: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new(columns: Vec<(String, String)>) -> Self {
        Self { columns }
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(h, _)| h.as_str())
    }

    pub fn value_at(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A security in canonical form. `None` means "no information", never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub symbol: String,
    pub company: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub exchange: Option<String>,
    pub country: Option<String>,
    pub market_cap: Option<f64>,
    pub pe: Option<f64>,
    pub price: Option<f64>,
    pub prev_close: Option<f64>,
    pub change_pct: Option<f64>,
    pub gap_pct: Option<f64>,
    pub volume: Option<f64>,
    pub avg_volume: Option<f64>,
    pub rel_volume: Option<f64>,
    pub float_shares: Option<f64>,
    pub short_float_pct: Option<f64>,
    pub after_hours_change_pct: Option<f64>,
    pub week52_low: Option<f64>,
    pub week52_high: Option<f64>,
    pub earnings_date: Option<NaiveDate>,
    pub days_to_earnings: Option<i64>,
    pub analyst_recom: Option<f64>,
    pub insider_trans_pct: Option<f64>,
    pub institutional_trans_pct: Option<f64>,
    /// Filled by the news enrichment step, after filtering.
    pub news_freshness: Option<f64>,
}

impl NormalizedRecord {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Sector-cap bucket; rows without a sector share [`UNKNOWN_SECTOR`].
    pub fn sector_key(&self) -> &str {
        self.sector.as_deref().unwrap_or(UNKNOWN_SECTOR)
    }

    /// Position of price within the 52-week range, clipped to [0, 1].
    pub fn week52_pos(&self) -> Option<f64> {
        let (price, low, high) = (self.price?, self.week52_low?, self.week52_high?);
        if high == low {
            return None;
        }
        Some(((price - low) / (high - low)).clamp(0.0, 1.0))
    }

    /// Net insider plus institutional transaction percentage.
    pub fn insider_inst_pct(&self) -> Option<f64> {
        match (self.insider_trans_pct, self.institutional_trans_pct) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
        }
    }
}
