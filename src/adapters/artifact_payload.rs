//! Serializable shapes of the run artifacts, shared by every artifact sink.

use crate::domain::pipeline::EngineOutput;
use crate::domain::record::NormalizedRecord;
use crate::domain::scoring::{Contribution, ScoredRecord};
use crate::domain::summary::{RunSummary, Tag, tags_for};
use chrono::NaiveDate;
use serde::Serialize;

pub const FULL_WATCHLIST_FILE: &str = "full_watchlist.json";
pub const TOP_N_FILE: &str = "topN.json";
pub const WATCHLIST_CSV_FILE: &str = "watchlist.csv";
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchlistEntry<'a> {
    pub rank: usize,
    pub symbol: &'a str,
    pub score: f64,
    pub sector: &'a str,
    pub tags: Vec<Tag>,
    pub top_features: &'a [Contribution],
    pub features: &'a [Contribution],
    pub fields: &'a NormalizedRecord,
}

impl<'a> WatchlistEntry<'a> {
    pub fn new(rank: usize, scored: &'a ScoredRecord) -> Self {
        Self {
            rank,
            symbol: scored.symbol(),
            score: scored.score,
            sector: scored.record.sector_key(),
            tags: tags_for(&scored.record),
            top_features: &scored.top_features,
            features: &scored.contributions,
            fields: &scored.record,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FullWatchlist<'a> {
    pub date: NaiveDate,
    pub generated_at: &'a str,
    pub count: usize,
    pub rows: Vec<WatchlistEntry<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopN<'a> {
    pub generated_at: &'a str,
    pub top_n: usize,
    pub symbols: Vec<&'a str>,
    pub ranking: Vec<WatchlistEntry<'a>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistCsvRow {
    pub rank: usize,
    pub symbol: String,
    pub score: f64,
    pub sector: String,
    pub gap_pct: Option<f64>,
    pub rel_volume: Option<f64>,
    /// Semicolon-separated tag names.
    pub tags: String,
}

impl WatchlistCsvRow {
    pub const HEADERS: [&'static str; 7] =
        ["rank", "symbol", "score", "sector", "gap_pct", "rel_volume", "tags"];
}

pub fn full_watchlist<'a>(output: &'a EngineOutput, summary: &'a RunSummary) -> FullWatchlist<'a> {
    FullWatchlist {
        date: output.run_date,
        generated_at: &summary.generated_at,
        count: output.scored.len(),
        rows: output
            .scored
            .iter()
            .enumerate()
            .map(|(i, s)| WatchlistEntry::new(i + 1, s))
            .collect(),
    }
}

pub fn top_n<'a>(output: &'a EngineOutput, summary: &'a RunSummary) -> TopN<'a> {
    TopN {
        generated_at: &summary.generated_at,
        top_n: output.selection.selected.len(),
        symbols: output.selection.symbols(),
        ranking: output
            .selection
            .selected
            .iter()
            .enumerate()
            .map(|(i, s)| WatchlistEntry::new(i + 1, s))
            .collect(),
    }
}

pub fn watchlist_rows(output: &EngineOutput) -> Vec<WatchlistCsvRow> {
    output
        .selection
        .selected
        .iter()
        .enumerate()
        .map(|(i, s)| WatchlistCsvRow {
            rank: i + 1,
            symbol: s.symbol().to_string(),
            score: round4(s.score),
            sector: s.record.sector_key().to_string(),
            gap_pct: s.record.gap_pct,
            rel_volume: s.record.rel_volume,
            tags: tags_for(&s.record)
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(";"),
        })
        .collect()
}
