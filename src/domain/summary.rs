//! Run summary and per-row explanation tags.

use crate::domain::filter::{FilterOutcome, Rejection};
use crate::domain::normalizer::{NormalizationWarning, Normalized};
use crate::domain::record::NormalizedRecord;
use crate::domain::selection::SelectionResult;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

const LOW_FLOAT_SHARES: f64 = 20_000_000.0;
const EXTREME_GAP_PCT: f64 = 20.0;
const BREAKOUT_W52_POS: f64 = 0.80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tag {
    LowFloat,
    ExtremeGap,
    EarningsToday,
    FiftyTwoWeekBreakout,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LowFloat => "LOW_FLOAT",
            Self::ExtremeGap => "EXTREME_GAP",
            Self::EarningsToday => "EARNINGS_TODAY",
            Self::FiftyTwoWeekBreakout => "FIFTY_TWO_WEEK_BREAKOUT",
        }
    }
}

pub fn tags_for(record: &NormalizedRecord) -> Vec<Tag> {
    let mut tags = Vec::new();
    if record.float_shares.is_some_and(|f| f < LOW_FLOAT_SHARES) {
        tags.push(Tag::LowFloat);
    }
    if record.gap_pct.is_some_and(|g| g > EXTREME_GAP_PCT) {
        tags.push(Tag::ExtremeGap);
    }
    if record.days_to_earnings.is_some_and(|d| d.abs() <= 1) {
        tags.push(Tag::EarningsToday);
    }
    if record.week52_pos().is_some_and(|p| p >= BREAKOUT_W52_POS) {
        tags.push(Tag::FiftyTwoWeekBreakout);
    }
    tags
}

/// What the caller should report for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Selected,
    NoQualifiers,
}

impl RunOutcome {
    pub fn of(selection: &SelectionResult) -> Self {
        if selection.is_empty() {
            Self::NoQualifiers
        } else {
            Self::Selected
        }
    }
}

/// A row that failed one or more hard filters, with every failed rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    pub symbol: String,
    pub rejections: Vec<Rejection>,
}

/// A qualified row skipped by the sector cap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapExclusion {
    pub symbol: String,
    pub rank: usize,
    pub sector: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub date: NaiveDate,
    pub generated_at: String,
    pub raw_rows: usize,
    pub normalized_rows: usize,
    pub duplicates_dropped: usize,
    pub qualified: usize,
    pub rejected: usize,
    pub rejections_by_rule: BTreeMap<String, usize>,
    pub rejected_rows: Vec<RejectedRow>,
    pub requested_top_n: usize,
    pub top_n: usize,
    pub outcome: RunOutcome,
    pub sector_cap_applied: bool,
    pub excluded_by_sector_cap: Vec<CapExclusion>,
    pub used_cached_export: bool,
    pub filters: Vec<String>,
    pub tags: BTreeMap<String, Vec<Tag>>,
    pub warnings: Vec<NormalizationWarning>,
    pub timings_sec: BTreeMap<String, f64>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RunSummaryBuilder {
    date: NaiveDate,
    generated_at: String,
    raw_rows: usize,
    normalized_rows: usize,
    duplicates_dropped: usize,
    warnings: Vec<NormalizationWarning>,
    qualified: usize,
    rejected: usize,
    rejections_by_rule: BTreeMap<String, usize>,
    rejected_rows: Vec<RejectedRow>,
    requested_top_n: usize,
    selection: Option<SelectionResult>,
    used_cached_export: bool,
    filters: Vec<String>,
    timings: BTreeMap<String, f64>,
    notes: Vec<String>,
}

impl RunSummaryBuilder {
    pub fn new(date: NaiveDate, generated_at: impl Into<String>) -> Self {
        Self {
            date,
            generated_at: generated_at.into(),
            raw_rows: 0,
            normalized_rows: 0,
            duplicates_dropped: 0,
            warnings: Vec::new(),
            qualified: 0,
            rejected: 0,
            rejections_by_rule: BTreeMap::new(),
            rejected_rows: Vec::new(),
            requested_top_n: 0,
            selection: None,
            used_cached_export: false,
            filters: Vec::new(),
            timings: BTreeMap::new(),
            notes: Vec::new(),
        }
    }

    pub fn raw_rows(mut self, count: usize) -> Self {
        self.raw_rows = count;
        self
    }

    pub fn normalized(mut self, normalized: &Normalized) -> Self {
        self.normalized_rows = normalized.records.len();
        self.duplicates_dropped = normalized.duplicates_dropped();
        self.warnings = normalized.warnings.clone();
        self
    }

    pub fn filtered(mut self, outcome: &FilterOutcome) -> Self {
        self.qualified = outcome.passed.len();
        self.rejected = outcome.rejected.len();
        self.rejections_by_rule.clear();
        self.rejected_rows.clear();
        for result in &outcome.rejected {
            for rejection in &result.rejections {
                *self
                    .rejections_by_rule
                    .entry(rejection.rule.to_string())
                    .or_insert(0) += 1;
            }
            self.rejected_rows.push(RejectedRow {
                symbol: result.record.symbol.clone(),
                rejections: result.rejections.clone(),
            });
        }
        self
    }

    pub fn selection(mut self, selection: &SelectionResult, requested_top_n: usize) -> Self {
        self.selection = Some(selection.clone());
        self.requested_top_n = requested_top_n;
        self
    }

    pub fn used_cached_export(mut self, used: bool) -> Self {
        self.used_cached_export = used;
        self
    }

    pub fn filters<I, S>(mut self, descriptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters = descriptions.into_iter().map(Into::into).collect();
        self
    }

    pub fn timing(mut self, stage: &str, elapsed: Duration) -> Self {
        let secs = (elapsed.as_secs_f64() * 1000.0).round() / 1000.0;
        self.timings.insert(stage.to_string(), secs);
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn build(self) -> RunSummary {
        let selection = self.selection.unwrap_or_default();
        let tags = selection
            .selected
            .iter()
            .map(|s| (s.symbol().to_string(), tags_for(&s.record)))
            .collect();
        RunSummary {
            date: self.date,
            generated_at: self.generated_at,
            raw_rows: self.raw_rows,
            normalized_rows: self.normalized_rows,
            duplicates_dropped: self.duplicates_dropped,
            qualified: self.qualified,
            rejected: self.rejected,
            rejections_by_rule: self.rejections_by_rule,
            rejected_rows: self.rejected_rows,
            requested_top_n: self.requested_top_n,
            top_n: selection.selected.len(),
            outcome: RunOutcome::of(&selection),
            sector_cap_applied: selection.sector_cap_applied,
            excluded_by_sector_cap: selection
                .excluded_by_sector_cap
                .iter()
                .map(|e| CapExclusion {
                    symbol: e.record.symbol().to_string(),
                    rank: e.rank,
                    sector: e.sector.clone(),
                    score: e.record.score,
                })
                .collect(),
            used_cached_export: self.used_cached_export,
            filters: self.filters,
            tags,
            warnings: self.warnings,
            timings_sec: self.timings,
            notes: self.notes,
        }
    }
}
