//! normalize → filter → news → score → select, as one synchronous pass.

use crate::domain::filter::{self, FilterOutcome};
use crate::domain::normalizer::{self, Normalized};
use crate::domain::record::RawRecord;
use crate::domain::scoring::ScoredRecord;
use crate::domain::selection::{self, SelectionResult};
use crate::domain::strategy::{NewsConfig, StrategyConfig};
use crate::domain::summary::RunSummaryBuilder;
use crate::ports::news_port::{self, NewsPort};
use chrono::NaiveDate;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub run_date: NaiveDate,
    pub raw_rows: usize,
    pub normalized: Normalized,
    pub filtered: FilterOutcome,
    /// Every qualified row, in rank order.
    pub scored: Vec<ScoredRecord>,
    pub selection: SelectionResult,
    pub requested_top_n: usize,
    pub filter_descriptions: Vec<String>,
    pub timings: Vec<(&'static str, Duration)>,
    pub notes: Vec<String>,
}

impl EngineOutput {
    /// Feed everything the engine knows into a summary builder.
    pub fn summarize(&self, builder: RunSummaryBuilder) -> RunSummaryBuilder {
        let mut builder = builder
            .raw_rows(self.raw_rows)
            .normalized(&self.normalized)
            .filtered(&self.filtered)
            .selection(&self.selection, self.requested_top_n)
            .filters(self.filter_descriptions.iter().cloned());
        for (stage, elapsed) in &self.timings {
            builder = builder.timing(stage, *elapsed);
        }
        for note in &self.notes {
            builder = builder.note(note.clone());
        }
        builder
    }
}

pub fn run_engine(
    raw_rows: &[RawRecord],
    strategy: &StrategyConfig,
    run_date: NaiveDate,
    news: &dyn NewsPort,
) -> EngineOutput {
    let mut timings = Vec::new();
    let mut notes = Vec::new();

    // Stage 1: normalize
    let started = Instant::now();
    let normalized = normalizer::normalize(raw_rows, &strategy.aliases, run_date);
    timings.push(("normalize", started.elapsed()));
    tracing::info!(
        raw = raw_rows.len(),
        normalized = normalized.records.len(),
        warnings = normalized.warnings.len(),
        "normalized export"
    );

    // Stage 2: hard filters
    let started = Instant::now();
    let mut filtered = filter::filter(normalized.records.clone(), &strategy.rules);
    timings.push(("filter", started.elapsed()));
    tracing::info!(
        passed = filtered.passed.len(),
        rejected = filtered.rejected.len(),
        "applied hard filters"
    );

    // Stage 3: news enrichment
    let started = Instant::now();
    if strategy.news.enabled {
        let enriched = enrich_news(&mut filtered, &strategy.news, news);
        notes.push(format!(
            "news probe returned signals for {enriched} of {} symbols",
            filtered.passed.len()
        ));
    } else {
        notes.push("news enrichment disabled".to_string());
    }
    timings.push(("news", started.elapsed()));

    // Stage 4: score and rank
    let started = Instant::now();
    let scored = strategy.scoring_engine().score(&filtered.passed);
    timings.push(("score", started.elapsed()));

    // Stage 5: sector-capped selection
    let started = Instant::now();
    let selection = selection::select(&scored, strategy.top_n, strategy.max_per_sector);
    timings.push(("select", started.elapsed()));
    tracing::info!(
        selected = selection.selected.len(),
        excluded_by_sector_cap = selection.excluded_by_sector_cap.len(),
        "selected top-n"
    );

    EngineOutput {
        run_date,
        raw_rows: raw_rows.len(),
        normalized,
        filtered,
        scored,
        selection,
        requested_top_n: strategy.top_n,
        filter_descriptions: strategy.filter_descriptions(),
        timings,
        notes,
    }
}

/// Set `news_freshness` on passing rows. Returns how many rows got a value.
fn enrich_news(filtered: &mut FilterOutcome, config: &NewsConfig, news: &dyn NewsPort) -> usize {
    let symbols: Vec<String> = filtered
        .passed
        .iter()
        .map(|r| r.record.symbol.clone())
        .collect();
    let signals = news.probe(&symbols);
    let mut enriched = 0;
    for result in &mut filtered.passed {
        result.record.news_freshness = signals
            .get(&result.record.symbol)
            .and_then(|s| news_port::freshness(s.hours_since_latest, config.freshness_hours));
        if result.record.news_freshness.is_some() {
            enriched += 1;
        }
    }
    tracing::debug!(probed = symbols.len(), enriched, "news enrichment");
    enriched
}
