//! Typed strategy configuration consumed by the engine.

use crate::domain::feature::{Feature, ReferenceRange};
use crate::domain::field::HeaderAliases;
use crate::domain::filter::HardFilterRule;
use crate::domain::scoring::{FeatureWeights, PenaltyCaps, ScoringEngine};
use std::collections::BTreeMap;

pub const DEFAULT_FRESHNESS_HOURS: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewsConfig {
    pub enabled: bool,
    pub freshness_hours: u32,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            freshness_hours: DEFAULT_FRESHNESS_HOURS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    /// Hard filters, in the order they were declared.
    pub rules: Vec<HardFilterRule>,
    pub weights: FeatureWeights,
    pub penalty_caps: PenaltyCaps,
    /// Overrides of [`Feature::default_range`].
    pub feature_ranges: BTreeMap<Feature, ReferenceRange>,
    pub top_n: usize,
    pub max_per_sector: f64,
    pub aliases: HeaderAliases,
    pub news: NewsConfig,
}

impl StrategyConfig {
    pub fn scoring_engine(&self) -> ScoringEngine {
        ScoringEngine::new(self.weights.clone(), self.penalty_caps.clone())
            .with_ranges(self.feature_ranges.clone())
    }

    /// Human-readable echo of the active filters, for the run summary.
    pub fn filter_descriptions(&self) -> Vec<String> {
        self.rules.iter().map(ToString::to_string).collect()
    }
}
