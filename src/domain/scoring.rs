//! Weighted composite scoring and the deterministic ranking order.
//!
//! Composite score = Σ clamp(transform(feature), -cap, +cap) × weight over the
//! configured features, in their declared order. Absent features contribute 0.

use crate::domain::feature::{Feature, ReferenceRange};
use crate::domain::filter::FilterResult;
use crate::domain::record::NormalizedRecord;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// How many contributions are surfaced per row for explanation.
pub const TOP_FEATURES: usize = 5;

/// Feature weights in declaration order. Declaration order breaks ties
/// between equal-magnitude contributions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureWeights {
    entries: Vec<(Feature, f64)>,
}

impl FeatureWeights {
    /// Later entries for an already-declared feature replace its weight but
    /// keep the original position.
    pub fn new<I: IntoIterator<Item = (Feature, f64)>>(entries: I) -> Self {
        let mut weights = Self::default();
        for (feature, weight) in entries {
            weights.set(feature, weight);
        }
        weights
    }

    pub fn set(&mut self, feature: Feature, weight: f64) {
        match self.entries.iter_mut().find(|(f, _)| *f == feature) {
            Some(entry) => entry.1 = weight,
            None => self.entries.push((feature, weight)),
        }
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.entries.iter().find(|(f, _)| *f == feature).map(|(_, w)| *w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Symmetric caps on transformed feature values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PenaltyCaps {
    pub per_feature: BTreeMap<Feature, f64>,
    /// Applies to features without their own cap.
    pub default: Option<f64>,
}

impl PenaltyCaps {
    pub fn cap_for(&self, feature: Feature) -> f64 {
        self.per_feature
            .get(&feature)
            .copied()
            .or(self.default)
            .unwrap_or(f64::INFINITY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contribution {
    pub feature: Feature,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    pub record: NormalizedRecord,
    pub score: f64,
    /// One entry per configured feature, in declaration order.
    pub contributions: Vec<Contribution>,
    pub top_features: Vec<Contribution>,
}

impl ScoredRecord {
    pub fn symbol(&self) -> &str {
        &self.record.symbol
    }

    pub fn contribution(&self, feature: Feature) -> Option<f64> {
        self.contributions
            .iter()
            .find(|c| c.feature == feature)
            .map(|c| c.value)
    }
}

/// Score descending, then symbol ascending. A total order.
pub fn rank_order(a: &ScoredRecord, b: &ScoredRecord) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.record.symbol.cmp(&b.record.symbol))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringEngine {
    weights: FeatureWeights,
    caps: PenaltyCaps,
    ranges: BTreeMap<Feature, ReferenceRange>,
}

impl ScoringEngine {
    pub fn new(weights: FeatureWeights, caps: PenaltyCaps) -> Self {
        Self {
            weights,
            caps,
            ranges: BTreeMap::new(),
        }
    }

    pub fn with_ranges(mut self, ranges: BTreeMap<Feature, ReferenceRange>) -> Self {
        self.ranges = ranges;
        self
    }

    pub fn range_for(&self, feature: Feature) -> ReferenceRange {
        self.ranges
            .get(&feature)
            .copied()
            .unwrap_or_else(|| feature.default_range())
    }

    pub fn score_record(&self, record: &NormalizedRecord) -> ScoredRecord {
        let contributions: Vec<Contribution> = self
            .weights
            .iter()
            .map(|(feature, weight)| {
                let value = match feature.transform(record, &self.range_for(feature)) {
                    Some(t) => {
                        let cap = self.caps.cap_for(feature);
                        let v = t.clamp(-cap, cap) * weight;
                        // Normalise negative zero so audit output reads "0".
                        if v == 0.0 { 0.0 } else { v }
                    }
                    None => 0.0,
                };
                Contribution { feature, value }
            })
            .collect();

        let score = contributions.iter().map(|c| c.value).sum();

        let mut top: Vec<Contribution> = contributions
            .iter()
            .copied()
            .filter(|c| c.value != 0.0)
            .collect();
        // Stable sort: equal magnitudes stay in declaration order.
        top.sort_by(|a, b| b.value.abs().total_cmp(&a.value.abs()));
        top.truncate(TOP_FEATURES);

        ScoredRecord {
            record: record.clone(),
            score,
            contributions,
            top_features: top,
        }
    }

    /// Score the passing rows, sorted by [`rank_order`]. Rejected rows are never scored.
    pub fn score(&self, rows: &[FilterResult]) -> Vec<ScoredRecord> {
        let mut scored: Vec<ScoredRecord> = rows
            .iter()
            .filter(|r| r.passed())
            .map(|r| self.score_record(&r.record))
            .collect();
        scored.sort_by(rank_order);
        scored
    }
}
