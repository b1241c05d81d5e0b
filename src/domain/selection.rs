//! Sector-capped Top-N selection.
//!
//! A single greedy forward pass over the ranked rows. Rows are only ever
//! removed, never reordered; a row skipped for its sector is not revisited.

use crate::domain::scoring::ScoredRecord;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorCapExclusion {
    pub record: ScoredRecord,
    /// 1-based position in the ranked input at the moment it was skipped.
    pub rank: usize,
    pub sector: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SelectionResult {
    pub selected: Vec<ScoredRecord>,
    pub sector_cap_applied: bool,
    pub excluded_by_sector_cap: Vec<SectorCapExclusion>,
}

impl SelectionResult {
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.selected.iter().map(|s| s.symbol()).collect()
    }
}

const CAP_SIGNIFICANT_DIGITS: i32 = 12;

/// `max(1, floor(top_n * max_per_sector))`.
pub fn sector_cap(top_n: usize, max_per_sector: f64) -> usize {
    // 100 * 0.29 = 28.999999999999996 must floor to 29, 3 * 0.9999999999 to 2.
    let raw = round_significant(top_n as f64 * max_per_sector, CAP_SIGNIFICANT_DIGITS).floor();
    (raw as usize).max(1)
}

fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10f64.powi(digits - 1 - magnitude);
    (value * factor).round() / factor
}

/// Select up to `top_n` rows from `ranked` (already in rank order).
pub fn select(ranked: &[ScoredRecord], top_n: usize, max_per_sector: f64) -> SelectionResult {
    let cap = sector_cap(top_n, max_per_sector);
    let mut per_sector: HashMap<&str, usize> = HashMap::new();
    let mut result = SelectionResult::default();

    for (idx, row) in ranked.iter().enumerate() {
        if result.selected.len() >= top_n {
            break;
        }
        let sector = row.record.sector_key();
        let count = per_sector.entry(sector).or_insert(0);
        if *count >= cap {
            tracing::debug!(symbol = row.symbol(), sector, rank = idx + 1, cap, "sector cap skip");
            result.excluded_by_sector_cap.push(SectorCapExclusion {
                record: row.clone(),
                rank: idx + 1,
                sector: sector.to_string(),
            });
            continue;
        }
        *count += 1;
        result.selected.push(row.clone());
    }

    result.sector_cap_applied = !result.excluded_by_sector_cap.is_empty();
    result
}
