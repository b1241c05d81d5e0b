//! Export normalization: raw vendor columns → [`NormalizedRecord`].
//!
//! Absent or unparseable cells become `None`. Unparseable text and missing
//! columns are recorded as [`NormalizationWarning`]s; nothing here is fatal.

use crate::domain::field::{CanonicalField, HeaderAliases};
use crate::domain::record::{NormalizedRecord, RawRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    MissingColumn,
    Unparseable,
    DuplicateSymbol,
    MissingSymbol,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingColumn => "missing column",
            Self::Unparseable => "unparseable value",
            Self::DuplicateSymbol => "duplicate symbol",
            Self::MissingSymbol => "missing symbol",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationWarning {
    pub symbol: String,
    pub field: CanonicalField,
    pub raw_value: Option<String>,
    pub kind: WarningKind,
}

#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<NormalizedRecord>,
    pub warnings: Vec<NormalizationWarning>,
}

impl Normalized {
    pub fn duplicates_dropped(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| w.kind == WarningKind::DuplicateSymbol)
            .count()
    }
}

/// Outcome of reading a single cell.
#[derive(Debug, Clone, PartialEq)]
enum Cell<T> {
    Value(T),
    Blank,
    Unparseable,
}

const BLANK_MARKERS: [&str; 4] = ["", "-", "N/A", "NA"];

fn is_blank(raw: &str) -> bool {
    let t = raw.trim();
    BLANK_MARKERS.iter().any(|m| t.eq_ignore_ascii_case(m))
}

fn parse_number(raw: &str) -> Cell<f64> {
    if is_blank(raw) {
        return Cell::Blank;
    }
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%'))
        .collect();
    let cleaned = cleaned.trim();
    let (digits, multiplier) = match cleaned.chars().last() {
        Some('K' | 'k') => (&cleaned[..cleaned.len() - 1], 1e3),
        Some('M' | 'm') => (&cleaned[..cleaned.len() - 1], 1e6),
        Some('B' | 'b') => (&cleaned[..cleaned.len() - 1], 1e9),
        Some('T' | 't') => (&cleaned[..cleaned.len() - 1], 1e12),
        _ => (cleaned, 1.0),
    };
    match digits.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Value(v * multiplier),
        _ => Cell::Unparseable,
    }
}

fn parse_range(raw: &str) -> Cell<(f64, f64)> {
    if is_blank(raw) {
        return Cell::Blank;
    }
    let parts: Vec<&str> = raw
        .split('-')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 2 {
        return Cell::Unparseable;
    }
    match (parse_number(parts[0]), parse_number(parts[1])) {
        (Cell::Value(low), Cell::Value(high)) => Cell::Value((low, high)),
        _ => Cell::Unparseable,
    }
}

fn parse_date(raw: &str) -> Cell<NaiveDate> {
    if is_blank(raw) {
        return Cell::Blank;
    }
    let t = raw.trim();
    // Some exports append a time ("01/30/2025 04:30:00 PM"); only the date matters.
    let date_part = t.split_whitespace().next().unwrap_or(t);
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(date_part, fmt) {
            return Cell::Value(d);
        }
    }
    Cell::Unparseable
}

fn parse_recommendation(raw: &str) -> Cell<f64> {
    let label = raw.trim().to_lowercase();
    let mapped = match label.as_str() {
        "strong buy" => Some(1.0),
        "buy" => Some(2.0),
        "hold" => Some(3.0),
        "sell" => Some(4.0),
        "strong sell" => Some(5.0),
        _ => None,
    };
    match mapped {
        Some(v) => Cell::Value(v),
        None => parse_number(raw),
    }
}

/// Per-row reader that resolves fields through the alias table and records warnings.
struct RowReader<'a> {
    raw: &'a RawRecord,
    aliases: &'a HeaderAliases,
    symbol: &'a str,
    warnings: &'a mut Vec<NormalizationWarning>,
}

impl RowReader<'_> {
    fn cell(&mut self, field: CanonicalField) -> Option<&str> {
        let raw = self.raw;
        match self.aliases.resolve(field, raw.headers()) {
            Some(idx) => raw.value_at(idx),
            None => {
                if field.warn_when_missing() {
                    self.warn(field, None, WarningKind::MissingColumn);
                }
                None
            }
        }
    }

    fn warn(&mut self, field: CanonicalField, raw_value: Option<&str>, kind: WarningKind) {
        tracing::warn!(
            symbol = self.symbol,
            field = field.name(),
            raw_value = raw_value.unwrap_or(""),
            "normalization: {kind}"
        );
        self.warnings.push(NormalizationWarning {
            symbol: self.symbol.to_string(),
            field,
            raw_value: raw_value.map(str::to_string),
            kind,
        });
    }

    fn typed<T>(&mut self, field: CanonicalField, parse: fn(&str) -> Cell<T>) -> Option<T> {
        let raw = self.cell(field)?.to_string();
        match parse(&raw) {
            Cell::Value(v) => Some(v),
            Cell::Blank => None,
            Cell::Unparseable => {
                self.warn(field, Some(&raw), WarningKind::Unparseable);
                None
            }
        }
    }

    fn text(&mut self, field: CanonicalField) -> Option<String> {
        self.cell(field)
            .filter(|v| !is_blank(v))
            .map(|v| v.trim().to_string())
    }

    fn number(&mut self, field: CanonicalField) -> Option<f64> {
        self.typed(field, parse_number)
    }

    /// Gap column when present, otherwise derived from price and previous close.
    fn gap(&mut self, price: Option<f64>, prev_close: Option<f64>) -> Option<f64> {
        let raw = self.raw;
        if self.aliases.resolve(CanonicalField::GapPct, raw.headers()).is_some() {
            return self.number(CanonicalField::GapPct);
        }
        match (price, prev_close) {
            (Some(p), Some(prev)) if prev != 0.0 => Some((p - prev) / prev * 100.0),
            _ => None,
        }
    }
}

fn normalize_row(
    raw: &RawRecord,
    symbol: &str,
    aliases: &HeaderAliases,
    run_date: NaiveDate,
    warnings: &mut Vec<NormalizationWarning>,
) -> NormalizedRecord {
    use CanonicalField as F;

    let mut r = RowReader {
        raw,
        aliases,
        symbol,
        warnings,
    };

    let price = r.number(F::Price);
    let prev_close = r.number(F::PrevClose);
    let gap_pct = r.gap(price, prev_close);
    let range = r.typed(F::Week52Range, parse_range);
    let earnings_date = r.typed(F::EarningsDate, parse_date);

    NormalizedRecord {
        symbol: symbol.to_string(),
        company: r.text(F::Company),
        sector: r.text(F::Sector),
        industry: r.text(F::Industry),
        exchange: r.text(F::Exchange),
        country: r.text(F::Country),
        market_cap: r.number(F::MarketCap),
        pe: r.number(F::Pe),
        price,
        prev_close,
        change_pct: r.number(F::ChangePct),
        gap_pct,
        volume: r.number(F::Volume),
        avg_volume: r.number(F::AvgVolume),
        rel_volume: r.number(F::RelVolume),
        float_shares: r.number(F::FloatShares),
        short_float_pct: r.number(F::ShortFloatPct),
        after_hours_change_pct: r.number(F::AfterHoursChangePct),
        week52_low: range.map(|(low, _)| low),
        week52_high: range.map(|(_, high)| high),
        earnings_date,
        days_to_earnings: earnings_date.map(|d| (d - run_date).num_days()),
        analyst_recom: r.typed(F::AnalystRecom, parse_recommendation),
        insider_trans_pct: r.number(F::InsiderTransPct),
        institutional_trans_pct: r.number(F::InstitutionalTransPct),
        news_freshness: None,
    }
}

/// Normalize raw export rows, preserving input order.
///
/// Rows with an empty symbol are dropped; later duplicates of a symbol are
/// dropped in favour of the first occurrence. Both are recorded as warnings.
pub fn normalize(raw_rows: &[RawRecord], aliases: &HeaderAliases, run_date: NaiveDate) -> Normalized {
    let mut out = Normalized::default();
    let mut seen: HashSet<String> = HashSet::new();

    for (row_idx, raw) in raw_rows.iter().enumerate() {
        let symbol = aliases
            .resolve(CanonicalField::Symbol, raw.headers())
            .and_then(|idx| raw.value_at(idx))
            .filter(|s| !s.trim().is_empty());

        let Some(symbol) = symbol else {
            tracing::warn!(row = row_idx + 1, "normalization: row without symbol dropped");
            out.warnings.push(NormalizationWarning {
                symbol: format!("#{}", row_idx + 1),
                field: CanonicalField::Symbol,
                raw_value: None,
                kind: WarningKind::MissingSymbol,
            });
            continue;
        };

        if !seen.insert(symbol.to_string()) {
            tracing::warn!(symbol, "normalization: duplicate symbol dropped");
            out.warnings.push(NormalizationWarning {
                symbol: symbol.to_string(),
                field: CanonicalField::Symbol,
                raw_value: Some(symbol.to_string()),
                kind: WarningKind::DuplicateSymbol,
            });
            continue;
        }

        let record = normalize_row(raw, symbol, aliases, run_date, &mut out.warnings);
        out.records.push(record);
    }

    tracing::debug!(
        input = raw_rows.len(),
        output = out.records.len(),
        warnings = out.warnings.len(),
        "normalized export"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn row(pairs: &[(&str, &str)]) -> RawRecord {
        RawRecord::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn parse_number_handles_formatting() {
        assert_eq!(parse_number("1,500,000"), Cell::Value(1_500_000.0));
        assert_eq!(parse_number("$18.50"), Cell::Value(18.5));
        assert_eq!(parse_number(" 5% "), Cell::Value(5.0));
        assert_eq!(parse_number("-1.5%"), Cell::Value(-1.5));
        assert_eq!(parse_number("1.5B"), Cell::Value(1.5e9));
        assert_eq!(parse_number("250K"), Cell::Value(250_000.0));
    }

    #[test]
    fn parse_number_blank_markers_are_not_failures() {
        for blank in ["", "  ", "-", "N/A", "na"] {
            assert_eq!(parse_number(blank), Cell::Blank, "{blank:?}");
        }
        assert_eq!(parse_number("abc"), Cell::Unparseable);
        assert_eq!(parse_number("inf"), Cell::Unparseable);
    }

    #[test]
    fn parse_range_and_date() {
        assert_eq!(parse_range("10 - 30"), Cell::Value((10.0, 30.0)));
        assert_eq!(parse_range("10"), Cell::Unparseable);
        assert_eq!(parse_date("2024-03-05"), Cell::Value(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()));
        assert_eq!(
            parse_date("03/05/2024 04:30:00 PM"),
            Cell::Value(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        );
        assert_eq!(parse_date("soon"), Cell::Unparseable);
    }

    #[test]
    fn parse_recommendation_accepts_labels_and_numbers() {
        assert_eq!(parse_recommendation("Strong Buy"), Cell::Value(1.0));
        assert_eq!(parse_recommendation("hold"), Cell::Value(3.0));
        assert_eq!(parse_recommendation("2.3"), Cell::Value(2.3));
    }

    #[test]
    fn normalizes_columns_and_types() {
        let raw = row(&[
            ("Ticker", "AAA"),
            ("Relative Vol.", "1.8"),
            ("Average Volume (3M)", "1,500,000"),
            ("Change", "5%"),
            ("52-Week Range", "10 - 20"),
            ("Price", "18.5"),
            ("Previous Close", "17.5"),
            ("Earnings Date", "2024-03-04"),
        ]);
        let out = normalize(&[raw], &HeaderAliases::finviz(), run_date());
        let rec = &out.records[0];

        assert_eq!(rec.symbol, "AAA");
        assert_eq!(rec.rel_volume, Some(1.8));
        assert_eq!(rec.avg_volume, Some(1_500_000.0));
        assert_eq!(rec.change_pct, Some(5.0));
        assert_relative_eq!(rec.gap_pct.unwrap(), (18.5 - 17.5) / 17.5 * 100.0);
        assert_relative_eq!(rec.week52_pos().unwrap(), 0.85);
        assert_eq!(rec.days_to_earnings, Some(3));
    }

    #[test]
    fn explicit_gap_column_wins_over_derivation() {
        let raw = row(&[("Ticker", "AAA"), ("Gap", "4%"), ("Price", "25"), ("Previous Close", "24")]);
        let out = normalize(&[raw], &HeaderAliases::finviz(), run_date());
        assert_eq!(out.records[0].gap_pct, Some(4.0));
    }

    #[test]
    fn missing_column_is_neutral_with_warning() {
        let raw = row(&[("Ticker", "AAA"), ("Price", "10"), ("Sector", "Technology")]);
        let out = normalize(&[raw], &HeaderAliases::finviz(), run_date());

        assert_eq!(out.records[0].avg_volume, None);
        assert!(out.warnings.iter().any(|w| w.symbol == "AAA"
            && w.field == CanonicalField::AvgVolume
            && w.kind == WarningKind::MissingColumn));
        assert!(!out.warnings.iter().any(|w| w.field == CanonicalField::Company));
    }

    #[test]
    fn unparseable_value_is_neutral_with_warning() {
        let raw = row(&[("Ticker", "AAA"), ("Price", "ten dollars")]);
        let out = normalize(&[raw], &HeaderAliases::finviz(), run_date());

        assert_eq!(out.records[0].price, None);
        let warning = out
            .warnings
            .iter()
            .find(|w| w.kind == WarningKind::Unparseable)
            .unwrap();
        assert_eq!(warning.field, CanonicalField::Price);
        assert_eq!(warning.raw_value.as_deref(), Some("ten dollars"));
    }

    #[test]
    fn blank_cells_are_neutral_without_unparseable_warning() {
        let raw = row(&[("Ticker", "AAA"), ("Price", "-"), ("Sector", "")]);
        let out = normalize(&[raw], &HeaderAliases::finviz(), run_date());
        assert_eq!(out.records[0].price, None);
        assert_eq!(out.records[0].sector, None);
        assert!(!out.warnings.iter().any(|w| w.kind == WarningKind::Unparseable));
    }

    #[test]
    fn duplicate_symbols_keep_first_occurrence() {
        let rows = vec![
            row(&[("Ticker", "AAA"), ("Price", "10")]),
            row(&[("Ticker", "BBB"), ("Price", "20")]),
            row(&[("Ticker", "AAA"), ("Price", "30")]),
            row(&[("Ticker", "AAA"), ("Price", "40")]),
        ];
        let out = normalize(&rows, &HeaderAliases::finviz(), run_date());

        let symbols: Vec<_> = out.records.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAA", "BBB"]);
        assert_eq!(out.records[0].price, Some(10.0));
        assert_eq!(out.duplicates_dropped(), 2);
    }

    #[test]
    fn rows_without_symbol_are_dropped() {
        let rows = vec![row(&[("Ticker", " "), ("Price", "10")]), row(&[("Price", "10")])];
        let out = normalize(&rows, &HeaderAliases::finviz(), run_date());
        assert!(out.records.is_empty());
        assert_eq!(
            out.warnings
                .iter()
                .filter(|w| w.kind == WarningKind::MissingSymbol)
                .count(),
            2
        );
    }

    #[test]
    fn symbol_is_preserved_unchanged() {
        let raw = row(&[("Ticker", "brk.b")]);
        let out = normalize(&[raw], &HeaderAliases::finviz(), run_date());
        assert_eq!(out.records[0].symbol, "brk.b");
    }

    #[test]
    fn configured_alias_resolves_drifted_header() {
        let mut aliases = HeaderAliases::finviz();
        aliases.prepend(CanonicalField::AvgVolume, ["Avg Vol (3 month)"]);
        let raw = row(&[("Ticker", "AAA"), ("AVG VOL (3 MONTH)", "2,000,000")]);
        let out = normalize(&[raw], &aliases, run_date());
        assert_eq!(out.records[0].avg_volume, Some(2_000_000.0));
    }
}
