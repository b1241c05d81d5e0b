//! Strategy configuration validation.
//!
//! Every option is checked before any row is processed; the first bad value
//! aborts with [`PremarketError::ConfigInvalid`] or
//! [`PremarketError::ConfigMissing`].

use crate::domain::error::PremarketError;
use crate::domain::feature::{Feature, ReferenceRange};
use crate::domain::field::{CanonicalField, HeaderAliases};
use crate::domain::filter::{HardFilterRule, MissingEarningsPolicy};
use crate::domain::scoring::{FeatureWeights, PenaltyCaps};
use crate::domain::strategy::{DEFAULT_FRESHNESS_HOURS, NewsConfig, StrategyConfig};
use crate::ports::config_port::ConfigPort;
use std::collections::BTreeMap;

const FILTERS: &str = "filters";
const SELECTION: &str = "selection";
const WEIGHTS: &str = "weights";
const PENALTY_CAPS: &str = "penalty_caps";
const FEATURE_RANGES: &str = "feature_ranges";
const ALIASES: &str = "aliases";
const NEWS: &str = "news";

const REQUIRED_FILTERS: [&str; 3] = ["price_min", "avg_vol_min", "earnings_exclude_window_days"];

/// Validate the whole strategy file and build the typed configuration.
pub fn load_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, PremarketError> {
    let rules = validate_filters(config)?;
    let (top_n, max_per_sector) = validate_selection(config)?;
    let weights = validate_weights(config)?;
    let penalty_caps = validate_penalty_caps(config)?;
    let feature_ranges = validate_feature_ranges(config)?;
    let aliases = validate_aliases(config)?;
    let news = validate_news(config)?;

    Ok(StrategyConfig {
        rules,
        weights,
        penalty_caps,
        feature_ranges,
        top_n,
        max_per_sector,
        aliases,
        news,
    })
}

/// Trimmed value, or `None` when unset or blank.
fn value(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_f64(section: &str, key: &str, raw: &str) -> Result<f64, PremarketError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(PremarketError::invalid(
            section,
            key,
            format!("expected a finite number, got '{raw}'"),
        )),
    }
}

fn parse_threshold(key: &str, raw: &str) -> Result<f64, PremarketError> {
    let v = parse_f64(FILTERS, key, raw)?;
    if v < 0.0 {
        return Err(PremarketError::invalid(
            FILTERS,
            key,
            format!("{key} must be non-negative"),
        ));
    }
    Ok(v)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_filters(config: &dyn ConfigPort) -> Result<Vec<HardFilterRule>, PremarketError> {
    for key in REQUIRED_FILTERS {
        if value(config, FILTERS, key).is_none() {
            return Err(PremarketError::missing(FILTERS, key));
        }
    }

    let missing = match value(config, FILTERS, "missing_earnings_policy") {
        None => MissingEarningsPolicy::default(),
        Some(raw) => MissingEarningsPolicy::parse(&raw).ok_or_else(|| {
            PremarketError::invalid(
                FILTERS,
                "missing_earnings_policy",
                format!("expected 'pass' or 'reject', got '{raw}'"),
            )
        })?,
    };

    let mut rules = Vec::new();
    for key in config.get_keys(FILTERS) {
        let Some(raw) = value(config, FILTERS, &key) else {
            // A blank threshold disables its rule.
            continue;
        };
        let rule = match key.as_str() {
            "price_min" => HardFilterRule::PriceMin(parse_threshold(&key, &raw)?),
            "price_max" => HardFilterRule::PriceMax(parse_threshold(&key, &raw)?),
            "avg_vol_min" => HardFilterRule::AvgVolMin(parse_threshold(&key, &raw)?),
            "rel_vol_min" => HardFilterRule::RelVolMin(parse_threshold(&key, &raw)?),
            "float_min" => HardFilterRule::FloatMin(parse_threshold(&key, &raw)?),
            "earnings_exclude_window_days" => {
                let days = raw.parse::<i64>().ok().filter(|d| *d >= 0).ok_or_else(|| {
                    PremarketError::invalid(
                        FILTERS,
                        &key,
                        format!("expected a non-negative integer, got '{raw}'"),
                    )
                })?;
                HardFilterRule::EarningsWindow { days, missing }
            }
            "exclude_exchanges" => HardFilterRule::ExcludeExchanges(parse_list(&raw)),
            "exclude_countries" => HardFilterRule::ExcludeCountries(parse_list(&raw)),
            "missing_earnings_policy" => continue,
            other => {
                return Err(PremarketError::invalid(
                    FILTERS,
                    other,
                    "unknown filter option",
                ));
            }
        };
        if matches!(&rule, HardFilterRule::ExcludeExchanges(l) | HardFilterRule::ExcludeCountries(l) if l.is_empty())
        {
            continue;
        }
        rules.push(rule);
    }

    let price_min = rules.iter().find_map(|r| match r {
        HardFilterRule::PriceMin(v) => Some(*v),
        _ => None,
    });
    let price_max = rules.iter().find_map(|r| match r {
        HardFilterRule::PriceMax(v) => Some(*v),
        _ => None,
    });
    if let (Some(lo), Some(hi)) = (price_min, price_max) {
        if hi < lo {
            return Err(PremarketError::invalid(
                FILTERS,
                "price_max",
                format!("price_max {hi} is below price_min {lo}"),
            ));
        }
    }
    Ok(rules)
}

fn validate_selection(config: &dyn ConfigPort) -> Result<(usize, f64), PremarketError> {
    let raw = value(config, SELECTION, "top_n")
        .ok_or_else(|| PremarketError::missing(SELECTION, "top_n"))?;
    let top_n = raw
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| {
            PremarketError::invalid(SELECTION, "top_n", "top_n must be a positive integer")
        })?;

    let raw = value(config, SELECTION, "max_per_sector")
        .ok_or_else(|| PremarketError::missing(SELECTION, "max_per_sector"))?;
    let max_per_sector = parse_f64(SELECTION, "max_per_sector", &raw)?;
    if max_per_sector <= 0.0 || max_per_sector > 1.0 {
        return Err(PremarketError::invalid(
            SELECTION,
            "max_per_sector",
            "max_per_sector must be in (0, 1]",
        ));
    }
    Ok((top_n, max_per_sector))
}

fn feature_key(section: &str, key: &str) -> Result<Feature, PremarketError> {
    Feature::from_name(key)
        .ok_or_else(|| PremarketError::invalid(section, key, "unknown feature"))
}

fn validate_weights(config: &dyn ConfigPort) -> Result<FeatureWeights, PremarketError> {
    let mut weights = FeatureWeights::default();
    for key in config.get_keys(WEIGHTS) {
        let feature = feature_key(WEIGHTS, &key)?;
        let raw = value(config, WEIGHTS, &key)
            .ok_or_else(|| PremarketError::invalid(WEIGHTS, &key, "weight is blank"))?;
        weights.set(feature, parse_f64(WEIGHTS, &key, &raw)?);
    }
    if weights.is_empty() {
        return Err(PremarketError::invalid(
            WEIGHTS,
            "*",
            "at least one feature weight is required",
        ));
    }
    Ok(weights)
}

fn validate_penalty_caps(config: &dyn ConfigPort) -> Result<PenaltyCaps, PremarketError> {
    let mut caps = PenaltyCaps::default();
    for key in config.get_keys(PENALTY_CAPS) {
        let raw = value(config, PENALTY_CAPS, &key)
            .ok_or_else(|| PremarketError::invalid(PENALTY_CAPS, &key, "cap is blank"))?;
        let cap = parse_f64(PENALTY_CAPS, &key, &raw)?;
        if cap < 0.0 {
            return Err(PremarketError::invalid(
                PENALTY_CAPS,
                &key,
                "cap must be non-negative",
            ));
        }
        if key == "default" {
            caps.default = Some(cap);
        } else {
            caps.per_feature.insert(feature_key(PENALTY_CAPS, &key)?, cap);
        }
    }
    Ok(caps)
}

fn validate_feature_ranges(
    config: &dyn ConfigPort,
) -> Result<BTreeMap<Feature, ReferenceRange>, PremarketError> {
    let mut ranges = BTreeMap::new();
    for key in config.get_keys(FEATURE_RANGES) {
        let feature = feature_key(FEATURE_RANGES, &key)?;
        let raw = value(config, FEATURE_RANGES, &key).unwrap_or_default();
        let bounds: Vec<&str> = raw.split(',').map(str::trim).collect();
        let [lo, hi] = bounds.as_slice() else {
            return Err(PremarketError::invalid(
                FEATURE_RANGES,
                &key,
                format!("expected 'lo, hi', got '{raw}'"),
            ));
        };
        let lo = parse_f64(FEATURE_RANGES, &key, lo)?;
        let hi = parse_f64(FEATURE_RANGES, &key, hi)?;
        if lo == hi {
            return Err(PremarketError::invalid(
                FEATURE_RANGES,
                &key,
                "range bounds must differ",
            ));
        }
        ranges.insert(feature, ReferenceRange::new(lo, hi));
    }
    Ok(ranges)
}

fn validate_aliases(config: &dyn ConfigPort) -> Result<HeaderAliases, PremarketError> {
    let mut aliases = HeaderAliases::default();
    for key in config.get_keys(ALIASES) {
        let field = CanonicalField::from_name(&key)
            .ok_or_else(|| PremarketError::invalid(ALIASES, &key, "unknown canonical field"))?;
        let names = value(config, ALIASES, &key)
            .map(|raw| parse_list(&raw))
            .unwrap_or_default();
        aliases.prepend(field, names);
    }
    Ok(aliases)
}

fn validate_news(config: &dyn ConfigPort) -> Result<NewsConfig, PremarketError> {
    let enabled = config
        .get_bool(NEWS, "enabled")
        .map_err(|raw| {
            PremarketError::invalid(NEWS, "enabled", format!("expected a boolean, got '{raw}'"))
        })?
        .unwrap_or(false);
    let freshness_hours = match value(config, NEWS, "freshness_hours") {
        None => DEFAULT_FRESHNESS_HOURS,
        Some(raw) => raw.parse::<u32>().ok().filter(|h| *h >= 1).ok_or_else(|| {
            PremarketError::invalid(NEWS, "freshness_hours", "freshness_hours must be at least 1")
        })?,
    };
    Ok(NewsConfig {
        enabled,
        freshness_hours,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const BASE: &str = r#"
[filters]
price_min = 5
price_max = 200
avg_vol_min = 1000000
earnings_exclude_window_days = 2
exclude_exchanges = OTC, PINK
exclude_countries =

[selection]
top_n = 20
max_per_sector = 0.3

[weights]
relvol = 1.0
gap = 0.5
"#;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn with(extra: &str) -> FileConfigAdapter {
        make_config(&format!("{BASE}\n{extra}"))
    }

    fn replace(from: &str, to: &str) -> FileConfigAdapter {
        make_config(&BASE.replace(from, to))
    }

    fn invalid_key(result: Result<StrategyConfig, PremarketError>) -> String {
        match result {
            Err(PremarketError::ConfigInvalid { key, .. }) => key,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn valid_config_builds_strategy() {
        let strategy = load_strategy_config(&make_config(BASE)).unwrap();
        assert_eq!(strategy.top_n, 20);
        assert_eq!(strategy.max_per_sector, 0.3);
        assert_eq!(
            strategy.rules,
            vec![
                HardFilterRule::PriceMin(5.0),
                HardFilterRule::PriceMax(200.0),
                HardFilterRule::AvgVolMin(1e6),
                HardFilterRule::EarningsWindow {
                    days: 2,
                    missing: MissingEarningsPolicy::Pass
                },
                HardFilterRule::ExcludeExchanges(vec!["OTC".into(), "PINK".into()]),
            ]
        );
        let order: Vec<Feature> = strategy.weights.iter().map(|(f, _)| f).collect();
        assert_eq!(order, vec![Feature::Relvol, Feature::Gap]);
        assert!(!strategy.news.enabled);
        assert!(strategy.feature_ranges.is_empty());
    }

    #[test]
    fn missing_required_filter_fails() {
        let result = load_strategy_config(&replace("price_min = 5\n", ""));
        assert!(matches!(
            result,
            Err(PremarketError::ConfigMissing { ref key, .. }) if key == "price_min"
        ));
    }

    #[test]
    fn negative_threshold_fails() {
        let key = invalid_key(load_strategy_config(&replace("price_min = 5", "price_min = -1")));
        assert_eq!(key, "price_min");
    }

    #[test]
    fn non_numeric_threshold_fails() {
        let key = invalid_key(load_strategy_config(&replace(
            "avg_vol_min = 1000000",
            "avg_vol_min = lots",
        )));
        assert_eq!(key, "avg_vol_min");
    }

    #[test]
    fn price_max_below_price_min_fails() {
        let key = invalid_key(load_strategy_config(&replace("price_max = 200", "price_max = 1")));
        assert_eq!(key, "price_max");
    }

    #[test]
    fn unknown_filter_option_fails() {
        let key = invalid_key(load_strategy_config(&replace(
            "price_max = 200",
            "price_max = 200\nmystery = 3",
        )));
        assert_eq!(key, "mystery");
    }

    #[test]
    fn missing_earnings_policy_is_validated() {
        let strategy = load_strategy_config(&replace(
            "earnings_exclude_window_days = 2",
            "missing_earnings_policy = reject\nearnings_exclude_window_days = 2",
        ))
        .unwrap();
        assert!(strategy.rules.contains(&HardFilterRule::EarningsWindow {
            days: 2,
            missing: MissingEarningsPolicy::Reject
        }));

        let key = invalid_key(load_strategy_config(&replace(
            "earnings_exclude_window_days = 2",
            "earnings_exclude_window_days = 2\nmissing_earnings_policy = maybe",
        )));
        assert_eq!(key, "missing_earnings_policy");
    }

    #[test]
    fn negative_earnings_window_fails() {
        let key = invalid_key(load_strategy_config(&replace(
            "earnings_exclude_window_days = 2",
            "earnings_exclude_window_days = -2",
        )));
        assert_eq!(key, "earnings_exclude_window_days");
    }

    #[test]
    fn top_n_zero_fails() {
        let key = invalid_key(load_strategy_config(&replace("top_n = 20", "top_n = 0")));
        assert_eq!(key, "top_n");
    }

    #[test]
    fn max_per_sector_out_of_range_fails() {
        for bad in ["0", "1.5", "-0.2", "NaN"] {
            let key = invalid_key(load_strategy_config(&replace(
                "max_per_sector = 0.3",
                &format!("max_per_sector = {bad}"),
            )));
            assert_eq!(key, "max_per_sector");
        }
    }

    #[test]
    fn missing_selection_key_fails() {
        let result = load_strategy_config(&replace("max_per_sector = 0.3\n", ""));
        assert!(matches!(result, Err(PremarketError::ConfigMissing { .. })));
    }

    #[test]
    fn unknown_weight_feature_fails() {
        let key = invalid_key(load_strategy_config(&replace("gap = 0.5", "moonshot = 0.5")));
        assert_eq!(key, "moonshot");
    }

    #[test]
    fn no_weights_fails() {
        let result = load_strategy_config(&replace("relvol = 1.0\ngap = 0.5\n", ""));
        assert!(matches!(result, Err(PremarketError::ConfigInvalid { .. })));
    }

    #[test]
    fn penalty_caps_accept_default_and_zero() {
        let strategy =
            load_strategy_config(&with("[penalty_caps]\ndefault = 3\nrelvol = 0\n")).unwrap();
        assert_eq!(strategy.penalty_caps.default, Some(3.0));
        assert_eq!(strategy.penalty_caps.cap_for(Feature::Relvol), 0.0);
        assert_eq!(strategy.penalty_caps.cap_for(Feature::Gap), 3.0);
    }

    #[test]
    fn negative_cap_fails() {
        let key = invalid_key(load_strategy_config(&with("[penalty_caps]\ngap = -1\n")));
        assert_eq!(key, "gap");
    }

    #[test]
    fn feature_ranges_parse_pairs() {
        let strategy = load_strategy_config(&with("[feature_ranges]\nrelvol = 0.5, 3\n")).unwrap();
        assert_eq!(
            strategy.feature_ranges[&Feature::Relvol],
            ReferenceRange::new(0.5, 3.0)
        );
    }

    #[test]
    fn degenerate_or_malformed_range_fails() {
        let key = invalid_key(load_strategy_config(&with("[feature_ranges]\ngap = 2, 2\n")));
        assert_eq!(key, "gap");
        let key = invalid_key(load_strategy_config(&with("[feature_ranges]\ngap = 2\n")));
        assert_eq!(key, "gap");
    }

    #[test]
    fn aliases_prepend_configured_headers() {
        let strategy = load_strategy_config(&with("[aliases]\navg_volume = Avg Vol, AV\n")).unwrap();
        let names = strategy.aliases.aliases(CanonicalField::AvgVolume);
        assert_eq!(&names[..2], ["Avg Vol", "AV"]);
    }

    #[test]
    fn unknown_alias_field_fails() {
        let key = invalid_key(load_strategy_config(&with("[aliases]\nwidgets = W\n")));
        assert_eq!(key, "widgets");
    }

    #[test]
    fn news_options() {
        let strategy =
            load_strategy_config(&with("[news]\nenabled = true\nfreshness_hours = 12\n")).unwrap();
        assert!(strategy.news.enabled);
        assert_eq!(strategy.news.freshness_hours, 12);

        let key = invalid_key(load_strategy_config(&with("[news]\nfreshness_hours = 0\n")));
        assert_eq!(key, "freshness_hours");
        let key = invalid_key(load_strategy_config(&with("[news]\nenabled = perhaps\n")));
        assert_eq!(key, "enabled");
    }
}
