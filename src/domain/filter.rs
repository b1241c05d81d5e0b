//! Hard filter rules and their evaluation.
//!
//! Every rule is evaluated against every row so a rejected row carries the
//! full list of rules it failed. A rule whose input field is absent passes;
//! missing data never disqualifies a security on its own. The earnings rule
//! is the one exception, and only when configured with
//! [`MissingEarningsPolicy::Reject`].

use crate::domain::record::NormalizedRecord;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingEarningsPolicy {
    #[default]
    Pass,
    Reject,
}

impl MissingEarningsPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pass" => Some(Self::Pass),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HardFilterRule {
    PriceMin(f64),
    PriceMax(f64),
    AvgVolMin(f64),
    RelVolMin(f64),
    FloatMin(f64),
    EarningsWindow {
        days: i64,
        missing: MissingEarningsPolicy,
    },
    ExcludeExchanges(Vec<String>),
    ExcludeCountries(Vec<String>),
}

/// One failed rule: which rule, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub rule: &'static str,
    pub reason: String,
}

fn below(rule: &'static str, what: &str, value: Option<f64>, min: f64) -> Option<Rejection> {
    let v = value?;
    (v < min).then(|| Rejection {
        rule,
        reason: format!("{what} {v} below minimum {min}"),
    })
}

fn listed(rule: &'static str, what: &str, value: Option<&str>, list: &[String]) -> Option<Rejection> {
    let v = value?;
    list.iter()
        .any(|item| item.eq_ignore_ascii_case(v.trim()))
        .then(|| Rejection {
            rule,
            reason: format!("{what} {v} is excluded"),
        })
}

impl HardFilterRule {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PriceMin(_) => "price_min",
            Self::PriceMax(_) => "price_max",
            Self::AvgVolMin(_) => "avg_vol_min",
            Self::RelVolMin(_) => "rel_vol_min",
            Self::FloatMin(_) => "float_min",
            Self::EarningsWindow { .. } => "earnings_window",
            Self::ExcludeExchanges(_) => "exclude_exchanges",
            Self::ExcludeCountries(_) => "exclude_countries",
        }
    }

    /// `None` when the row passes this rule.
    pub fn check(&self, r: &NormalizedRecord) -> Option<Rejection> {
        let name = self.name();
        match self {
            Self::PriceMin(min) => below(name, "price", r.price, *min),
            Self::PriceMax(max) => {
                let v = r.price?;
                (v > *max).then(|| Rejection {
                    rule: name,
                    reason: format!("price {v} above maximum {max}"),
                })
            }
            Self::AvgVolMin(min) => below(name, "average volume", r.avg_volume, *min),
            Self::RelVolMin(min) => below(name, "relative volume", r.rel_volume, *min),
            Self::FloatMin(min) => below(name, "float", r.float_shares, *min),
            Self::EarningsWindow { days, missing } => match r.days_to_earnings {
                Some(d) if d.abs() <= *days => Some(Rejection {
                    rule: name,
                    reason: format!("earnings in {d} days, within {days}-day window"),
                }),
                Some(_) => None,
                None => (*missing == MissingEarningsPolicy::Reject).then(|| Rejection {
                    rule: name,
                    reason: "earnings date unknown".to_string(),
                }),
            },
            Self::ExcludeExchanges(list) => listed(name, "exchange", r.exchange.as_deref(), list),
            Self::ExcludeCountries(list) => listed(name, "country", r.country.as_deref(), list),
        }
    }
}

impl fmt::Display for HardFilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PriceMin(v) | Self::PriceMax(v) | Self::AvgVolMin(v) | Self::RelVolMin(v)
            | Self::FloatMin(v) => write!(f, "{} = {}", self.name(), v),
            Self::EarningsWindow { days, missing } => {
                write!(f, "{} = {} days (missing: {:?})", self.name(), days, missing)
            }
            Self::ExcludeExchanges(list) | Self::ExcludeCountries(list) => {
                write!(f, "{} = [{}]", self.name(), list.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterResult {
    pub record: NormalizedRecord,
    pub rejections: Vec<Rejection>,
}

impl FilterResult {
    pub fn passed(&self) -> bool {
        self.rejections.is_empty()
    }
}

/// Rows partitioned by outcome, each side in input order.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub passed: Vec<FilterResult>,
    pub rejected: Vec<FilterResult>,
}

impl FilterOutcome {
    pub fn passed_records(&self) -> impl Iterator<Item = &NormalizedRecord> {
        self.passed.iter().map(|r| &r.record)
    }
}

pub fn evaluate(record: NormalizedRecord, rules: &[HardFilterRule]) -> FilterResult {
    let rejections = rules.iter().filter_map(|rule| rule.check(&record)).collect();
    FilterResult { record, rejections }
}

/// Apply every rule to every row.
pub fn filter(rows: Vec<NormalizedRecord>, rules: &[HardFilterRule]) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();
    for row in rows {
        let result = evaluate(row, rules);
        if result.passed() {
            outcome.passed.push(result);
        } else {
            tracing::debug!(
                symbol = %result.record.symbol,
                rules = ?result.rejections.iter().map(|r| r.rule).collect::<Vec<_>>(),
                "rejected"
            );
            outcome.rejected.push(result);
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(symbol: &str) -> NormalizedRecord {
        NormalizedRecord {
            price: Some(20.0),
            avg_volume: Some(2_000_000.0),
            rel_volume: Some(2.0),
            float_shares: Some(50e6),
            days_to_earnings: Some(30),
            exchange: Some("NASDAQ".into()),
            country: Some("USA".into()),
            ..NormalizedRecord::new(symbol)
        }
    }

    fn rules() -> Vec<HardFilterRule> {
        vec![
            HardFilterRule::PriceMin(5.0),
            HardFilterRule::PriceMax(200.0),
            HardFilterRule::AvgVolMin(1_000_000.0),
            HardFilterRule::RelVolMin(1.5),
            HardFilterRule::FloatMin(5e6),
            HardFilterRule::EarningsWindow {
                days: 2,
                missing: MissingEarningsPolicy::Pass,
            },
            HardFilterRule::ExcludeExchanges(vec!["OTC".into()]),
            HardFilterRule::ExcludeCountries(vec!["China".into()]),
        ]
    }

    #[test]
    fn healthy_row_passes_all_rules() {
        let result = evaluate(rec("AAA"), &rules());
        assert!(result.passed());
    }

    #[test]
    fn every_failed_rule_is_recorded_in_config_order() {
        let mut r = rec("AAA");
        r.price = Some(2.0);
        r.avg_volume = Some(10_000.0);
        r.exchange = Some("otc".into());
        let result = evaluate(r, &rules());
        let names: Vec<_> = result.rejections.iter().map(|x| x.rule).collect();
        assert_eq!(names, vec!["price_min", "avg_vol_min", "exclude_exchanges"]);
    }

    #[test]
    fn rule_order_changes_reason_order_only() {
        let mut r = rec("AAA");
        r.price = Some(2.0);
        r.avg_volume = Some(10.0);
        let mut reversed = rules();
        reversed.reverse();

        let forward = evaluate(r.clone(), &rules());
        let backward = evaluate(r, &reversed);
        assert_eq!(forward.passed(), backward.passed());
        let mut a: Vec<_> = forward.rejections.iter().map(|x| x.rule).collect();
        let mut b: Vec<_> = backward.rejections.iter().map(|x| x.rule).collect();
        assert_ne!(a, b);
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[test]
    fn absent_fields_pass_their_rules() {
        let r = NormalizedRecord::new("AAA");
        let result = evaluate(r, &rules());
        assert!(result.passed(), "{:?}", result.rejections);
    }

    #[test]
    fn earnings_window_is_symmetric_around_run_date() {
        let rule = HardFilterRule::EarningsWindow {
            days: 2,
            missing: MissingEarningsPolicy::Pass,
        };
        for (days, rejected) in [(-3, false), (-2, true), (0, true), (2, true), (3, false)] {
            let mut r = rec("AAA");
            r.days_to_earnings = Some(days);
            assert_eq!(rule.check(&r).is_some(), rejected, "days={days}");
        }
    }

    #[test]
    fn missing_earnings_policy_reject() {
        let rule = HardFilterRule::EarningsWindow {
            days: 2,
            missing: MissingEarningsPolicy::Reject,
        };
        let mut r = rec("AAA");
        r.days_to_earnings = None;
        let rejection = rule.check(&r).unwrap();
        assert_eq!(rejection.rule, "earnings_window");
        assert_eq!(rejection.reason, "earnings date unknown");
    }

    #[test]
    fn policy_parse() {
        assert_eq!(MissingEarningsPolicy::parse(" Reject "), Some(MissingEarningsPolicy::Reject));
        assert_eq!(MissingEarningsPolicy::parse("pass"), Some(MissingEarningsPolicy::Pass));
        assert_eq!(MissingEarningsPolicy::parse("maybe"), None);
    }

    #[test]
    fn filter_partitions_preserving_order() {
        let mut low = rec("BBB");
        low.price = Some(1.0);
        let mut low2 = rec("DDD");
        low2.price = Some(1.0);
        let rows = vec![rec("AAA"), low, rec("CCC"), low2, rec("EEE")];

        let outcome = filter(rows, &rules());
        let passed: Vec<_> = outcome.passed_records().map(|r| r.symbol.as_str()).collect();
        let rejected: Vec<_> = outcome.rejected.iter().map(|r| r.record.symbol.as_str()).collect();
        assert_eq!(passed, vec!["AAA", "CCC", "EEE"]);
        assert_eq!(rejected, vec!["BBB", "DDD"]);
    }

    #[test]
    fn display_describes_threshold() {
        assert_eq!(HardFilterRule::PriceMin(5.0).to_string(), "price_min = 5");
        assert_eq!(
            HardFilterRule::ExcludeExchanges(vec!["OTC".into(), "PINK".into()]).to_string(),
            "exclude_exchanges = [OTC, PINK]"
        );
    }
}
