#![allow(dead_code)]

use chrono::NaiveDate;
use premarket::domain::error::PremarketError;
use premarket::domain::feature::Feature;
use premarket::domain::field::HeaderAliases;
use premarket::domain::filter::{HardFilterRule, MissingEarningsPolicy};
use premarket::domain::record::{NormalizedRecord, RawRecord};
use premarket::domain::scoring::{FeatureWeights, PenaltyCaps, ScoredRecord};
use premarket::domain::strategy::{NewsConfig, StrategyConfig};
use premarket::ports::export_port::{AcquiredExport, ExportPort};
use premarket::ports::news_port::{NewsPort, NewsSignal};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

pub const HEADER: &str = "No.,Ticker,Company,Sector,Industry,Country,Exchange,Market Cap,P/E,\
Price,Change,Gap,Volume,Average Volume,Relative Volume,Shares Float,Short Float,\
After-Hours Change,52-Week Range,Earnings Date,Analyst Recom";

/// One export line in [`HEADER`] column order.
pub struct ExportRow {
    pub ticker: String,
    pub sector: String,
    pub exchange: String,
    pub price: String,
    pub gap: String,
    pub avg_volume: String,
    pub rel_volume: String,
    pub float: String,
    pub earnings: String,
}

impl ExportRow {
    pub fn new(ticker: &str, sector: &str) -> Self {
        Self {
            ticker: ticker.into(),
            sector: sector.into(),
            exchange: "NASD".into(),
            price: "25.00".into(),
            gap: "2.00%".into(),
            avg_volume: "2.5M".into(),
            rel_volume: "3.00".into(),
            float: "80.00M".into(),
            earnings: "".into(),
        }
    }

    pub fn price(mut self, v: &str) -> Self {
        self.price = v.into();
        self
    }

    pub fn gap(mut self, v: &str) -> Self {
        self.gap = v.into();
        self
    }

    pub fn avg_volume(mut self, v: &str) -> Self {
        self.avg_volume = v.into();
        self
    }

    pub fn rel_volume(mut self, v: &str) -> Self {
        self.rel_volume = v.into();
        self
    }

    pub fn float(mut self, v: &str) -> Self {
        self.float = v.into();
        self
    }

    pub fn exchange(mut self, v: &str) -> Self {
        self.exchange = v.into();
        self
    }

    pub fn earnings(mut self, v: &str) -> Self {
        self.earnings = v.into();
        self
    }

    fn line(&self, n: usize) -> String {
        format!(
            "{n},{t},{t} Inc,{s},Software,USA,{x},1.2B,18.5,{p},1.50%,{g},900K,{av},{rv},{f},4.10%,0.80%,10.00 - 30.00,{e},Buy",
            t = self.ticker,
            s = self.sector,
            x = self.exchange,
            p = self.price,
            g = self.gap,
            av = self.avg_volume,
            rv = self.rel_volume,
            f = self.float,
            e = self.earnings,
        )
    }
}

pub fn export_csv(rows: &[ExportRow]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&row.line(i + 1));
        out.push('\n');
    }
    out
}

pub fn raw_rows(rows: &[ExportRow]) -> Vec<RawRecord> {
    premarket::adapters::csv_adapter::parse_export(export_csv(rows).as_bytes(), "fixture.csv")
        .unwrap()
}

/// Export port serving a fixed body from a file, or failing.
pub struct MockExportPort {
    pub path: PathBuf,
    pub used_cache: bool,
    pub error: Option<String>,
}

impl MockExportPort {
    pub fn with_body(dir: &Path, body: &str) -> Self {
        let path = dir.join("finviz_elite.csv");
        fs::write(&path, body).unwrap();
        Self {
            path,
            used_cache: false,
            error: None,
        }
    }

    pub fn cached(mut self) -> Self {
        self.used_cache = true;
        self
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            path: PathBuf::new(),
            used_cache: false,
            error: Some(reason.to_string()),
        }
    }
}

impl ExportPort for MockExportPort {
    fn acquire(&self, _run_date: NaiveDate, _use_cache: bool) -> Result<AcquiredExport, PremarketError> {
        if let Some(reason) = &self.error {
            return Err(PremarketError::Acquisition {
                reason: reason.clone(),
            });
        }
        Ok(AcquiredExport {
            path: self.path.clone(),
            used_cache: self.used_cache,
        })
    }
}

#[derive(Default)]
pub struct MockNewsPort {
    pub signals: HashMap<String, NewsSignal>,
}

impl MockNewsPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signal(mut self, symbol: &str, hours_since_latest: f64) -> Self {
        self.signals
            .insert(symbol.to_string(), NewsSignal { hours_since_latest });
        self
    }
}

impl NewsPort for MockNewsPort {
    fn probe(&self, symbols: &[String]) -> HashMap<String, NewsSignal> {
        symbols
            .iter()
            .filter_map(|s| self.signals.get(s).map(|sig| (s.clone(), *sig)))
            .collect()
    }
}

pub const STRATEGY_INI: &str = r#"
[filters]
price_min = 5
avg_vol_min = 1000000
rel_vol_min = 1.0
earnings_exclude_window_days = 1
exclude_exchanges = OTC

[selection]
top_n = 3
max_per_sector = 0.5

[weights]
relvol = 1.0
gap = 1.0

[penalty_caps]
default = 3.0
"#;

pub fn make_strategy(top_n: usize, max_per_sector: f64) -> StrategyConfig {
    StrategyConfig {
        rules: vec![
            HardFilterRule::PriceMin(5.0),
            HardFilterRule::AvgVolMin(1_000_000.0),
            HardFilterRule::EarningsWindow {
                days: 1,
                missing: MissingEarningsPolicy::Pass,
            },
        ],
        weights: FeatureWeights::new([(Feature::Relvol, 1.0), (Feature::Gap, 1.0)]),
        penalty_caps: PenaltyCaps {
            per_feature: BTreeMap::new(),
            default: Some(3.0),
        },
        feature_ranges: BTreeMap::new(),
        top_n,
        max_per_sector,
        aliases: HeaderAliases::default(),
        news: NewsConfig::default(),
    }
}

pub fn make_scored(symbol: &str, sector: &str, score: f64) -> ScoredRecord {
    ScoredRecord {
        record: NormalizedRecord {
            sector: Some(sector.to_string()),
            ..NormalizedRecord::new(symbol)
        },
        score,
        contributions: vec![],
        top_features: vec![],
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
