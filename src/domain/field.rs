//! Canonical field schema and the vendor header alias table.
//!
//! Vendors rename export columns from time to time ("Average Volume" vs
//! "Avg Volume"). Each canonical field owns an ordered list of accepted raw
//! header names; matching is case-insensitive and whitespace-trimmed.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Symbol,
    Company,
    Sector,
    Industry,
    Exchange,
    Country,
    MarketCap,
    Pe,
    Price,
    PrevClose,
    ChangePct,
    GapPct,
    Volume,
    AvgVolume,
    RelVolume,
    FloatShares,
    ShortFloatPct,
    AfterHoursChangePct,
    Week52Range,
    EarningsDate,
    AnalystRecom,
    InsiderTransPct,
    InstitutionalTransPct,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 23] = [
        Self::Symbol,
        Self::Company,
        Self::Sector,
        Self::Industry,
        Self::Exchange,
        Self::Country,
        Self::MarketCap,
        Self::Pe,
        Self::Price,
        Self::PrevClose,
        Self::ChangePct,
        Self::GapPct,
        Self::Volume,
        Self::AvgVolume,
        Self::RelVolume,
        Self::FloatShares,
        Self::ShortFloatPct,
        Self::AfterHoursChangePct,
        Self::Week52Range,
        Self::EarningsDate,
        Self::AnalystRecom,
        Self::InsiderTransPct,
        Self::InstitutionalTransPct,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::Company => "company",
            Self::Sector => "sector",
            Self::Industry => "industry",
            Self::Exchange => "exchange",
            Self::Country => "country",
            Self::MarketCap => "market_cap",
            Self::Pe => "pe",
            Self::Price => "price",
            Self::PrevClose => "prev_close",
            Self::ChangePct => "change_pct",
            Self::GapPct => "gap_pct",
            Self::Volume => "volume",
            Self::AvgVolume => "avg_volume",
            Self::RelVolume => "rel_volume",
            Self::FloatShares => "float_shares",
            Self::ShortFloatPct => "short_float_pct",
            Self::AfterHoursChangePct => "after_hours_change_pct",
            Self::Week52Range => "week52_range",
            Self::EarningsDate => "earnings_date",
            Self::AnalystRecom => "analyst_recom",
            Self::InsiderTransPct => "insider_trans_pct",
            Self::InstitutionalTransPct => "institutional_trans_pct",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|f| f.name() == wanted)
    }

    /// Whether an absent column for this field is worth a warning. Purely
    /// descriptive columns, and inputs that only feed derived values, stay quiet.
    pub fn warn_when_missing(self) -> bool {
        !matches!(
            self,
            Self::Symbol
                | Self::Company
                | Self::Industry
                | Self::MarketCap
                | Self::PrevClose
                | Self::GapPct
                | Self::Volume
        )
    }

    fn finviz_headers(self) -> &'static [&'static str] {
        match self {
            Self::Symbol => &["Ticker", "Symbol"],
            Self::Company => &["Company", "Name"],
            Self::Sector => &["Sector"],
            Self::Industry => &["Industry"],
            Self::Exchange => &["Exchange"],
            Self::Country => &["Country"],
            Self::MarketCap => &["Market Cap", "Mkt Cap"],
            Self::Pe => &["P/E", "PE"],
            Self::Price => &["Price", "Last"],
            Self::PrevClose => &["Previous Close", "Prev Close"],
            Self::ChangePct => &["Change", "Change %"],
            Self::GapPct => &["Gap", "Gap %"],
            Self::Volume => &["Volume"],
            Self::AvgVolume => &["Average Volume", "Average Volume (3m)", "Avg Volume"],
            Self::RelVolume => &["Relative Volume", "Relative Vol.", "Rel Volume"],
            Self::FloatShares => &["Shares Float", "Float"],
            Self::ShortFloatPct => &["Short Float", "Float Short"],
            Self::AfterHoursChangePct => &["After-Hours Change", "After Hours Change"],
            Self::Week52Range => &["52-Week Range", "52W Range"],
            Self::EarningsDate => &["Earnings Date", "Earnings"],
            Self::AnalystRecom => &["Analyst Recom", "Analyst Recom.", "Recom"],
            Self::InsiderTransPct => &["Insider Transactions", "Insider Trans"],
            Self::InstitutionalTransPct => &["Institutional Transactions", "Inst Trans"],
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn header_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Canonical field → ordered list of accepted raw header names.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderAliases {
    table: BTreeMap<CanonicalField, Vec<String>>,
}

impl Default for HeaderAliases {
    fn default() -> Self {
        Self::finviz()
    }
}

impl HeaderAliases {
    /// An empty table; every field resolves as absent.
    pub fn empty() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Header names used by the Finviz screener export.
    pub fn finviz() -> Self {
        let table = CanonicalField::ALL
            .into_iter()
            .map(|field| {
                let names = field.finviz_headers().iter().map(|s| s.to_string()).collect();
                (field, names)
            })
            .collect();
        Self { table }
    }

    /// Put `aliases` ahead of the field's existing names, skipping repeats.
    pub fn prepend<I, S>(&mut self, field: CanonicalField, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let existing = self.table.remove(&field).unwrap_or_default();
        let mut merged: Vec<String> = Vec::new();
        for name in aliases.into_iter().map(Into::into).chain(existing) {
            let key = header_key(&name);
            if key.is_empty() || merged.iter().any(|m| header_key(m) == key) {
                continue;
            }
            merged.push(name);
        }
        self.table.insert(field, merged);
    }

    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        self.table.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Index of the first header (in export order) matching any alias of `field`.
    pub fn resolve<'a, I>(&self, field: CanonicalField, headers: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let wanted: Vec<String> = self.aliases(field).iter().map(|a| header_key(a)).collect();
        if wanted.is_empty() {
            return None;
        }
        headers
            .into_iter()
            .position(|h| wanted.contains(&header_key(h)))
    }
}
