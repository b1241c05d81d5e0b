//! Scoring features and their transforms.
//!
//! Each feature reads one source value from a [`NormalizedRecord`] and maps it
//! onto a dimensionless scale using a reference range. An absent source value
//! yields `None`, which scoring treats as a zero contribution.

use crate::domain::record::NormalizedRecord;
use serde::Serialize;
use std::fmt;

/// Smallest input taken by the log scale.
const LOG_FLOOR: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Relvol,
    Gap,
    Avgvol,
    FloatBand,
    ShortFloat,
    AfterHours,
    Change,
    W52pos,
    NewsFresh,
    Analyst,
    InsiderInst,
    EarningsNear,
    PeOutlier,
}

/// How a source value is mapped through its reference range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// `(x - mid) / half_width`; a reversed range flips the sign.
    Linear,
    /// Linear scaling of `log10(x)`; inputs below 1 score as 1.
    Log10,
    /// +1 inside the range, -1 outside.
    Band,
    /// 1 inside the range, 0 outside.
    Inside,
    /// 1 outside the range, 0 inside.
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceRange {
    pub lo: f64,
    pub hi: f64,
}

impl ReferenceRange {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    fn contains(&self, x: f64) -> bool {
        let (a, b) = if self.lo <= self.hi {
            (self.lo, self.hi)
        } else {
            (self.hi, self.lo)
        };
        x >= a && x <= b
    }

    fn linear(&self, x: f64) -> f64 {
        let mid = (self.lo + self.hi) / 2.0;
        let half = (self.hi - self.lo) / 2.0;
        (x - mid) / half
    }
}

impl Feature {
    pub const ALL: [Feature; 13] = [
        Self::Relvol,
        Self::Gap,
        Self::Avgvol,
        Self::FloatBand,
        Self::ShortFloat,
        Self::AfterHours,
        Self::Change,
        Self::W52pos,
        Self::NewsFresh,
        Self::Analyst,
        Self::InsiderInst,
        Self::EarningsNear,
        Self::PeOutlier,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Relvol => "relvol",
            Self::Gap => "gap",
            Self::Avgvol => "avgvol",
            Self::FloatBand => "float_band",
            Self::ShortFloat => "short_float",
            Self::AfterHours => "after_hours",
            Self::Change => "change",
            Self::W52pos => "w52pos",
            Self::NewsFresh => "news_fresh",
            Self::Analyst => "analyst",
            Self::InsiderInst => "insider_inst",
            Self::EarningsNear => "earnings_near",
            Self::PeOutlier => "pe_outlier",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|f| f.name() == wanted)
    }

    pub fn scale(self) -> Scale {
        match self {
            Self::Avgvol => Scale::Log10,
            Self::FloatBand => Scale::Band,
            Self::EarningsNear => Scale::Inside,
            Self::PeOutlier => Scale::Outside,
            _ => Scale::Linear,
        }
    }

    pub fn default_range(self) -> ReferenceRange {
        match self {
            Self::Relvol => ReferenceRange::new(1.0, 5.0),
            Self::Gap => ReferenceRange::new(0.0, 10.0),
            Self::Avgvol => ReferenceRange::new(5.0, 7.0),
            Self::FloatBand => ReferenceRange::new(10e6, 150e6),
            Self::ShortFloat => ReferenceRange::new(0.0, 30.0),
            Self::AfterHours => ReferenceRange::new(-5.0, 5.0),
            Self::Change => ReferenceRange::new(-10.0, 10.0),
            Self::W52pos => ReferenceRange::new(0.0, 1.0),
            Self::NewsFresh => ReferenceRange::new(0.0, 1.0),
            // Analyst recommendations run 1 (strong buy) .. 5 (strong sell).
            Self::Analyst => ReferenceRange::new(5.0, 1.0),
            Self::InsiderInst => ReferenceRange::new(-10.0, 10.0),
            Self::EarningsNear => ReferenceRange::new(0.0, 10.0),
            Self::PeOutlier => ReferenceRange::new(0.0, 100.0),
        }
    }

    /// Raw source value for this feature, or `None` when the row carries none.
    pub fn source(self, record: &NormalizedRecord) -> Option<f64> {
        match self {
            Self::Relvol => record.rel_volume,
            Self::Gap => record.gap_pct,
            Self::Avgvol => record.avg_volume,
            Self::FloatBand => record.float_shares,
            Self::ShortFloat => record.short_float_pct,
            Self::AfterHours => record.after_hours_change_pct,
            Self::Change => record.change_pct,
            Self::W52pos => record.week52_pos(),
            Self::NewsFresh => record.news_freshness,
            Self::Analyst => record.analyst_recom,
            Self::InsiderInst => record.insider_inst_pct(),
            Self::EarningsNear => record.days_to_earnings.map(|d| d.abs() as f64),
            Self::PeOutlier => record.pe,
        }
    }

    /// Transformed (pre-cap, pre-weight) value.
    pub fn transform(self, record: &NormalizedRecord, range: &ReferenceRange) -> Option<f64> {
        let x = self.source(record)?;
        let value = match self.scale() {
            Scale::Linear => range.linear(x),
            // A non-positive value is the worst case, not an absent one.
            Scale::Log10 => range.linear(x.max(LOG_FLOOR).log10()),
            Scale::Band => {
                if range.contains(x) {
                    1.0
                } else {
                    -1.0
                }
            }
            Scale::Inside => f64::from(u8::from(range.contains(x))),
            Scale::Outside => f64::from(u8::from(!range.contains(x))),
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
