//! Market-local time. Run dates and timestamps follow the exchange's zone,
//! not the host's.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

pub const DEFAULT_TZ_NAME: &str = "America/New_York";
pub const DEFAULT_TZ: Tz = chrono_tz::America::New_York;

/// Resolve an IANA zone name. Blank or unknown names fall back to
/// [`DEFAULT_TZ`].
pub fn resolve_timezone(name: Option<&str>) -> Tz {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return DEFAULT_TZ;
    };
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            tracing::warn!(timezone = name, fallback = DEFAULT_TZ_NAME, "unknown timezone");
            DEFAULT_TZ
        }
    }
}

pub fn now_in(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

/// Calendar date of `instant` in `tz`.
pub fn market_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

pub fn today_in(tz: Tz) -> NaiveDate {
    market_date(Utc::now(), tz)
}
