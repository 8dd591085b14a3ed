use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WooxError};

/// Symbol-list entry meaning "every pair".
pub const NO_PAIR_FILTER: &str = "ALL";

/// Last second of a UTC day, as an offset from midnight.
const END_OF_DAY_SECS: i64 = 86_399;

/// Trading-pair filter; `All` is the "no filter" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairFilter {
    #[default]
    All,
    Pair(String),
}

impl PairFilter {
    /// Parse a user-supplied value. Empty input or the sentinel mean `All`.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(NO_PAIR_FILTER) {
            PairFilter::All
        } else {
            PairFilter::Pair(value.to_string())
        }
    }

    pub fn as_pair(&self) -> Option<&str> {
        match self {
            PairFilter::All => None,
            PairFilter::Pair(p) => Some(p),
        }
    }

    /// Case-sensitive exact match; `All` matches everything.
    pub fn matches(&self, symbol: &str) -> bool {
        match self {
            PairFilter::All => true,
            PairFilter::Pair(p) => p == symbol,
        }
    }
}

impl FromStr for PairFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(PairFilter::parse(s))
    }
}

impl From<Option<String>> for PairFilter {
    fn from(value: Option<String>) -> Self {
        value.map(|v| PairFilter::parse(&v)).unwrap_or_default()
    }
}

impl fmt::Display for PairFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairFilter::All => f.write_str(NO_PAIR_FILTER),
            PairFilter::Pair(p) => f.write_str(p),
        }
    }
}

/// Time window (unix milliseconds, inclusive) and optional pair for one fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryWindow {
    pub start_ms: i64,
    pub end_ms: i64,
    pub pair: Option<String>,
}

impl QueryWindow {
    /// # Errors
    ///
    /// Returns `WooxError::Validation` if `start_ms > end_ms`.
    pub fn new(start_ms: i64, end_ms: i64) -> Result<Self> {
        if start_ms > end_ms {
            return Err(WooxError::Validation(format!(
                "window start {start_ms} is after end {end_ms}"
            )));
        }
        Ok(Self {
            start_ms,
            end_ms,
            pair: None,
        })
    }

    /// Window from `start` 00:00:00 to `end` 23:59:59 UTC.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let start_ms = start_of_day(start).timestamp_millis();
        let end_ms = end_of_day(end).timestamp_millis();
        Self::new(start_ms, end_ms)
    }

    /// Attach a pair; the `All` sentinel clears it.
    pub fn with_pair(mut self, pair: &PairFilter) -> Self {
        self.pair = pair.as_pair().map(str::to_string);
        self
    }

    pub fn pair_filter(&self) -> PairFilter {
        PairFilter::from(self.pair.clone())
    }

    /// Query parameters for one page of `GET /v1/orders`.
    pub fn order_params(&self, page: u64) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("realized_pnl", "true".to_string()),
            ("status", "COMPLETED".to_string()),
            ("start_t", self.start_ms.to_string()),
            ("end_t", self.end_ms.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(pair) = self.pair_filter().as_pair() {
            params.push(("pair", pair.to_string()));
        }
        params
    }
}

/// Named shorthand for a window relative to the current time (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuickRange {
    Today,
    Yesterday,
    CurrentWeek,
    Last7Days,
    CurrentMonth,
    Last30Days,
}

impl QuickRange {
    pub const ALL: [QuickRange; 6] = [
        QuickRange::Today,
        QuickRange::Yesterday,
        QuickRange::CurrentWeek,
        QuickRange::Last7Days,
        QuickRange::CurrentMonth,
        QuickRange::Last30Days,
    ];

    pub fn name(self) -> &'static str {
        match self {
            QuickRange::Today => "today",
            QuickRange::Yesterday => "yesterday",
            QuickRange::CurrentWeek => "current-week",
            QuickRange::Last7Days => "last-7-days",
            QuickRange::CurrentMonth => "current-month",
            QuickRange::Last30Days => "last-30-days",
        }
    }

    /// Resolve to a concrete window against `now`.
    pub fn resolve(self, now: DateTime<Utc>) -> QueryWindow {
        let today = now.date_naive();
        let (start, end) = match self {
            QuickRange::Today => (start_of_day(today), now),
            QuickRange::Yesterday => {
                let yesterday = today - Duration::days(1);
                (start_of_day(yesterday), end_of_day(yesterday))
            }
            QuickRange::CurrentWeek => {
                let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
                (start_of_day(monday), now)
            }
            QuickRange::Last7Days => (now - Duration::days(7), now),
            QuickRange::CurrentMonth => {
                let first = today - Duration::days(i64::from(today.day0()));
                (start_of_day(first), now)
            }
            QuickRange::Last30Days => (now - Duration::days(30), now),
        };
        QueryWindow {
            start_ms: start.timestamp_millis(),
            end_ms: end.timestamp_millis(),
            pair: None,
        }
    }
}

impl FromStr for QuickRange {
    type Err = WooxError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        QuickRange::ALL
            .into_iter()
            .find(|r| r.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = QuickRange::ALL.iter().map(|r| r.name()).collect();
                WooxError::Validation(format!(
                    "unknown quick range \"{s}\". Available: {}",
                    names.join(", ")
                ))
            })
    }
}

impl fmt::Display for QuickRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Either a fixed window or a quick range re-resolved at each cycle start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeRange {
    Fixed { start_ms: i64, end_ms: i64 },
    Quick(QuickRange),
}

impl TimeRange {
    /// # Errors
    ///
    /// Returns `WooxError::Validation` if `start_ms > end_ms`.
    pub fn fixed(start_ms: i64, end_ms: i64) -> Result<Self> {
        let window = QueryWindow::new(start_ms, end_ms)?;
        Ok(TimeRange::Fixed {
            start_ms: window.start_ms,
            end_ms: window.end_ms,
        })
    }

    pub fn resolve(&self, now: DateTime<Utc>) -> QueryWindow {
        match *self {
            TimeRange::Fixed { start_ms, end_ms } => QueryWindow {
                start_ms,
                end_ms,
                pair: None,
            },
            TimeRange::Quick(range) => range.resolve(now),
        }
    }
}

impl From<QuickRange> for TimeRange {
    fn from(range: QuickRange) -> Self {
        TimeRange::Quick(range)
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::seconds(END_OF_DAY_SECS)
}
