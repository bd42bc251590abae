// Evaluation windows: a full season or a rolling timeframe ending today.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Earliest season with pitch-level tracking data.
pub const FIRST_TRACKED_SEASON: i32 = 2015;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("invalid timeframe '{0}'; use one of: last_week, last_2_weeks, last_month")]
    UnknownTimeframe(String),

    #[error("season {0} is before {FIRST_TRACKED_SEASON}")]
    SeasonTooEarly(i32),
}

/// A rolling window of recent days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    LastWeek,
    #[serde(rename = "last_2_weeks")]
    LastTwoWeeks,
    LastMonth,
}

impl Timeframe {
    pub const SLUGS: [&'static str; 3] = ["last_week", "last_2_weeks", "last_month"];

    pub fn days(self) -> i64 {
        match self {
            Timeframe::LastWeek => 7,
            Timeframe::LastTwoWeeks => 14,
            Timeframe::LastMonth => 30,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Timeframe::LastWeek => "last_week",
            Timeframe::LastTwoWeeks => "last_2_weeks",
            Timeframe::LastMonth => "last_month",
        }
    }

    /// Inclusive (start, end) dates of the window ending on `today`.
    pub fn date_range(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (today - Duration::days(self.days()), today)
    }
}

impl FromStr for Timeframe {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "last_week" => Ok(Timeframe::LastWeek),
            "last_2_weeks" => Ok(Timeframe::LastTwoWeeks),
            "last_month" => Ok(Timeframe::LastMonth),
            other => Err(WindowError::UnknownTimeframe(other.to_string())),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// The period a ranking run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EvaluationWindow {
    Season(i32),
    Recent(Timeframe),
}

impl EvaluationWindow {
    /// Directory / path segment naming the window: the year or the slug.
    pub fn path_segment(&self) -> String {
        match self {
            EvaluationWindow::Season(year) => year.to_string(),
            EvaluationWindow::Recent(tf) => tf.slug().to_string(),
        }
    }

    /// Date range for recent windows; seasons are not date-bounded.
    pub fn date_range(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            EvaluationWindow::Season(_) => None,
            EvaluationWindow::Recent(tf) => Some(tf.date_range(today)),
        }
    }
}

impl fmt::Display for EvaluationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationWindow::Season(year) => write!(f, "{year} season"),
            EvaluationWindow::Recent(tf) => write!(f, "{tf}"),
        }
    }
}

/// Reject seasons before pitch tracking existed.
pub fn check_season(season: i32) -> Result<i32, WindowError> {
    if season < FIRST_TRACKED_SEASON {
        return Err(WindowError::SeasonTooEarly(season));
    }
    Ok(season)
}

/// Today's date in local time.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
