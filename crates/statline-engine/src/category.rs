// Statistical categories, scoring profiles, and the raw upstream row shape.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Player kind
// ---------------------------------------------------------------------------

/// Which ranking table a player belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    Pitcher,
    Hitter,
}

impl PlayerKind {
    pub fn label(self) -> &'static str {
        match self {
            PlayerKind::Pitcher => "pitcher",
            PlayerKind::Hitter => "hitter",
        }
    }
}

impl std::fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for PlayerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pitcher" | "pitchers" => Ok(PlayerKind::Pitcher),
            "hitter" | "hitters" => Ok(PlayerKind::Hitter),
            other => Err(format!("unknown player type '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Direction in which a category rewards a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

impl Polarity {
    /// Orient a standard score so that a positive value is always good.
    pub fn orient(self, score: f64) -> f64 {
        match self {
            Polarity::HigherIsBetter => score,
            Polarity::LowerIsBetter => -score,
        }
    }
}

/// One scored statistical category.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// Upstream column name (e.g. "ERA").
    pub column: String,
    pub polarity: Polarity,
    /// Rate stats whose denominator varies per player go through the
    /// two-pass reliability reweighting, weighted by the profile's volume column.
    pub reliability_weighted: bool,
}

impl Category {
    fn counting(column: &str) -> Self {
        Category {
            column: column.to_string(),
            polarity: Polarity::HigherIsBetter,
            reliability_weighted: false,
        }
    }

    fn rate(column: &str, polarity: Polarity) -> Self {
        Category {
            column: column.to_string(),
            polarity,
            reliability_weighted: true,
        }
    }
}

/// Everything the engine needs to know to rank one kind of player.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringProfile {
    pub kind: PlayerKind,
    /// Usage-volume column: IP for pitchers, PA for hitters.
    pub volume_column: String,
    /// Rows must have a usage volume strictly greater than this to qualify.
    pub qualify_threshold: f64,
    pub categories: Vec<Category>,
}

impl ScoringProfile {
    /// W, ERA, WHIP, SO, SV, HLD qualified and weighted by IP.
    pub fn pitchers() -> Self {
        ScoringProfile {
            kind: PlayerKind::Pitcher,
            volume_column: "IP".into(),
            qualify_threshold: 0.0,
            categories: vec![
                Category::counting("W"),
                Category::rate("ERA", Polarity::LowerIsBetter),
                Category::rate("WHIP", Polarity::LowerIsBetter),
                Category::counting("SO"),
                Category::counting("SV"),
                Category::counting("HLD"),
            ],
        }
    }

    /// R, HR, RBI, SB, AVG qualified and weighted by PA.
    pub fn hitters() -> Self {
        ScoringProfile {
            kind: PlayerKind::Hitter,
            volume_column: "PA".into(),
            qualify_threshold: 0.0,
            categories: vec![
                Category::counting("R"),
                Category::counting("HR"),
                Category::counting("RBI"),
                Category::counting("SB"),
                Category::rate("AVG", Polarity::HigherIsBetter),
            ],
        }
    }

    pub fn for_kind(kind: PlayerKind) -> Self {
        match kind {
            PlayerKind::Pitcher => Self::pitchers(),
            PlayerKind::Hitter => Self::hitters(),
        }
    }

    /// Same profile with a different qualifier threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.qualify_threshold = threshold;
        self
    }

    /// Category column names in scoring order.
    pub fn columns(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.column.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Raw upstream rows
// ---------------------------------------------------------------------------

/// One unprocessed row from the upstream data source.
///
/// Columns other than the identity pair are kept as raw JSON values in no
/// particular order; the sanitizer decides what is numeric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub name: String,
    pub team: String,
    pub fields: HashMap<String, serde_json::Value>,
}

impl RawRow {
    pub fn new(name: impl Into<String>, team: impl Into<String>) -> Self {
        RawRow {
            name: name.into(),
            team: team.into(),
            fields: HashMap::new(),
        }
    }

    /// Builder-style field setter, mostly for tests and adapters.
    pub fn with(mut self, column: &str, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(column.to_string(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&serde_json::Value> {
        self.fields.get(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitcher_profile_polarity_is_fixed() {
        let profile = ScoringProfile::pitchers();
        let lower: Vec<&str> = profile
            .categories
            .iter()
            .filter(|c| c.polarity == Polarity::LowerIsBetter)
            .map(|c| c.column.as_str())
            .collect();
        assert_eq!(lower, vec!["ERA", "WHIP"]);
        assert_eq!(profile.volume_column, "IP");
    }

    #[test]
    fn only_rate_stats_are_reliability_weighted() {
        let weighted: Vec<String> = ScoringProfile::pitchers()
            .categories
            .into_iter()
            .chain(ScoringProfile::hitters().categories)
            .filter(|c| c.reliability_weighted)
            .map(|c| c.column)
            .collect();
        assert_eq!(weighted, vec!["ERA", "WHIP", "AVG"]);
    }

    #[test]
    fn orient_inverts_lower_is_better() {
        assert_eq!(Polarity::LowerIsBetter.orient(1.5), -1.5);
        assert_eq!(Polarity::HigherIsBetter.orient(1.5), 1.5);
    }

    #[test]
    fn player_kind_parses_plural_and_case() {
        assert_eq!("Pitchers".parse::<PlayerKind>(), Ok(PlayerKind::Pitcher));
        assert_eq!("hitter".parse::<PlayerKind>(), Ok(PlayerKind::Hitter));
        assert!("catcher".parse::<PlayerKind>().is_err());
    }
}
