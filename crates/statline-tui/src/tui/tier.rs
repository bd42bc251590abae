// Score tiers: maps a standard score to a display band and colour.

use ratatui::style::{Color, Style};

/// Display band for a signed standard score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreTier {
    Elite,
    Strong,
    Good,
    Neutral,
    Weak,
    Poor,
    Awful,
}

impl ScoreTier {
    /// Lower bound of each tier, best first. Anything below the last bound is `Awful`.
    const BOUNDS: [(f64, ScoreTier); 6] = [
        (2.5, ScoreTier::Elite),
        (1.5, ScoreTier::Strong),
        (0.5, ScoreTier::Good),
        (-0.5, ScoreTier::Neutral),
        (-1.5, ScoreTier::Weak),
        (-2.5, ScoreTier::Poor),
    ];

    /// Classify a score. NaN has no tier.
    pub fn classify(score: f64) -> Option<ScoreTier> {
        if score.is_nan() {
            return None;
        }
        let tier = Self::BOUNDS
            .iter()
            .find(|(lower, _)| score >= *lower)
            .map_or(ScoreTier::Awful, |(_, tier)| *tier);
        Some(tier)
    }

    /// Classify a possibly-missing score.
    pub fn for_score(score: Option<f64>) -> Option<ScoreTier> {
        score.and_then(Self::classify)
    }

    pub fn color(self) -> Color {
        match self {
            ScoreTier::Elite => Color::Rgb(0x00, 0x64, 0x00),
            ScoreTier::Strong => Color::Rgb(0x00, 0x80, 0x00),
            ScoreTier::Good => Color::Rgb(0x32, 0xCD, 0x32),
            ScoreTier::Neutral => Color::Rgb(0xFF, 0xFF, 0xFF),
            ScoreTier::Weak => Color::Rgb(0xFF, 0xA0, 0x7A),
            ScoreTier::Poor => Color::Rgb(0xFF, 0x00, 0x00),
            ScoreTier::Awful => Color::Rgb(0x8B, 0x00, 0x00),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreTier::Elite => "Elite",
            ScoreTier::Strong => "Strong",
            ScoreTier::Good => "Good",
            ScoreTier::Neutral => "Neutral",
            ScoreTier::Weak => "Weak",
            ScoreTier::Poor => "Poor",
            ScoreTier::Awful => "Awful",
        }
    }

    /// Text colour readable on top of [`ScoreTier::color`].
    fn text_color(self) -> Color {
        match self {
            ScoreTier::Good | ScoreTier::Neutral | ScoreTier::Weak => Color::Black,
            _ => Color::White,
        }
    }
}

/// Cell style for a score: tier background, or unstyled when there is no tier.
pub fn score_style(score: Option<f64>) -> Style {
    match ScoreTier::for_score(score) {
        Some(tier) => Style::default().bg(tier.color()).fg(tier.text_color()),
        None => Style::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_inclusive_lower_bounds() {
        assert_eq!(ScoreTier::classify(2.5), Some(ScoreTier::Elite));
        assert_eq!(ScoreTier::classify(2.49), Some(ScoreTier::Strong));
        assert_eq!(ScoreTier::classify(1.5), Some(ScoreTier::Strong));
        assert_eq!(ScoreTier::classify(0.5), Some(ScoreTier::Good));
        assert_eq!(ScoreTier::classify(0.0), Some(ScoreTier::Neutral));
        assert_eq!(ScoreTier::classify(-0.5), Some(ScoreTier::Neutral));
        assert_eq!(ScoreTier::classify(-0.51), Some(ScoreTier::Weak));
        assert_eq!(ScoreTier::classify(-1.5), Some(ScoreTier::Weak));
        assert_eq!(ScoreTier::classify(-2.5), Some(ScoreTier::Poor));
        assert_eq!(ScoreTier::classify(-2.51), Some(ScoreTier::Awful));
    }

    #[test]
    fn extremes_land_in_end_tiers() {
        assert_eq!(ScoreTier::classify(f64::INFINITY), Some(ScoreTier::Elite));
        assert_eq!(ScoreTier::classify(f64::NEG_INFINITY), Some(ScoreTier::Awful));
    }

    #[test]
    fn missing_and_nan_have_no_tier() {
        assert_eq!(ScoreTier::classify(f64::NAN), None);
        assert_eq!(ScoreTier::for_score(None), None);
        assert_eq!(score_style(None), Style::default());
        assert_eq!(score_style(Some(f64::NAN)), Style::default());
    }

    #[test]
    fn colors_match_palette() {
        assert_eq!(ScoreTier::Elite.color(), Color::Rgb(0, 100, 0));
        assert_eq!(ScoreTier::Good.color(), Color::Rgb(50, 205, 50));
        assert_eq!(ScoreTier::Awful.color(), Color::Rgb(139, 0, 0));
    }

    #[test]
    fn style_uses_tier_background() {
        let style = score_style(Some(3.0));
        assert_eq!(style.bg, Some(ScoreTier::Elite.color()));
        assert_eq!(style.fg, Some(Color::White));
    }
}
