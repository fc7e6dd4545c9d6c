//! Feature extraction: raw upstream record → fully populated feature bundle.
//!
//! Missing or unusable values never fail extraction; they fall back to a
//! neutral default so the prop still participates in the slate.

use crate::models::{PropRecord, Side, SidePair};
use serde::{Deserialize, Serialize};

/// Neutral hit rate / recent form (coinflip)
pub const NEUTRAL_PROBABILITY: f64 = 0.5;

/// Neutral expected value percentage
pub const NEUTRAL_EV_PERCENT: f64 = 0.0;

/// Middle of a 32-team league table
pub const NEUTRAL_RANK: f64 = 16.0;

pub const BEST_RANK: f64 = 1.0;
pub const WORST_RANK: f64 = 32.0;

/// Recency weights for last-5 / last-10 / last-20 hit rates
const WINDOW_WEIGHTS: [f64; 3] = [0.5, 0.3, 0.2];

/// Well-typed features of one prop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureBundle {
    /// Share of recent games clearing the line (0-1)
    pub hit_rate: f64,

    /// Recent-form score (0-1, 0.5 neutral)
    pub recent_form: f64,

    /// Season average of the stat behind the prop
    pub season_average: f64,

    /// Prop line the season average is compared against
    pub line: f64,

    /// Own offense rank (1 = best, 32 = worst)
    pub offense_rank: f64,

    /// Opponent defense rank (1 = best, 32 = worst)
    pub defense_rank: f64,

    /// Expected value of the favorable side in percent (-100..=100)
    pub ev_percent: f64,

    /// American prices per side, if quoted
    pub prices: SidePair<Option<i32>>,
}

impl FeatureBundle {
    /// Bundle with every feature at its neutral default
    pub fn neutral(line: f64) -> Self {
        Self {
            hit_rate: NEUTRAL_PROBABILITY,
            recent_form: NEUTRAL_PROBABILITY,
            season_average: line,
            line,
            offense_rank: NEUTRAL_RANK,
            defense_rank: NEUTRAL_RANK,
            ev_percent: NEUTRAL_EV_PERCENT,
            prices: SidePair::default(),
        }
    }

    pub fn price(&self, side: Side) -> Option<i32> {
        *self.prices.get(side)
    }
}

/// Normalize a raw record into a feature bundle
pub fn extract(record: &PropRecord) -> FeatureBundle {
    let raw = &record.features;
    let line = finite(Some(record.line)).unwrap_or(0.0);

    let windows = [raw.hit_rate_l5, raw.hit_rate_l10, raw.hit_rate_l20];
    let hit_rate = as_probability(raw.hit_rate)
        .or_else(|| blended_hit_rate(windows))
        .unwrap_or(NEUTRAL_PROBABILITY);

    let ev_percent = finite(raw.ev_percent)
        .filter(|ev| (-100.0..=100.0).contains(ev))
        .unwrap_or(NEUTRAL_EV_PERCENT);

    FeatureBundle {
        hit_rate,
        recent_form: as_probability(raw.recent_form).unwrap_or(NEUTRAL_PROBABILITY),
        season_average: finite(raw.season_average).unwrap_or(line),
        line,
        offense_rank: league_rank(raw.offense_rank),
        defense_rank: league_rank(raw.defense_rank),
        ev_percent,
        prices: SidePair::new(record.price_favorable, record.price_unfavorable),
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Interpret a value as a probability: 0-1 as-is, 0-100 as percent
fn as_probability(value: Option<f64>) -> Option<f64> {
    let v = finite(value)?;
    if (0.0..=1.0).contains(&v) {
        Some(v)
    } else if (0.0..=100.0).contains(&v) {
        Some(v / 100.0)
    } else {
        None
    }
}

/// Recency-weighted blend over whichever windows are present
fn blended_hit_rate(windows: [Option<f64>; 3]) -> Option<f64> {
    let (sum, weight) = windows
        .iter()
        .zip(WINDOW_WEIGHTS)
        .filter_map(|(value, weight)| {
            as_probability(*value).map(|p| (p * weight, weight))
        })
        .fold((0.0, 0.0), |(s, w), (ps, pw)| (s + ps, w + pw));

    (weight > 0.0).then(|| sum / weight)
}

fn league_rank(value: Option<f64>) -> f64 {
    finite(value)
        .map(|r| r.clamp(BEST_RANK, WORST_RANK))
        .unwrap_or(NEUTRAL_RANK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawFeatures;

    fn record(features: RawFeatures) -> PropRecord {
        PropRecord::new("p1", "Josh Allen", "passing yards", 250.5, -110, -110)
            .with_features(features)
    }

    #[test]
    fn test_missing_features_default_to_neutral() {
        let bundle = extract(&record(RawFeatures::default()));

        assert_eq!(bundle.hit_rate, 0.5);
        assert_eq!(bundle.recent_form, 0.5);
        assert_eq!(bundle.ev_percent, 0.0);
        assert_eq!(bundle.offense_rank, 16.0);
        assert_eq!(bundle.defense_rank, 16.0);
        assert_eq!(bundle.season_average, 250.5);
        assert_eq!(bundle.price(Side::Favorable), Some(-110));
    }

    #[test]
    fn test_percent_and_fraction_inputs() {
        let bundle = extract(&record(RawFeatures {
            hit_rate: Some(70.0),
            recent_form: Some(0.8),
            ..Default::default()
        }));
        assert!((bundle.hit_rate - 0.7).abs() < 1e-12);
        assert_eq!(bundle.recent_form, 0.8);
    }

    #[test]
    fn test_unusable_values_are_treated_as_missing() {
        let bundle = extract(&record(RawFeatures {
            hit_rate: Some(f64::NAN),
            recent_form: Some(250.0),
            ev_percent: Some(-400.0),
            season_average: Some(f64::INFINITY),
            offense_rank: Some(0.0),
            defense_rank: Some(90.0),
            ..Default::default()
        }));

        assert_eq!(bundle.hit_rate, 0.5);
        assert_eq!(bundle.recent_form, 0.5);
        assert_eq!(bundle.ev_percent, 0.0);
        assert_eq!(bundle.season_average, 250.5);
        assert_eq!(bundle.offense_rank, 1.0);
        assert_eq!(bundle.defense_rank, 32.0);
    }

    #[test]
    fn test_window_blend_when_direct_hit_rate_missing() {
        let bundle = extract(&record(RawFeatures {
            hit_rate_l5: Some(80.0),
            hit_rate_l10: Some(0.6),
            ..Default::default()
        }));
        // (0.8 * 0.5 + 0.6 * 0.3) / 0.8
        assert!((bundle.hit_rate - 0.725).abs() < 1e-12);

        let direct = extract(&record(RawFeatures {
            hit_rate: Some(0.4),
            hit_rate_l5: Some(1.0),
            ..Default::default()
        }));
        assert_eq!(direct.hit_rate, 0.4);
    }

    #[test]
    fn test_missing_prices_and_non_finite_line() {
        let mut raw = PropRecord::new("p2", "Kicker", "field goals made", f64::NAN, 100, -120);
        raw.price_unfavorable = None;

        let bundle = extract(&raw);
        assert_eq!(bundle.line, 0.0);
        assert_eq!(bundle.price(Side::Favorable), Some(100));
        assert_eq!(bundle.price(Side::Unfavorable), None);
    }
}
