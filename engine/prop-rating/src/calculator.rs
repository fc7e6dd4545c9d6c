use crate::classifier::classify;
use crate::config::RatingConfig;
use crate::features::{extract, FeatureBundle, BEST_RANK, WORST_RANK};
use crate::models::*;
use tracing::trace;

/// Line value saturates once the season average is this far (in percent) from the line
const LINE_EDGE_CAP_PERCENT: f64 = 25.0;

/// Dual-side rating calculator
///
/// Each side's raw score is the weighted mean of six 0-100 factor scores, so
/// raw scores always land in [0, 100]. The two sides are scored independently;
/// nothing forces them to be symmetric.
pub struct RatingCalculator {
    config: RatingConfig,
}

impl RatingCalculator {
    /// Create a new rating calculator
    pub fn new(config: RatingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    /// Score every factor from the point of view of `side`
    pub fn factor_scores(&self, bundle: &FeatureBundle, side: Side) -> FactorScores {
        let towards = |favorable_score: f64| match side {
            Side::Favorable => favorable_score,
            Side::Unfavorable => 100.0 - favorable_score,
        };

        // EV is quoted for the favorable side; the other side mirrors it
        let ev_for_side = match side {
            Side::Favorable => bundle.ev_percent,
            Side::Unfavorable => -bundle.ev_percent,
        };

        FactorScores {
            expected_value: (50.0 + ev_for_side).clamp(0.0, 100.0),
            hit_rate: towards(bundle.hit_rate.clamp(0.0, 1.0) * 100.0),
            recent_form: towards(bundle.recent_form.clamp(0.0, 1.0) * 100.0),
            // A weak opposing defense (high rank number) helps the favorable side
            matchup: towards(rank_position(bundle.defense_rank) * 100.0),
            // A strong own offense (low rank number) helps the favorable side
            offense: towards((1.0 - rank_position(bundle.offense_rank)) * 100.0),
            line_value: towards(line_value_score(bundle.season_average, bundle.line)),
        }
    }

    /// Raw score for one side
    pub fn compute_rating(&self, bundle: &FeatureBundle, side: Side) -> f64 {
        self.weighted(&self.factor_scores(bundle, side))
    }

    /// Raw scores for both sides of a record
    pub fn compute_dual_ratings(&self, record: &PropRecord) -> SidePair<f64> {
        let bundle = extract(record);
        SidePair::new(
            self.compute_rating(&bundle, Side::Favorable),
            self.compute_rating(&bundle, Side::Unfavorable),
        )
    }

    /// Rate a record for both sides.
    ///
    /// Normalized ratings start at the display midpoint and are only meaningful
    /// once the slate normalizer has run over the full slate.
    pub fn rate(&self, record: &PropRecord, slate_generation: u64) -> RatedProp {
        let features = extract(record);
        let factors = SidePair::new(
            self.factor_scores(&features, Side::Favorable),
            self.factor_scores(&features, Side::Unfavorable),
        );
        let raw_score = SidePair::new(
            self.weighted(&factors.favorable),
            self.weighted(&factors.unfavorable),
        );

        trace!(
            "Rated prop {} ({}): favorable {:.2}, unfavorable {:.2}",
            record.id,
            record.category,
            raw_score.favorable,
            raw_score.unfavorable
        );

        let midpoint = self.config.display.midpoint();
        RatedProp {
            priority: classify(&record.category),
            record: record.clone(),
            slate_generation,
            features,
            factors,
            raw_score,
            normalized_rating: SidePair::new(midpoint, midpoint),
        }
    }

    fn weighted(&self, factors: &FactorScores) -> f64 {
        let weights = self.config.weights.as_array();
        let total = self.config.weights.total();
        if total <= 0.0 {
            return 50.0;
        }

        let sum: f64 = factors
            .as_array()
            .iter()
            .zip(weights)
            .map(|(f, w)| f * w)
            .sum();
        sum / total
    }
}

/// Position of a league rank in [0, 1]: 0 for the best, 1 for the worst
fn rank_position(rank: f64) -> f64 {
    ((rank.clamp(BEST_RANK, WORST_RANK) - BEST_RANK) / (WORST_RANK - BEST_RANK))
        .clamp(0.0, 1.0)
}

/// 50 when the season average matches the line, higher when it clears the line
fn line_value_score(season_average: f64, line: f64) -> f64 {
    if !line.is_finite() || !season_average.is_finite() || line <= 0.0 {
        return 50.0;
    }

    let edge_percent = ((season_average - line) / line * 100.0)
        .clamp(-LINE_EDGE_CAP_PERCENT, LINE_EDGE_CAP_PERCENT);
    50.0 + edge_percent * (50.0 / LINE_EDGE_CAP_PERCENT)
}
