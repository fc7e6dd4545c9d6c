use crate::calculator::RatingCalculator;
use crate::config::RatingConfig;
use crate::error::{RatingError, Result};
use crate::models::{PropRecord, RatedProp, Side, Slate, SlateContext};
use crate::normalizer::{SlateBounds, SlateNormalizer};
use crate::ranking::RankingEngine;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Ranked output of one pass over one slate generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSlate {
    pub generation: u64,
    pub context: SlateContext,
    pub side: Side,
    pub bounds: Option<SlateBounds>,
    pub props: Vec<RatedProp>,
}

impl RankedSlate {
    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

/// Extractor → calculator → normalizer → classifier → ranking, as one pure pass.
///
/// Holds no slate state between calls; each pass works on its own copy.
pub struct RatingPipeline {
    calculator: RatingCalculator,
    normalizer: SlateNormalizer,
    ranking: RankingEngine,
}

impl RatingPipeline {
    pub fn new(config: RatingConfig) -> Self {
        let normalizer = SlateNormalizer::new(config.display);
        let ranking = RankingEngine::new(config.gate);
        let calculator = RatingCalculator::new(config);

        Self {
            calculator,
            normalizer,
            ranking,
        }
    }

    pub fn config(&self) -> &RatingConfig {
        self.calculator.config()
    }

    pub fn ranking(&self) -> &RankingEngine {
        &self.ranking
    }

    /// Rate every prop of the slate and normalize both sides against it.
    ///
    /// Prop ids must be unique within the slate.
    pub fn rate_slate(&self, slate: &Slate) -> Result<Vec<RatedProp>> {
        if slate.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::with_capacity(slate.len());
        if let Some(duplicate) = slate.props.iter().find(|p| !seen.insert(p.id.as_str())) {
            return Err(RatingError::DuplicateProp {
                prop_id: duplicate.id.clone(),
            });
        }

        let mut rated: Vec<RatedProp> = slate
            .props
            .iter()
            .map(|record| self.calculator.rate(record, slate.generation))
            .collect();

        for side in Side::ALL {
            self.normalizer.normalize_slate(&mut rated, side)?;
        }
        Ok(rated)
    }

    /// Full pass: rate, normalize and rank the slate for `side`
    pub fn run(&self, slate: &Slate, side: Side) -> Result<RankedSlate> {
        let rated = self.rate_slate(slate)?;
        let bounds = SlateBounds::of(&rated, side);
        let props = self.ranking.rank(&rated, side)?;

        let date = slate.context.date.map(|d| d.to_string());
        info!(
            "Ranked slate generation {} ({} {}): {} props for {} side",
            slate.generation,
            slate.context.sport,
            date.unwrap_or_default(),
            props.len(),
            side
        );

        Ok(RankedSlate {
            generation: slate.generation,
            context: slate.context.clone(),
            side,
            bounds,
            props,
        })
    }
}

impl Default for RatingPipeline {
    fn default() -> Self {
        Self::new(RatingConfig::default())
    }
}

/// Generation stamp handed out when a new slate starts computing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlateTicket {
    pub generation: u64,
    pub context: SlateContext,
}

impl SlateTicket {
    /// Build the slate this ticket stamps
    pub fn slate(&self, props: Vec<PropRecord>) -> Slate {
        Slate::new(self.generation, self.context.clone(), props)
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    issued: u64,
    latest: Option<Arc<RankedSlate>>,
}

/// Last-request-wins holder for ranked output.
///
/// Every new slate gets a higher generation; results from any generation other
/// than the most recently issued one are discarded on publish.
#[derive(Debug, Default)]
pub struct SlateTracker {
    state: RwLock<TrackerState>,
}

impl SlateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp a new slate; any pass still running for an older one becomes stale
    pub fn begin(&self, context: SlateContext) -> SlateTicket {
        let mut state = self.state.write();
        state.issued += 1;
        SlateTicket {
            generation: state.issued,
            context,
        }
    }

    pub fn current_generation(&self) -> u64 {
        self.state.read().issued
    }

    /// Accept a ranked slate only if it belongs to the latest issued generation
    pub fn publish(&self, ranked: RankedSlate) -> bool {
        let mut state = self.state.write();
        if ranked.generation != state.issued {
            warn!(
                "Discarding stale ranking for generation {} (latest is {})",
                ranked.generation, state.issued
            );
            return false;
        }

        state.latest = Some(Arc::new(ranked));
        true
    }

    /// Publish the outcome of a pass. A failed pass for the current generation
    /// clears the output instead of leaving a superseded order on display.
    pub fn complete(&self, ticket: &SlateTicket, outcome: Result<RankedSlate>) -> bool {
        match outcome {
            Ok(ranked) => self.publish(ranked),
            Err(e) => {
                let mut state = self.state.write();
                if ticket.generation == state.issued {
                    error!("Ranking failed for generation {}: {}", ticket.generation, e);
                    state.latest = None;
                } else {
                    warn!(
                        "Ignoring failure of stale generation {}: {}",
                        ticket.generation, e
                    );
                }
                false
            }
        }
    }

    /// Latest accepted ranking, `None` meaning no ranked data available
    pub fn latest(&self) -> Option<Arc<RankedSlate>> {
        self.state.read().latest.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Confidence, Grade, RatingColor, RawFeatures};
    use chrono::NaiveDate;

    fn context(day: u32) -> SlateContext {
        SlateContext {
            sport: "nfl".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 10, day),
            filters: vec!["main-lines".to_string()],
        }
    }

    fn record(id: &str, name: &str, category: &str, hit_rate: f64, over: i32) -> PropRecord {
        PropRecord::new(id, name, category, 60.5, over, -115).with_features(RawFeatures {
            hit_rate: Some(hit_rate),
            ..Default::default()
        })
    }

    fn sample_props() -> Vec<PropRecord> {
        vec![
            record("1", "Josh Allen", "passing yards", 0.75, -120),
            record("2", "James Cook", "rushing yards", 0.55, -125),
            record("3", "Khalil Shakir", "receiving yards", 0.35, -130),
            record("4", "Dalton Kincaid", "receiving touchdowns", 0.60, 100),
        ]
    }

    #[test]
    fn test_pipeline_end_to_end() {
        let pipeline = RatingPipeline::default();
        let slate = Slate::new(1, context(12), sample_props());

        let ranked = pipeline.run(&slate, Side::Favorable).unwrap();

        assert_eq!(ranked.generation, 1);
        assert_eq!(ranked.len(), 4);
        assert_eq!(ranked.props[0].id(), "1");
        assert_eq!(ranked.props[0].rating(Side::Favorable), 95);
        // Pick'em priced touchdown prop rated below 80 goes last
        assert_eq!(ranked.props[3].id(), "4");
        assert!(ranked
            .props
            .iter()
            .all(|p| (40..=95).contains(&p.rating(Side::Favorable))
                && (40..=95).contains(&p.rating(Side::Unfavorable))));
    }

    #[test]
    fn test_unfavorable_ranking_reverses_hit_rate_preference() {
        let pipeline = RatingPipeline::default();
        let slate = Slate::new(1, context(12), sample_props());

        let ranked = pipeline.run(&slate, Side::Unfavorable).unwrap();
        assert_eq!(ranked.props[0].id(), "3");
        assert_eq!(ranked.props[0].rating(Side::Unfavorable), 95);
    }

    #[test]
    fn test_explanations_follow_ratings() {
        let pipeline = RatingPipeline::default();
        let props = vec![
            record("hot", "Josh Allen", "passing yards", 0.9, -120),
            record("cold", "Joe Flacco", "passing yards", 0.2, -120),
        ];
        let slate = Slate::new(1, context(12), props);
        let ranked = pipeline.run(&slate, Side::Favorable).unwrap();

        let hot = &ranked.props[0];
        assert_eq!(hot.id(), "hot");
        assert_eq!(hot.grade(Side::Favorable), Grade::A);
        assert_eq!(hot.color(Side::Favorable), RatingColor::Green);
        assert_eq!(hot.confidence(Side::Favorable), Confidence::Low);
        assert_eq!(
            hot.reasoning(Side::Favorable),
            vec!["Strong hit rate across recent games (90)"]
        );

        let cold = &ranked.props[1];
        assert_eq!(cold.grade(Side::Favorable), Grade::F);
        assert_eq!(cold.color(Side::Favorable), RatingColor::Red);
        assert_eq!(cold.reasoning(Side::Favorable), vec!["Low hit rate (20)"]);
        assert_eq!(
            cold.reasoning(Side::Unfavorable),
            vec!["Strong hit rate across recent games (80)"]
        );
    }

    #[test]
    fn test_mixed_payload_still_ranks_every_record() {
        let payload = r#"[
            {"id": "a", "playerName": "Josh Allen", "propType": "passing yards",
             "line": 262.5, "overOdds": -120, "underOdds": -110, "hitRate": 0.75},
            {"id": "b", "playerName": "James Cook", "propType": "rushing yards",
             "line": "70.5", "overOdds": "-115", "underOdds": "-105", "hitRate": "55",
             "recentForm": "cold"},
            {"id": "c", "playerName": "Khalil Shakir", "propType": "receiving yards",
             "line": 48.5, "overOdds": "off the board", "underOdds": null,
             "hitRate": false, "opponentRank": "n/a"}
        ]"#;
        let props: Vec<PropRecord> = serde_json::from_str(payload).unwrap();
        assert_eq!(props.len(), 3);

        let ranked = RatingPipeline::default()
            .run(&Slate::new(1, context(12), props), Side::Favorable)
            .unwrap();
        let ids: Vec<&str> = ranked.props.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);

        let unreadable = &ranked.props[1];
        assert_eq!(unreadable.features.hit_rate, 0.5);
        assert_eq!(unreadable.features.defense_rank, 16.0);
        assert_eq!(unreadable.record.price(Side::Favorable), None);
    }

    #[test]
    fn test_duplicate_prop_ids_are_rejected() {
        let pipeline = RatingPipeline::default();
        let mut props = sample_props();
        props.push(record("2", "James Cook", "rushing yards", 0.55, -125));
        let slate = Slate::new(1, context(12), props);

        let err = pipeline.run(&slate, Side::Favorable).unwrap_err();
        assert!(matches!(err, RatingError::DuplicateProp { prop_id } if prop_id == "2"));

        // The tracker treats it like any other failed pass
        let tracker = SlateTracker::new();
        let ticket = tracker.begin(context(12));
        let outcome = pipeline.run(&ticket.slate(slate.props.clone()), Side::Favorable);
        assert!(!tracker.complete(&ticket, outcome));
        assert!(tracker.latest().is_none());
    }

    #[test]
    fn test_empty_slate_yields_empty_ranking() {
        let pipeline = RatingPipeline::default();
        let slate = Slate::new(5, context(12), Vec::new());
        let ranked = pipeline.run(&slate, Side::Favorable).unwrap();

        assert!(ranked.is_empty());
        assert!(ranked.bounds.is_none());
    }

    #[test]
    fn test_tracker_discards_out_of_order_results() {
        let pipeline = RatingPipeline::default();
        let tracker = SlateTracker::new();

        let first = tracker.begin(context(12));
        let second = tracker.begin(context(13));
        assert_eq!(tracker.current_generation(), 2);

        let newer = pipeline
            .run(&second.slate(sample_props()), Side::Favorable)
            .unwrap();
        let older = pipeline
            .run(&first.slate(sample_props()), Side::Favorable)
            .unwrap();

        assert!(tracker.publish(newer));
        assert!(!tracker.publish(older));

        let latest = tracker.latest().unwrap();
        assert_eq!(latest.generation, 2);
        assert_eq!(latest.context.date, NaiveDate::from_ymd_opt(2025, 10, 13));
    }

    #[test]
    fn test_tracker_with_concurrent_passes() {
        let pipeline = RatingPipeline::default();
        let tracker = SlateTracker::new();
        let tickets: Vec<SlateTicket> = (1..=4).map(|day| tracker.begin(context(day))).collect();

        std::thread::scope(|scope| {
            for ticket in &tickets {
                let pipeline = &pipeline;
                let tracker = &tracker;
                scope.spawn(move || {
                    let outcome = pipeline.run(&ticket.slate(sample_props()), Side::Favorable);
                    tracker.complete(ticket, outcome)
                });
            }
        });

        assert_eq!(tracker.latest().unwrap().generation, 4);
    }

    #[test]
    fn test_failed_current_pass_clears_output() {
        let pipeline = RatingPipeline::default();
        let tracker = SlateTracker::new();

        let ticket = tracker.begin(context(12));
        let ranked = pipeline.run(&ticket.slate(sample_props()), Side::Favorable);
        assert!(tracker.complete(&ticket, ranked));
        assert!(tracker.latest().is_some());

        let next = tracker.begin(context(13));
        let failure = Err(RatingError::SlateMismatch {
            expected: 2,
            found: 1,
        });
        assert!(!tracker.complete(&next, failure));
        assert!(tracker.latest().is_none());
    }

    #[test]
    fn test_tracker_starts_without_data() {
        let tracker = SlateTracker::new();
        assert_eq!(tracker.current_generation(), 0);
        assert!(tracker.latest().is_none());
    }
}
