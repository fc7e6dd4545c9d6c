//! Ranking engine: merges normalized rating, priority tier, the near-coinflip
//! price gate and deterministic tie-breakers into one total order.
//!
//! Precedence:
//! 1. gated props below the rating threshold go after everything else
//! 2. normalized rating, descending
//! 3. priority tier, ascending
//! 4. sub-order, ascending (offense tier only)
//! 5. category label, ascending
//! 6. player name, then prop id, ascending

use crate::config::CoinflipGate;
use crate::error::Result;
use crate::models::{RatedProp, Side};
use crate::normalizer::ensure_single_generation;
use std::cmp::Ordering;
use tracing::debug;

pub struct RankingEngine {
    gate: CoinflipGate,
}

impl RankingEngine {
    pub fn new(gate: CoinflipGate) -> Self {
        Self { gate }
    }

    /// Whether the side's price sits in the near-even band
    pub fn is_gated(&self, prop: &RatedProp, side: Side) -> bool {
        prop.record
            .price(side)
            .is_some_and(|price| self.gate.contains(price))
    }

    /// Gated and not rated highly enough to escape the gate
    pub fn is_demoted(&self, prop: &RatedProp, side: Side) -> bool {
        self.is_gated(prop, side) && prop.rating(side) < self.gate.rating_threshold
    }

    pub fn compare(&self, a: &RatedProp, b: &RatedProp, side: Side) -> Ordering {
        self.is_demoted(a, side)
            .cmp(&self.is_demoted(b, side))
            .then_with(|| b.rating(side).cmp(&a.rating(side)))
            .then_with(|| a.priority.tier.cmp(&b.priority.tier))
            .then_with(|| {
                if a.priority.is_offense() && b.priority.is_offense() {
                    a.priority.sub_order.cmp(&b.priority.sub_order)
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| a.record.category.cmp(&b.record.category))
            .then_with(|| a.record.player_name.cmp(&b.record.player_name))
            .then_with(|| a.record.id.cmp(&b.record.id))
    }

    /// Order one slate's props for `side`. Input order never affects the result.
    pub fn rank(&self, records: &[RatedProp], side: Side) -> Result<Vec<RatedProp>> {
        ensure_single_generation(records)?;

        let mut ranked = records.to_vec();
        ranked.sort_by(|a, b| self.compare(a, b, side));

        let demoted = ranked.iter().filter(|p| self.is_demoted(p, side)).count();
        debug!(
            "Ranked {} props for {} side ({} demoted by coinflip gate)",
            ranked.len(),
            side,
            demoted
        );

        Ok(ranked)
    }
}
