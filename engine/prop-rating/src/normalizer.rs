//! Slate normalization: raw scores → bounded display ratings relative to the slate.

use crate::config::DisplayBand;
use crate::error::{RatingError, Result};
use crate::models::{RatedProp, Side};
use serde::Serialize;
use tracing::debug;

/// Minimum and maximum raw score of one side across a slate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlateBounds {
    pub min: f64,
    pub max: f64,
}

impl SlateBounds {
    /// Bounds over the finite raw scores of `side`; `None` if there are none
    pub fn of(records: &[RatedProp], side: Side) -> Option<Self> {
        records
            .iter()
            .map(|r| *r.raw_score.get(side))
            .filter(|s| s.is_finite())
            .fold(None, |acc, score| match acc {
                None => Some(SlateBounds {
                    min: score,
                    max: score,
                }),
                Some(b) => Some(SlateBounds {
                    min: b.min.min(score),
                    max: b.max.max(score),
                }),
            })
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Relative position of a raw score inside the bounds, 0.5 for a flat slate
    pub fn position(&self, raw_score: f64) -> f64 {
        let range = self.range();
        if range > 0.0 {
            (raw_score - self.min) / range
        } else {
            0.5
        }
    }
}

/// Rescales raw scores into the display band relative to the current slate
pub struct SlateNormalizer {
    display: DisplayBand,
}

impl SlateNormalizer {
    pub fn new(display: DisplayBand) -> Self {
        Self { display }
    }

    /// Normalize `side` for every record in place.
    ///
    /// Every record must come from the same slate generation. Returns the
    /// bounds used, or `None` for an empty slate.
    pub fn normalize_slate(
        &self,
        records: &mut [RatedProp],
        side: Side,
    ) -> Result<Option<SlateBounds>> {
        ensure_single_generation(records)?;

        let Some(bounds) = SlateBounds::of(records, side) else {
            // Empty slate, or nothing finite to anchor on
            let midpoint = self.display.midpoint();
            for record in records.iter_mut() {
                *record.normalized_rating.get_mut(side) = midpoint;
            }
            return Ok(None);
        };

        for record in records.iter_mut() {
            let rating = self.scale(&bounds, *record.raw_score.get(side));
            *record.normalized_rating.get_mut(side) = rating;
        }

        debug!(
            "Normalized {} props for {} side: raw {:.2}..{:.2} → {}..{}",
            records.len(),
            side,
            bounds.min,
            bounds.max,
            self.display.min,
            self.display.max
        );

        Ok(Some(bounds))
    }

    /// Normalized rating of one prop relative to `slate`, without mutating it
    pub fn normalize_record(&self, slate: &[RatedProp], prop_id: &str, side: Side) -> Result<u8> {
        if slate.is_empty() {
            return Err(RatingError::EmptySlate {
                prop_id: prop_id.to_string(),
            });
        }
        ensure_single_generation(slate)?;

        let record = slate
            .iter()
            .find(|r| r.id() == prop_id)
            .ok_or_else(|| RatingError::PropNotInSlate {
                prop_id: prop_id.to_string(),
            })?;

        let rating = match SlateBounds::of(slate, side) {
            Some(bounds) => self.scale(&bounds, *record.raw_score.get(side)),
            None => self.display.midpoint(),
        };
        Ok(rating)
    }

    fn scale(&self, bounds: &SlateBounds, raw_score: f64) -> u8 {
        if !raw_score.is_finite() {
            return self.display.midpoint();
        }
        self.display.scale(bounds.position(raw_score))
    }
}

/// Reject a batch that mixes records from different slate generations
pub(crate) fn ensure_single_generation(records: &[RatedProp]) -> Result<()> {
    let Some(first) = records.first() else {
        return Ok(());
    };

    match records.iter().find(|r| r.slate_generation != first.slate_generation) {
        Some(stale) => Err(RatingError::SlateMismatch {
            expected: first.slate_generation,
            found: stale.slate_generation,
        }),
        None => Ok(()),
    }
}
