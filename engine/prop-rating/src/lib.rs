//! Prop Rating Engine
//!
//! Scores player props for both directions (favorable / unfavorable), rescales
//! the raw scores relative to the rest of the current slate, classifies each
//! market into a priority tier and merges everything into one deterministic
//! presentation order.
//!
//! Data flows strictly downward:
//! `features` → `calculator` → `normalizer` → (`classifier`) → `ranking`.
//! The `pipeline` module wires the stages together and guards against
//! out-of-order slate completion with generation stamps.

pub mod calculator;
pub mod classifier;
pub mod config;
pub mod error;
pub mod features;
mod lenient;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod ranking;


pub use calculator::RatingCalculator;
pub use classifier::{classify, Priority};
pub use config::{CoinflipGate, DisplayBand, FactorWeights, RatingConfig};
pub use error::{RatingError, Result};
pub use features::{extract, FeatureBundle};
pub use models::*;
pub use normalizer::{SlateBounds, SlateNormalizer};
pub use pipeline::{RankedSlate, RatingPipeline, SlateTicket, SlateTracker};
pub use ranking::RankingEngine;

/// Lowest normalized rating ever displayed
pub const DEFAULT_DISPLAY_MIN: u8 = 40;

/// Highest normalized rating ever displayed (never 100)
pub const DEFAULT_DISPLAY_MAX: u8 = 95;

/// Normalized rating a gated (near-coinflip) prop must reach to escape demotion
pub const DEFAULT_GATE_RATING_THRESHOLD: u8 = 80;
