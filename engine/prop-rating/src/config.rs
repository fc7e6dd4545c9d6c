//! Configuration for the Prop Rating Engine

use crate::error::{RatingError, Result};
use crate::{DEFAULT_DISPLAY_MAX, DEFAULT_DISPLAY_MIN, DEFAULT_GATE_RATING_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "PROP_RATING_";

/// Configuration for the Prop Rating Engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RatingConfig {
    /// Weights of the six factor scores that make up a raw score
    pub weights: FactorWeights,

    /// Display range normalized ratings are mapped into
    pub display: DisplayBand,

    /// Near-coinflip price gate used by the ranking engine
    pub gate: CoinflipGate,
}

/// Factor weights for the raw score (weighted mean, so they need not sum to 1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    pub expected_value: f64,
    pub hit_rate: f64,
    pub recent_form: f64,
    pub matchup: f64,
    pub offense: f64,
    pub line_value: f64,
}

/// Closed integer range normalized ratings live in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayBand {
    pub min: u8,
    pub max: u8,
}

/// Near-even price band that demotes weak props in the ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinflipGate {
    /// Smallest absolute American price inside the band
    pub min_abs_price: i32,

    /// Largest absolute American price inside the band
    pub max_abs_price: i32,

    /// Gated props rated below this are ordered after every other prop
    pub rating_threshold: u8,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            expected_value: 0.30,
            hit_rate: 0.25,
            recent_form: 0.15,
            matchup: 0.15,
            offense: 0.05,
            line_value: 0.10,
        }
    }
}

impl Default for DisplayBand {
    fn default() -> Self {
        Self {
            min: DEFAULT_DISPLAY_MIN,
            max: DEFAULT_DISPLAY_MAX,
        }
    }
}

impl Default for CoinflipGate {
    fn default() -> Self {
        Self {
            min_abs_price: 95,
            max_abs_price: 105,
            rating_threshold: DEFAULT_GATE_RATING_THRESHOLD,
        }
    }
}

impl FactorWeights {
    /// Weights in factor order: EV, hit rate, form, matchup, offense, line value
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.expected_value,
            self.hit_rate,
            self.recent_form,
            self.matchup,
            self.offense,
            self.line_value,
        ]
    }

    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }
}

impl DisplayBand {
    pub fn span(&self) -> f64 {
        f64::from(self.max) - f64::from(self.min)
    }

    /// Rating every prop gets when the slate has no spread
    pub fn midpoint(&self) -> u8 {
        self.scale(0.5)
    }

    /// Map a position in [0, 1] onto the band, rounding half away from zero
    pub fn scale(&self, position: f64) -> u8 {
        let position = if position.is_finite() {
            position.clamp(0.0, 1.0)
        } else {
            0.5
        };
        let value = (f64::from(self.min) + position * self.span()).round();
        value.clamp(f64::from(self.min), f64::from(self.max)) as u8
    }
}

impl CoinflipGate {
    /// Whether an American price sits inside the near-even band
    pub fn contains(&self, price: i32) -> bool {
        let abs = price.unsigned_abs();
        abs >= self.min_abs_price.unsigned_abs() && abs <= self.max_abs_price.unsigned_abs()
    }
}

impl RatingConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `PROP_RATING_*` overrides from an arbitrary key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        override_from(&lookup, "DISPLAY_MIN", &mut self.display.min);
        override_from(&lookup, "DISPLAY_MAX", &mut self.display.max);
        override_from(&lookup, "GATE_MIN_PRICE", &mut self.gate.min_abs_price);
        override_from(&lookup, "GATE_MAX_PRICE", &mut self.gate.max_abs_price);
        override_from(&lookup, "GATE_THRESHOLD", &mut self.gate.rating_threshold);
        override_from(&lookup, "WEIGHT_EV", &mut self.weights.expected_value);
        override_from(&lookup, "WEIGHT_HIT_RATE", &mut self.weights.hit_rate);
        override_from(&lookup, "WEIGHT_FORM", &mut self.weights.recent_form);
        override_from(&lookup, "WEIGHT_MATCHUP", &mut self.weights.matchup);
        override_from(&lookup, "WEIGHT_OFFENSE", &mut self.weights.offense);
        override_from(&lookup, "WEIGHT_LINE", &mut self.weights.line_value);
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RatingConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject weights and bands the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        let weights = self.weights.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(RatingError::Config(
                "factor weights must be finite and non-negative".to_string(),
            ));
        }
        if self.weights.total() <= 0.0 {
            return Err(RatingError::Config(
                "at least one factor weight must be positive".to_string(),
            ));
        }
        if self.display.min >= self.display.max || self.display.max > 100 {
            return Err(RatingError::Config(format!(
                "display band {}..={} must satisfy min < max <= 100",
                self.display.min, self.display.max
            )));
        }
        if self.gate.min_abs_price.unsigned_abs() > self.gate.max_abs_price.unsigned_abs() {
            return Err(RatingError::Config(format!(
                "coinflip band {}..={} is inverted",
                self.gate.min_abs_price, self.gate.max_abs_price
            )));
        }
        Ok(())
    }
}

fn override_from<F, T>(lookup: &F, name: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let key = format!("{ENV_PREFIX}{name}");
    if let Some(raw) = lookup(&key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => warn!("Ignoring {}={:?}: not a valid value", key, raw),
        }
    }
}
