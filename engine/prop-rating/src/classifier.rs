//! Priority classification of free-text market labels.
//!
//! Labels can match several categories at once ("passing touchdowns"), so the
//! rules are evaluated in a fixed precedence order and the first match wins.

use serde::{Deserialize, Serialize};

pub const TIER_OFFENSE: u8 = 1;
pub const TIER_KICKING: u8 = 2;
pub const TIER_DEFENSE: u8 = 4;
pub const TIER_DEFAULT: u8 = 50;
pub const TIER_TOUCHDOWN: u8 = 99;

const OFFENSE_KEYWORDS: [(&str, u8); 3] = [("passing", 1), ("rushing", 2), ("receiving", 3)];
const KICKING_KEYWORDS: [&str; 3] = ["field goal", "kicking", "extra point"];
const DEFENSE_KEYWORDS: [&str; 4] = ["defense", "sack", "tackle", "interception"];

/// Coarse tier plus fine sub-order within the offense tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Priority {
    pub tier: u8,

    /// Only meaningful inside the offense tier; 0 elsewhere
    pub sub_order: u8,
}

impl Priority {
    pub fn is_offense(&self) -> bool {
        self.tier == TIER_OFFENSE
    }

    fn tier_only(tier: u8) -> Self {
        Self { tier, sub_order: 0 }
    }
}

/// Classify a market label. Never fails; unknown labels land in the default tier.
pub fn classify(category_label: &str) -> Priority {
    let label = category_label.to_lowercase();

    if label.contains("touchdown") {
        return Priority::tier_only(TIER_TOUCHDOWN);
    }

    if let Some((_, sub_order)) = OFFENSE_KEYWORDS.iter().find(|(kw, _)| label.contains(kw)) {
        return Priority {
            tier: TIER_OFFENSE,
            sub_order: *sub_order,
        };
    }

    if KICKING_KEYWORDS.iter().any(|kw| label.contains(kw)) {
        return Priority::tier_only(TIER_KICKING);
    }

    if DEFENSE_KEYWORDS.iter().any(|kw| label.contains(kw)) {
        return Priority::tier_only(TIER_DEFENSE);
    }

    Priority::tier_only(TIER_DEFAULT)
}
