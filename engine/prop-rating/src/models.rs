use crate::classifier::Priority;
use crate::features::FeatureBundle;
use crate::lenient;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction a prop is rated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The "over" direction
    Favorable,
    /// The "under" direction
    Unfavorable,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Favorable, Side::Unfavorable];

    pub fn opposite(self) -> Side {
        match self {
            Side::Favorable => Side::Unfavorable,
            Side::Unfavorable => Side::Favorable,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Favorable => write!(f, "favorable"),
            Side::Unfavorable => write!(f, "unfavorable"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "favorable" | "over" => Ok(Side::Favorable),
            "unfavorable" | "under" => Ok(Side::Unfavorable),
            other => Err(format!("unknown side '{other}'")),
        }
    }
}

/// One value per direction
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SidePair<T> {
    pub favorable: T,
    pub unfavorable: T,
}

impl<T> SidePair<T> {
    pub fn new(favorable: T, unfavorable: T) -> Self {
        Self {
            favorable,
            unfavorable,
        }
    }

    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Favorable => &self.favorable,
            Side::Unfavorable => &self.unfavorable,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Favorable => &mut self.favorable,
            Side::Unfavorable => &mut self.unfavorable,
        }
    }
}

/// Optional performance features as they arrive from upstream payloads.
///
/// Both camelCase (frontend) and snake_case (backend) spellings are accepted,
/// and numeric strings count as numbers. Values that cannot be read as a
/// number decode to `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFeatures {
    #[serde(
        alias = "hitRate",
        alias = "recentHitRate",
        alias = "recent_hit_rate",
        deserialize_with = "lenient::number"
    )]
    pub hit_rate: Option<f64>,

    #[serde(alias = "l5", deserialize_with = "lenient::number")]
    pub hit_rate_l5: Option<f64>,

    #[serde(alias = "l10", deserialize_with = "lenient::number")]
    pub hit_rate_l10: Option<f64>,

    #[serde(alias = "l20", deserialize_with = "lenient::number")]
    pub hit_rate_l20: Option<f64>,

    /// Also accepts form words ("hot", "good", "average", "cold")
    #[serde(
        alias = "recentForm",
        alias = "form_score",
        deserialize_with = "lenient::recent_form"
    )]
    pub recent_form: Option<f64>,

    #[serde(
        alias = "seasonAverage",
        alias = "season_avg",
        alias = "historicalAverage",
        deserialize_with = "lenient::number"
    )]
    pub season_average: Option<f64>,

    #[serde(
        alias = "offenseRank",
        alias = "team_offense_rank",
        deserialize_with = "lenient::number"
    )]
    pub offense_rank: Option<f64>,

    #[serde(
        alias = "defenseRank",
        alias = "opponentRank",
        alias = "opponent_rank",
        alias = "matchup_rank",
        deserialize_with = "lenient::number"
    )]
    pub defense_rank: Option<f64>,

    #[serde(
        alias = "evPercent",
        alias = "expectedValue",
        alias = "expected_value",
        deserialize_with = "lenient::number"
    )]
    pub ev_percent: Option<f64>,
}

/// One wagerable line item, immutable for the duration of a ranking pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropRecord {
    /// Unique prop id
    #[serde(deserialize_with = "lenient::prop_id")]
    pub id: String,

    /// Player or team the prop is about (e.g., "Josh Allen")
    #[serde(
        default,
        alias = "playerName",
        alias = "entity",
        deserialize_with = "lenient::label"
    )]
    pub player_name: String,

    #[serde(default, deserialize_with = "lenient::optional_label")]
    pub team: Option<String>,

    /// Free-text market description (e.g., "passing yards")
    #[serde(
        default,
        alias = "propType",
        alias = "market",
        deserialize_with = "lenient::label"
    )]
    pub category: String,

    /// Numeric threshold of the prop
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub line: f64,

    /// American price for the favorable direction (e.g., -110)
    #[serde(
        default,
        alias = "overOdds",
        alias = "over_odds",
        deserialize_with = "lenient::american_price"
    )]
    pub price_favorable: Option<i32>,

    /// American price for the unfavorable direction
    #[serde(
        default,
        alias = "underOdds",
        alias = "under_odds",
        deserialize_with = "lenient::american_price"
    )]
    pub price_unfavorable: Option<i32>,

    #[serde(flatten)]
    pub features: RawFeatures,
}

impl PropRecord {
    /// Create a prop with no performance features
    pub fn new(
        id: impl Into<String>,
        player_name: impl Into<String>,
        category: impl Into<String>,
        line: f64,
        price_favorable: i32,
        price_unfavorable: i32,
    ) -> Self {
        Self {
            id: id.into(),
            player_name: player_name.into(),
            team: None,
            category: category.into(),
            line,
            price_favorable: Some(price_favorable),
            price_unfavorable: Some(price_unfavorable),
            features: RawFeatures::default(),
        }
    }

    pub fn with_features(mut self, features: RawFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn price(&self, side: Side) -> Option<i32> {
        match side {
            Side::Favorable => self.price_favorable,
            Side::Unfavorable => self.price_unfavorable,
        }
    }
}

/// Context shared by every prop of a slate
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlateContext {
    /// Sport key (e.g., "nfl")
    pub sport: String,

    /// Slate date
    pub date: Option<NaiveDate>,

    /// Selection filters currently applied
    pub filters: Vec<String>,
}

/// Cohort of props used as the normalization population
#[derive(Debug, Clone, PartialEq)]
pub struct Slate {
    pub generation: u64,
    pub context: SlateContext,
    pub props: Vec<PropRecord>,
}

impl Slate {
    pub fn new(generation: u64, context: SlateContext, props: Vec<PropRecord>) -> Self {
        Self {
            generation,
            context,
            props,
        }
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

/// Per-factor scores (each 0-100) behind one side's raw score
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FactorScores {
    pub expected_value: f64,
    pub hit_rate: f64,
    pub recent_form: f64,
    pub matchup: f64,
    pub offense: f64,
    pub line_value: f64,
}

impl FactorScores {
    /// Scores in factor order: EV, hit rate, form, matchup, offense, line value
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

    /// Number of factors scoring at least `threshold`
    pub fn count_at_least(&self, threshold: f64) -> usize {
        self.as_array().iter().filter(|f| **f >= threshold).count()
    }
}

/// A prop annotated with ratings and priority, valid only for its slate generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatedProp {
    pub record: PropRecord,
    pub slate_generation: u64,
    pub features: FeatureBundle,
    pub factors: SidePair<FactorScores>,
    pub raw_score: SidePair<f64>,
    pub normalized_rating: SidePair<u8>,
    pub priority: Priority,
}

impl RatedProp {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn rating(&self, side: Side) -> u8 {
        *self.normalized_rating.get(side)
    }

    pub fn grade(&self, side: Side) -> Grade {
        Grade::from_rating(self.rating(side))
    }

    pub fn color(&self, side: Side) -> RatingColor {
        RatingColor::from_rating(self.rating(side))
    }

    pub fn confidence(&self, side: Side) -> Confidence {
        Confidence::assess(self.rating(side), self.factors.get(side))
    }

    /// Short explanation of the strongest and weakest factors for a side
    pub fn reasoning(&self, side: Side) -> Vec<String> {
        let factors = self.factors.get(side);
        let mut notes = Vec::new();

        let labelled = [
            (factors.expected_value, "Excellent expected value", "Poor expected value"),
            (factors.hit_rate, "Strong hit rate across recent games", "Low hit rate"),
            (factors.recent_form, "Player in excellent recent form", "Player struggling recently"),
            (factors.matchup, "Favorable matchup", "Tough matchup"),
            (factors.offense, "Supportive offense", "Limited offense"),
            (
                factors.line_value,
                "Favorable line vs. season average",
                "Challenging line vs. season average",
            ),
        ];
        for (score, strong, weak) in labelled {
            if score >= 80.0 {
                notes.push(format!("{strong} ({score:.0})"));
            } else if score <= 30.0 {
                notes.push(format!("{weak} ({score:.0})"));
            }
        }

        if notes.is_empty() {
            notes.push("Balanced analysis across all factors".to_string());
        }
        notes
    }
}

/// Letter grade for a normalized rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_rating(rating: u8) -> Self {
        match rating {
            90.. => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        write!(f, "{letter}")
    }
}

/// Color band for a normalized rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingColor {
    Green,
    Yellow,
    Red,
}

impl RatingColor {
    pub fn from_rating(rating: u8) -> Self {
        match rating {
            80.. => RatingColor::Green,
            70..=79 => RatingColor::Yellow,
            _ => RatingColor::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn assess(rating: u8, factors: &FactorScores) -> Self {
        let strong = factors.count_at_least(70.0);
        if rating >= 75 && strong >= 3 {
            Confidence::High
        } else if rating >= 60 && strong >= 2 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}
