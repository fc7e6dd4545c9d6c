//! Tolerant field decoders for upstream prop payloads.
//!
//! Feeds mix numbers, numeric strings and the occasional word for the same
//! field. A value that cannot be interpreted decodes to `None` (or an empty
//! label) so the prop falls back to a neutral feature instead of failing the
//! whole slate.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(f64),
    Text(String),
    Other(#[allow(dead_code)] IgnoredAny),
}

impl Loose {
    fn number(self) -> Option<f64> {
        let value = match self {
            Loose::Number(n) => n,
            Loose::Text(s) => s.trim().parse().ok()?,
            Loose::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    fn text(self) -> Option<String> {
        match self {
            Loose::Number(n) => Some(n.to_string()),
            Loose::Text(s) => Some(s),
            Loose::Other(_) => None,
        }
    }
}

/// Number or numeric string
pub(crate) fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Loose::deserialize(deserializer)?.number())
}

/// Like [`number`], 0 when unusable
pub(crate) fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(deserializer)?.unwrap_or(0.0))
}

/// American price such as `-115`, `"-115"` or `"+120"`
pub(crate) fn american_price<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(deserializer)?.and_then(|price| {
        let rounded = price.round();
        (rounded.abs() <= f64::from(i32::MAX)).then_some(rounded as i32)
    }))
}

/// Recent form as a 0-1 / 0-100 number or a form word ("hot", "cold", ...)
pub(crate) fn recent_form<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Text(word) => form_word(&word).or_else(|| Loose::Text(word).number()),
        other => other.number(),
    })
}

/// Form words on the 0-1 scale, 0.5 neutral
fn form_word(word: &str) -> Option<f64> {
    match word.trim().to_ascii_lowercase().as_str() {
        "hot" | "excellent" => Some(0.8),
        "good" | "strong" => Some(0.7),
        "average" | "neutral" => Some(0.5),
        "cold" | "poor" => Some(0.3),
        _ => None,
    }
}

/// Free-text label; numbers are kept as their text, anything else is empty
pub(crate) fn label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Loose::deserialize(deserializer)?.text().unwrap_or_default())
}

pub(crate) fn optional_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Loose::deserialize(deserializer)?.text())
}

/// Prop id; numeric ids are accepted, anything else is rejected
pub(crate) fn prop_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Loose::deserialize(deserializer)?
        .text()
        .ok_or_else(|| serde::de::Error::custom("prop id must be a string or a number"))
}
