//! Card grading types.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::status::ParseStatusError;

/// Physical condition grade of a single card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum CardCondition {
    /// Near Mint.
    #[default]
    #[serde(rename = "NM")]
    NearMint,
    /// Lightly Played.
    #[serde(rename = "LP")]
    LightlyPlayed,
    /// Moderately Played.
    #[serde(rename = "MP")]
    ModeratelyPlayed,
    /// Heavily Played.
    #[serde(rename = "HP")]
    HeavilyPlayed,
    /// Damaged.
    #[serde(rename = "DMG")]
    Damaged,
}

impl CardCondition {
    /// Short grading code (`NM`, `LP`, ...).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NearMint => "NM",
            Self::LightlyPlayed => "LP",
            Self::ModeratelyPlayed => "MP",
            Self::HeavilyPlayed => "HP",
            Self::Damaged => "DMG",
        }
    }
}

impl fmt::Display for CardCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CardCondition {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NM" => Ok(Self::NearMint),
            "LP" => Ok(Self::LightlyPlayed),
            "MP" => Ok(Self::ModeratelyPlayed),
            "HP" => Ok(Self::HeavilyPlayed),
            "DMG" => Ok(Self::Damaged),
            _ => Err(ParseStatusError::new("card condition", s)),
        }
    }
}
