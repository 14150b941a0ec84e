use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A player's height in feet and inches, written the way the draft site
/// displays it: `6-2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Height {
    pub feet: u8,
    pub inches: u8,
}

impl Height {
    pub fn new(feet: u8, inches: u8) -> Option<Self> {
        (inches < 12 && feet > 0).then_some(Height { feet, inches })
    }

    /// 74 -> 6-2. Zero means "unknown" in the feeds and maps to `None`.
    pub fn from_total_inches(total: u32) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let feet = u8::try_from(total / 12).ok()?;
        Height::new(feet, (total % 12) as u8)
    }

    pub fn total_inches(&self) -> u32 {
        u32::from(self.feet) * 12 + u32::from(self.inches)
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.feet, self.inches)
    }
}

impl FromStr for Height {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (feet, inches) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected feet-inches, got {:?}", s))?;
        let feet: u8 = feet.trim().parse().map_err(|_| format!("bad feet in {:?}", s))?;
        let inches: u8 = inches
            .trim()
            .parse()
            .map_err(|_| format!("bad inches in {:?}", s))?;
        Height::new(feet, inches).ok_or_else(|| format!("out of range height {:?}", s))
    }
}

impl TryFrom<String> for Height {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Height> for String {
    fn from(h: Height) -> Self {
        h.to_string()
    }
}

/// What the resolver concluded for one player.
///
/// `Found` always carries both measurements; a source that only knew one of
/// them never produces this variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Found {
        source: String,
        height: Height,
        weight: u32,
    },
    NotFound,
}

pub const NOT_FOUND_TAG: &str = "not_found";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    #[serde(flatten)]
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl EnrichmentResult {
    pub fn found(source: impl Into<String>, height: Height, weight: u32) -> Self {
        EnrichmentResult {
            outcome: Outcome::Found {
                source: source.into(),
                height,
                weight,
            },
            logo: None,
        }
    }

    pub fn not_found() -> Self {
        EnrichmentResult {
            outcome: Outcome::NotFound,
            logo: None,
        }
    }

    pub fn with_logo(mut self, logo: Option<String>) -> Self {
        self.logo = logo;
        self
    }

    /// Provenance tag: the source name, or `not_found`.
    pub fn provenance(&self) -> &str {
        match &self.outcome {
            Outcome::Found { source, .. } => source,
            Outcome::NotFound => NOT_FOUND_TAG,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self.outcome, Outcome::Found { .. })
    }

    pub fn height(&self) -> Option<Height> {
        match &self.outcome {
            Outcome::Found { height, .. } => Some(*height),
            Outcome::NotFound => None,
        }
    }

    pub fn weight(&self) -> Option<u32> {
        match &self.outcome {
            Outcome::Found { weight, .. } => Some(*weight),
            Outcome::NotFound => None,
        }
    }
}
