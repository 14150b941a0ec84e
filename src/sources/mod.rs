//! External lookups for player measurements.
//!
//! Each adapter answers for a single site. The resolver decides whether an
//! answer is good enough and which adapter to ask next.

mod espn;
mod tankathon;

pub use espn::{EspnParser, EspnSource};
pub use tankathon::{TankathonParser, TankathonSource};

use crate::enrichment::Height;
use crate::error::SourceError;

/// What the resolver asks each source. `name` is already normalized.
#[derive(Debug, Clone, Copy)]
pub struct PlayerQuery<'a> {
    pub name: &'a str,
    pub position: &'a str,
    pub school: &'a str,
}

/// Whatever a source managed to find. May be partial.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceHit {
    pub height: Option<Height>,
    pub weight: Option<u32>,
    pub logo: Option<String>,
}

impl SourceHit {
    /// Height and weight, if both are present.
    pub fn measurements(&self) -> Option<(Height, u32)> {
        Some((self.height?, self.weight?))
    }
}

pub trait SourceAdapter {
    /// Provenance tag recorded for results from this source.
    fn name(&self) -> &str;

    /// `Ok(None)` means the site answered but knows nothing useful.
    fn lookup(&self, query: &PlayerQuery<'_>) -> Result<Option<SourceHit>, SourceError>;
}

/// Leading digits of a text node: `6'` -> 6, `225lbs` -> 225.
pub(crate) fn leading_number(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
