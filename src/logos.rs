use std::collections::HashMap;
use std::time::Duration;

use log::{debug, warn};

use crate::error::SourceError;
use crate::http::HttpFetcher;

/// ESPN team ids for schools that regularly produce draft prospects.
pub const ESPN_TEAM_IDS: &[(&str, u32)] = &[
    ("Alabama", 333),
    ("Arizona", 12),
    ("Arizona State", 9),
    ("Arkansas", 8),
    ("Auburn", 2),
    ("Baylor", 239),
    ("Boise State", 68),
    ("Boston College", 103),
    ("BYU", 252),
    ("Buffalo", 2084),
    ("California", 25),
    ("Cincinnati", 2132),
    ("Clemson", 228),
    ("Colorado", 38),
    ("Duke", 150),
    ("East Carolina", 151),
    ("Florida", 57),
    ("Florida State", 52),
    ("Georgia", 61),
    ("Georgia State", 2247),
    ("Georgia Tech", 59),
    ("Houston", 248),
    ("Illinois", 356),
    ("Indiana", 84),
    ("Iowa", 2294),
    ("Iowa State", 66),
    ("Kansas", 2305),
    ("Kansas State", 2306),
    ("Kentucky", 96),
    ("LSU", 99),
    ("Louisville", 97),
    ("Maryland", 120),
    ("Miami (FL)", 2390),
    ("Michigan", 130),
    ("Michigan State", 127),
    ("Minnesota", 135),
    ("Mississippi State", 344),
    ("Missouri", 142),
    ("Nebraska", 158),
    ("Nevada", 2440),
    ("North Carolina", 153),
    ("North Carolina State", 152),
    ("Notre Dame", 87),
    ("Ohio State", 194),
    ("Oklahoma", 201),
    ("Oklahoma State", 197),
    ("Ole Miss", 145),
    ("Oregon", 2483),
    ("Oregon State", 204),
    ("Penn State", 213),
    ("Pittsburgh", 221),
    ("Purdue", 2509),
    ("Rutgers", 164),
    ("SMU", 2567),
    ("South Carolina", 2579),
    ("Stanford", 24),
    ("Syracuse", 183),
    ("TCU", 2628),
    ("Tennessee", 2633),
    ("Texas", 251),
    ("Texas A&M", 245),
    ("Texas Tech", 2641),
    ("UCF", 2116),
    ("UCLA", 26),
    ("UMass", 113),
    ("USC", 30),
    ("UTSA", 2636),
    ("Utah", 254),
    ("Vanderbilt", 238),
    ("Virginia", 258),
    ("Virginia Tech", 259),
    ("Wake Forest", 154),
    ("Washington", 264),
    ("Washington State", 265),
    ("West Virginia", 277),
    ("Wisconsin", 275),
];

/// Host of the older logo CDN. Its URLs stopped resolving reliably.
pub const LEGACY_LOGO_HOST: &str = "d2uki2uvp6v3wr.cloudfront.net";

/// School names whose CDN slug is not just the hyphenated name.
const CDN_SLUG_ALIASES: &[(&str, &str)] = &[
    ("miami (fl)", "miami-florida"),
    ("miami", "miami-florida"),
    ("texas a&m", "texas-am"),
    ("ole miss", "mississippi"),
    ("usc", "southern-california"),
    ("ucf", "central-florida"),
    ("byu", "brigham-young"),
    ("lsu", "louisiana-state"),
    ("smu", "southern-methodist"),
    ("tcu", "texas-christian"),
    ("pitt", "pittsburgh"),
    ("nc state", "nc-state"),
    ("utsa", "texas-san-antonio"),
];

pub fn espn_logo_url(team_id: u32) -> String {
    format!("https://a.espncdn.com/i/teamlogos/ncaa/500/{}.png", team_id)
}

pub trait LogoSource {
    fn name(&self) -> &str;
    fn logo_for(&self, school: &str) -> Result<Option<String>, SourceError>;
}

/// Static lookup in [`ESPN_TEAM_IDS`]; never touches the network.
#[derive(Debug, Default)]
pub struct EspnTeamLogos;

impl LogoSource for EspnTeamLogos {
    fn name(&self) -> &str {
        "espn_team_ids"
    }

    fn logo_for(&self, school: &str) -> Result<Option<String>, SourceError> {
        let school = school.trim();
        Ok(ESPN_TEAM_IDS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(school))
            .map(|(_, id)| espn_logo_url(*id)))
    }
}

/// `Texas A&M` -> `texas-am`, `Penn State` -> `penn-state`.
pub fn cdn_slug(school: &str) -> String {
    let lower = school.trim().to_lowercase();
    if let Some((_, slug)) = CDN_SLUG_ALIASES.iter().find(|(name, _)| *name == lower) {
        return slug.to_string();
    }
    let cleaned: String = lower
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect();
    cleaned
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Probes the legacy CDN with a HEAD request.
pub struct TankathonCdnLogos {
    fetcher: HttpFetcher,
    timeout: Duration,
}

impl TankathonCdnLogos {
    pub fn new(fetcher: HttpFetcher) -> Self {
        TankathonCdnLogos {
            fetcher,
            timeout: Duration::from_secs(3),
        }
    }
}

impl LogoSource for TankathonCdnLogos {
    fn name(&self) -> &str {
        "tankathon_cdn"
    }

    fn logo_for(&self, school: &str) -> Result<Option<String>, SourceError> {
        let slug = cdn_slug(school);
        if slug.is_empty() {
            return Ok(None);
        }
        let url = format!("http://{}/ncaa/{}.svg", LEGACY_LOGO_HOST, slug);
        Ok(self.fetcher.exists(&url, self.timeout)?.then_some(url))
    }
}

/// Per-run school -> logo cache. Misses are cached too so a school is
/// looked up at most once per run.
pub struct LogoCache {
    sources: Vec<Box<dyn LogoSource>>,
    entries: HashMap<String, Option<String>>,
}

impl LogoCache {
    pub fn new(sources: Vec<Box<dyn LogoSource>>) -> Self {
        LogoCache {
            sources,
            entries: HashMap::new(),
        }
    }

    /// A cache with no sources; every lookup is a miss.
    pub fn disabled() -> Self {
        LogoCache::new(Vec::new())
    }

    pub fn logo_for(&mut self, school: &str) -> Option<String> {
        let key = school.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        if let Some(cached) = self.entries.get(&key) {
            return cached.clone();
        }

        let mut found = None;
        for source in &self.sources {
            match source.logo_for(school) {
                Ok(Some(url)) => {
                    debug!("Logo for '{}' from {}: {}", school, source.name(), url);
                    found = Some(url);
                    break;
                }
                Ok(None) => {}
                Err(e) => warn!("Logo lookup for '{}' via {} failed: {}", school, source.name(), e),
            }
        }
        self.entries.insert(key, found.clone());
        found
    }

    /// Schools seen so far and how many had a logo.
    pub fn stats(&self) -> (usize, usize) {
        let hits = self.entries.values().filter(|v| v.is_some()).count();
        (self.entries.len(), hits)
    }
}
