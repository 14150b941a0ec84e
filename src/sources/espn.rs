use regex::Regex;

use super::{PlayerQuery, SourceAdapter, SourceHit};
use crate::enrichment::Height;
use crate::error::{EnrichError, SourceError};
use crate::http::HttpFetcher;

/// ESPN prints bio lines like `6-2 HT` and `210 WT`.
pub struct EspnParser {
    height: Regex,
    weight: Regex,
}

impl EspnParser {
    pub fn new() -> Result<Self, EnrichError> {
        let compile = |pattern: &str| Regex::new(pattern).map_err(|e| EnrichError::Pattern(e.to_string()));
        Ok(EspnParser {
            height: compile(r"(\d+)-(\d+)\s*HT")?,
            weight: compile(r"(\d+)\s*WT")?,
        })
    }

    pub fn parse(&self, html: &str) -> Option<SourceHit> {
        let height = self.height.captures(html).and_then(|caps| {
            let feet = caps.get(1)?.as_str().parse().ok()?;
            let inches = caps.get(2)?.as_str().parse().ok()?;
            Height::new(feet, inches)
        });
        let weight = self
            .weight
            .captures(html)
            .and_then(|caps| caps.get(1)?.as_str().parse().ok())
            .filter(|w: &u32| *w > 0);

        if height.is_none() && weight.is_none() {
            return None;
        }
        Some(SourceHit {
            height,
            weight,
            logo: None,
        })
    }
}

pub struct EspnSource {
    fetcher: HttpFetcher,
    parser: EspnParser,
    draft_year: u16,
}

impl EspnSource {
    pub fn new(fetcher: HttpFetcher, draft_year: u16) -> Result<Self, EnrichError> {
        Ok(EspnSource {
            fetcher,
            parser: EspnParser::new()?,
            draft_year,
        })
    }

    pub fn search_url(&self, query: &PlayerQuery<'_>) -> String {
        let terms = format!(
            "{} {} {} {}",
            query.name, query.school, query.position, self.draft_year
        );
        format!(
            "https://www.espn.com/nfl/draft{}/player/_/{}",
            self.draft_year,
            urlencoding::encode(&terms)
        )
    }
}

impl SourceAdapter for EspnSource {
    fn name(&self) -> &str {
        "espn"
    }

    fn lookup(&self, query: &PlayerQuery<'_>) -> Result<Option<SourceHit>, SourceError> {
        let html = self.fetcher.get_text(&self.search_url(query))?;
        Ok(self.parser.parse(&html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parses_bio_line() {
        let html = r#"<ul class="PlayerHeader__Bio"><li>6-2 HT</li><li>210 WT</li><li>QB</li></ul>"#;
        let hit = EspnParser::new().unwrap().parse(html).unwrap();
        assert_eq!(hit.height.unwrap().to_string(), "6-2");
        assert_eq!(hit.weight, Some(210));
    }

    #[test]
    fn weight_only_is_partial() {
        let hit = EspnParser::new().unwrap().parse("<li>305 WT</li>").unwrap();
        assert_eq!(hit.height, None);
        assert!(hit.measurements().is_none());
    }

    #[test]
    fn search_url_is_encoded() {
        let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
        let source = EspnSource::new(fetcher, 2026).unwrap();
        let url = source.search_url(&PlayerQuery {
            name: "Rueben Bain Jr",
            position: "ED",
            school: "Miami (FL)",
        });
        assert_eq!(
            url,
            "https://www.espn.com/nfl/draft2026/player/_/Rueben%20Bain%20Jr%20Miami%20%28FL%29%20ED%202026"
        );
    }
}
