use scraper::{ElementRef, Html, Selector};

use super::{leading_number, PlayerQuery, SourceAdapter, SourceHit};
use crate::enrichment::Height;
use crate::error::{EnrichError, SourceError};
use crate::http::HttpFetcher;

const PROFILE_BASE: &str = "https://www.tankathon.com/nfl/players/";

/// Extracts measurements from a Tankathon player profile page.
pub struct TankathonParser {
    feet: Selector,
    inches: Selector,
    label: Selector,
    logo: Selector,
}

fn selector(css: &str) -> Result<Selector, EnrichError> {
    Selector::parse(css).map_err(|e| EnrichError::Pattern(format!("{}: {:?}", css, e)))
}

impl TankathonParser {
    pub fn new() -> Result<Self, EnrichError> {
        Ok(TankathonParser {
            feet: selector("span.feet")?,
            inches: selector("span.inches")?,
            label: selector("div.label")?,
            logo: selector(r#"img[src*="d2uki2uvp6v3wr.cloudfront.net/ncaa/"]"#)?,
        })
    }

    /// Height is split over `span.feet` (`6'`) and `span.inches` (`5"`);
    /// weight is the `.value` div right after the "Weight" label.
    pub fn parse(&self, html: &str) -> Option<SourceHit> {
        let document = Html::parse_document(html);

        let first_number = |sel: &Selector| {
            document
                .select(sel)
                .next()
                .and_then(|el| leading_number(&el.text().collect::<String>()))
        };

        let height = match (first_number(&self.feet), first_number(&self.inches)) {
            (Some(feet), Some(inches)) => u8::try_from(feet)
                .ok()
                .zip(u8::try_from(inches).ok())
                .and_then(|(feet, inches)| Height::new(feet, inches)),
            _ => None,
        };

        let weight = document
            .select(&self.label)
            .find(|label| label.text().collect::<String>().trim().eq_ignore_ascii_case("weight"))
            .and_then(|label| label.next_siblings().find_map(ElementRef::wrap))
            .and_then(|value| leading_number(&value.text().collect::<String>()))
            .filter(|w| *w > 0);

        let logo = document
            .select(&self.logo)
            .filter_map(|img| img.value().attr("src"))
            .find(|src| src.ends_with(".svg"))
            .map(str::to_string);

        if height.is_none() && weight.is_none() && logo.is_none() {
            return None;
        }
        Some(SourceHit {
            height,
            weight,
            logo,
        })
    }
}

/// `Rueben Bain Jr` -> `rueben-bain-jr`.
pub fn profile_slug(normalized_name: &str) -> String {
    normalized_name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .replace('\'', "")
}

pub struct TankathonSource {
    fetcher: HttpFetcher,
    parser: TankathonParser,
}

impl TankathonSource {
    pub fn new(fetcher: HttpFetcher) -> Result<Self, EnrichError> {
        Ok(TankathonSource {
            fetcher,
            parser: TankathonParser::new()?,
        })
    }
}

impl SourceAdapter for TankathonSource {
    fn name(&self) -> &str {
        "tankathon"
    }

    fn lookup(&self, query: &PlayerQuery<'_>) -> Result<Option<SourceHit>, SourceError> {
        let url = url::Url::parse(PROFILE_BASE)?.join(&profile_slug(query.name))?;
        let html = self.fetcher.get_text(url.as_str())?;
        Ok(self.parser.parse(&html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"
        <html><body>
          <div class="player-header">
            <img class="logo" src="http://d2uki2uvp6v3wr.cloudfront.net/ncaa/indiana.svg">
            <div class="measurables">
              <div class="item"><div class="label">Height</div>
                <div class="value"><span class="feet">6'</span><span class="inches">5&quot;</span></div></div>
              <div class="item"><div class="label">Weight</div><div class="value">225<span class="small">lbs</span></div></div>
            </div>
          </div>
        </body></html>"#;

    #[test]
    fn parses_full_profile() {
        let hit = TankathonParser::new().unwrap().parse(PROFILE).unwrap();
        assert_eq!(hit.height.unwrap().to_string(), "6-5");
        assert_eq!(hit.weight, Some(225));
        assert_eq!(
            hit.logo.as_deref(),
            Some("http://d2uki2uvp6v3wr.cloudfront.net/ncaa/indiana.svg")
        );
        assert!(hit.measurements().is_some());
    }

    #[test]
    fn profile_without_weight_is_partial() {
        let html = r#"<span class="feet">6'</span><span class="inches">1&quot;</span>"#;
        let hit = TankathonParser::new().unwrap().parse(html).unwrap();
        assert!(hit.height.is_some());
        assert_eq!(hit.weight, None);
        assert!(hit.measurements().is_none());
    }

    #[test]
    fn unrelated_page_is_no_data() {
        let html = "<html><body><h1>Page not found</h1></body></html>";
        assert_eq!(TankathonParser::new().unwrap().parse(html), None);
    }

    #[test]
    fn slug_from_normalized_name() {
        assert_eq!(profile_slug("Rueben Bain Jr"), "rueben-bain-jr");
        assert_eq!(profile_slug("Ja'Marr  Chase"), "jamarr-chase");
    }
}
