use std::time::Duration;

use log::{debug, warn};

use crate::delay_manager;
use crate::enrichment::EnrichmentResult;
use crate::logos::LogoCache;
use crate::sources::{PlayerQuery, SourceAdapter};

/// Canonical form of a player name for building lookups: trimmed, single
/// spaces, generational suffix spelled `Jr`, `Sr`, `II`, `III`, `IV`.
pub fn normalize_name(name: &str) -> String {
    let mut words: Vec<String> = name.split_whitespace().map(str::to_string).collect();

    if words.len() > 1 {
        if let Some(last) = words.last_mut() {
            let bare = last.trim_end_matches('.').to_ascii_lowercase();
            let canonical = match bare.as_str() {
                "jr" => Some("Jr"),
                "sr" => Some("Sr"),
                "ii" => Some("II"),
                "iii" => Some("III"),
                "iv" => Some("IV"),
                _ => None,
            };
            if let Some(canonical) = canonical {
                *last = canonical.to_string();
            }
        }
    }
    words.join(" ")
}

/// Tries each source in order and keeps the first answer that has both
/// height and weight.
pub struct Resolver {
    sources: Vec<Box<dyn SourceAdapter>>,
    logos: LogoCache,
    source_delay: Duration,
}

impl Resolver {
    pub fn new(sources: Vec<Box<dyn SourceAdapter>>, logos: LogoCache, source_delay: Duration) -> Self {
        Resolver {
            sources,
            logos,
            source_delay,
        }
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn logos(&self) -> &LogoCache {
        &self.logos
    }

    /// Never fails: source errors count as misses and exhausting every
    /// source yields a `not_found` result.
    pub fn resolve(&mut self, name: &str, position: &str, school: &str) -> EnrichmentResult {
        let normalized = normalize_name(name);
        let query = PlayerQuery {
            name: &normalized,
            position: position.trim(),
            school: school.trim(),
        };

        let mut result = None;
        let mut source_logo = None;

        for (i, source) in self.sources.iter().enumerate() {
            if i > 0 {
                delay_manager::source_delay(self.source_delay);
            }

            match source.lookup(&query) {
                Ok(Some(hit)) => match hit.measurements() {
                    Some((height, weight)) => {
                        source_logo = hit.logo;
                        result = Some(EnrichmentResult::found(source.name(), height, weight));
                        break;
                    }
                    None => debug!("{} had partial data for '{}'; trying next source", source.name(), normalized),
                },
                Ok(None) => debug!("{} has no data for '{}'", source.name(), normalized),
                Err(e) => warn!("{} lookup for '{}' failed: {}", source.name(), normalized, e),
            }
        }

        let logo = self.logos.logo_for(query.school).or(source_logo);
        result.unwrap_or_else(EnrichmentResult::not_found).with_logo(logo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{Height, Outcome, NOT_FOUND_TAG};
    use crate::error::SourceError;
    use crate::sources::SourceHit;
    use std::cell::RefCell;
    use std::rc::Rc;

    enum Answer {
        Hit(Option<u32>, Option<u32>),
        Nothing,
        Fail,
    }

    struct Scripted {
        name: &'static str,
        answer: Answer,
        seen: Rc<RefCell<Vec<String>>>,
    }

    impl Scripted {
        fn boxed(name: &'static str, answer: Answer, seen: &Rc<RefCell<Vec<String>>>) -> Box<dyn SourceAdapter> {
            Box::new(Scripted {
                name,
                answer,
                seen: seen.clone(),
            })
        }
    }

    impl SourceAdapter for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn lookup(&self, query: &PlayerQuery<'_>) -> Result<Option<SourceHit>, SourceError> {
            self.seen.borrow_mut().push(format!("{}:{}", self.name, query.name));
            match self.answer {
                Answer::Hit(inches, weight) => Ok(Some(SourceHit {
                    height: inches.and_then(Height::from_total_inches),
                    weight,
                    logo: None,
                })),
                Answer::Nothing => Ok(None),
                Answer::Fail => Err(SourceError::Parse("connection reset".into())),
            }
        }
    }

    fn resolver(sources: Vec<Box<dyn SourceAdapter>>) -> Resolver {
        Resolver::new(sources, LogoCache::disabled(), Duration::ZERO)
    }

    #[test]
    fn normalizes_suffixes_and_spacing() {
        assert_eq!(normalize_name("  John   Smith Jr. "), "John Smith Jr");
        assert_eq!(normalize_name("Rueben Bain JR"), "Rueben Bain Jr");
        assert_eq!(normalize_name("Ed Reed sr."), "Ed Reed Sr");
        assert_eq!(normalize_name("Marvin Harrison iii"), "Marvin Harrison III");
        assert_eq!(normalize_name("Jr"), "Jr");
        assert_eq!(normalize_name("Caleb Downs"), "Caleb Downs");
    }

    #[test]
    fn first_complete_source_wins() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut r = resolver(vec![
            Scripted::boxed("A", Answer::Hit(Some(74), Some(210)), &seen),
            Scripted::boxed("B", Answer::Hit(Some(70), Some(190)), &seen),
        ]);

        let result = r.resolve("John Smith Jr.", "QB", "State U");
        assert_eq!(result.provenance(), "A");
        assert_eq!(result.height().unwrap().to_string(), "6-2");
        assert_eq!(result.weight(), Some(210));
        assert_eq!(*seen.borrow(), vec!["A:John Smith Jr".to_string()]);
    }

    #[test]
    fn partial_hit_falls_through() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut r = resolver(vec![
            Scripted::boxed("A", Answer::Hit(Some(74), None), &seen),
            Scripted::boxed("B", Answer::Hit(Some(75), Some(250)), &seen),
        ]);

        let result = r.resolve("Caleb Downs", "S", "Ohio State");
        assert_eq!(result.provenance(), "B");
        assert_eq!(result.height().unwrap().to_string(), "6-3");
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn failures_and_partials_everywhere_are_not_found() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut r = resolver(vec![
            Scripted::boxed("A", Answer::Fail, &seen),
            Scripted::boxed("B", Answer::Nothing, &seen),
            Scripted::boxed("C", Answer::Hit(None, Some(300)), &seen),
        ]);

        let result = r.resolve("David Bailey", "ED", "Texas Tech");
        assert_eq!(result.outcome, Outcome::NotFound);
        assert_eq!(result.provenance(), NOT_FOUND_TAG);
        assert_eq!(result.height(), None);
        assert_eq!(result.weight(), None);
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn logo_cache_is_preferred_over_source_logo() {
        struct WithLogo;
        impl SourceAdapter for WithLogo {
            fn name(&self) -> &str {
                "tankathon"
            }
            fn lookup(&self, _: &PlayerQuery<'_>) -> Result<Option<SourceHit>, SourceError> {
                Ok(Some(SourceHit {
                    height: Height::new(6, 1),
                    weight: Some(200),
                    logo: Some("http://d2uki2uvp6v3wr.cloudfront.net/ncaa/alabama.svg".into()),
                }))
            }
        }

        let cache = LogoCache::new(vec![Box::new(crate::logos::EspnTeamLogos)]);
        let mut r = Resolver::new(vec![Box::new(WithLogo)], cache, Duration::ZERO);

        let alabama = r.resolve("Some Player", "WR", "Alabama");
        assert_eq!(
            alabama.logo.as_deref(),
            Some("https://a.espncdn.com/i/teamlogos/ncaa/500/333.png")
        );

        let unknown = r.resolve("Other Player", "WR", "Nowhere Tech");
        assert_eq!(
            unknown.logo.as_deref(),
            Some("http://d2uki2uvp6v3wr.cloudfront.net/ncaa/alabama.svg")
        );
    }
}
