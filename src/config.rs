use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{EnrichError, Result};
use crate::sink::LoadMode;

/// Everything a run needs, read from `ENRICH_*` environment variables.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub progress_path: PathBuf,
    pub limit: Option<usize>,
    pub batch_size: usize,
    pub row_delay: Duration,
    pub source_delay: Duration,
    pub http_timeout: Duration,
    pub draft_year: u16,
    pub database_path: Option<PathBuf>,
    pub db_mode: LoadMode,
    pub fix_logos: bool,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        EnrichConfig {
            input_path: PathBuf::from("prospects.csv"),
            output_path: PathBuf::from("data/prospects-enriched.csv"),
            progress_path: PathBuf::from("data/enrichment-progress.json"),
            limit: None,
            batch_size: 10,
            row_delay: Duration::from_millis(2000),
            source_delay: Duration::from_millis(1000),
            http_timeout: Duration::from_secs(10),
            draft_year: 2026,
            database_path: None,
            db_mode: LoadMode::Replace,
            fix_logos: false,
        }
    }
}

impl EnrichConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EnrichConfig::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let config = EnrichConfig {
            input_path: get("ENRICH_INPUT").map(PathBuf::from).unwrap_or(defaults.input_path),
            output_path: get("ENRICH_OUTPUT").map(PathBuf::from).unwrap_or(defaults.output_path),
            progress_path: get("ENRICH_PROGRESS")
                .map(PathBuf::from)
                .unwrap_or(defaults.progress_path),
            limit: parse_opt(&get, "ENRICH_LIMIT")?,
            batch_size: parse_opt(&get, "ENRICH_BATCH_SIZE")?.unwrap_or(defaults.batch_size),
            row_delay: parse_opt(&get, "ENRICH_ROW_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.row_delay),
            source_delay: parse_opt(&get, "ENRICH_SOURCE_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.source_delay),
            http_timeout: parse_opt(&get, "ENRICH_HTTP_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            draft_year: parse_opt(&get, "ENRICH_DRAFT_YEAR")?.unwrap_or(defaults.draft_year),
            database_path: get("ENRICH_DATABASE").map(PathBuf::from),
            db_mode: parse_opt(&get, "ENRICH_DB_MODE")?.unwrap_or(defaults.db_mode),
            fix_logos: get("ENRICH_FIX_LOGOS")
                .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "True" | "yes"))
                .unwrap_or(defaults.fix_logos),
        };

        if config.batch_size == 0 {
            return Err(EnrichError::Config {
                key: "ENRICH_BATCH_SIZE".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(config)
    }
}

fn parse_opt<T, G>(get: &G, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| EnrichError::Config {
                key: key.to_string(),
                reason: format!("{:?}: {}", raw, e),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<EnrichConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnrichConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.row_delay, Duration::from_secs(2));
        assert_eq!(config.source_delay, Duration::from_secs(1));
        assert!(config.database_path.is_none());
        assert_eq!(config.db_mode, LoadMode::Replace);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("ENRICH_INPUT", "feed.json"),
            ("ENRICH_LIMIT", "100"),
            ("ENRICH_ROW_DELAY_MS", "0"),
            ("ENRICH_DB_MODE", "reset"),
            ("ENRICH_FIX_LOGOS", "true"),
        ])
        .unwrap();
        assert_eq!(config.input_path, PathBuf::from("feed.json"));
        assert_eq!(config.limit, Some(100));
        assert!(config.row_delay.is_zero());
        assert_eq!(config.db_mode, LoadMode::Reset);
        assert!(config.fix_logos);
    }

    #[test]
    fn bad_numbers_and_zero_batch_are_rejected() {
        assert!(matches!(
            config_from(&[("ENRICH_LIMIT", "lots")]),
            Err(EnrichError::Config { .. })
        ));
        assert!(matches!(
            config_from(&[("ENRICH_BATCH_SIZE", "0")]),
            Err(EnrichError::Config { .. })
        ));
    }
}
