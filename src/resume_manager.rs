use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enrichment::{EnrichmentResult, Height, NOT_FOUND_TAG};
use crate::error::{EnrichError, Result};

pub const PROGRESS_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub name: String,
    pub result: EnrichmentResult,
}

/// Which rows are done and what was found for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub version: u32,
    pub completed: BTreeSet<String>,
    pub data: BTreeMap<String, ProgressEntry>,
}

impl Default for ProgressState {
    fn default() -> Self {
        ProgressState {
            version: PROGRESS_VERSION,
            completed: BTreeSet::new(),
            data: BTreeMap::new(),
        }
    }
}

impl ProgressState {
    pub fn contains(&self, id: &str) -> bool {
        self.completed.contains(id)
    }

    /// Stores the result and marks the row processed in one step, so the
    /// completed set never names a row without an entry.
    pub fn record(&mut self, id: impl Into<String>, name: impl Into<String>, result: EnrichmentResult) {
        let id = id.into();
        self.data.insert(
            id.clone(),
            ProgressEntry {
                name: name.into(),
                result,
            },
        );
        self.completed.insert(id);
    }

    pub fn result(&self, id: &str) -> Option<&EnrichmentResult> {
        self.data.get(id).map(|entry| &entry.result)
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Count of stored results per provenance tag.
    pub fn source_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.data.values() {
            *counts.entry(entry.result.provenance().to_string()).or_insert(0) += 1;
        }
        counts
    }

    fn first_orphan(&self) -> Option<&String> {
        self.completed.iter().find(|id| !self.data.contains_key(*id))
    }
}

/// Snapshot layout written before the file carried a version field.
/// Missing values were stored as empty strings.
#[derive(Deserialize)]
struct LegacySnapshot {
    #[serde(default)]
    completed: Vec<String>,
    #[serde(default)]
    data: BTreeMap<String, LegacyEntry>,
}

#[derive(Deserialize)]
struct LegacyEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    height: String,
    #[serde(default)]
    weight: Value,
    #[serde(default)]
    logo: String,
    #[serde(default)]
    source: String,
}

impl LegacyEntry {
    fn into_entry(self) -> ProgressEntry {
        let height = self.height.parse::<Height>().ok();
        let weight = match &self.weight {
            Value::Number(n) => n.as_u64().and_then(|w| u32::try_from(w).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        let logo = Some(self.logo).filter(|l| !l.trim().is_empty());
        let result = match (height, weight) {
            (Some(height), Some(weight)) if !self.source.is_empty() && self.source != NOT_FOUND_TAG => {
                EnrichmentResult::found(self.source, height, weight)
            }
            _ => EnrichmentResult::not_found(),
        };
        ProgressEntry {
            name: self.name,
            result: result.with_logo(logo),
        }
    }
}

impl From<LegacySnapshot> for ProgressState {
    fn from(legacy: LegacySnapshot) -> Self {
        ProgressState {
            version: PROGRESS_VERSION,
            completed: legacy.completed.into_iter().collect(),
            data: legacy
                .data
                .into_iter()
                .map(|(id, entry)| (id, entry.into_entry()))
                .collect(),
        }
    }
}

/// File-backed checkpoint for the enrichment run.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ProgressStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the last snapshot. A missing file is a fresh start; a file that
    /// exists but cannot be understood is an error, never an empty state.
    pub fn load(&self) -> Result<ProgressState> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No progress file found at {:?}. Starting fresh.", self.path);
                return Ok(ProgressState::default());
            }
            Err(e) => return Err(self.corrupt(format!("unreadable: {}", e))),
        };

        let raw: Value = serde_json::from_str(&content)
            .map_err(|e| self.corrupt(format!("not valid json: {}", e)))?;

        let state = match raw.get("version") {
            Some(version) => {
                let found = version
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| self.corrupt(format!("bad version field {}", version)))?;
                if found > PROGRESS_VERSION {
                    return Err(EnrichError::UnsupportedProgressVersion {
                        path: self.path.clone(),
                        found,
                        supported: PROGRESS_VERSION,
                    });
                }
                serde_json::from_value::<ProgressState>(raw)
                    .map_err(|e| self.corrupt(e.to_string()))?
            }
            None => {
                warn!("Progress file {:?} has no version; migrating legacy layout.", self.path);
                serde_json::from_value::<LegacySnapshot>(raw)
                    .map(ProgressState::from)
                    .map_err(|e| self.corrupt(e.to_string()))?
            }
        };

        if let Some(orphan) = state.first_orphan() {
            return Err(self.corrupt(format!("row {:?} is marked complete but has no result", orphan)));
        }

        info!("Resumed previous session: {} rows processed.", state.len());
        Ok(state)
    }

    /// Overwrites the snapshot via a temp file and rename, so a crash
    /// mid-write leaves the previous snapshot intact.
    pub fn save(&self, state: &ProgressState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.tmp_path();
        {
            let mut file = File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "progress.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn corrupt(&self, reason: String) -> EnrichError {
        EnrichError::CorruptProgress {
            path: self.path.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_state() -> ProgressState {
        let mut state = ProgressState::default();
        state.record(
            "1",
            "John Smith Jr.",
            EnrichmentResult::found("tankathon", Height::new(6, 2).unwrap(), 210)
                .with_logo(Some("https://a.espncdn.com/i/teamlogos/ncaa/500/333.png".into())),
        );
        state.record("2", "Jane Doe", EnrichmentResult::not_found());
        state
    }

    #[test]
    fn missing_file_is_empty_state() {
        let dir = tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("progress.json"));
        let state = store.load().unwrap();
        assert!(state.is_empty());
        assert!(state.data.is_empty());
        assert_eq!(state.version, PROGRESS_VERSION);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("nested").join("progress.json"));
        let state = sample_state();

        store.save(&state).unwrap();
        store.save(&state).unwrap();

        assert_eq!(store.load().unwrap(), state);
        assert!(!dir.path().join("nested").join("progress.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, "{ not json").unwrap();

        let err = ProgressStore::new(&path).load().unwrap_err();
        assert!(matches!(err, EnrichError::CorruptProgress { .. }));
    }

    #[test]
    fn completed_without_result_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, r#"{"version":1,"completed":["7"],"data":{}}"#).unwrap();

        let err = ProgressStore::new(&path).load().unwrap_err();
        assert!(matches!(err, EnrichError::CorruptProgress { .. }));
    }

    #[test]
    fn newer_version_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, r#"{"version":9,"completed":[],"data":{}}"#).unwrap();

        let err = ProgressStore::new(&path).load().unwrap_err();
        assert!(matches!(
            err,
            EnrichError::UnsupportedProgressVersion { found: 9, .. }
        ));
    }

    #[test]
    fn legacy_snapshot_is_migrated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(
            &path,
            r#"{
              "completed": ["1", "2", "3"],
              "data": {
                "1": {"name": "Arvell Reese", "height": "6-4", "weight": "243",
                      "logo": "http://d2uki2uvp6v3wr.cloudfront.net/ncaa/ohio-state.svg",
                      "source": "tankathon"},
                "2": {"name": "David Bailey", "height": "", "weight": "", "logo": "", "source": "not_found"},
                "3": {"name": "Caleb Downs", "height": "6-0", "weight": "", "logo": "", "source": "espn"}
              }
            }"#,
        )
        .unwrap();

        let state = ProgressStore::new(&path).load().unwrap();
        assert_eq!(state.version, PROGRESS_VERSION);
        assert_eq!(state.len(), 3);

        let reese = state.result("1").unwrap();
        assert_eq!(reese.provenance(), "tankathon");
        assert_eq!(reese.height().unwrap().to_string(), "6-4");
        assert_eq!(reese.weight(), Some(243));
        assert!(reese.logo.is_some());

        assert_eq!(state.result("2").unwrap().provenance(), NOT_FOUND_TAG);
        // half a measurement is not a hit
        assert!(!state.result("3").unwrap().is_found());
    }

    #[test]
    fn source_counts_group_by_provenance() {
        let counts = sample_state().source_counts();
        assert_eq!(counts.get("tankathon"), Some(&1));
        assert_eq!(counts.get(NOT_FOUND_TAG), Some(&1));
    }
}
