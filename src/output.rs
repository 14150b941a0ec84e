use std::fs::{self, File};
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::input_loader::InputRecord;
use crate::resume_manager::ProgressState;

/// One row of the enriched artifact. Column names match what the site's
/// import expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    #[serde(rename = "Rank")]
    pub rank: String,
    #[serde(rename = "Player")]
    pub player: String,
    #[serde(rename = "Position")]
    pub position: String,
    #[serde(rename = "School")]
    pub school: String,
    #[serde(rename = "Height")]
    pub height: String,
    #[serde(rename = "Weight")]
    pub weight: String,
    #[serde(rename = "School_Logo")]
    pub school_logo: String,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "PFF Grade")]
    pub pff_grade: String,
    #[serde(rename = "Analysis")]
    pub analysis: String,
}

/// Artifact header, in `OutputRow` field order.
pub const HEADER: [&str; 10] = [
    "Rank",
    "Player",
    "Position",
    "School",
    "Height",
    "Weight",
    "School_Logo",
    "Source",
    "PFF Grade",
    "Analysis",
];

/// Merges feed rows with stored results, in feed order. Resolved
/// measurements win over the feed's own; rows without a result keep the
/// feed values and an empty `Source`.
pub fn materialize(records: &[InputRecord], state: &ProgressState) -> Vec<OutputRow> {
    records
        .iter()
        .map(|record| {
            let result = state.result(&record.id);
            let height = result.and_then(|r| r.height()).or(record.height);
            let weight = result.and_then(|r| r.weight()).or(record.weight);

            OutputRow {
                rank: record.id.clone(),
                player: record.name.clone(),
                position: record.position.clone(),
                school: record.school.clone(),
                height: height.map(|h| h.to_string()).unwrap_or_default(),
                weight: weight.map(|w| w.to_string()).unwrap_or_default(),
                school_logo: result.and_then(|r| r.logo.clone()).unwrap_or_default(),
                source: result.map(|r| r.provenance().to_string()).unwrap_or_default(),
                pff_grade: record.pff_grade.clone().unwrap_or_default(),
                analysis: record.analysis.clone().unwrap_or_default(),
            }
        })
        .collect()
}

pub fn write_csv(path: &Path, rows: &[OutputRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    // header written up front so an empty run still yields a readable artifact
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(File::create(path)?);
    writer.write_record(HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Wrote {} rows to {:?}", rows.len(), path);
    Ok(())
}

pub fn read_csv(path: &Path) -> Result<Vec<OutputRow>> {
    let mut reader = csv::Reader::from_reader(File::open(path)?);
    let rows = reader.deserialize().collect::<std::result::Result<Vec<OutputRow>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{EnrichmentResult, Height};
    use tempfile::tempdir;

    fn record(id: &str, name: &str) -> InputRecord {
        InputRecord {
            id: id.into(),
            name: name.into(),
            position: "QB".into(),
            school: "State U".into(),
            height: None,
            weight: None,
            pff_grade: None,
            analysis: None,
        }
    }

    #[test]
    fn merges_results_in_feed_order() {
        let mut with_feed_values = record("3", "Feed Only");
        with_feed_values.height = Height::new(5, 11);
        with_feed_values.weight = Some(190);
        with_feed_values.pff_grade = Some("77.5".into());
        let records = vec![record("1", "John Smith Jr."), record("2", "Jane Doe"), with_feed_values];

        let mut state = ProgressState::default();
        state.record(
            "1",
            "John Smith Jr.",
            EnrichmentResult::found("A", Height::from_total_inches(74).unwrap(), 210)
                .with_logo(Some("https://logo/1.png".into())),
        );
        state.record("3", "Feed Only", EnrichmentResult::not_found());

        let rows = materialize(&records, &state);
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].height, "6-2");
        assert_eq!(rows[0].weight, "210");
        assert_eq!(rows[0].source, "A");
        assert_eq!(rows[0].school_logo, "https://logo/1.png");

        assert_eq!(rows[1].height, "");
        assert_eq!(rows[1].source, "");

        assert_eq!(rows[2].height, "5-11");
        assert_eq!(rows[2].weight, "190");
        assert_eq!(rows[2].source, "not_found");
        assert_eq!(rows[2].pff_grade, "77.5");
    }

    #[test]
    fn csv_has_expected_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("enriched.csv");
        let rows = materialize(&[record("1", "A Player")], &ProgressState::default());

        write_csv(&path, &rows).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(
            "Rank,Player,Position,School,Height,Weight,School_Logo,Source,PFF Grade,Analysis\n"
        ));
        assert_eq!(read_csv(&path).unwrap(), rows);
    }

    #[test]
    fn empty_artifact_still_has_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("enriched.csv");

        write_csv(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}\n", HEADER.join(",")));
        assert!(read_csv(&path).unwrap().is_empty());
    }
}
