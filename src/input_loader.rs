use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use calamine::{open_workbook_auto, Reader};
use log::{info, warn};
use serde::Deserialize;

use crate::enrichment::Height;
use crate::error::{EnrichError, Result};

/// One prospect from the feed. Read once, never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    pub id: String,
    pub name: String,
    pub position: String,
    pub school: String,
    pub height: Option<Height>,
    pub weight: Option<u32>,
    pub pff_grade: Option<String>,
    pub analysis: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    /// 1-based data row number within the feed.
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadedInput {
    pub records: Vec<InputRecord>,
    pub skipped: Vec<SkippedRow>,
}

/// Every field optional so a bad row can be reported instead of failing
/// the whole file.
#[derive(Debug, Default, Deserialize)]
struct CsvRow {
    #[serde(default, rename = "Rank", alias = "rank", alias = "RANK", alias = "Id", alias = "id")]
    rank: Option<String>,
    #[serde(default, rename = "Player", alias = "player", alias = "Name", alias = "name")]
    player: Option<String>,
    #[serde(default, rename = "Position", alias = "position", alias = "Pos", alias = "POS")]
    position: Option<String>,
    #[serde(default, rename = "School", alias = "school", alias = "College", alias = "college")]
    school: Option<String>,
    #[serde(default, rename = "Height", alias = "height", alias = "HT")]
    height: Option<String>,
    #[serde(default, rename = "Weight", alias = "weight", alias = "WT")]
    weight: Option<String>,
    #[serde(default, rename = "PFF Grade", alias = "pff_grade", alias = "PFF")]
    pff_grade: Option<String>,
    #[serde(default, rename = "Analysis", alias = "analysis")]
    analysis: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonFeed {
    #[serde(default)]
    prospects: Vec<JsonProspect>,
}

#[derive(Debug, Deserialize)]
struct JsonProspect {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    team_name: Option<String>,
    /// Total inches.
    #[serde(default)]
    height: Option<f64>,
    #[serde(default)]
    weight: Option<f64>,
}

/// Loads the feed, picking the reader by extension: `.json`, `.xlsx`/`.xls`,
/// anything else as CSV. Keeps at most `limit` rows.
pub fn load_records<P: AsRef<Path>>(filename: P, limit: Option<usize>) -> Result<LoadedInput> {
    let path = filename.as_ref();
    if !path.exists() {
        return Err(EnrichError::InvalidInput {
            path: path.to_path_buf(),
            reason: "file does not exist".into(),
        });
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let mut loaded = match extension.as_str() {
        "json" => load_json(path)?,
        "xlsx" | "xls" => load_excel(path)?,
        _ => load_csv(path)?,
    };

    for skipped in &loaded.skipped {
        warn!("Skipping input row {}: {}", skipped.row, skipped.reason);
    }
    if let Some(limit) = limit {
        loaded.records.truncate(limit);
    }
    info!(
        "Loaded {} records from {:?} ({} skipped)",
        loaded.records.len(),
        path,
        loaded.skipped.len()
    );
    Ok(loaded)
}

fn load_csv(path: &Path) -> Result<LoadedInput> {
    let file = File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let mut builder = FeedBuilder::default();
    for (i, result) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = i + 1;
        match result {
            Ok(raw) => builder.push(
                row,
                RawFields {
                    id: raw.rank,
                    name: raw.player,
                    position: raw.position,
                    school: raw.school,
                    height: raw.height.as_deref().and_then(parse_height_text),
                    weight: raw.weight.as_deref().and_then(parse_weight_text),
                    pff_grade: raw.pff_grade,
                    analysis: raw.analysis,
                },
            ),
            Err(e) => builder.skip(row, format!("unparseable csv record: {}", e)),
        }
    }
    Ok(builder.finish())
}

fn load_json(path: &Path) -> Result<LoadedInput> {
    let file = File::open(path)?;
    let feed: JsonFeed = serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| {
        EnrichError::InvalidInput {
            path: path.to_path_buf(),
            reason: format!("not a prospects document: {}", e),
        }
    })?;

    let mut builder = FeedBuilder::default();
    for (i, prospect) in feed.prospects.into_iter().enumerate() {
        let row = i + 1;
        builder.push(
            row,
            RawFields {
                // feed order is the rank
                id: Some(row.to_string()),
                name: prospect.name,
                position: prospect.position,
                school: prospect.team_name,
                height: prospect
                    .height
                    .filter(|h| *h > 0.0)
                    .and_then(|h| Height::from_total_inches(h.round() as u32)),
                weight: prospect.weight.filter(|w| *w > 0.0).map(|w| w.round() as u32),
                pff_grade: None,
                analysis: None,
            },
        );
    }
    Ok(builder.finish())
}

fn load_excel(path: &Path) -> Result<LoadedInput> {
    let mut workbook = open_workbook_auto(path)?;
    let worksheets = workbook.worksheets();
    let Some((_name, range)) = worksheets.first() else {
        return Err(EnrichError::InvalidInput {
            path: path.to_path_buf(),
            reason: "workbook has no worksheets".into(),
        });
    };

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(LoadedInput::default());
    };

    let mut columns = ExcelColumns::default();
    for (col_idx, cell) in header.iter().enumerate() {
        let name = cell.to_string().to_lowercase();
        let slot = if name.contains("rank") {
            &mut columns.rank
        } else if name.contains("player") || name == "name" {
            &mut columns.name
        } else if name.contains("pos") {
            &mut columns.position
        } else if name.contains("school") || name.contains("college") {
            &mut columns.school
        } else if name.contains("height") {
            &mut columns.height
        } else if name.contains("weight") {
            &mut columns.weight
        } else if name.contains("pff") {
            &mut columns.pff_grade
        } else if name.contains("analysis") {
            &mut columns.analysis
        } else {
            continue;
        };
        slot.get_or_insert(col_idx);
    }

    if columns.rank.is_none() || columns.name.is_none() {
        return Err(EnrichError::InvalidInput {
            path: path.to_path_buf(),
            reason: "header row needs 'Rank' and 'Player' columns".into(),
        });
    }

    let mut builder = FeedBuilder::default();
    for (i, cells) in rows.enumerate() {
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| cells.get(i))
                .map(|c| c.to_string().trim().to_string())
                .filter(|s| !s.is_empty())
        };
        builder.push(
            i + 1,
            RawFields {
                id: cell(columns.rank),
                name: cell(columns.name),
                position: cell(columns.position),
                school: cell(columns.school),
                height: cell(columns.height).as_deref().and_then(parse_height_text),
                weight: cell(columns.weight).as_deref().and_then(parse_weight_text),
                pff_grade: cell(columns.pff_grade),
                analysis: cell(columns.analysis),
            },
        );
    }
    Ok(builder.finish())
}

#[derive(Default)]
struct ExcelColumns {
    rank: Option<usize>,
    name: Option<usize>,
    position: Option<usize>,
    school: Option<usize>,
    height: Option<usize>,
    weight: Option<usize>,
    pff_grade: Option<usize>,
    analysis: Option<usize>,
}

struct RawFields {
    id: Option<String>,
    name: Option<String>,
    position: Option<String>,
    school: Option<String>,
    height: Option<Height>,
    weight: Option<u32>,
    pff_grade: Option<String>,
    analysis: Option<String>,
}

/// Validates rows as they come in: identifier and name are required and
/// identifiers must be unique.
#[derive(Default)]
struct FeedBuilder {
    loaded: LoadedInput,
    seen: HashSet<String>,
}

impl FeedBuilder {
    fn push(&mut self, row: usize, raw: RawFields) {
        let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let Some(id) = non_empty(raw.id) else {
            return self.skip(row, "missing identifier".into());
        };
        let Some(name) = non_empty(raw.name) else {
            return self.skip(row, format!("row {:?} has no player name", id));
        };
        if !self.seen.insert(id.clone()) {
            return self.skip(row, format!("duplicate identifier {:?}", id));
        }

        self.loaded.records.push(InputRecord {
            id,
            name,
            position: non_empty(raw.position).unwrap_or_default(),
            school: non_empty(raw.school).unwrap_or_default(),
            height: raw.height,
            weight: raw.weight,
            pff_grade: non_empty(raw.pff_grade),
            analysis: non_empty(raw.analysis),
        });
    }

    fn skip(&mut self, row: usize, reason: String) {
        self.loaded.skipped.push(SkippedRow { row, reason });
    }

    fn finish(self) -> LoadedInput {
        self.loaded
    }
}

/// Accepts `6-2` or a bare inch count like `74`.
fn parse_height_text(text: &str) -> Option<Height> {
    let text = text.trim();
    text.parse::<Height>()
        .ok()
        .or_else(|| text.parse::<u32>().ok().and_then(Height::from_total_inches))
}

/// Accepts `210`, `210 lbs`, `210.0`.
fn parse_weight_text(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits
        .parse::<f64>()
        .ok()
        .filter(|w| *w > 0.0)
        .map(|w| w.round() as u32)
}
