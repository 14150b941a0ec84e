use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::{info, warn};
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::logos::{espn_logo_url, ESPN_TEAM_IDS, LEGACY_LOGO_HOST};
use crate::output::{self, OutputRow};

/// Tables the site reads. Only created when missing.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS players (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    position TEXT,
    school TEXT,
    height TEXT,
    weight INTEGER,
    rank INTEGER,
    pff_grade REAL,
    scout_grade REAL,
    school_logo TEXT
);
CREATE TABLE IF NOT EXISTS expert_reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER REFERENCES players(id),
    body TEXT
);
CREATE TABLE IF NOT EXISTS community_reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER REFERENCES players(id),
    body TEXT
);
CREATE TABLE IF NOT EXISTS votes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    report_id INTEGER REFERENCES community_reports(id),
    value INTEGER
);
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Upsert players by slug; reports and votes are left alone.
    Replace,
    /// Wipe players together with everything that hangs off them, then insert.
    Reset,
}

impl FromStr for LoadMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(LoadMode::Replace),
            "reset" => Ok(LoadMode::Reset),
            other => Err(format!("unknown load mode {:?} (expected replace or reset)", other)),
        }
    }
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadMode::Replace => f.write_str("replace"),
            LoadMode::Reset => f.write_str("reset"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub written: usize,
    pub with_measurements: usize,
    pub with_logo: usize,
}

/// URL slug for a player page: `Ja'Marr Chase` -> `jamarr-chase`.
pub fn player_slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace() || *c == '\'' || *c == '-')
        .collect::<String>()
        .replace(' ', "-")
        .replace('\'', "")
}

pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Reads the artifact back from disk and loads it, so the database only
/// ever sees what was written to the CSV.
pub fn load_artifact(conn: &mut Connection, artifact: &Path, mode: LoadMode) -> Result<LoadReport> {
    let rows = output::read_csv(artifact)?;
    load_players(conn, &rows, mode)
}

pub fn load_players(conn: &mut Connection, rows: &[OutputRow], mode: LoadMode) -> Result<LoadReport> {
    if mode == LoadMode::Replace {
        return write_players(conn, rows, mode);
    }

    // foreign_keys cannot change inside a transaction; restored on every path
    let enforced: bool = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
    conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
    let loaded = write_players(conn, rows, mode);
    if enforced {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    }
    loaded
}

fn write_players(conn: &mut Connection, rows: &[OutputRow], mode: LoadMode) -> Result<LoadReport> {
    let tx = conn.transaction()?;
    if mode == LoadMode::Reset {
        tx.execute_batch(
            "DELETE FROM votes;
             DELETE FROM community_reports;
             DELETE FROM expert_reports;
             DELETE FROM players;",
        )?;
    }

    let mut report = LoadReport::default();
    {
        // upsert keeps the row id, so reports still point at their player
        let mut stmt = tx.prepare(
            "INSERT INTO players (name, slug, position, school, height, weight, rank, pff_grade, school_logo)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(slug) DO UPDATE SET
                 name = excluded.name,
                 position = excluded.position,
                 school = excluded.school,
                 height = excluded.height,
                 weight = excluded.weight,
                 rank = excluded.rank,
                 pff_grade = excluded.pff_grade,
                 school_logo = excluded.school_logo",
        )?;
        let mut seen = HashSet::new();
        for (i, row) in rows.iter().enumerate() {
            let rank: i64 = row.rank.trim().parse().unwrap_or(i as i64 + 1);
            let slug = player_slug(&row.player);
            let height = non_empty(&row.height);
            let weight: Option<i64> = row.weight.trim().parse().ok();
            let pff_grade: Option<f64> = row.pff_grade.trim().parse().ok();
            let logo = non_empty(&row.school_logo);

            stmt.execute(params![
                row.player,
                slug,
                row.position,
                row.school,
                height,
                weight,
                rank,
                pff_grade,
                logo,
            ])?;

            if !seen.insert(slug) {
                warn!(
                    "Rank {} ({}) shares a slug with an earlier row and overwrote it",
                    row.rank, row.player
                );
                continue;
            }
            report.written += 1;
            if height.is_some() && weight.is_some() {
                report.with_measurements += 1;
            }
            if logo.is_some() {
                report.with_logo += 1;
            }
        }
    }
    tx.commit()?;

    info!(
        "Loaded {} players ({} with height/weight, {} with logos) using {} mode",
        report.written, report.with_measurements, report.with_logo, mode
    );
    Ok(report)
}

/// Drops logos pointing at the legacy CDN and sets the ESPN logo for every
/// school with a known team id. Returns the number of rows given an ESPN logo.
pub fn apply_espn_logos(conn: &mut Connection) -> Result<usize> {
    let tx = conn.transaction()?;
    let legacy_pattern = format!("%{}%", LEGACY_LOGO_HOST);
    tx.execute(
        "UPDATE players SET school_logo = NULL WHERE school_logo LIKE ?1",
        params![legacy_pattern],
    )?;

    let mut updated = 0;
    {
        let mut stmt =
            tx.prepare("UPDATE players SET school_logo = ?1 WHERE TRIM(school) = ?2 COLLATE NOCASE")?;
        for (school, team_id) in ESPN_TEAM_IDS {
            updated += stmt.execute(params![espn_logo_url(*team_id), school])?;
        }
    }
    tx.commit()?;
    info!("Set ESPN logos on {} players", updated);
    Ok(updated)
}

pub fn count_players(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM players", [], |row| row.get(0))?)
}

fn non_empty(s: &str) -> Option<&str> {
    Some(s.trim()).filter(|s| !s.is_empty())
}
