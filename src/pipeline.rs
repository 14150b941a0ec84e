use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::delay_manager;
use crate::error::Result;
use crate::input_loader::InputRecord;
use crate::resolver::Resolver;
use crate::resume_manager::{ProgressState, ProgressStore};

#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    /// Flush the progress file after this many rows.
    pub batch_size: usize,
    /// Pause between rows, on top of the resolver's between-source delay.
    pub row_delay: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings {
            batch_size: 10,
            row_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Stopped early on request; progress was flushed and a re-run resumes.
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub total: usize,
    /// Rows already processed by an earlier run.
    pub resumed: usize,
    /// Rows resolved during this run.
    pub attempted: usize,
    pub found: usize,
    pub not_found: usize,
    pub by_source: BTreeMap<String, usize>,
}

/// Drives one run over the feed: skip what is done, resolve the rest in
/// order, checkpoint every batch and once more at the end.
pub struct Pipeline<'a> {
    store: &'a ProgressStore,
    resolver: &'a mut Resolver,
    settings: RunSettings,
    interrupt: Arc<AtomicBool>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        store: &'a ProgressStore,
        resolver: &'a mut Resolver,
        settings: RunSettings,
        interrupt: Arc<AtomicBool>,
    ) -> Self {
        Pipeline {
            store,
            resolver,
            settings,
            interrupt,
        }
    }

    fn interrupted(&self) -> bool {
        self.interrupt.load(Ordering::SeqCst)
    }

    pub fn run(&mut self, state: &mut ProgressState, records: &[InputRecord]) -> Result<RunSummary> {
        let total = records.len();
        let pending: Vec<(usize, &InputRecord)> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                let done = state.contains(&record.id);
                if done {
                    debug!("Skipping {} ({}): already processed", record.id, record.name);
                }
                !done
            })
            .collect();

        let mut summary = RunSummary {
            outcome: RunOutcome::Completed,
            total,
            resumed: total - pending.len(),
            attempted: 0,
            found: 0,
            not_found: 0,
            by_source: BTreeMap::new(),
        };
        info!(
            "Total prospects: {}, previously completed: {}, remaining: {}",
            total,
            summary.resumed,
            pending.len()
        );

        let batch_size = self.settings.batch_size.max(1);

        for (n, (index, record)) in pending.iter().enumerate() {
            if self.interrupted() {
                summary.outcome = RunOutcome::Interrupted;
                break;
            }

            let result = self
                .resolver
                .resolve(&record.name, &record.position, &record.school);

            let mark = if result.is_found() { "found" } else { "missing" };
            info!(
                "[{}/{}] {} ({}, {}): {} ({})",
                index + 1,
                total,
                record.name,
                record.position,
                record.school,
                mark,
                result.provenance()
            );

            if result.is_found() {
                summary.found += 1;
            } else {
                summary.not_found += 1;
            }
            *summary
                .by_source
                .entry(result.provenance().to_string())
                .or_insert(0) += 1;

            state.record(record.id.clone(), record.name.clone(), result);
            summary.attempted += 1;

            if summary.attempted % batch_size == 0 {
                self.store.save(state)?;
                debug!("Checkpoint: {} rows saved to {:?}", state.len(), self.store.path());
            }

            let is_last = n + 1 == pending.len();
            if !is_last && !delay_manager::row_delay(self.settings.row_delay, &self.interrupt) {
                summary.outcome = RunOutcome::Interrupted;
                break;
            }
        }

        self.store.save(state)?;

        match summary.outcome {
            RunOutcome::Completed => info!(
                "Run complete: {} resolved this run ({} found, {} not found), {} resumed.",
                summary.attempted, summary.found, summary.not_found, summary.resumed
            ),
            RunOutcome::Interrupted => info!(
                "Interrupted after {} rows. Progress saved to {:?}; run again to resume.",
                summary.attempted,
                self.store.path()
            ),
        }
        Ok(summary)
    }
}
