use std::error::Error;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info, warn};

use prospect_enricher_lib::logos::{EspnTeamLogos, LogoSource, TankathonCdnLogos};
use prospect_enricher_lib::{http::HttpFetcher, input_loader, logger, output, sink};
use prospect_enricher_lib::{EnrichConfig, EspnSource, LogoCache, Pipeline, ProgressStore, Resolver};
use prospect_enricher_lib::{RunOutcome, RunSettings, SourceAdapter, TankathonSource};

/// Conventional status for a run stopped by Ctrl-C.
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> Result<ExitCode, Box<dyn Error>> {
    logger::init();
    info!("Starting prospect enrichment...");

    let config = EnrichConfig::from_env()?;

    let interrupt = Arc::new(AtomicBool::new(false));
    {
        let flag = interrupt.clone();
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })?;
    }

    // 1. Load inputs
    let loaded = input_loader::load_records(&config.input_path, config.limit)?;
    if loaded.records.is_empty() {
        error!(
            "No usable records in {:?}. Expected Rank, Player, Position, School columns or a prospects JSON document.",
            config.input_path
        );
        return Ok(ExitCode::FAILURE);
    }
    if !loaded.skipped.is_empty() {
        warn!("{} input rows were skipped.", loaded.skipped.len());
    }

    // 2. Load resume state; a corrupt file stops here
    let store = ProgressStore::new(&config.progress_path);
    let mut state = store.load()?;

    // 3. Sources
    let fetcher = HttpFetcher::new(config.http_timeout)?;
    let sources: Vec<Box<dyn SourceAdapter>> = vec![
        Box::new(TankathonSource::new(fetcher.clone())?),
        Box::new(EspnSource::new(fetcher.clone(), config.draft_year)?),
    ];
    let logo_sources: Vec<Box<dyn LogoSource>> = vec![
        Box::new(EspnTeamLogos),
        Box::new(TankathonCdnLogos::new(fetcher)),
    ];
    let mut resolver = Resolver::new(sources, LogoCache::new(logo_sources), config.source_delay);
    info!("Sources in order: {}", resolver.source_names().join(", "));

    // 4. Enrich
    let settings = RunSettings {
        batch_size: config.batch_size,
        row_delay: config.row_delay,
    };
    let summary = Pipeline::new(&store, &mut resolver, settings, interrupt.clone())
        .run(&mut state, &loaded.records)?;

    // 5. Artifact, written for interrupted runs too
    let rows = output::materialize(&loaded.records, &state);
    output::write_csv(&config.output_path, &rows)?;

    let (schools, logo_hits) = resolver.logos().stats();
    let found = rows.iter().filter(|r| !r.height.is_empty() && !r.weight.is_empty()).count();
    info!(
        "Found data for {}/{} ({:.1}%). Logos for {}/{} schools.",
        found,
        rows.len(),
        found as f64 / rows.len() as f64 * 100.0,
        logo_hits,
        schools
    );
    for (source, count) in state.source_counts() {
        info!("  {}: {}", source, count);
    }

    if summary.outcome == RunOutcome::Interrupted {
        warn!("Interrupted! Progress saved. Run again to resume.");
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }

    // 6. Database
    if let Some(db_path) = &config.database_path {
        let mut conn = sink::open(db_path)?;
        sink::load_artifact(&mut conn, &config.output_path, config.db_mode)?;
        if config.fix_logos {
            sink::apply_espn_logos(&mut conn)?;
        }
        info!("Verified: {} players in {:?}", sink::count_players(&conn)?, db_path);
    }

    info!("Output: {:?}", config.output_path);
    Ok(ExitCode::SUCCESS)
}
