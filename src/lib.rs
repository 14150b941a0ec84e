pub mod config;
pub mod delay_manager;
pub mod enrichment;
pub mod error;
pub mod http;
pub mod input_loader;
pub mod logger;
pub mod logos;
pub mod output;
pub mod pipeline;
pub mod resolver;
pub mod resume_manager;
pub mod sink;
pub mod sources;

// Exporting types for convenience
pub use config::EnrichConfig;
pub use enrichment::{EnrichmentResult, Height, Outcome};
pub use error::{EnrichError, SourceError};
pub use input_loader::InputRecord;
pub use logos::LogoCache;
pub use pipeline::{Pipeline, RunOutcome, RunSettings, RunSummary};
pub use resolver::Resolver;
pub use resume_manager::{ProgressState, ProgressStore};
pub use sources::{EspnSource, SourceAdapter, TankathonSource};
