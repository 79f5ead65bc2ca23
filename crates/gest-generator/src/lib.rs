//! # gest-generator
//!
//! The generator contract for gest VOCS problems and a set of reference
//! generators.
//!
//! A [`Generator`] is built against a validated [`Vocs`](gest_types::Vocs)
//! through [`FromVocs::construct`], proposes points with `suggest`, learns from
//! evaluated points through `ingest` and is closed with `finalize`. The
//! reference generators cover independent random sampling, an exhaustive
//! grid, a single-objective local search and a wrapper that moves ingestion
//! onto a worker thread.

mod background;
mod generator;
mod grid;
mod perturb;
mod random;
mod state;

pub use background::{BackgroundConfig, BackgroundIngest};
pub use generator::{FromVocs, Generator};
pub use grid::{GridSampler, GridSamplerConfig};
pub use perturb::{Incumbent, PerturbationSampler, PerturbationSamplerConfig};
pub use random::{RandomSampler, RandomSamplerConfig};
pub use state::{resolve_count, Evaluation, GeneratorCore, Phase};

pub use gest_types;
