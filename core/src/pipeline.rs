//! # Analysis Pipeline
//!
//! Runs one capture through every stage:
//!
//! 1. **Capture**: read packet records, honouring the packet limit.
//! 2. **Extraction**: keep the IPv4 address pairs.
//! 3. **Classification**: collect the unique eligible addresses.
//! 4. **Resolution**: look them up on the worker pool.
//! 5. **Aggregation**: attribute every packet by source and destination.
//!
//! Progress is reported through a [`PipelineObserver`]; the result is a
//! [`Report`] that the caller renders however it likes.

use std::path::Path;
use std::time::{Duration, Instant};

use geotally_common::config::Config;
use geotally_common::error::CaptureError;
use geotally_common::network::address;

use crate::capture;
use crate::distribution::{self, Distribution};
use crate::extractor::{self, Extraction};
use crate::pool::{self, AddressCountryMap, ProgressFn, ResolutionPool};
use crate::resolver::{CountryResolver, RegistryLookup};

/// Stage notifications. All methods default to doing nothing.
///
/// `resolution_progress` is called from resolver worker threads.
pub trait PipelineObserver: Sync {
    fn reading(&self, _path: &Path) {}
    fn extracted(&self, _extraction: &Extraction) {}
    fn resolving(&self, _unique: usize, _workers: usize) {}
    fn resolution_progress(&self, _completed: usize, _total: usize) {}
    fn resolved(&self, _mapping: &AddressCountryMap) {}
}

impl PipelineObserver for () {}

/// Everything a run produced, ready for rendering.
#[derive(Debug, Clone)]
pub struct Report {
    /// Packet records read, IPv4 or not.
    pub packet_count: usize,
    /// Packets that carried IPv4 addresses.
    pub pair_count: usize,
    /// Unique eligible addresses submitted for lookup.
    pub unique_addresses: usize,
    pub distribution: Distribution,
    pub mapping: AddressCountryMap,
    pub elapsed: Duration,
}

pub struct Pipeline<L> {
    packet_limit: Option<usize>,
    pool: ResolutionPool<L>,
}

impl<L: RegistryLookup> Pipeline<L> {
    pub fn new(cfg: &Config, lookup: L) -> Self {
        let workers = cfg.workers.unwrap_or_else(pool::default_worker_count);
        Self {
            packet_limit: cfg.packet_limit.filter(|&n| n > 0),
            pool: ResolutionPool::new(CountryResolver::new(lookup), workers),
        }
    }

    /// Analyses the capture at `path`.
    ///
    /// Only an unreadable capture fails the run; lookup problems end up as
    /// `LOCAL` attributions.
    pub fn run(&self, path: &Path, observer: &dyn PipelineObserver) -> Result<Report, CaptureError> {
        let started = Instant::now();

        observer.reading(path);
        let records = capture::read_capture(path, self.packet_limit)?;
        let extraction = extractor::extract(&records);
        observer.extracted(&extraction);

        let eligible = address::eligible_addresses(&extraction.pairs);
        observer.resolving(eligible.len(), self.pool.workers());
        let progress: ProgressFn<'_> =
            &|completed: usize, total: usize| observer.resolution_progress(completed, total);
        let mapping = self.pool.resolve_all(eligible, Some(progress));
        observer.resolved(&mapping);

        let distribution = distribution::aggregate(&extraction.pairs, &mapping);

        Ok(Report {
            packet_count: extraction.packet_count,
            pair_count: extraction.pairs.len(),
            unique_addresses: mapping.len(),
            distribution,
            mapping,
            elapsed: started.elapsed(),
        })
    }
}
