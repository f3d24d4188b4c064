//! Bounded-parallel resolution of a whole address set.
//!
//! Every unique address is handed to the [`CountryResolver`] exactly once on a
//! dedicated `rayon` pool. Resolutions are independent; the only synchronisation
//! is the collection barrier at the end of [`ResolutionPool::resolve_all`].

use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use geotally_common::network::country::CountryCode;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, warn};

use crate::resolver::{CountryResolver, RegistryLookup, ResolutionResult};

const MIN_WORKERS: usize = 2;
const RESERVED_CPUS: usize = 2;

/// Worker count for `cpus` available CPUs: two are left to the rest of the
/// system on machines with four or more, small machines get two workers.
pub fn worker_count(cpus: usize) -> usize {
    if cpus >= 4 {
        cpus.saturating_sub(RESERVED_CPUS).max(MIN_WORKERS)
    } else {
        MIN_WORKERS
    }
}

pub fn default_worker_count() -> usize {
    let cpus = thread::available_parallelism().map_or(1, |n| n.get());
    worker_count(cpus)
}

/// Resolved countries keyed by address, in the order addresses were submitted.
///
/// Holds an entry for every eligible address, including those whose lookup
/// produced no country.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressCountryMap {
    entries: Vec<(Ipv4Addr, Option<CountryCode>)>,
    index: HashMap<Ipv4Addr, usize>,
}

impl AddressCountryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first result for an address; later duplicates are ignored.
    pub fn insert(&mut self, result: ResolutionResult) {
        if self.index.contains_key(&result.address) {
            return;
        }
        self.index.insert(result.address, self.entries.len());
        self.entries.push((result.address, result.country));
    }

    /// The country of `addr`, if it was looked up and the registry named one.
    pub fn country(&self, addr: &Ipv4Addr) -> Option<&CountryCode> {
        self.index
            .get(addr)
            .and_then(|&i| self.entries[i].1.as_ref())
    }

    pub fn contains(&self, addr: &Ipv4Addr) -> bool {
        self.index.contains_key(addr)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Ipv4Addr, Option<&CountryCode>)> {
        self.entries
            .iter()
            .map(|(addr, country)| (*addr, country.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolved_count(&self) -> usize {
        self.entries.iter().filter(|(_, c)| c.is_some()).count()
    }
}

impl FromIterator<ResolutionResult> for AddressCountryMap {
    fn from_iter<T: IntoIterator<Item = ResolutionResult>>(iter: T) -> Self {
        let mut map = AddressCountryMap::new();
        for result in iter {
            map.insert(result);
        }
        map
    }
}

/// Called with `(completed, total)` after each resolution, from worker threads.
pub type ProgressFn<'a> = &'a (dyn Fn(usize, usize) + Sync);

pub struct ResolutionPool<L> {
    resolver: CountryResolver<L>,
    workers: usize,
}

impl<L: RegistryLookup> ResolutionPool<L> {
    pub fn new(resolver: CountryResolver<L>, workers: usize) -> Self {
        Self {
            resolver,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Resolves every unique address in `addresses` and blocks until all are done.
    pub fn resolve_all<I>(&self, addresses: I, progress: Option<ProgressFn<'_>>) -> AddressCountryMap
    where
        I: IntoIterator<Item = Ipv4Addr>,
    {
        let unique: Vec<Ipv4Addr> = dedup(addresses);
        if unique.is_empty() {
            return AddressCountryMap::new();
        }

        let total = unique.len();
        let completed = AtomicUsize::new(0);
        let resolve_one = |addr: &Ipv4Addr| {
            let result = self.resolver.resolve(*addr);
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(report) = progress {
                report(done, total);
            }
            result
        };

        let results: Vec<ResolutionResult> = match self.build_pool() {
            Some(pool) => {
                debug!("resolving {total} addresses on {} workers", self.workers);
                pool.install(|| unique.par_iter().map(resolve_one).collect())
            }
            None => unique.iter().map(resolve_one).collect(),
        };

        results.into_iter().collect()
    }

    fn build_pool(&self) -> Option<ThreadPool> {
        match ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("geotally-resolver-{i}"))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("could not start resolver workers, resolving sequentially: {e}");
                None
            }
        }
    }
}

fn dedup<I: IntoIterator<Item = Ipv4Addr>>(addresses: I) -> Vec<Ipv4Addr> {
    let mut seen: HashSet<Ipv4Addr> = HashSet::new();
    addresses.into_iter().filter(|addr| seen.insert(*addr)).collect()
}
