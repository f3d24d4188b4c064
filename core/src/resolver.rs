//! Country resolution for a single address.
//!
//! The registry itself sits behind [`RegistryLookup`]; [`CountryResolver`] only
//! knows how to read a country out of its textual answer. Lookup failures are
//! absorbed here and surface as an unresolved address, never as an error.

use std::net::Ipv4Addr;
use std::sync::Arc;

use geotally_common::error::LookupError;
use geotally_common::network::country::CountryCode;
use tracing::{debug, trace};

mod whois;

pub use whois::WhoisLookup;

const COUNTRY_KEY: &str = "country";

/// A blocking registry query returning the raw, line-oriented answer.
pub trait RegistryLookup: Send + Sync {
    fn query(&self, addr: Ipv4Addr) -> Result<String, LookupError>;
}

impl<T: RegistryLookup + ?Sized> RegistryLookup for Arc<T> {
    fn query(&self, addr: Ipv4Addr) -> Result<String, LookupError> {
        (**self).query(addr)
    }
}

impl<T: RegistryLookup + ?Sized> RegistryLookup for Box<T> {
    fn query(&self, addr: Ipv4Addr) -> Result<String, LookupError> {
        (**self).query(addr)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    pub address: Ipv4Addr,
    pub country: Option<CountryCode>,
}

pub struct CountryResolver<L> {
    lookup: L,
}

impl<L> CountryResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }
}

impl<L: RegistryLookup> CountryResolver<L> {
    /// Queries the registry once for `addr`. Never retries.
    pub fn resolve(&self, addr: Ipv4Addr) -> ResolutionResult {
        let country = match self.lookup.query(addr) {
            Ok(output) => {
                let country = parse_country(&output);
                if country.is_none() {
                    debug!("no country in registry answer for {addr}");
                }
                country
            }
            Err(e) => {
                debug!("registry lookup for {addr} failed: {e}");
                None
            }
        };
        trace!(%addr, ?country, "resolved");

        ResolutionResult {
            address: addr,
            country,
        }
    }
}

/// Extracts the country from a registry answer.
///
/// Looks at every line starting with `country` (any case) and keeps the last one,
/// since registries tend to list the organisation before the more specific
/// allocation. The value is the final whitespace-separated token after the key
/// and its optional colon, so `Country:US` and `country:    US` both give `US`.
pub fn parse_country(output: &str) -> Option<CountryCode> {
    let line = output.lines().filter(|line| is_country_line(line)).last()?;
    let value = line.get(COUNTRY_KEY.len()..)?.trim_start_matches(':');
    value.split_whitespace().last().and_then(CountryCode::new)
}

fn is_country_line(line: &str) -> bool {
    line.get(..COUNTRY_KEY.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(COUNTRY_KEY))
}
