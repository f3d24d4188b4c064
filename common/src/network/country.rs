use std::fmt;

pub const LOCAL_LABEL: &str = "LOCAL";

/// Country token as reported by a registry, e.g. `US` or `DE`.
///
/// Kept verbatim apart from surrounding whitespace; registries are not consistent
/// about case, and neither is the report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountryCode(String);

impl CountryCode {
    /// Returns `None` for tokens that are empty after trimming.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a packet endpoint is counted in the distribution.
///
/// `Local` covers both addresses that were never looked up (local, multicast)
/// and addresses whose lookup produced no country.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attribution {
    Country(CountryCode),
    Local,
}

impl Attribution {
    pub fn label(&self) -> &str {
        match self {
            Attribution::Country(code) => code.as_str(),
            Attribution::Local => LOCAL_LABEL,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Attribution::Local)
    }
}

impl From<Option<CountryCode>> for Attribution {
    fn from(country: Option<CountryCode>) -> Self {
        country.map_or(Attribution::Local, Attribution::Country)
    }
}

impl fmt::Display for Attribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
