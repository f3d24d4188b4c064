use std::time::Duration;

pub const DEFAULT_WHOIS_PROGRAM: &str = "whois";
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for a single analysis run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Only the first `n` packets of the capture are read when set. `Some(0)`
    /// means no cap.
    pub packet_limit: Option<usize>,
    /// Prints the full address to country mapping after the distribution.
    pub trace: bool,
    /// Upper bound for one registry lookup. Expired lookups count as unresolved.
    pub lookup_timeout: Duration,
    /// Overrides the computed resolution worker count.
    pub workers: Option<usize>,
    /// Program spawned for registry lookups, invoked as `<program> <address>`.
    pub whois_program: String,
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            packet_limit: None,
            trace: false,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            workers: None,
            whois_program: DEFAULT_WHOIS_PROGRAM.to_string(),
            quiet: false,
        }
    }
}
