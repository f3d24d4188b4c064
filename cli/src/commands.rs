pub mod analyze;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use geotally_common::config::{self, Config};

#[derive(Parser)]
#[command(name = "geotally")]
#[command(about = "Country distribution of the IPv4 traffic in a packet capture.")]
pub struct CommandLine {
    /// Capture file to analyse (pcap or pcapng)
    pub file: PathBuf,

    /// Only analyse the first N packets
    #[arg(short = 'p', long = "packages", value_name = "N")]
    pub packet_limit: Option<usize>,

    /// Also print every looked-up IP with its country
    #[arg(long)]
    pub trace: bool,

    /// Seconds to wait for a single whois lookup
    #[arg(short, long, value_name = "SECS", default_value_t = config::DEFAULT_LOOKUP_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Number of parallel lookups [default: CPUs - 2, at least 2]
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// whois client to run for each lookup
    #[arg(long, value_name = "PROGRAM", default_value = config::DEFAULT_WHOIS_PROGRAM)]
    pub whois: String,

    /// Hide spinners, headers and status lines
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn to_config(&self) -> Config {
        Config {
            packet_limit: self.packet_limit.filter(|&n| n > 0),
            trace: self.trace,
            lookup_timeout: Duration::from_secs(self.timeout),
            workers: self.workers,
            whois_program: self.whois.clone(),
            quiet: self.quiet,
        }
    }
}
