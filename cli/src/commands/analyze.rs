use std::borrow::Cow;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use colored::*;
use geotally_common::{config::Config, success, warn};
use geotally_core::extractor::Extraction;
use geotally_core::pipeline::{Pipeline, PipelineObserver, Report};
use geotally_core::pool::AddressCountryMap;
use geotally_core::resolver::WhoisLookup;
use tracing::debug;

use crate::mprint;
use crate::terminal::{colors, print, report::ReportRenderer, spinner::Spinner};

pub fn analyze(file: &Path, cfg: &Config) -> anyhow::Result<()> {
    print::header("geotally", cfg.quiet);

    let pipeline = Pipeline::new(cfg, WhoisLookup::from_config(cfg));
    let progress = CliProgress::new(cfg.quiet);
    let report = pipeline
        .run(file, &progress)
        .with_context(|| format!("could not analyse {}", file.display()))?;
    progress.finish();

    analysis_ends(&report, cfg);
    Ok(())
}

fn analysis_ends(report: &Report, cfg: &Config) {
    if !cfg.quiet {
        mprint!();
        print::header("country distribution", cfg.quiet);
    }

    for line in ReportRenderer::new(cfg.trace).render(report) {
        print::print(&line);
    }

    if !cfg.quiet {
        let summary = format!(
            "{} IPv4 packets, {} countries resolved",
            report.pair_count.to_string().bold().green(),
            report.mapping.resolved_count().to_string().bold().green(),
        )
        .color(colors::TEXT_DEFAULT)
        .to_string();
        print::fat_separator();
        print::centerln(&summary);
    }
}

/// Drives the stage spinner and status lines from pipeline events.
struct CliProgress {
    quiet: bool,
    spinner: Mutex<Option<Spinner>>,
}

impl CliProgress {
    fn new(quiet: bool) -> Self {
        Self {
            quiet,
            spinner: Mutex::new(None),
        }
    }

    /// Shows `msg` on a fresh spinner. The previous one is dropped first, since
    /// dropping a spinner unregisters whichever one is active.
    fn start(&self, msg: impl Into<Cow<'static, str>>) {
        if let Ok(mut current) = self.spinner.lock() {
            drop(current.take());
            *current = Some(Spinner::start(msg, self.quiet));
        }
    }

    fn finish(&self) {
        if let Ok(mut current) = self.spinner.lock() {
            drop(current.take());
        }
    }
}

impl PipelineObserver for CliProgress {
    fn reading(&self, path: &Path) {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let msg = format!("Extracting packets from {} file ...", name.color(colors::ACCENT));
        self.start(msg);
    }

    fn extracted(&self, extraction: &Extraction) {
        self.finish();
        success!("Extracted {} packets", extraction.packet_count);
        debug!("{} packets carry IPv4 addresses", extraction.pairs.len());
    }

    fn resolving(&self, unique: usize, workers: usize) {
        debug!("{unique} eligible addresses, {workers} workers");
        self.start("Fetching country codes ...");
    }

    fn resolution_progress(&self, completed: usize, total: usize) {
        if let Ok(current) = self.spinner.lock() {
            if let Some(spinner) = current.as_ref() {
                spinner.set_message(format!("Fetching country codes ... {completed}/{total}"));
            }
        }
    }

    fn resolved(&self, mapping: &AddressCountryMap) {
        self.finish();
        success!("Processed {} global unique IP", mapping.len());
        if !mapping.is_empty() && mapping.resolved_count() == 0 {
            warn!("no address could be resolved, check that the whois client works");
        }
    }
}
