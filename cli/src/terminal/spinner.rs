use std::borrow::Cow;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICK_RATE: Duration = Duration::from_millis(100);
const TICKS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

/// The spinner currently on screen, if any. Log output is routed through it
/// so lines are printed above the spinner instead of through it.
static ACTIVE: Mutex<Option<ProgressBar>> = Mutex::new(None);

/// A transient spinner for one pipeline stage, cleared when dropped.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn start(msg: impl Into<Cow<'static, str>>, quiet: bool) -> Self {
        if quiet {
            return Self {
                pb: ProgressBar::hidden(),
            };
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
            pb.set_style(style.tick_strings(TICKS));
        }
        pb.set_message(msg);
        pb.enable_steady_tick(TICK_RATE);

        if let Ok(mut active) = ACTIVE.lock() {
            *active = Some(pb.clone());
        }
        Self { pb }
    }

    pub fn set_message(&self, msg: impl Into<Cow<'static, str>>) {
        self.pb.set_message(msg);
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.pb.finish_and_clear();
        if let Ok(mut active) = ACTIVE.lock() {
            *active = None;
        }
    }
}

#[cfg(test)]
pub fn is_active() -> bool {
    ACTIVE.lock().is_ok_and(|active| active.is_some())
}

pub fn println(msg: &str) {
    let active = ACTIVE.lock().ok().and_then(|guard| guard.clone());
    match active {
        Some(pb) if !pb.is_hidden() => pb.println(msg),
        _ => println!("{msg}"),
    }
}

/// `io::Write` adapter for the tracing subscriber.
pub struct SpinnerWriter;

impl std::io::Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let msg = String::from_utf8_lossy(buf);
        println(msg.trim_end());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
