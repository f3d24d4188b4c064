//! Registry lookups through the system `whois` client.
//!
//! Each query spawns one child process. Its output is drained on a helper
//! thread while the caller polls for exit, so a stalled registry costs at most
//! the configured timeout; the child is killed and reaped when it expires.

use std::io::{self, Read};
use std::net::Ipv4Addr;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use geotally_common::config::Config;
use geotally_common::error::LookupError;
use tracing::trace;

use super::RegistryLookup;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct WhoisLookup {
    program: String,
    timeout: Duration,
}

impl WhoisLookup {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.whois_program.clone(), cfg.lookup_timeout)
    }

    fn spawn(&self, addr: Ipv4Addr) -> Result<Child, LookupError> {
        Command::new(&self.program)
            .arg(addr.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| LookupError::Spawn {
                program: self.program.clone(),
                source,
            })
    }
}

impl RegistryLookup for WhoisLookup {
    fn query(&self, addr: Ipv4Addr) -> Result<String, LookupError> {
        let mut child = self.spawn(addr)?;
        let Some(mut stdout) = child.stdout.take() else {
            reap(&mut child);
            return Err(LookupError::Wait(io::Error::other("stdout was not captured")));
        };

        let reader = thread::spawn(move || -> io::Result<Vec<u8>> {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf)?;
            Ok(buf)
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    reap(&mut child);
                    trace!("{} {addr} killed after {:?}", self.program, self.timeout);
                    return Err(LookupError::Timeout(self.timeout));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    reap(&mut child);
                    return Err(LookupError::Wait(e));
                }
            }
        };

        let output = reader
            .join()
            .map_err(|_| io::Error::other("output reader panicked"))??;

        if !status.success() {
            return Err(LookupError::Status {
                code: status.code(),
            });
        }

        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}

// Errors are ignored: the child may already have exited.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
