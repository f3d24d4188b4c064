use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Fatal errors: the capture could not be turned into packet records.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot read capture file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed capture file: {0}")]
    Malformed(String),
}

/// Per-address lookup failures. These never abort a run.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("lost track of lookup process: {0}")]
    Wait(#[from] io::Error),

    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("lookup exited unsuccessfully (code {code:?})")]
    Status { code: Option<i32> },
}
