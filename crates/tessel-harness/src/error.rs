use std::io;
use std::path::PathBuf;

use tessel_layout::{LayoutError, WorkspaceError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("trace line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("trace is empty (no header line)")]
    EmptyTrace,

    #[error("unsupported trace version {found} (expected {expected})")]
    TraceVersion { found: u16, expected: u16 },

    #[error("JSONL sink is still attached to a workspace")]
    SinkInUse,

    #[error(
        "replay diverged at event {sequence}: recorded hash {expected:#018x}, replayed {actual:#018x}"
    )]
    HashMismatch {
        sequence: u64,
        expected: u64,
        actual: u64,
    },

    #[error("replay failed at event {sequence}: {source}")]
    Replay {
        sequence: u64,
        #[source]
        source: LayoutError,
    },

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

impl HarnessError {
    /// Process exit code for the CLI: 1 for bad input, 2 for a divergent replay.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::HashMismatch { .. } | Self::Replay { .. } => 2,
            Self::Io(_)
            | Self::File { .. }
            | Self::Json { .. }
            | Self::EmptyTrace
            | Self::TraceVersion { .. }
            | Self::SinkInUse
            | Self::Layout(_)
            | Self::Workspace(_) => 1,
        }
    }
}
