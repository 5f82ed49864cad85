//! JSONL trace files.
//!
//! Line 1 is a [`TraceHeader`] describing the starting workspace; every
//! following line is one [`DebugEvent`].

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use tessel_core::Rect;
use tessel_layout::{DebugEvent, DebugEventKind, PaneTreeSnapshot, WorkspaceConfig};

use crate::error::{HarnessError, Result};

pub const TRACE_FORMAT_VERSION: u16 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceHeader {
    pub version: u16,
    pub area: Rect,
    #[serde(default)]
    pub config: WorkspaceConfig,
    pub initial: PaneTreeSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl TraceHeader {
    #[must_use]
    pub fn new(area: Rect, config: WorkspaceConfig, initial: PaneTreeSnapshot) -> Self {
        Self {
            version: TRACE_FORMAT_VERSION,
            area,
            config,
            initial,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub header: TraceHeader,
    pub events: Vec<DebugEvent>,
}

impl Trace {
    /// Committed mutations, in order.
    pub fn committed(&self) -> impl Iterator<Item = &DebugEvent> {
        self.events
            .iter()
            .filter(|event| matches!(event.kind, DebugEventKind::MutationCommitted { .. }))
    }
}

/// Write `header` and `events` as JSONL.
pub fn write_trace<W: Write>(
    mut writer: W,
    header: &TraceHeader,
    events: &[DebugEvent],
) -> Result<()> {
    write_line(&mut writer, header)?;
    for event in events {
        write_line(&mut writer, event)?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_line<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *writer, value).map_err(std::io::Error::from)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Parse a JSONL trace. Blank lines are skipped; line numbers in errors are
/// 1-based.
pub fn read_trace<R: BufRead>(reader: R) -> Result<Trace> {
    let mut header = None;
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let number = index + 1;
        if header.is_none() {
            let parsed: TraceHeader =
                serde_json::from_str(&line).map_err(|source| HarnessError::Json {
                    line: number,
                    source,
                })?;
            if parsed.version != TRACE_FORMAT_VERSION {
                return Err(HarnessError::TraceVersion {
                    found: parsed.version,
                    expected: TRACE_FORMAT_VERSION,
                });
            }
            header = Some(parsed);
            continue;
        }
        events.push(
            serde_json::from_str(&line).map_err(|source| HarnessError::Json {
                line: number,
                source,
            })?,
        );
    }
    let header = header.ok_or(HarnessError::EmptyTrace)?;
    Ok(Trace { header, events })
}
