//! Deterministic replay of recorded traces.
//!
//! Only `MutationCommitted` events change the tree, so replay re-applies
//! exactly those against a fresh engine built from the header and checks
//! each resulting state hash against the recorded one.

use serde::Serialize;
use tessel_layout::{DebugEventKind, LayoutEngine, PaneTreeSnapshot};

use crate::error::{HarnessError, Result};
use crate::trace::Trace;

/// Summary of a successful replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub events: usize,
    pub committed: usize,
    pub cancelled: usize,
    pub transitions: usize,
    pub final_hash: u64,
    pub final_snapshot: PaneTreeSnapshot,
}

pub fn replay_trace(trace: &Trace) -> Result<ReplayReport> {
    let header = &trace.header;
    let mut engine = LayoutEngine::from_snapshot(
        header.initial.clone(),
        header.area,
        header.config.metrics,
    )?;
    let mut committed = 0;
    let mut cancelled = 0;
    let mut transitions = 0;

    for event in &trace.events {
        match &event.kind {
            DebugEventKind::MutationCommitted {
                mutation,
                after_hash,
            } => {
                let outcome = engine
                    .apply(mutation)
                    .map_err(|source| HarnessError::Replay {
                        sequence: event.sequence,
                        source,
                    })?;
                if outcome.after_hash != *after_hash {
                    return Err(HarnessError::HashMismatch {
                        sequence: event.sequence,
                        expected: *after_hash,
                        actual: outcome.after_hash,
                    });
                }
                committed += 1;
            }
            DebugEventKind::MutationCancelled { .. } => cancelled += 1,
            DebugEventKind::StateTransition { .. } => transitions += 1,
        }
    }

    tracing::debug!(
        events = trace.events.len(),
        committed,
        hash = engine.tree().state_hash(),
        "replay.done"
    );
    Ok(ReplayReport {
        events: trace.events.len(),
        committed,
        cancelled,
        transitions,
        final_hash: engine.tree().state_hash(),
        final_snapshot: engine.snapshot(),
    })
}
