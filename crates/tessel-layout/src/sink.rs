//! Debug event stream.
//!
//! Every drag state transition and every committed or cancelled mutation is
//! pushed, in order, to an optional [`DebugSink`]. The stream is the single
//! integration point for trace and replay tooling.

use std::fmt;

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::engine::Mutation;
use crate::hit::HitTarget;

/// Reported drag controller phase.
///
/// `Committed` and `Cancelled` only ever appear as transition endpoints; the
/// controller rests in `Idle` after either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPhase {
    Idle,
    Hovering,
    Dragging,
    Committed,
    Cancelled,
}

/// Why a gesture ended without a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// `PointerEvent::Cancel`.
    Explicit,
    /// `PointerEvent::CaptureLost`.
    CaptureLost,
    /// The dragged pane was removed or changed kind mid-gesture.
    TargetInvalidated,
    /// Released a detached pane over nothing it can land on.
    NoDropTarget,
    /// Released before the gesture did anything.
    NoMovement,
    /// The engine refused the final mutation.
    MutationRejected,
    /// The host cancelled the gesture.
    Programmatic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DebugEventKind {
    StateTransition {
        from: DragPhase,
        to: DragPhase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<HitTarget>,
    },
    MutationCommitted {
        mutation: Mutation,
        after_hash: u64,
    },
    MutationCancelled {
        reason: CancelReason,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mutation: Option<Mutation>,
    },
}

/// One sequenced, timestamped event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugEvent {
    pub sequence: u64,
    pub elapsed_us: u64,
    #[serde(flatten)]
    pub kind: DebugEventKind,
}

/// Receiver of the debug event stream.
pub trait DebugSink {
    fn emit(&mut self, event: &DebugEvent);
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DebugSink for NullSink {
    fn emit(&mut self, _event: &DebugEvent) {}
}

impl DebugSink for Vec<DebugEvent> {
    fn emit(&mut self, event: &DebugEvent) {
        self.push(event.clone());
    }
}

#[derive(Debug, Clone, Copy)]
enum Clock {
    Wall(Instant),
    /// `elapsed_us` mirrors the sequence number, for reproducible traces.
    Logical,
}

/// Sequencer in front of an optional sink.
pub struct DebugEmitter {
    sink: Option<Box<dyn DebugSink>>,
    sequence: u64,
    clock: Clock,
}

impl fmt::Debug for DebugEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugEmitter")
            .field("attached", &self.sink.is_some())
            .field("sequence", &self.sequence)
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for DebugEmitter {
    fn default() -> Self {
        Self::new(None)
    }
}

impl DebugEmitter {
    #[must_use]
    pub fn new(sink: Option<Box<dyn DebugSink>>) -> Self {
        Self {
            sink,
            sequence: 0,
            clock: Clock::Wall(Instant::now()),
        }
    }

    /// Stamp events with their sequence number instead of wall time.
    #[must_use]
    pub fn logical_clock(mut self) -> Self {
        self.clock = Clock::Logical;
        self
    }

    /// Swap the sink, returning the previous one.
    pub fn set_sink(&mut self, sink: Option<Box<dyn DebugSink>>) -> Option<Box<dyn DebugSink>> {
        std::mem::replace(&mut self.sink, sink)
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.sink.is_some()
    }

    /// Sequence number the next event will carry.
    #[must_use]
    pub const fn next_sequence(&self) -> u64 {
        self.sequence
    }

    pub fn emit(&mut self, kind: DebugEventKind) {
        let sequence = self.sequence;
        self.sequence += 1;
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let elapsed_us = match self.clock {
            Clock::Wall(started) => {
                u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX)
            }
            Clock::Logical => sequence,
        };
        sink.emit(&DebugEvent {
            sequence,
            elapsed_us,
            kind,
        });
    }
}
