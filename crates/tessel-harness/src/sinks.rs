//! Reference [`DebugSink`] implementations.
//!
//! Workspaces own their sink as a `Box<dyn DebugSink>`, so the sinks that
//! need to be read back afterwards share their state through an `Rc` handle
//! kept by the caller.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use tessel_layout::{DebugEvent, DebugEventKind, DebugSink};

use crate::error::{HarnessError, Result};
use crate::trace::{TraceHeader, write_line};

/// Keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<DebugEvent>>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<DebugEvent> {
        self.events.borrow().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl DebugSink for RecordingSink {
    fn emit(&mut self, event: &DebugEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Mirrors the stream into `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DebugSink for TracingSink {
    fn emit(&mut self, event: &DebugEvent) {
        match &event.kind {
            DebugEventKind::StateTransition { from, to, target } => tracing::debug!(
                sequence = event.sequence,
                elapsed_us = event.elapsed_us,
                from = ?from,
                to = ?to,
                target = ?target,
                "debug.transition"
            ),
            DebugEventKind::MutationCommitted {
                mutation,
                after_hash,
            } => tracing::debug!(
                sequence = event.sequence,
                elapsed_us = event.elapsed_us,
                op = mutation.name(),
                hash = after_hash,
                "debug.committed"
            ),
            DebugEventKind::MutationCancelled { reason, mutation } => tracing::debug!(
                sequence = event.sequence,
                elapsed_us = event.elapsed_us,
                reason = ?reason,
                op = mutation.as_ref().map(|m| m.name()),
                "debug.cancelled"
            ),
        }
    }
}

struct JsonlState<W> {
    writer: W,
    lines: u64,
    error: Option<io::Error>,
}

/// Streams events as JSONL behind a [`TraceHeader`] line.
///
/// `emit` cannot fail, so the first write error is kept and every later
/// event is dropped; [`JsonlSink::finish`] reports it.
pub struct JsonlSink<W> {
    state: Rc<RefCell<JsonlState<W>>>,
}

impl<W> Clone for JsonlSink<W> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<W: Write> JsonlSink<W> {
    /// Write the header line and return the sink.
    pub fn new(mut writer: W, header: &TraceHeader) -> Result<Self> {
        write_line(&mut writer, header)?;
        Ok(Self {
            state: Rc::new(RefCell::new(JsonlState {
                writer,
                lines: 1,
                error: None,
            })),
        })
    }

    /// Lines written so far, header included.
    #[must_use]
    pub fn lines(&self) -> u64 {
        self.state.borrow().lines
    }

    /// Flush and hand back the writer. Every clone, including the one given
    /// to a workspace, must have been dropped.
    pub fn finish(self) -> Result<W> {
        let state = Rc::try_unwrap(self.state)
            .map_err(|_| HarnessError::SinkInUse)?
            .into_inner();
        if let Some(err) = state.error {
            return Err(err.into());
        }
        let mut writer = state.writer;
        writer.flush()?;
        Ok(writer)
    }
}

impl<W: Write> DebugSink for JsonlSink<W> {
    fn emit(&mut self, event: &DebugEvent) {
        let mut state = self.state.borrow_mut();
        if state.error.is_some() {
            return;
        }
        match write_line(&mut state.writer, event) {
            Ok(()) => state.lines += 1,
            Err(HarnessError::Io(err)) => {
                tracing::warn!(error = %err, sequence = event.sequence, "jsonl.write_failed");
                state.error = Some(err);
            }
            Err(other) => {
                tracing::warn!(error = %other, sequence = event.sequence, "jsonl.write_failed");
                state.error = Some(io::Error::other(other.to_string()));
            }
        }
    }
}

/// Forwards each event to several sinks in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn DebugSink>>,
}

impl FanoutSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, sink: impl DebugSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl DebugSink for FanoutSink {
    fn emit(&mut self, event: &DebugEvent) {
        for sink in &mut self.sinks {
            sink.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::read_trace;
    use tessel_core::{Rect, View};
    use tessel_layout::{CancelReason, PaneTree, WorkspaceConfig};

    fn event(sequence: u64) -> DebugEvent {
        DebugEvent {
            sequence,
            elapsed_us: sequence,
            kind: DebugEventKind::MutationCancelled {
                reason: CancelReason::Explicit,
                mutation: None,
            },
        }
    }

    fn header() -> TraceHeader {
        TraceHeader::new(
            Rect::new(0, 0, 10, 10),
            WorkspaceConfig::default(),
            PaneTree::singleton(View::label(1, "x")).to_snapshot(),
        )
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn recording_sink_shares_its_buffer() {
        let recorder = RecordingSink::new();
        let mut handle = recorder.clone();
        handle.emit(&event(0));
        handle.emit(&event(1));
        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.events()[1].sequence, 1);
        recorder.clear();
        assert!(recorder.is_empty());
    }

    #[test]
    fn jsonl_sink_streams_a_readable_trace() {
        let sink = JsonlSink::new(Vec::new(), &header()).expect("header");
        let mut attached = sink.clone();
        attached.emit(&event(0));
        attached.emit(&event(1));
        drop(attached);
        assert_eq!(sink.lines(), 3);

        let bytes = sink.finish().expect("finish");
        let trace = read_trace(bytes.as_slice()).expect("read");
        assert_eq!(trace.events, vec![event(0), event(1)]);
    }

    #[test]
    fn finish_refuses_while_attached() {
        let sink = JsonlSink::new(Vec::new(), &header()).expect("header");
        let _attached = sink.clone();
        assert!(matches!(sink.finish(), Err(HarnessError::SinkInUse)));
    }

    #[test]
    fn header_write_failure_is_reported() {
        assert!(matches!(
            JsonlSink::new(Broken, &header()),
            Err(HarnessError::Io(_))
        ));
    }

    #[test]
    fn fanout_reaches_every_sink() {
        let first = RecordingSink::new();
        let second = RecordingSink::new();
        let mut fanout = FanoutSink::new()
            .with(first.clone())
            .with(TracingSink)
            .with(second.clone());
        fanout.emit(&event(4));
        assert_eq!(first.events(), second.events());
        assert_eq!(first.len(), 1);
    }
}
