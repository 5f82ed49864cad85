#![forbid(unsafe_code)]

//! Tessel Harness
//!
//! Tooling around the `tessel-layout` debug stream.
//!
//! # Key Components
//!
//! - [`RecordingSink`], [`TracingSink`], [`JsonlSink`] - Reference debug sinks
//! - [`replay_trace`] - Re-apply committed mutations and verify state hashes
//! - [`GestureScript`] - Scripted pointer device for tests
//! - [`DeterminismFixture`] - Seeds and deterministic mode from the environment
//! - `tessel-trace` - CLI that records demo sessions and replays traces

pub mod cli;
pub mod demo;
pub mod determinism;
pub mod error;
pub mod gesture;
pub mod replay;
pub mod sinks;
pub mod trace;

pub use cli::run_from_env;
pub use determinism::{DeterminismFixture, Lcg};
pub use error::{HarnessError, Result};
pub use gesture::GestureScript;
pub use replay::{ReplayReport, replay_trace};
pub use sinks::{FanoutSink, JsonlSink, RecordingSink, TracingSink};
pub use trace::{TRACE_FORMAT_VERSION, Trace, TraceHeader, read_trace, write_trace};
