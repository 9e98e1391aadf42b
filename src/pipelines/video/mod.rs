// SPDX-License-Identifier: GPL-3.0-only

//! Video recording pipeline
//!
//! This module provides:
//! - A recorder state machine sampling the compositing surface at a fixed rate
//! - Pluggable recorder sinks (VP9/WebM through GStreamer)
//! - The `MM:SS` elapsed-time label

pub mod recorder;
pub mod sink;
pub mod timer;

pub use recorder::{Recorder, RecorderEvent, save_recording};
pub use sink::{
    RecorderSink, SinkEvent, SinkEventSender, SinkFactory, UnavailableSinkFactory,
    default_sink_factory,
};
pub use timer::{ElapsedTimer, format_elapsed};
