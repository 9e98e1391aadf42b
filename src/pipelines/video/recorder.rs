// SPDX-License-Identifier: GPL-3.0-only

//! Recording state machine
//!
//! ```text
//! Stopped ──start──► Recording ──stop──► Finalizing ──Finished──► Stopped
//!                        │                    │
//!                        └──── Failed ────────┴──► Stopped (chunks discarded)
//! ```
//!
//! While recording, the surface is sampled at a fixed capture rate that is
//! independent of the render loop's target rate. Chunks are kept in arrival
//! order and concatenated into one file once the sink reports `Finished`.

use super::sink::{RecorderSink, SinkEvent, SinkFactory};
use crate::constants::capture;
use crate::errors::RecordingError;
use crate::render::Surface;
use crate::storage;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Something the application task must react to
#[derive(Debug)]
pub enum RecorderEvent {
    /// Time to sample the surface
    CaptureDue,
    /// Output from the sink
    Sink(SinkEvent),
}

enum RecorderState {
    Stopped,
    Recording {
        sink: Box<dyn RecorderSink>,
        events: mpsc::UnboundedReceiver<SinkEvent>,
        capture: Interval,
        size: (u32, u32),
        started_at: Instant,
    },
    Finalizing {
        // Kept alive until the sink has flushed
        _sink: Box<dyn RecorderSink>,
        events: mpsc::UnboundedReceiver<SinkEvent>,
    },
}

/// Records the compositing surface through a [`SinkFactory`]
pub struct Recorder {
    factory: Arc<dyn SinkFactory>,
    state: RecorderState,
    chunks: Vec<Vec<u8>>,
    frames: u64,
}

impl Recorder {
    pub fn new(factory: Arc<dyn SinkFactory>) -> Self {
        Self {
            factory,
            state: RecorderState::Stopped,
            chunks: Vec::new(),
            frames: 0,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording { .. })
    }

    pub fn is_finalizing(&self) -> bool {
        matches!(self.state, RecorderState::Finalizing { .. })
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.state, RecorderState::Stopped)
    }

    /// Frames pushed to the sink in the current recording
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Chunks received so far in the current recording
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Wall-clock start of the active recording
    pub fn started_at(&self) -> Option<Instant> {
        match &self.state {
            RecorderState::Recording { started_at, .. } => Some(*started_at),
            _ => None,
        }
    }

    /// Stopped → Recording for a `width x height` surface
    ///
    /// # Errors
    /// * `RecordingError::AlreadyRecording` - not stopped
    /// * `RecordingError::EncoderNotAvailable` - the sink could not be built
    pub fn start(&mut self, width: u32, height: u32) -> Result<(), RecordingError> {
        if !self.is_stopped() {
            return Err(RecordingError::AlreadyRecording);
        }
        if width == 0 || height == 0 {
            return Err(RecordingError::Sink("nothing has been drawn yet".to_string()));
        }

        self.chunks.clear();
        self.frames = 0;

        let (tx, rx) = mpsc::unbounded_channel();
        let sink = self
            .factory
            .open(width, height, capture::RECORDING_FPS, tx)
            .inspect_err(|e| error!(error = %e, sink = self.factory.name(), "Failed to open recorder sink"))?;

        let mut ticker =
            tokio::time::interval(Duration::from_secs(1) / capture::RECORDING_FPS);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            width,
            height,
            fps = capture::RECORDING_FPS,
            sink = self.factory.name(),
            "Recording started"
        );

        self.state = RecorderState::Recording {
            sink,
            events: rx,
            capture: ticker,
            size: (width, height),
            started_at: Instant::now(),
        };
        Ok(())
    }

    /// Push the surface's current contents as the next frame
    ///
    /// Surfaces that changed size since `start` are scaled to the recording
    /// size. A sink error aborts the recording and is returned.
    pub fn capture_frame(&mut self, surface: &Surface) -> Result<(), RecordingError> {
        let RecorderState::Recording { sink, size, .. } = &mut self.state else {
            return Ok(());
        };
        if surface.is_empty() {
            return Ok(());
        }

        let (width, height) = *size;
        let pushed = if surface.width() == width && surface.height() == height {
            sink.push_frame(surface.image())
        } else {
            let scaled: RgbaImage = image::imageops::resize(
                surface.image(),
                width,
                height,
                image::imageops::FilterType::Nearest,
            );
            sink.push_frame(&scaled)
        };

        match pushed {
            Ok(()) => {
                self.frames += 1;
                if self.frames % u64::from(capture::RECORDING_FPS) == 0 {
                    debug!(frames = self.frames, chunks = self.chunks.len(), "Recording progress");
                }
                Ok(())
            }
            Err(e) => {
                self.abort(&e.to_string());
                Err(e)
            }
        }
    }

    /// Recording → Finalizing; the file is produced once the sink finishes
    pub fn stop(&mut self) -> Result<(), RecordingError> {
        let (mut sink, events) = match std::mem::replace(&mut self.state, RecorderState::Stopped) {
            RecorderState::Recording { sink, events, .. } => (sink, events),
            other => {
                self.state = other;
                return Err(RecordingError::NotRecording);
            }
        };

        info!(frames = self.frames, "Stopping recording");
        if let Err(e) = sink.finish() {
            self.abort(&e.to_string());
            return Err(e);
        }
        self.state = RecorderState::Finalizing {
            _sink: sink,
            events,
        };
        Ok(())
    }

    /// Discard everything and return to Stopped
    pub fn abort(&mut self, reason: &str) {
        if !self.is_stopped() {
            warn!(reason, chunks = self.chunks.len(), "Recording aborted");
        }
        self.state = RecorderState::Stopped;
        self.chunks.clear();
    }

    /// Wait for the next capture tick or sink event
    ///
    /// Never resolves while stopped.
    pub async fn next_event(&mut self) -> RecorderEvent {
        let closed = || SinkEvent::Failed("recorder sink closed unexpectedly".to_string());
        match &mut self.state {
            RecorderState::Stopped => std::future::pending().await,
            RecorderState::Recording {
                capture, events, ..
            } => {
                tokio::select! {
                    event = events.recv() => RecorderEvent::Sink(event.unwrap_or_else(closed)),
                    _ = capture.tick() => RecorderEvent::CaptureDue,
                }
            }
            RecorderState::Finalizing { events, .. } => {
                RecorderEvent::Sink(events.recv().await.unwrap_or_else(closed))
            }
        }
    }

    /// Apply a sink event
    ///
    /// Returns the finished file contents once finalization completes, or the
    /// error that aborted the recording.
    pub fn handle_sink_event(
        &mut self,
        event: SinkEvent,
    ) -> Option<Result<Vec<u8>, RecordingError>> {
        match event {
            SinkEvent::Chunk(data) => {
                if !self.is_stopped() && !data.is_empty() {
                    self.chunks.push(data);
                }
                None
            }
            SinkEvent::Finished => match self.state {
                RecorderState::Finalizing { .. } => {
                    self.state = RecorderState::Stopped;
                    let chunks = std::mem::take(&mut self.chunks);
                    let bytes = chunks.concat();
                    info!(chunks = chunks.len(), bytes = bytes.len(), "Recording finalized");
                    Some(Ok(bytes))
                }
                RecorderState::Recording { .. } => {
                    let err = RecordingError::Sink("sink finished before stop".to_string());
                    self.abort(&err.to_string());
                    Some(Err(err))
                }
                RecorderState::Stopped => None,
            },
            SinkEvent::Failed(reason) => {
                if self.is_stopped() {
                    return None;
                }
                self.abort(&reason);
                Some(Err(RecordingError::Sink(reason)))
            }
        }
    }

    /// Stop and wait for the finished file contents
    pub async fn finish(&mut self) -> Result<Vec<u8>, RecordingError> {
        self.stop()?;
        self.wait_finalized().await
    }

    /// Wait for a recording that was already stopped to finalize
    pub async fn wait_finalized(&mut self) -> Result<Vec<u8>, RecordingError> {
        if !self.is_finalizing() {
            return Err(RecordingError::NotRecording);
        }
        loop {
            match self.next_event().await {
                RecorderEvent::Sink(event) => {
                    if let Some(result) = self.handle_sink_event(event) {
                        return result;
                    }
                }
                RecorderEvent::CaptureDue => {}
            }
        }
    }
}

/// Write a finished recording as `video_<millis>.webm` into `dir`
pub async fn save_recording(data: &[u8], dir: &Path) -> Result<PathBuf, RecordingError> {
    let filename = storage::video_filename(storage::timestamp_millis());
    storage::write_output(dir, &filename, data)
        .await
        .map_err(|e| RecordingError::Save(e.to_string()))
}
