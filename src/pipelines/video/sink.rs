// SPDX-License-Identifier: GPL-3.0-only

//! Recorder sinks
//!
//! A sink takes raw RGBA frames and emits encoded container bytes as a stream
//! of chunks. Chunks and the final `Finished` marker arrive on an unbounded
//! channel in the order the sink produced them; the recorder never sees the
//! sink's threads.

use crate::errors::RecordingError;
use image::RgbaImage;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Asynchronous output of a recorder sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// Encoded bytes, in production order
    Chunk(Vec<u8>),
    /// All chunks have been delivered
    Finished,
    /// The sink failed; no further events follow
    Failed(String),
}

/// Sender half handed to a sink when it is opened
pub type SinkEventSender = mpsc::UnboundedSender<SinkEvent>;

/// An open encoder/muxer accepting frames
///
/// Implementations keep their event sender alive until they have sent
/// `Finished` or `Failed`; a closed channel is treated as a failure.
pub trait RecorderSink: Send {
    /// Queue one frame. Frames always have the size the sink was opened with.
    fn push_frame(&mut self, frame: &RgbaImage) -> Result<(), RecordingError>;

    /// Ask the sink to flush and finalize. Completion is signalled by
    /// `SinkEvent::Finished`.
    fn finish(&mut self) -> Result<(), RecordingError>;
}

/// Creates recorder sinks
pub trait SinkFactory: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Open a sink for `width x height` frames at `fps`
    ///
    /// # Errors
    /// * `RecordingError::EncoderNotAvailable` - no usable encoder/muxer
    fn open(
        &self,
        width: u32,
        height: u32,
        fps: u32,
        events: SinkEventSender,
    ) -> Result<Box<dyn RecorderSink>, RecordingError>;
}

/// Sink factory selected at build time
pub fn default_sink_factory() -> Arc<dyn SinkFactory> {
    #[cfg(feature = "gstreamer")]
    {
        Arc::new(webm::WebmSinkFactory)
    }
    #[cfg(not(feature = "gstreamer"))]
    {
        Arc::new(UnavailableSinkFactory)
    }
}

/// Factory used when no encoder is compiled in
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSinkFactory;

impl SinkFactory for UnavailableSinkFactory {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn open(
        &self,
        _width: u32,
        _height: u32,
        _fps: u32,
        _events: SinkEventSender,
    ) -> Result<Box<dyn RecorderSink>, RecordingError> {
        Err(RecordingError::EncoderNotAvailable(
            "built without GStreamer support".to_string(),
        ))
    }
}

#[cfg(feature = "gstreamer")]
pub mod webm {
    //! VP9/WebM sink
    //!
    //! ```text
    //! appsrc (RGBA) ! videoconvert ! vp9enc ! webmmux streamable=true ! appsink
    //! ```
    //!
    //! The muxer runs in streamable mode because its output goes to memory, not
    //! a seekable file.

    use super::*;
    use crate::constants::capture;
    use gstreamer::prelude::*;
    use gstreamer_app::{AppSink, AppSrc};
    use tracing::{debug, error, info, warn};

    #[derive(Debug, Default, Clone, Copy)]
    pub struct WebmSinkFactory;

    fn make(factory: &str) -> Result<gstreamer::Element, RecordingError> {
        gstreamer::ElementFactory::make(factory)
            .build()
            .map_err(|e| RecordingError::EncoderNotAvailable(format!("{}: {}", factory, e)))
    }

    impl SinkFactory for WebmSinkFactory {
        fn name(&self) -> &'static str {
            "webm"
        }

        fn open(
            &self,
            width: u32,
            height: u32,
            fps: u32,
            events: SinkEventSender,
        ) -> Result<Box<dyn RecorderSink>, RecordingError> {
            crate::backends::gst_init().map_err(RecordingError::EncoderNotAvailable)?;
            info!(width, height, fps, "Creating WebM recorder sink");

            let caps = gstreamer_video::VideoCapsBuilder::new()
                .format(gstreamer_video::VideoFormat::Rgba)
                .width(width as i32)
                .height(height as i32)
                .framerate(gstreamer::Fraction::new(fps as i32, 1))
                .build();

            let appsrc = AppSrc::builder()
                .name("recorder_src")
                .caps(&caps)
                .format(gstreamer::Format::Time)
                .is_live(true)
                .do_timestamp(true)
                .build();

            let convert = make("videoconvert")?;
            let encoder = make("vp9enc")?;
            encoder.set_property("deadline", 1i64);
            encoder.set_property("target-bitrate", (capture::RECORDING_BITRATE_KBPS * 1000) as i32);
            let muxer = make("webmmux")?;
            muxer.set_property("streamable", true);

            let appsink = AppSink::builder().name("recorder_sink").sync(false).build();

            let pipeline = gstreamer::Pipeline::new();
            pipeline
                .add_many([appsrc.upcast_ref(), &convert, &encoder, &muxer, appsink.upcast_ref()])
                .map_err(|e| RecordingError::Sink(format!("Failed to add elements: {}", e)))?;
            gstreamer::Element::link_many([
                appsrc.upcast_ref(),
                &convert,
                &encoder,
                &muxer,
                appsink.upcast_ref(),
            ])
            .map_err(|e| RecordingError::Sink(format!("Failed to link elements: {}", e)))?;

            let chunk_events = events.clone();
            let eos_events = events.clone();
            appsink.set_callbacks(
                gstreamer_app::AppSinkCallbacks::builder()
                    .new_sample(move |appsink| {
                        let sample = appsink.pull_sample().map_err(|_| gstreamer::FlowError::Eos)?;
                        let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                        let map = buffer
                            .map_readable()
                            .map_err(|_| gstreamer::FlowError::Error)?;
                        if chunk_events.send(SinkEvent::Chunk(map.as_slice().to_vec())).is_err() {
                            return Err(gstreamer::FlowError::Flushing);
                        }
                        Ok(gstreamer::FlowSuccess::Ok)
                    })
                    .eos(move |_| {
                        debug!("Recorder sink reached end of stream");
                        let _ = eos_events.send(SinkEvent::Finished);
                    })
                    .build(),
            );

            if let Some(bus) = pipeline.bus() {
                let error_events = events;
                bus.set_sync_handler(move |_, msg| {
                    if let gstreamer::MessageView::Error(err) = msg.view() {
                        error!(error = %err.error(), "Recorder pipeline error");
                        let _ = error_events.send(SinkEvent::Failed(err.error().to_string()));
                    }
                    gstreamer::BusSyncReply::Drop
                });
            }

            pipeline.set_state(gstreamer::State::Playing).map_err(|e| {
                RecordingError::Sink(format!("Failed to start recorder pipeline: {}", e))
            })?;

            Ok(Box::new(WebmSink {
                pipeline,
                appsrc,
                frames: 0,
            }))
        }
    }

    struct WebmSink {
        pipeline: gstreamer::Pipeline,
        appsrc: AppSrc,
        frames: u64,
    }

    impl RecorderSink for WebmSink {
        fn push_frame(&mut self, frame: &RgbaImage) -> Result<(), RecordingError> {
            let buffer = gstreamer::Buffer::from_mut_slice(frame.as_raw().clone());
            self.appsrc
                .push_buffer(buffer)
                .map_err(|e| RecordingError::Sink(format!("Failed to push frame: {:?}", e)))?;
            self.frames += 1;
            Ok(())
        }

        fn finish(&mut self) -> Result<(), RecordingError> {
            info!(frames = self.frames, "Finalizing WebM recording");
            self.appsrc
                .end_of_stream()
                .map(|_| ())
                .map_err(|e| RecordingError::Sink(format!("Failed to send EOS: {:?}", e)))
        }
    }

    impl Drop for WebmSink {
        fn drop(&mut self) {
            if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
                warn!(error = %e, "Failed to stop recorder pipeline");
            }
        }
    }
}
