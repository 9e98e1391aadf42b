// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer camera source
//!
//! Devices are discovered with a `DeviceMonitor` on the `Video/Source` class.
//! Each stream is a small pipeline:
//!
//! ```text
//! <device src> ! videoconvert ! videoscale ! videorate ! video/x-raw,format=RGBA ! appsink
//! ```
//!
//! The appsink callback publishes every decoded frame into the session's
//! latest-frame channel.

use super::types::*;
use super::{CameraSession, FrameSource, StreamHandle};
use crate::constants::{camera, render};
use crate::errors::AcquisitionError;
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Property carrying the sensor location on libcamera/PipeWire devices
const LOCATION_PROPERTIES: [&str; 2] = ["api.libcamera.location", "camera.location"];

/// Properties that may carry a stable device identifier
const PATH_PROPERTIES: [&str; 4] = ["object.path", "api.v4l2.path", "device.path", "node.name"];

/// Camera source backed by the system's GStreamer device providers
#[derive(Debug, Default)]
pub struct GstCameraSource;

impl GstCameraSource {
    pub fn new() -> Self {
        Self
    }

    fn devices(&self) -> Result<Vec<(CameraDevice, gstreamer::Device)>, AcquisitionError> {
        crate::backends::gst_init().map_err(AcquisitionError::Backend)?;

        let monitor = gstreamer::DeviceMonitor::new();
        monitor.add_filter(Some("Video/Source"), None);
        monitor
            .start()
            .map_err(|e| AcquisitionError::Backend(format!("device monitor: {}", e)))?;
        let devices = monitor.devices();
        monitor.stop();

        Ok(devices
            .into_iter()
            .enumerate()
            .map(|(index, device)| (describe(index, &device), device))
            .collect())
    }
}

fn describe(index: usize, device: &gstreamer::Device) -> CameraDevice {
    let properties = device.properties();
    let lookup = |keys: &[&str]| -> Option<String> {
        let props = properties.as_ref()?;
        keys.iter().find_map(|key| props.get::<String>(*key).ok())
    };

    CameraDevice {
        name: device.display_name().to_string(),
        path: lookup(&PATH_PROPERTIES).unwrap_or_else(|| format!("gst:{}", index)),
        facing: lookup(&LOCATION_PROPERTIES).and_then(|loc| Facing::from_location(&loc)),
    }
}

impl FrameSource for GstCameraSource {
    fn name(&self) -> &'static str {
        "gstreamer"
    }

    fn enumerate(&self) -> Vec<CameraDevice> {
        match self.devices() {
            Ok(devices) => devices.into_iter().map(|(info, _)| info).collect(),
            Err(e) => {
                warn!(error = %e, "Camera enumeration failed");
                Vec::new()
            }
        }
    }

    fn open(&self, request: &StreamRequest) -> Result<CameraSession, AcquisitionError> {
        let devices = self.devices()?;
        // Prefer a camera that reports the requested location over an external one
        let (info, device) = devices
            .iter()
            .find(|(info, _)| info.facing == Some(request.facing))
            .or_else(|| devices.iter().find(|(info, _)| info.serves(request.facing)))
            .cloned()
            .ok_or(AcquisitionError::NoMatchingDevice(request.facing))?;

        info!(
            device = %info.name,
            path = %info.path,
            width = request.ideal_width,
            height = request.ideal_height,
            fps = request.ideal_fps,
            "Creating camera pipeline"
        );

        let (sender, frames) = frame_channel();
        let stream = GstStream::new(&device, request, sender)?;
        Ok(CameraSession::new(request, info, frames, Box::new(stream)))
    }
}

fn make(factory: &str) -> Result<gstreamer::Element, AcquisitionError> {
    gstreamer::ElementFactory::make(factory)
        .build()
        .map_err(|e| AcquisitionError::Backend(format!("Failed to create {}: {}", factory, e)))
}

struct GstStream {
    pipeline: Option<gstreamer::Pipeline>,
    appsink: AppSink,
}

impl GstStream {
    fn new(
        device: &gstreamer::Device,
        request: &StreamRequest,
        sender: FrameSender,
    ) -> Result<Self, AcquisitionError> {
        let source = device
            .create_element(Some("camera_src"))
            .map_err(|e| AcquisitionError::Backend(format!("Failed to create source: {}", e)))?;

        let convert = make("videoconvert")?;
        let scale = make("videoscale")?;
        let rate = make("videorate")?;

        let caps = gstreamer_video::VideoCapsBuilder::new()
            .format(gstreamer_video::VideoFormat::Rgba)
            .width(request.ideal_width as i32)
            .height(request.ideal_height as i32)
            .framerate(gstreamer::Fraction::new(request.ideal_fps as i32, 1))
            .build();

        let appsink = AppSink::builder()
            .name("sink")
            .caps(&caps)
            .max_buffers(camera::MAX_BUFFERS)
            .drop(true)
            .sync(false)
            .enable_last_sample(false)
            .build();

        let pipeline = gstreamer::Pipeline::new();
        pipeline
            .add_many([&source, &convert, &scale, &rate, appsink.upcast_ref()])
            .map_err(|e| AcquisitionError::Backend(format!("Failed to add elements: {}", e)))?;
        gstreamer::Element::link_many([&source, &convert, &scale, &rate, appsink.upcast_ref()])
            .map_err(|e| AcquisitionError::Backend(format!("Failed to link elements: {}", e)))?;

        let frame_counter = AtomicU64::new(0);
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_num = frame_counter.fetch_add(1, Ordering::Relaxed);
                    let sample = appsink.pull_sample().map_err(|_| gstreamer::FlowError::Eos)?;
                    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                    let video_info =
                        VideoInfo::from_caps(caps).map_err(|_| gstreamer::FlowError::Error)?;
                    let map = buffer
                        .map_readable()
                        .map_err(|_| gstreamer::FlowError::Error)?;

                    let frame = CameraFrame {
                        width: video_info.width(),
                        height: video_info.height(),
                        stride: video_info.stride()[0] as u32,
                        data: Arc::from(map.as_slice()),
                        captured_at: Instant::now(),
                    };

                    if frame_num % render::FRAME_LOG_INTERVAL == 0 {
                        debug!(
                            frame = frame_num,
                            width = frame.width,
                            height = frame.height,
                            stride = frame.stride,
                            "Camera frame"
                        );
                    }

                    sender.send_replace(Some(Arc::new(frame)));
                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        let mut stream = Self {
            pipeline: Some(pipeline),
            appsink,
        };
        stream.play()?;
        Ok(stream)
    }

    fn play(&mut self) -> Result<(), AcquisitionError> {
        let Some(pipeline) = self.pipeline.as_ref() else {
            return Err(AcquisitionError::Backend("pipeline already stopped".into()));
        };

        let started = pipeline.set_state(gstreamer::State::Playing);
        let (result, state, pending) =
            pipeline.state(gstreamer::ClockTime::from_seconds(camera::START_TIMEOUT_SECS));
        debug!(result = ?result, state = ?state, pending = ?pending, "Camera pipeline state");

        if started.is_ok() && result.is_ok() {
            info!("Camera pipeline playing");
            return Ok(());
        }

        let err = pipeline
            .bus()
            .and_then(|bus| bus.pop_filtered(&[gstreamer::MessageType::Error]))
            .map(|msg| match msg.view() {
                gstreamer::MessageView::Error(err) => classify(err.error()),
                _ => AcquisitionError::Backend("pipeline failed to start".into()),
            })
            .unwrap_or_else(|| AcquisitionError::Backend("pipeline failed to start".into()));

        error!(error = %err, "Camera pipeline failed to start");
        self.stop();
        Err(err)
    }
}

/// Map a pipeline error to the acquisition taxonomy
fn classify(err: gstreamer::glib::Error) -> AcquisitionError {
    if err.matches(gstreamer::ResourceError::NotAuthorized) {
        AcquisitionError::PermissionDenied
    } else if err.matches(gstreamer::ResourceError::Busy) {
        AcquisitionError::Busy
    } else if err.matches(gstreamer::ResourceError::NotFound) {
        AcquisitionError::Backend(format!("device vanished: {}", err))
    } else {
        AcquisitionError::Backend(err.to_string())
    }
}

impl StreamHandle for GstStream {
    fn stop(&mut self) {
        let Some(pipeline) = self.pipeline.take() else {
            return;
        };

        debug!("Clearing appsink callbacks");
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        if let Err(e) = pipeline.set_state(gstreamer::State::Null) {
            warn!(error = %e, "Failed to stop camera pipeline");
            return;
        }
        let (result, state, _) =
            pipeline.state(gstreamer::ClockTime::from_seconds(camera::START_TIMEOUT_SECS));
        info!(result = ?result, state = ?state, "Camera pipeline stopped");
    }
}
