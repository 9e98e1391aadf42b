// SPDX-License-Identifier: GPL-3.0-only

//! Application shell
//!
//! [`App`] owns every piece of mutable state: settings, view state, the camera
//! session, the render loop, the compositing surface, the recorder and the
//! transient UI indicators. Front-ends drive it from a single task by awaiting
//! [`App::step`] alongside their own input source and calling the setter
//! operations in between.
//!
//! # Architecture
//!
//! - `state`: view state, camera mode and filter selection
//! - `controls`: pinch gesture and focus indicator

pub mod controls;
pub mod state;

pub use controls::{FocusIndicator, FocusPhase, PinchGesture, Point, pinch_zoom};
pub use state::{CameraMode, FilterType, ViewState};

use crate::backends::audio;
use crate::backends::camera::{CameraDevice, Facing, FrameSource, SessionManager};
use crate::config::{Config, FrameRateChoice, MaxZoomChoice, PhotoFormat};
use crate::constants::capture;
use crate::errors::{AcquisitionError, EncodeError, RecordingError};
use crate::pipelines::photo::{PhotoPipeline, take_snapshot};
use crate::pipelines::video::{ElapsedTimer, Recorder, RecorderEvent, SinkFactory, save_recording};
use crate::render::{RenderLoop, RenderStats, Surface, TickOutcome};
use crate::storage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// What a call to [`App::step`] did
#[derive(Debug)]
pub enum AppEvent {
    /// A display tick was processed
    Tick(TickOutcome),
    /// A frame was pushed to the recorder
    FrameRecorded,
    /// Recording finalized; the file is being written
    RecordingFinalized { bytes: usize },
    PhotoSaved(PathBuf),
    PhotoFailed(EncodeError),
    RecordingSaved(PathBuf),
    RecordingFailed(RecordingError),
}

enum Wake {
    Tick(Instant),
    Recorder(RecorderEvent),
    Photo(Result<PathBuf, EncodeError>),
    Video(Result<PathBuf, RecordingError>),
}

/// Application context
pub struct App {
    config: Config,
    facing: Facing,
    mode: CameraMode,
    view: ViewState,
    sessions: SessionManager,
    render: RenderLoop,
    surface: Surface,
    recorder: Recorder,
    timer: ElapsedTimer,
    elapsed_label: Option<String>,
    pinch: PinchGesture,
    focus: FocusIndicator,
    flash_until: Option<Instant>,
    error_message: Option<String>,
    photo_tx: mpsc::UnboundedSender<Result<PathBuf, EncodeError>>,
    photo_rx: mpsc::UnboundedReceiver<Result<PathBuf, EncodeError>>,
    video_tx: mpsc::UnboundedSender<Result<PathBuf, RecordingError>>,
    video_rx: mpsc::UnboundedReceiver<Result<PathBuf, RecordingError>>,
}

impl App {
    pub fn new(config: Config, source: Arc<dyn FrameSource>, sinks: Arc<dyn SinkFactory>) -> Self {
        let (photo_tx, photo_rx) = mpsc::unbounded_channel();
        let (video_tx, video_rx) = mpsc::unbounded_channel();
        Self {
            facing: config.facing,
            mode: CameraMode::Photo,
            view: ViewState::new(config.max_zoom.value()),
            sessions: SessionManager::new(source),
            render: RenderLoop::new(config.target_fps.fps()),
            surface: Surface::new(),
            recorder: Recorder::new(sinks),
            timer: ElapsedTimer::new(),
            elapsed_label: None,
            pinch: PinchGesture::new(),
            focus: FocusIndicator::default(),
            flash_until: None,
            error_message: None,
            photo_tx,
            photo_rx,
            video_tx,
            video_rx,
            config,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn render_stats(&self) -> RenderStats {
        self.render.stats()
    }

    pub fn is_rendering(&self) -> bool {
        self.render.is_running()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Recording stopped, file not yet finalized
    pub fn is_finalizing(&self) -> bool {
        self.recorder.is_finalizing()
    }

    /// `MM:SS` label while recording
    pub fn elapsed_label(&self) -> Option<&str> {
        self.elapsed_label.as_deref()
    }

    /// Label updates produced by the current (or last) recording
    pub fn elapsed_updates(&self) -> u64 {
        self.timer.updates()
    }

    pub fn flash_active(&self, now: Instant) -> bool {
        self.flash_until.is_some_and(|until| now < until)
    }

    pub fn focus_phase(&self, now: Instant) -> FocusPhase {
        self.focus.phase(now)
    }

    /// Blocking message for the user, set by acquisition failures
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error_message = None;
    }

    pub fn cameras(&self) -> Vec<CameraDevice> {
        self.sessions.enumerate()
    }

    /// Name of the active camera
    pub fn camera_name(&self) -> Option<&str> {
        self.sessions.session().map(|s| s.device().name.as_str())
    }

    // =========================================================================
    // Camera session
    // =========================================================================

    /// Acquire the camera for the current facing and frame rate
    ///
    /// The previous session is released first. On failure the render loop
    /// goes idle and a blocking message is set; nothing retries. Refused while
    /// a recording is active or finalizing, since the recorder reads the
    /// surface this session feeds.
    pub async fn start_camera(&mut self) -> Result<(), AcquisitionError> {
        self.ensure_not_recording()?;
        self.render.stop();
        match self
            .sessions
            .start(self.facing, self.config.target_fps.fps())
            .await
        {
            Ok(()) => {
                self.error_message = None;
                self.render.start(Instant::now());
                Ok(())
            }
            Err(e) => {
                error!(error = %e, facing = %self.facing, "Camera unavailable");
                self.error_message = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Wait for the active camera's first frame
    pub async fn wait_until_ready(&mut self, timeout: Duration) -> Result<(), AcquisitionError> {
        self.sessions.wait_until_ready(timeout).await
    }

    fn ensure_not_recording(&self) -> Result<(), AcquisitionError> {
        if self.recorder.is_stopped() {
            Ok(())
        } else {
            debug!("Camera change refused while recording");
            Err(AcquisitionError::RecordingActive)
        }
    }

    /// Switch between front and back camera
    pub async fn switch_facing(&mut self) -> Result<(), AcquisitionError> {
        self.ensure_not_recording()?;
        self.facing = self.facing.toggled();
        info!(facing = %self.facing, "Switching camera");
        self.start_camera().await
    }

    /// Change the target frame rate; the session is replaced to request it
    pub async fn set_target_fps(&mut self, choice: FrameRateChoice) -> Result<(), AcquisitionError> {
        self.ensure_not_recording()?;
        self.config.target_fps = choice;
        self.render.set_fps(choice.fps());
        if self.sessions.is_active() || self.error_message.is_some() {
            self.start_camera().await
        } else {
            Ok(())
        }
    }

    /// Release the camera and halt the render loop
    pub async fn stop_camera(&mut self) {
        self.render.stop();
        self.sessions.stop().await;
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub fn set_max_zoom(&mut self, choice: MaxZoomChoice) {
        self.config.max_zoom = choice;
        self.view.set_max_zoom(choice.value());
    }

    pub fn set_save_format(&mut self, format: PhotoFormat) {
        self.config.save_format = format;
    }

    pub fn toggle_shutter_sound(&mut self) -> bool {
        self.config.shutter_sound = !self.config.shutter_sound;
        self.config.shutter_sound
    }

    pub fn toggle_mirror_front(&mut self) -> bool {
        self.config.mirror_front = !self.config.mirror_front;
        self.config.mirror_front
    }

    // =========================================================================
    // View controls
    // =========================================================================

    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        self.view.set_zoom(zoom)
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.view.zoom_in()
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.view.zoom_out()
    }

    pub fn reset_zoom(&mut self) {
        self.view.reset_zoom();
    }

    pub fn set_exposure(&mut self, exposure: f32) -> f32 {
        self.view.set_exposure(exposure)
    }

    pub fn exposure_up(&mut self) -> f32 {
        self.view.exposure_up()
    }

    pub fn exposure_down(&mut self) -> f32 {
        self.view.exposure_down()
    }

    pub fn reset_exposure(&mut self) {
        self.view.reset_exposure();
    }

    pub fn select_filter(&mut self, filter: FilterType) {
        debug!(filter = filter.name(), "Filter selected");
        self.view.set_filter(filter);
    }

    pub fn next_filter(&mut self) -> FilterType {
        self.select_filter(self.view.filter().next());
        self.view.filter()
    }

    pub fn prev_filter(&mut self) -> FilterType {
        self.select_filter(self.view.filter().prev());
        self.view.filter()
    }

    pub fn finger_pressed(&mut self, id: u64, position: Point) {
        self.pinch.finger_pressed(id, position, &self.view);
    }

    pub fn finger_moved(&mut self, id: u64, position: Point) -> Option<f32> {
        self.pinch.finger_moved(id, position, &mut self.view)
    }

    pub fn finger_lifted(&mut self, id: u64) {
        self.pinch.finger_lifted(id);
    }

    /// Show the focus ring at `at`; the camera's focus is left alone
    pub fn tap_focus(&mut self, at: Point) {
        self.focus.tap(at, Instant::now());
    }

    // =========================================================================
    // Capture
    // =========================================================================

    /// Switch photo/video; ignored while a recording is active or finalizing
    pub fn set_mode(&mut self, mode: CameraMode) -> bool {
        if !self.recorder.is_stopped() {
            debug!("Mode change ignored while recording");
            return false;
        }
        self.mode = mode;
        true
    }

    pub fn toggle_mode(&mut self) -> bool {
        self.set_mode(self.mode.toggled())
    }

    /// The capture/record button
    pub fn shutter(&mut self) -> Result<(), crate::errors::AppError> {
        match self.mode {
            CameraMode::Photo => self.capture_photo().map_err(Into::into),
            CameraMode::Video if self.recorder.is_recording() => {
                self.stop_recording().map_err(Into::into)
            }
            CameraMode::Video => self.start_recording().map_err(Into::into),
        }
    }

    /// Snapshot the surface and save it in the background
    ///
    /// The result arrives later through [`App::step`] as `PhotoSaved` or
    /// `PhotoFailed`.
    pub fn capture_photo(&mut self) -> Result<(), EncodeError> {
        if self.mode != CameraMode::Photo {
            return Err(EncodeError::NotPhotoMode);
        }
        let snapshot = take_snapshot(&self.surface)
            .inspect_err(|e| warn!(error = %e, "Photo capture rejected"))?;

        self.flash_until = Some(Instant::now() + capture::FLASH_DURATION);
        if self.config.shutter_sound {
            audio::play_shutter_sound();
        }

        let pipeline = PhotoPipeline::from_config(&self.config);
        let results = self.photo_tx.clone();
        tokio::spawn(async move {
            let _ = results.send(pipeline.process(snapshot).await);
        });
        Ok(())
    }

    pub fn start_recording(&mut self) -> Result<(), RecordingError> {
        if self.mode != CameraMode::Video {
            return Err(RecordingError::NotVideoMode);
        }
        self.recorder
            .start(self.surface.width(), self.surface.height())?;
        let now = Instant::now();
        self.timer.start(now);
        self.elapsed_label = self.timer.tick(now);
        Ok(())
    }

    /// Stop recording; the timer halts immediately, the file follows once the
    /// sink has finalized
    pub fn stop_recording(&mut self) -> Result<(), RecordingError> {
        self.recorder.stop()?;
        self.halt_timer();
        Ok(())
    }

    fn halt_timer(&mut self) {
        if self.timer.cancel() {
            debug!(updates = self.timer.updates(), "Elapsed timer cancelled");
        }
        self.elapsed_label = None;
    }

    // =========================================================================
    // Event loop
    // =========================================================================

    /// Wait for the next display tick, recorder event or save result and
    /// apply it
    pub async fn step(&mut self) -> AppEvent {
        let wake = tokio::select! {
            now = self.render.next_tick() => Wake::Tick(now),
            event = self.recorder.next_event() => Wake::Recorder(event),
            Some(result) = self.photo_rx.recv() => Wake::Photo(result),
            Some(result) = self.video_rx.recv() => Wake::Video(result),
        };

        match wake {
            Wake::Tick(now) => self.on_tick(now),
            Wake::Recorder(event) => self.on_recorder_event(event),
            Wake::Photo(Ok(path)) => AppEvent::PhotoSaved(path),
            Wake::Photo(Err(e)) => {
                error!(error = %e, "Photo capture failed");
                AppEvent::PhotoFailed(e)
            }
            Wake::Video(Ok(path)) => AppEvent::RecordingSaved(path),
            Wake::Video(Err(e)) => {
                error!(error = %e, "Saving recording failed");
                AppEvent::RecordingFailed(e)
            }
        }
    }

    fn on_tick(&mut self, now: Instant) -> AppEvent {
        let frame = self.sessions.latest_frame();
        let mirror = self.config.mirrors(self.facing);
        let outcome = self
            .render
            .tick(now, frame.as_deref(), &self.view, mirror, &mut self.surface);

        if let Some(label) = self.timer.tick(now) {
            self.elapsed_label = Some(label);
        }
        if self.flash_until.is_some_and(|until| now >= until) {
            self.flash_until = None;
        }
        AppEvent::Tick(outcome)
    }

    fn on_recorder_event(&mut self, event: RecorderEvent) -> AppEvent {
        match event {
            RecorderEvent::CaptureDue => match self.recorder.capture_frame(&self.surface) {
                Ok(()) => AppEvent::FrameRecorded,
                Err(e) => self.recording_failed(e),
            },
            RecorderEvent::Sink(sink_event) => match self.recorder.handle_sink_event(sink_event) {
                None => AppEvent::FrameRecorded,
                Some(Ok(bytes)) => {
                    let size = bytes.len();
                    let dir = storage::video_dir(&self.config);
                    let results = self.video_tx.clone();
                    tokio::spawn(async move {
                        let _ = results.send(save_recording(&bytes, &dir).await);
                    });
                    AppEvent::RecordingFinalized { bytes: size }
                }
                Some(Err(e)) => self.recording_failed(e),
            },
        }
    }

    fn recording_failed(&mut self, e: RecordingError) -> AppEvent {
        error!(error = %e, "Recording aborted");
        self.halt_timer();
        AppEvent::RecordingFailed(e)
    }

    /// Tear everything down
    ///
    /// An active recording is finalized and saved before the camera is
    /// released. A sink that does not finalize within
    /// [`capture::FINALIZE_TIMEOUT`] loses the recording.
    pub async fn shutdown(&mut self) {
        if !self.recorder.is_stopped() {
            self.halt_timer();
            let recorder = &mut self.recorder;
            let finalize = async move {
                if recorder.is_recording() {
                    recorder.finish().await
                } else {
                    recorder.wait_finalized().await
                }
            };
            let finished = tokio::time::timeout(capture::FINALIZE_TIMEOUT, finalize).await;
            match finished {
                Ok(Ok(bytes)) => {
                    if let Err(e) = save_recording(&bytes, &storage::video_dir(&self.config)).await {
                        error!(error = %e, "Failed to save recording on shutdown");
                    }
                }
                Ok(Err(e)) => warn!(error = %e, "Recording lost on shutdown"),
                Err(_) => {
                    warn!(
                        timeout_ms = capture::FINALIZE_TIMEOUT.as_millis() as u64,
                        "Recording lost on shutdown: sink never finalized"
                    );
                    self.recorder.abort("finalization timed out");
                }
            }
        }
        self.stop_camera().await;
        info!("Application shut down");
    }
}
