// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the recording state machine, using an in-memory sink

use image::RgbaImage;
use lenscap::FilterType;
use lenscap::backends::camera::CameraFrame;
use lenscap::errors::RecordingError;
use lenscap::pipelines::video::{
    ElapsedTimer, Recorder, RecorderEvent, RecorderSink, SinkEvent, SinkEventSender, SinkFactory,
    save_recording,
};
use lenscap::render::{Surface, compute_crop, compute_filter, draw_frame};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Emits one chunk per frame (the frame number) and a trailer on finish
struct MemorySinkFactory {
    fail_after: Option<u8>,
    finish_early: bool,
}

impl MemorySinkFactory {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            fail_after: None,
            finish_early: false,
        })
    }
}

struct MemorySink {
    events: SinkEventSender,
    frames: u8,
    fail_after: Option<u8>,
    finish_early: bool,
}

impl SinkFactory for MemorySinkFactory {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn open(
        &self,
        _width: u32,
        _height: u32,
        _fps: u32,
        events: SinkEventSender,
    ) -> Result<Box<dyn RecorderSink>, RecordingError> {
        Ok(Box::new(MemorySink {
            events,
            frames: 0,
            fail_after: self.fail_after,
            finish_early: self.finish_early,
        }))
    }
}

impl RecorderSink for MemorySink {
    fn push_frame(&mut self, _frame: &RgbaImage) -> Result<(), RecordingError> {
        self.frames += 1;
        let _ = self.events.send(SinkEvent::Chunk(vec![self.frames]));
        if self.fail_after == Some(self.frames) {
            let _ = self.events.send(SinkEvent::Failed("disk full".to_string()));
        }
        if self.finish_early {
            let _ = self.events.send(SinkEvent::Finished);
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), RecordingError> {
        let _ = self.events.send(SinkEvent::Chunk(b"end".to_vec()));
        let _ = self.events.send(SinkEvent::Finished);
        Ok(())
    }
}

fn drawn_surface() -> Surface {
    let frame = CameraFrame::from_rgba(8, 6, vec![200; 8 * 6 * 4]);
    let mut surface = Surface::new();
    draw_frame(
        &mut surface,
        &frame,
        compute_crop(8, 6, 1.0),
        &compute_filter(0.0, FilterType::Original),
        false,
    )
    .unwrap();
    surface
}

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("lenscap-{}-{}", name, std::process::id()))
}

#[tokio::test(start_paused = true)]
async fn test_start_then_stop_yields_one_file() {
    let mut recorder = Recorder::new(MemorySinkFactory::new());
    recorder.start(8, 6).unwrap();
    let bytes = recorder.finish().await.unwrap();
    assert_eq!(bytes, b"end");
    assert!(recorder.is_stopped());

    let dir = temp_dir("record-once");
    let path = save_recording(&bytes, &dir).await.unwrap();

    let files: Vec<_> = std::fs::read_dir(&dir).unwrap().collect();
    assert_eq!(files.len(), 1);
    assert_eq!(std::fs::read(&path).unwrap(), b"end");

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    let digits = name
        .strip_prefix("video_")
        .and_then(|rest| rest.strip_suffix(".webm"))
        .unwrap();
    assert!(!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()));

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test(start_paused = true)]
async fn test_chunks_concatenate_in_arrival_order() {
    let surface = drawn_surface();
    let mut recorder = Recorder::new(MemorySinkFactory::new());
    recorder.start(8, 6).unwrap();

    for _ in 0..3 {
        recorder.capture_frame(&surface).unwrap();
    }
    assert_eq!(recorder.frames(), 3);

    let bytes = recorder.finish().await.unwrap();
    assert_eq!(bytes, [1, 2, 3, b'e', b'n', b'd']);
}

#[tokio::test(start_paused = true)]
async fn test_capture_ticks_drive_frames() {
    let surface = drawn_surface();
    let mut recorder = Recorder::new(MemorySinkFactory::new());
    recorder.start(8, 6).unwrap();

    let mut captured = 0;
    while captured < 5 {
        match recorder.next_event().await {
            RecorderEvent::CaptureDue => {
                recorder.capture_frame(&surface).unwrap();
                captured += 1;
            }
            RecorderEvent::Sink(event) => {
                assert!(recorder.handle_sink_event(event).is_none());
            }
        }
    }

    let bytes = recorder.finish().await.unwrap();
    assert_eq!(bytes, [1, 2, 3, 4, 5, b'e', b'n', b'd']);
}

#[tokio::test(start_paused = true)]
async fn test_resized_surface_is_scaled() {
    let surface = drawn_surface();
    let mut recorder = Recorder::new(MemorySinkFactory::new());
    recorder.start(4, 3).unwrap();
    recorder.capture_frame(&surface).unwrap();
    assert_eq!(recorder.frames(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_sink_failure_discards_chunks() {
    let surface = drawn_surface();
    let factory = Arc::new(MemorySinkFactory {
        fail_after: Some(2),
        finish_early: false,
    });
    let mut recorder = Recorder::new(factory);
    recorder.start(8, 6).unwrap();

    let error = loop {
        match recorder.next_event().await {
            RecorderEvent::CaptureDue => recorder.capture_frame(&surface).unwrap(),
            RecorderEvent::Sink(event) => {
                if let Some(result) = recorder.handle_sink_event(event) {
                    break result.unwrap_err();
                }
            }
        }
    };

    assert_eq!(error, RecordingError::Sink("disk full".to_string()));
    assert!(recorder.is_stopped());
    assert_eq!(recorder.chunk_count(), 0);

    // Back in Stopped: a new recording can start
    recorder.start(8, 6).unwrap();
    assert!(recorder.is_recording());
}

#[tokio::test(start_paused = true)]
async fn test_early_finish_is_a_failure() {
    let surface = drawn_surface();
    let factory = Arc::new(MemorySinkFactory {
        fail_after: None,
        finish_early: true,
    });
    let mut recorder = Recorder::new(factory);
    recorder.start(8, 6).unwrap();
    recorder.capture_frame(&surface).unwrap();

    let result = loop {
        if let RecorderEvent::Sink(event) = recorder.next_event().await
            && let Some(result) = recorder.handle_sink_event(event)
        {
            break result;
        }
    };
    assert!(matches!(result, Err(RecordingError::Sink(_))));
    assert!(recorder.is_stopped());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_transitions() {
    let mut recorder = Recorder::new(MemorySinkFactory::new());
    assert_eq!(recorder.stop(), Err(RecordingError::NotRecording));
    assert!(matches!(recorder.start(0, 0), Err(RecordingError::Sink(_))));

    recorder.start(8, 6).unwrap();
    assert_eq!(recorder.start(8, 6), Err(RecordingError::AlreadyRecording));

    recorder.stop().unwrap();
    assert!(recorder.is_finalizing());
    assert_eq!(recorder.start(8, 6), Err(RecordingError::AlreadyRecording));
    assert!(recorder.wait_finalized().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_stopped_recorder_never_wakes() {
    let mut recorder = Recorder::new(MemorySinkFactory::new());
    assert!(
        tokio::time::timeout(Duration::from_secs(10), recorder.next_event())
            .await
            .is_err()
    );
}

#[test]
fn test_timer_produces_no_updates_after_cancel() {
    let t0 = Instant::now();
    let mut timer = ElapsedTimer::new();
    timer.start(t0);
    for s in 1..=3 {
        assert!(timer.tick(t0 + Duration::from_secs(s)).is_some());
    }
    assert!(timer.cancel());

    for s in 4..=10 {
        assert_eq!(timer.tick(t0 + Duration::from_secs(s)), None);
    }
    assert_eq!(timer.updates(), 3);
    assert!(!timer.is_running());
}

#[test]
fn test_timer_label_uses_wall_clock() {
    let t0 = Instant::now();
    let mut timer = ElapsedTimer::new();
    timer.start(t0);
    assert_eq!(
        timer.tick(t0 + Duration::from_millis(3_661_500)).as_deref(),
        Some("61:01")
    );
}
