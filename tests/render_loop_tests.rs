// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the frame-rate gated render loop

use lenscap::ViewState;
use lenscap::backends::camera::CameraFrame;
use lenscap::render::{RenderLoop, Surface, TickOutcome};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn solid_frame(width: u32, height: u32) -> CameraFrame {
    CameraFrame::from_rgba(width, height, vec![90; (width * height * 4) as usize])
}

fn running_loop(fps: u32, t0: Instant) -> RenderLoop {
    let mut render = RenderLoop::with_rng(fps, StdRng::seed_from_u64(11));
    render.start(t0);
    render
}

#[test]
fn test_thirty_fps_gating() {
    let t0 = Instant::now();
    let mut render = running_loop(30, t0);
    let view = ViewState::new(5.0);
    let frame = solid_frame(16, 9);
    let mut surface = Surface::new();

    let outcomes: Vec<TickOutcome> = [10u64, 20, 45]
        .into_iter()
        .map(|ms| {
            render.tick(
                t0 + Duration::from_millis(ms),
                Some(&frame),
                &view,
                false,
                &mut surface,
            )
        })
        .collect();

    assert_eq!(
        outcomes,
        [TickOutcome::NotDue, TickOutcome::NotDue, TickOutcome::Drawn]
    );
    assert_eq!(render.stats().drawn, 1);
    assert_eq!((surface.width(), surface.height()), (16, 9));
}

#[test]
fn test_draw_count_does_not_drift() {
    // 60 Hz display ticks against a 24 fps target for ten seconds
    let t0 = Instant::now();
    let mut render = running_loop(24, t0);
    let view = ViewState::new(5.0);
    let frame = solid_frame(4, 4);
    let mut surface = Surface::new();

    let tick = Duration::from_micros(16_667);
    let mut drawn = 0;
    for i in 1..=600u32 {
        if render.tick(t0 + tick * i, Some(&frame), &view, false, &mut surface)
            == TickOutcome::Drawn
        {
            drawn += 1;
        }
    }
    // Phase-locked: within one frame of the ideal 240
    assert!((239..=240).contains(&drawn), "drawn {}", drawn);
}

#[test]
fn test_unready_source_keeps_baseline() {
    let t0 = Instant::now();
    let mut render = running_loop(30, t0);
    let view = ViewState::new(5.0);
    let frame = solid_frame(8, 8);
    let mut surface = Surface::new();

    let at = |ms| t0 + Duration::from_millis(ms);
    assert_eq!(
        render.tick(at(40), None, &view, false, &mut surface),
        TickOutcome::SourceNotReady
    );
    assert!(surface.is_empty());

    // Still due one millisecond later because the baseline did not move
    assert_eq!(
        render.tick(at(41), Some(&frame), &view, false, &mut surface),
        TickOutcome::Drawn
    );
    assert_eq!(render.stats().not_ready, 1);
}

#[test]
fn test_bad_frame_is_skipped_not_fatal() {
    let t0 = Instant::now();
    let mut render = running_loop(30, t0);
    let view = ViewState::new(5.0);
    let mut surface = Surface::new();

    let truncated = CameraFrame {
        data: Arc::from(vec![0u8; 10]),
        ..solid_frame(8, 8)
    };
    let at = |ms| t0 + Duration::from_millis(ms);

    assert_eq!(
        render.tick(at(40), Some(&truncated), &view, false, &mut surface),
        TickOutcome::Failed
    );
    // The failed frame consumed its slot
    assert_eq!(
        render.tick(at(50), Some(&solid_frame(8, 8)), &view, false, &mut surface),
        TickOutcome::NotDue
    );
    assert_eq!(
        render.tick(at(80), Some(&solid_frame(8, 8)), &view, false, &mut surface),
        TickOutcome::Drawn
    );
    assert!(render.is_running());
    assert_eq!(render.stats().failed, 1);
}

#[test]
fn test_stopped_loop_draws_nothing() {
    let t0 = Instant::now();
    let mut render = running_loop(30, t0);
    render.stop();
    assert!(!render.is_running());

    let mut surface = Surface::new();
    assert_eq!(
        render.tick(
            t0 + Duration::from_secs(1),
            Some(&solid_frame(4, 4)),
            &ViewState::new(5.0),
            false,
            &mut surface
        ),
        TickOutcome::Idle
    );
    assert!(surface.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_scheduling_chain() {
    let mut render = RenderLoop::with_rng(30, StdRng::seed_from_u64(3));
    render.start(Instant::now());

    for _ in 0..3 {
        tokio::time::timeout(Duration::from_millis(50), render.next_tick())
            .await
            .expect("running loop ticks");
    }

    render.stop();
    assert!(
        tokio::time::timeout(Duration::from_secs(5), render.next_tick())
            .await
            .is_err(),
        "stopped loop must not tick"
    );
}

#[tokio::test(start_paused = true)]
async fn test_display_ticks_at_refresh_rate() {
    let mut render = RenderLoop::with_rng(60, StdRng::seed_from_u64(5));
    let start = Instant::now();
    render.start(start);

    let first = render.next_tick().await;
    let second = render.next_tick().await;
    let gap = second - first;
    assert!(gap >= Duration::from_millis(16) && gap <= Duration::from_millis(17));
}
