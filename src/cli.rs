// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking photos
//! - Recording videos
//!
//! Photo and video commands run the same render loop and capture pipelines as
//! the terminal viewer, so what is saved is the composited (zoomed, filtered)
//! surface.

use lenscap::app::{App, AppEvent, CameraMode};
use lenscap::backends::camera::FrameSource;
use lenscap::constants::camera;
use lenscap::render::TickOutcome;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// List all available cameras
pub fn list_cameras(source: &dyn FrameSource) -> Result<(), Box<dyn std::error::Error>> {
    let cameras = source.enumerate();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", source.name());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        let location = camera
            .facing
            .map(|f| f.to_string())
            .unwrap_or_else(|| "external".to_string());
        println!("      Facing: {}", location);
        println!("      Path:   {}", camera.path);
        println!();
    }

    Ok(())
}

/// Take a photo of the composited view
pub async fn take_photo(mut app: App) -> Result<(), Box<dyn std::error::Error>> {
    let result = capture_one(&mut app).await;
    app.shutdown().await;
    result
}

async fn capture_one(app: &mut App) -> Result<(), Box<dyn std::error::Error>> {
    start(app).await?;

    // Let exposure settle, then use the next composited frame
    println!("Capturing...");
    let warmup_until = Instant::now() + camera::WARMUP;
    tokio::time::timeout(camera::FIRST_FRAME_TIMEOUT + camera::WARMUP, async {
        loop {
            if let AppEvent::Tick(TickOutcome::Drawn) = app.step().await
                && Instant::now() >= warmup_until
            {
                break;
            }
        }
    })
    .await
    .map_err(|_| "Failed to capture frame from camera")?;

    app.capture_photo()?;

    loop {
        match app.step().await {
            AppEvent::PhotoSaved(path) => {
                println!("Photo saved: {}", path.display());
                return Ok(());
            }
            AppEvent::PhotoFailed(e) => return Err(e.into()),
            _ => {}
        }
    }
}

/// Record a video for `duration` seconds or until Ctrl+C
pub async fn record_video(mut app: App, duration: u64) -> Result<(), Box<dyn std::error::Error>> {
    let result = record(&mut app, Duration::from_secs(duration)).await;
    app.shutdown().await;
    result
}

async fn record(app: &mut App, duration: Duration) -> Result<(), Box<dyn std::error::Error>> {
    start(app).await?;

    // The recorder is sized from the surface, so wait for the first draw
    tokio::time::timeout(camera::FIRST_FRAME_TIMEOUT, async {
        while !matches!(app.step().await, AppEvent::Tick(TickOutcome::Drawn)) {}
    })
    .await
    .map_err(|_| "Camera produced no frames")?;

    let surface = app.surface();
    println!(
        "Recording format: {}x{} @ {}fps",
        surface.width(),
        surface.height(),
        lenscap::constants::capture::RECORDING_FPS
    );
    println!("Duration: {} seconds", duration.as_secs());

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    if !app.set_mode(CameraMode::Video) {
        return Err("Could not switch to video mode".into());
    }
    println!();
    println!("Recording... (press Ctrl+C to stop early)");
    app.start_recording()?;

    let deadline = Instant::now() + duration;
    let mut shown = String::new();
    loop {
        if let AppEvent::RecordingFailed(e) = app.step().await {
            println!();
            return Err(e.into());
        }

        if let Some(label) = app.elapsed_label()
            && label != shown
        {
            shown = label.to_string();
            print!("\rRecording: {}", shown);
            std::io::Write::flush(&mut std::io::stdout())?;
        }

        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }
        if Instant::now() >= deadline {
            println!();
            break;
        }
    }

    app.stop_recording()?;

    loop {
        match app.step().await {
            AppEvent::RecordingSaved(path) => {
                println!("Video saved: {}", path.display());
                return Ok(());
            }
            AppEvent::RecordingFailed(e) => return Err(e.into()),
            _ => {}
        }
    }
}

async fn start(app: &mut App) -> Result<(), Box<dyn std::error::Error>> {
    app.start_camera().await?;
    println!("Using camera: {}", app.camera_name().unwrap_or("unknown"));
    app.wait_until_ready(camera::FIRST_FRAME_TIMEOUT).await?;
    Ok(())
}
