// SPDX-License-Identifier: GPL-3.0-only

//! Lenscap - live camera capture with real-time filters
//!
//! This library provides the core functionality for the Lenscap application:
//! camera acquisition, the frame-rate gated render loop, filter compositing,
//! photo snapshots and WebM recording of the composited view.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Application context, view state and input controllers
//! - [`backends`]: Camera and audio backend abstraction
//! - [`render`]: Transform calculator, compositing surface and render loop
//! - [`pipelines`]: Photo and video capture pipelines
//! - [`config`]: User configuration handling
//! - [`storage`]: Save directories and output filenames
//! - [`terminal`]: Interactive terminal front-end
//!
//! # Example
//!
//! ```ignore
//! let source = Arc::new(TestPatternSource::new());
//! let mut app = App::new(Config::default(), source, default_sink_factory());
//! app.start_camera().await?;
//! loop {
//!     let event = app.step().await;
//!     // react to input and events
//! }
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod render;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{App, AppEvent, CameraMode, FilterType, ViewState};
pub use config::Config;
pub use errors::{AppError, AppResult};
