// SPDX-License-Identifier: GPL-3.0-only

//! Capture pipelines fed by the compositing surface
//!
//! - [`photo`]: snapshot, encode and save
//! - [`video`]: fixed-rate capture into a recorder sink

pub mod photo;
pub mod video;
