// SPDX-License-Identifier: GPL-3.0-only

//! Camera session lifecycle
//!
//! The manager provides:
//! - At most one live session at a time
//! - Stop-before-start replacement on facing or frame-rate changes
//! - Readiness waiting for the first frame

use super::types::*;
use super::{CameraSession, FrameSource};
use crate::errors::AcquisitionError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Owner of the single active [`CameraSession`]
///
/// Every mutating operation takes `&mut self`, so acquisitions are serialized
/// by construction: a replacement cannot begin while another is outstanding.
pub struct SessionManager {
    source: Arc<dyn FrameSource>,
    session: Option<CameraSession>,
}

impl SessionManager {
    pub fn new(source: Arc<dyn FrameSource>) -> Self {
        info!(backend = source.name(), "Creating camera session manager");
        Self {
            source,
            session: None,
        }
    }

    /// Name of the backend in use
    pub fn backend_name(&self) -> &'static str {
        self.source.name()
    }

    /// Enumerate available cameras
    pub fn enumerate(&self) -> Vec<CameraDevice> {
        self.source.enumerate()
    }

    /// The live session, if any
    pub fn session(&self) -> Option<&CameraSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Replace the current session with a new one for `facing` at `fps`
    ///
    /// The previous session is fully stopped before the new acquisition
    /// begins. On failure no session is left active.
    pub async fn start(&mut self, facing: Facing, fps: u32) -> Result<(), AcquisitionError> {
        self.stop().await;

        let request = StreamRequest::new(facing, fps);
        info!(
            backend = self.source.name(),
            facing = %facing,
            fps,
            "Acquiring camera"
        );

        let source = Arc::clone(&self.source);
        let session = tokio::task::spawn_blocking(move || source.open(&request))
            .await
            .map_err(|e| AcquisitionError::Backend(format!("acquisition task failed: {}", e)))?
            .inspect_err(|e| warn!(error = %e, facing = %facing, "Camera acquisition failed"))?;

        info!(device = %session.device().name, "Camera session started");
        self.session = Some(session);
        Ok(())
    }

    /// Release the active session, waiting until its tracks are stopped
    pub async fn stop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        info!(facing = %session.facing(), "Stopping camera session");
        let result = tokio::task::spawn_blocking(move || {
            session.stop();
            drop(session);
        })
        .await;

        if let Err(e) = result {
            warn!(error = %e, "Camera session teardown task failed");
        }
    }

    /// Latest frame of the active session; `None` while idle or unready
    pub fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        self.session.as_ref().and_then(CameraSession::latest_frame)
    }

    /// Wait for the active session's first frame
    ///
    /// # Errors
    /// * `AcquisitionError::Timeout` - no frame within `timeout`
    /// * `AcquisitionError::Backend` - no session, or the stream ended first
    pub async fn wait_until_ready(&mut self, timeout: Duration) -> Result<(), AcquisitionError> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| AcquisitionError::Backend("no active camera session".to_string()))?;

        match tokio::time::timeout(timeout, session.ready()).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AcquisitionError::Backend(
                "stream ended before the first frame".to_string(),
            )),
            Err(_) => Err(AcquisitionError::Timeout),
        }
    }
}
