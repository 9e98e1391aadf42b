// SPDX-License-Identifier: GPL-3.0-only

//! Snapshot of the compositing surface
//!
//! The snapshot is a copy, so the render loop keeps drawing while the copy is
//! encoded and saved.

use crate::errors::EncodeError;
use crate::render::Surface;
use image::RgbaImage;
use tracing::debug;

/// Copy the surface's current contents
///
/// # Errors
/// * `EncodeError::EmptySurface` - nothing has been drawn yet
pub fn take_snapshot(surface: &Surface) -> Result<RgbaImage, EncodeError> {
    if surface.is_empty() {
        return Err(EncodeError::EmptySurface);
    }
    let snapshot = surface.snapshot();
    debug!(
        width = snapshot.width(),
        height = snapshot.height(),
        "Surface snapshot taken"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_surface_cannot_be_captured() {
        assert_eq!(
            take_snapshot(&Surface::new()).unwrap_err(),
            EncodeError::EmptySurface
        );
    }
}
