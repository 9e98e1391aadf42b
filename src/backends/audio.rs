// SPDX-License-Identifier: GPL-3.0-only

//! Shutter cue
//!
//! A short sine beep played through the default audio sink. Without GStreamer
//! the terminal bell is rung instead.

use tracing::debug;
#[cfg(feature = "gstreamer")]
use tracing::warn;

/// Play the shutter sound without blocking the caller
pub fn play_shutter_sound() {
    #[cfg(feature = "gstreamer")]
    {
        let spawned = std::thread::Builder::new()
            .name("shutter-sound".into())
            .spawn(|| {
                if let Err(e) = play_beep() {
                    warn!(error = %e, "Shutter sound failed");
                    ring_bell();
                }
            });
        if let Err(e) = spawned {
            warn!(error = %e, "Failed to spawn shutter sound thread");
        }
    }

    #[cfg(not(feature = "gstreamer"))]
    ring_bell();
}

fn ring_bell() {
    use std::io::Write;
    let mut stderr = std::io::stderr();
    let _ = stderr.write_all(b"\x07");
    let _ = stderr.flush();
    debug!("Rang terminal bell");
}

#[cfg(feature = "gstreamer")]
fn play_beep() -> Result<(), String> {
    use crate::constants::sound;
    use gstreamer::prelude::*;

    crate::backends::gst_init()?;

    let pipeline = gstreamer::parse::launch(&format!(
        "audiotestsrc wave=sine freq={} volume={} num-buffers={} samplesperbuffer=441 ! \
         audioconvert ! autoaudiosink",
        sound::BEEP_FREQUENCY,
        sound::BEEP_VOLUME,
        sound::BEEP_BUFFERS,
    ))
    .map_err(|e| e.to_string())?;

    pipeline
        .set_state(gstreamer::State::Playing)
        .map_err(|e| e.to_string())?;

    let bus = pipeline.bus().ok_or("pipeline has no bus")?;
    let outcome = match bus.timed_pop_filtered(
        gstreamer::ClockTime::from_seconds(2),
        &[gstreamer::MessageType::Eos, gstreamer::MessageType::Error],
    ) {
        Some(msg) => match msg.view() {
            gstreamer::MessageView::Error(err) => Err(err.error().to_string()),
            _ => Ok(()),
        },
        None => Ok(()),
    };

    let _ = pipeline.set_state(gstreamer::State::Null);
    debug!("Shutter sound finished");
    outcome
}
