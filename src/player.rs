//! Media player boundary
//!
//! The overlay never decodes or renders video itself. It drives an external
//! player through the [`PlayerAdapter`] trait: it sets the playback
//! parameters for the current source and asks the player to start. The host
//! forwards the player's "ready" and "ended" notifications back into the
//! sequencer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::Settings, playlist::Entry};

/// The player refused to start playback, typically because the browser
/// blocked autoplay with sound
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("playback start rejected: {reason}")]
pub struct PlaybackStartRejected {
    /// Reason reported by the player
    pub reason: String,
}

/// Trait for driving an external media player
///
/// Implementations wrap whatever surface actually renders the video, such as
/// an HTML video element.
pub trait PlayerAdapter {
    /// Sets the media source to play
    fn set_source(&mut self, source: &str);

    /// Sets whether the source restarts when it ends
    fn set_looping(&mut self, looping: bool);

    /// Mutes or unmutes the audio
    fn set_muted(&mut self, muted: bool);

    /// Shows or hides the viewer's playback controls
    fn set_controls(&mut self, controls: bool);

    /// Sets the playback rate, `1.0` being real time
    fn set_playback_rate(&mut self, rate: f64);

    /// Starts playback
    ///
    /// # Errors
    ///
    /// Returns `PlaybackStartRejected` if the player refuses to start.
    fn play(&mut self) -> Result<(), PlaybackStartRejected>;
}

/// Playback parameters for one entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Media source
    pub source: String,
    /// Restart when the source ends
    pub looping: bool,
    /// Start muted
    pub muted: bool,
    /// Show the viewer's controls
    pub controls: bool,
    /// Playback rate
    pub playback_rate: f64,
}

impl PlaybackSettings {
    /// Computes the playback parameters for an entry
    ///
    /// Ads are muted, looped, sped up by the display-speed multiplier and
    /// shown without controls. Organic content keeps the viewer's audio,
    /// plays once at normal speed and exposes the controls.
    pub fn for_entry(entry: &Entry, settings: &Settings) -> Self {
        let is_ad = entry.is_ad();

        Self {
            source: entry.source.clone(),
            looping: is_ad,
            muted: is_ad,
            controls: !is_ad,
            playback_rate: if is_ad {
                settings.ad_playback_rate()
            } else {
                1.
            },
        }
    }

    /// Pushes these parameters to a player
    pub fn apply<P: PlayerAdapter + ?Sized>(&self, player: &mut P) {
        player.set_source(&self.source);
        player.set_looping(self.looping);
        player.set_muted(self.muted);
        player.set_controls(self.controls);
        player.set_playback_rate(self.playback_rate);
    }
}
