//! # Ad Quiz Overlay
//!
//! This library provides the interaction core of an ad-insertion overlay. It
//! sequences video ads, shows an interactive quiz over an ad, and advances
//! the playlist based on the quiz outcome and the elapsed time. Rendering,
//! media playback and storage are left to the host, which the core drives
//! through small traits and serializable messages.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
use serde::{Deserialize, Serialize};

pub mod config;
pub mod constants;
pub mod counter;
pub mod id;
pub mod player;
pub mod playlist;
pub mod quiz;
pub mod sequencer;
pub mod session;
pub mod timeline;
pub mod watched;

/// Messages sent to update the rendering layer
///
/// Update messages describe a single change, such as a countdown tick or a
/// new panel height.
#[derive(Debug, Serialize, Clone, PartialEq, Eq, derive_more::From)]
pub enum UpdateMessage {
    /// Playlist and panel updates
    Sequencer(sequencer::UpdateMessage),
    /// Quiz updates
    Quiz(quiz::UpdateMessage),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Alarm messages for timed events
///
/// Every delay in the overlay is expressed as an alarm handed to the host's
/// scheduling function and delivered back once the delay has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::From, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Countdown ticks
    Counter(counter::AlarmMessage),
    /// Quiz completion delays
    Quiz(quiz::AlarmMessage),
}
