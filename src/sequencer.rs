//! Ad sequencing and panel management
//!
//! The sequencer owns the playlist and decides what plays next. It selects
//! the next entry when playback ends or a quiz is won, consults the watched
//! flags so a quiz is never shown twice, activates the quiz of a fresh ad,
//! configures the external player, and computes the height of the quiz
//! panel that the rendering layer reserves under the video.
//!
//! All input arrives as method calls from the host: player notifications,
//! viewer selections and scheduled alarms. Everything the rendering layer
//! needs is pushed through a [`Tunnel`] and is also readable through the
//! getters at any time.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use web_time::Duration;

use crate::{
    AlarmMessage,
    config::Settings,
    constants::settings::COLLAPSED_PANEL_HEIGHT,
    player::{PlaybackSettings, PlayerAdapter},
    playlist::{Entry, Playlist},
    quiz::{self, Outcome, Phase, Signal, state::OptionView},
    session::Tunnel,
    watched::WatchedStore,
};

/// What caused the sequencer to advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// The current entry finished playing
    PlaybackEnded,
    /// The quiz of the current entry was answered correctly
    QuizSucceeded,
    /// The host asked for the next entry, e.g. on page load
    Manual,
}

/// Update messages about the playlist and the quiz panel
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub enum UpdateMessage {
    /// The quiz panel changed height
    PanelHeight(u32),
    /// A new entry started
    EntryStarted {
        /// Media source of the entry
        source: String,
        /// Whether the entry was already watched before
        already_watched: bool,
        /// Whether a quiz is shown over the entry
        quiz_visible: bool,
    },
    /// Nothing is left to play
    PlaylistFinished,
}

/// Quiz part of a snapshot
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct QuizSnapshot {
    /// Current phase
    pub phase: Phase,
    /// Display seconds left
    pub remaining_seconds: u64,
    /// Prompt to display
    pub displayed_prompt: String,
    /// Selectable options
    pub options: Vec<OptionView>,
    /// Key of the selected option
    pub selected: Option<String>,
    /// Key of the correct option, disclosed once the quiz left `Unanswered`
    pub correct_key: Option<String>,
}

/// Full snapshot of the observable state
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SyncMessage {
    /// Source of the current entry
    pub source: Option<String>,
    /// Whether the current entry was already watched before
    pub already_watched: bool,
    /// Height of the quiz panel in pixels
    pub panel_height: u32,
    /// The active quiz, if one is shown
    pub quiz: Option<QuizSnapshot>,
    /// Entries left in the playlist
    pub remaining_entries: usize,
}

/// The ad sequencer
///
/// Generic over the player it drives and the store holding the watched
/// flags, both supplied by the host.
pub struct Sequencer<P, W> {
    /// Timing and layout settings
    settings: Settings,
    /// Entries left to play
    playlist: Playlist,
    /// Watched flags keyed by source
    store: W,
    /// The external media player
    player: P,
    /// Entry currently playing
    current: Option<Entry>,
    /// Whether the current entry was watched before it was selected
    already_watched: bool,
    /// Runtime state of the quiz shown over the current entry
    quiz: Option<quiz::State>,
    /// Height reserved for the quiz panel
    panel_height: u32,
}

impl<P, W> Debug for Sequencer<P, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("current", &self.current.as_ref().map(|entry| &entry.source))
            .field("remaining", &self.playlist.len())
            .field("panel_height", &self.panel_height)
            .finish_non_exhaustive()
    }
}

impl<P: PlayerAdapter, W: WatchedStore> Sequencer<P, W> {
    /// Creates a sequencer with nothing playing yet
    ///
    /// Call [`Sequencer::advance`] with [`Trigger::Manual`] to start the
    /// first entry.
    pub fn new(settings: Settings, playlist: Playlist, store: W, player: P) -> Self {
        Self {
            settings,
            playlist,
            store,
            player,
            current: None,
            already_watched: false,
            quiz: None,
            panel_height: COLLAPSED_PANEL_HEIGHT,
        }
    }

    /// Moves to the next entry of the playlist
    ///
    /// Entries are taken from the end of the playlist. A sponsored entry is
    /// skipped when reached through [`Trigger::PlaybackEnded`] but plays when
    /// reached any other way. The quiz of an entry is only shown the first
    /// time its source is played.
    ///
    /// Each entry sets the panel height on arrival, so the success height
    /// reached by a correct answer only lasts until the completion delay
    /// elapses; an entry without a quiz then collapses the panel. Like the
    /// sponsored skip, this differs from overlays that keep the success
    /// height until the playlist ends.
    ///
    /// # Arguments
    ///
    /// * `trigger` - What caused the advance
    /// * `schedule_message` - Function to schedule the quiz countdown
    /// * `tunnel` - Channel to the rendering layer
    ///
    /// # Returns
    ///
    /// The entry now playing, or `None` when the playlist is exhausted
    pub fn advance<T: Tunnel, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        trigger: Trigger,
        schedule_message: S,
        tunnel: &T,
    ) -> Option<&Entry> {
        // the next entry sets the panel height itself
        if let Some(quiz) = self.quiz.take() {
            quiz.dismiss(|_| ());
        }

        let Some(entry) = self.next_entry(trigger) else {
            tracing::info!(?trigger, "playlist finished");
            self.current = None;
            self.already_watched = false;
            self.set_panel_height(COLLAPSED_PANEL_HEIGHT, tunnel);
            tunnel.send_message(&UpdateMessage::PlaylistFinished.into());
            return None;
        };

        self.already_watched = self.store.is_watched(&entry.source);
        if !self.already_watched {
            self.store.set(&entry.source, true);
        }

        tracing::info!(
            source = %entry.source,
            ?trigger,
            already_watched = self.already_watched,
            "entry selected"
        );

        match &entry.quiz {
            Some(config) if !self.already_watched => {
                self.quiz = Some(quiz::State::activate(
                    config.clone(),
                    entry.time_budget(),
                    &self.settings,
                    schedule_message,
                ));
                self.set_panel_height(self.settings.default_panel_height, tunnel);
            }
            _ => self.set_panel_height(COLLAPSED_PANEL_HEIGHT, tunnel),
        }

        PlaybackSettings::for_entry(&entry, &self.settings).apply(&mut self.player);

        tunnel.send_message(
            &UpdateMessage::EntryStarted {
                source: entry.source.clone(),
                already_watched: self.already_watched,
                quiz_visible: self.quiz.is_some(),
            }
            .into(),
        );
        if let Some(quiz) = &self.quiz {
            tunnel.send_message(&quiz.announcement().into());
        }

        self.current = Some(entry);
        self.current.as_ref()
    }

    /// Pops the next entry, skipping a sponsored one on playback end
    fn next_entry(&mut self, trigger: Trigger) -> Option<Entry> {
        let entry = self.playlist.pop()?;

        if trigger == Trigger::PlaybackEnded && entry.sponsored {
            tracing::debug!(source = %entry.source, "skipping sponsored entry");
            return self.playlist.pop();
        }

        Some(entry)
    }

    /// Handles the player's "ready to play" notification
    ///
    /// Starts playback. When the player refuses, e.g. because autoplay with
    /// sound is blocked, the rejection is swallowed and the player stays
    /// muted; otherwise the audio is switched on.
    ///
    /// # Returns
    ///
    /// `true` if playback started
    pub fn player_ready(&mut self) -> bool {
        match self.player.play() {
            Ok(()) => {
                self.player.set_muted(false);
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "playback start rejected, staying muted");
                false
            }
        }
    }

    /// Handles the player's "playback ended" notification
    pub fn playback_ended<T: Tunnel, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        schedule_message: S,
        tunnel: &T,
    ) -> Option<&Entry> {
        self.advance(Trigger::PlaybackEnded, schedule_message, tunnel)
    }

    /// Forwards the viewer's answer to the active quiz
    ///
    /// Unknown option keys and selections without an active quiz are logged
    /// and otherwise ignored.
    pub fn select_option<T: Tunnel, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        key: &str,
        mut schedule_message: S,
        tunnel: &T,
    ) {
        let Some(quiz) = &mut self.quiz else {
            tracing::debug!(key, "selection without an active quiz");
            return;
        };

        let mut signals = Vec::new();
        if let Err(e) = quiz.select_option(key, &mut schedule_message, |signal| {
            signals.push(signal);
        }) {
            tracing::debug!(error = %e, "selection ignored");
        }

        self.handle_signals(signals, schedule_message, tunnel);
    }

    /// Dismisses the active quiz, if any, collapsing the panel
    ///
    /// A completion still pending for the dismissed quiz is cancelled.
    pub fn dismiss_quiz<T: Tunnel>(&mut self, tunnel: &T) {
        if let Some(quiz) = self.quiz.take() {
            let mut signals = Vec::new();
            quiz.dismiss(|signal| signals.push(signal));
            self.handle_signals(signals, |_, _| {}, tunnel);
        }
    }

    /// Handles a scheduled alarm
    ///
    /// Alarms that arrive after their quiz was dismissed are dropped.
    pub fn receive_alarm<T: Tunnel, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        message: &AlarmMessage,
        mut schedule_message: S,
        tunnel: &T,
    ) {
        let Some(quiz) = &mut self.quiz else {
            tracing::trace!(?message, "dropping alarm without an active quiz");
            return;
        };

        let mut signals = Vec::new();
        quiz.receive_alarm(message, &mut schedule_message, |signal| {
            signals.push(signal);
        });

        self.handle_signals(signals, schedule_message, tunnel);
    }

    /// Reacts to the signals emitted by the quiz
    fn handle_signals<T: Tunnel, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        signals: Vec<Signal>,
        mut schedule_message: S,
        tunnel: &T,
    ) {
        for signal in signals {
            if let Some(update) = self.quiz.as_ref().and_then(|quiz| quiz.update_for(signal)) {
                tunnel.send_message(&update.into());
            }

            match signal {
                Signal::Tick { .. } => (),
                Signal::Answered { correct: true } => {
                    self.set_panel_height(self.settings.success_panel_height, tunnel);
                }
                Signal::Answered { correct: false } | Signal::Completed(Outcome::FailedByTimeout) => {
                    self.set_panel_height(self.settings.failure_panel_height, tunnel);
                }
                Signal::Completed(Outcome::Succeeded) => {
                    self.advance(Trigger::QuizSucceeded, &mut schedule_message, tunnel);
                }
                Signal::Dismissed { panel_height } => self.set_panel_height(panel_height, tunnel),
            }
        }
    }

    fn set_panel_height<T: Tunnel>(&mut self, height: u32, tunnel: &T) {
        if self.panel_height != height {
            self.panel_height = height;
            tunnel.send_message(&UpdateMessage::PanelHeight(height).into());
        }
    }

    /// Sends a full snapshot of the observable state through the tunnel
    pub fn sync<T: Tunnel>(&self, tunnel: &T) {
        tunnel.send_state(&self.state_message());
    }

    /// Builds a full snapshot of the observable state
    pub fn state_message(&self) -> SyncMessage {
        SyncMessage {
            source: self.current.as_ref().map(|entry| entry.source.clone()),
            already_watched: self.already_watched,
            panel_height: self.panel_height,
            quiz: self.quiz.as_ref().map(|quiz| QuizSnapshot {
                phase: quiz.phase(),
                remaining_seconds: quiz.remaining_seconds(),
                displayed_prompt: quiz.displayed_prompt().to_string(),
                options: quiz.options(),
                selected: quiz.selected().map(str::to_string),
                correct_key: (quiz.phase() != Phase::Unanswered)
                    .then(|| quiz.config().correct_key())
                    .flatten()
                    .map(str::to_string),
            }),
            remaining_entries: self.playlist.len(),
        }
    }

    /// Height reserved for the quiz panel, in pixels
    pub fn panel_height(&self) -> u32 {
        self.panel_height
    }

    /// Phase of the active quiz
    pub fn quiz_phase(&self) -> Option<Phase> {
        self.quiz.as_ref().map(quiz::State::phase)
    }

    /// Display seconds left on the active quiz
    pub fn remaining_seconds(&self) -> Option<u64> {
        self.quiz.as_ref().map(quiz::State::remaining_seconds)
    }

    /// Prompt of the active quiz
    pub fn displayed_prompt(&self) -> Option<&str> {
        self.quiz.as_ref().map(quiz::State::displayed_prompt)
    }

    /// Options of the active quiz, empty without one
    pub fn options(&self) -> Vec<OptionView> {
        self.quiz
            .as_ref()
            .map(quiz::State::options)
            .unwrap_or_default()
    }

    /// Runtime state of the active quiz
    pub fn quiz(&self) -> Option<&quiz::State> {
        self.quiz.as_ref()
    }

    /// Entry currently playing
    pub fn current(&self) -> Option<&Entry> {
        self.current.as_ref()
    }

    /// Whether the current entry was already watched before it was selected
    pub fn already_watched(&self) -> bool {
        self.already_watched
    }

    /// Entries left to play
    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    /// The watched flags
    pub fn store(&self) -> &W {
        &self.store
    }

    /// The player being driven
    pub fn player(&self) -> &P {
        &self.player
    }

    /// The settings in use
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
