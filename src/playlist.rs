//! Playlist of ads and organic videos
//!
//! A playlist is an ordered list of entries. Some entries are ads carrying an
//! embedded quiz, some are sponsored clips, and the rest is organic content.
//! The sequencer consumes the playlist from its end, so entries play in the
//! reverse of their declaration order.

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    constants::playlist::{
        DEFAULT_DURATION, MAX_DURATION, MAX_ENTRY_COUNT, MAX_SOURCE_LENGTH, MIN_DURATION,
    },
    quiz::{self, AnswerOption},
};

/// Errors that can occur while loading a playlist
#[derive(Error, Debug)]
pub enum Error {
    /// The playlist document is not valid JSON or has the wrong shape
    #[error("malformed playlist: {0}")]
    Json(#[from] serde_json::Error),
    /// The playlist parsed but violates a constraint
    #[error("invalid playlist: {0}")]
    Invalid(#[from] garde::Report),
}

/// One item of the playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Entry {
    /// Media source; also the key of the watched flag
    #[garde(length(min = 1, max = MAX_SOURCE_LENGTH))]
    pub source: String,
    /// Sponsored entries are skipped when reached by the end of playback
    #[serde(default)]
    #[garde(skip)]
    pub sponsored: bool,
    /// Time budget of the embedded quiz, in display seconds
    #[serde(default)]
    #[garde(range(min = MIN_DURATION, max = MAX_DURATION))]
    pub duration_seconds: Option<u64>,
    /// Quiz shown over this entry
    #[serde(default)]
    #[garde(dive)]
    pub quiz: Option<quiz::Config>,
}

impl Entry {
    /// An organic entry: no quiz, not sponsored
    pub fn organic(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            sponsored: false,
            duration_seconds: None,
            quiz: None,
        }
    }

    /// A sponsored entry
    pub fn sponsored(source: impl Into<String>) -> Self {
        Self {
            sponsored: true,
            ..Self::organic(source)
        }
    }

    /// An ad carrying a quiz with the given time budget
    pub fn with_quiz(source: impl Into<String>, quiz: quiz::Config, duration_seconds: u64) -> Self {
        Self {
            duration_seconds: Some(duration_seconds),
            quiz: Some(quiz),
            ..Self::organic(source)
        }
    }

    /// Whether this entry is advertising rather than organic content
    pub fn is_ad(&self) -> bool {
        self.sponsored || self.quiz.is_some()
    }

    /// Time budget of the embedded quiz
    pub fn time_budget(&self) -> u64 {
        self.duration_seconds.unwrap_or(DEFAULT_DURATION)
    }
}

/// An ordered playlist, consumed from its end
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(transparent)]
pub struct Playlist {
    #[garde(length(max = MAX_ENTRY_COUNT), dive)]
    entries: Vec<Entry>,
}

impl Playlist {
    /// Creates a playlist from entries in declaration order
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Parses a playlist from a JSON array of entries and validates it
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if the document cannot be parsed and
    /// `Error::Invalid` if an entry or its quiz is invalid.
    pub fn from_json(s: &str) -> Result<Self, Error> {
        let playlist: Self = serde_json::from_str(s)?;
        playlist.validate()?;
        Ok(playlist)
    }

    /// Removes and returns the next entry to play
    pub fn pop(&mut self) -> Option<Entry> {
        self.entries.pop()
    }

    /// Number of entries left
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are left
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries left, in declaration order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The stock playlist: an organic video preceded by two quiz ads, each
    /// followed by a sponsored clip
    pub fn demo() -> Self {
        fn options(labels: [&str; 4]) -> std::collections::BTreeMap<String, AnswerOption> {
            ["a", "b", "c", "d"]
                .into_iter()
                .zip(labels)
                .enumerate()
                .map(|(i, (key, label))| {
                    (
                        key.to_string(),
                        AnswerOption {
                            label: label.to_string(),
                            correct: i == 0,
                        },
                    )
                })
                .collect()
        }

        Self::new(vec![
            Entry::organic("media/video.mp4"),
            Entry::sponsored("media/sponsor.mp4"),
            Entry::with_quiz(
                "media/ad-2.mp4",
                quiz::Config {
                    prompt: "Who dies at the end?".to_string(),
                    success_template: "Well done, \"$data\" dies at the end".to_string(),
                    failure_template: "No, \"$data\" survives, keep watching".to_string(),
                    options: options(["Iron Man", "Thor", "Hulk", "Captain America"]),
                },
                60,
            ),
            Entry::sponsored("media/sponsor.mp4"),
            Entry::with_quiz(
                "media/ad.mp4",
                quiz::Config {
                    prompt: "How much will the next electric city car cost?".to_string(),
                    success_template: "Well done, it costs \"$data\"".to_string(),
                    failure_template: "No, it does not cost \"$data\", keep watching".to_string(),
                    options: options(["1 999 €", "2 500 €", "3 000 €", "4 000 €"]),
                },
                60,
            ),
        ])
    }
}
