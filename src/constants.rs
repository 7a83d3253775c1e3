//! Configuration constants for the ad overlay
//!
//! This module contains the limits and default values used throughout the
//! overlay to validate loaded playlists and settings and to provide
//! consistent boundaries for the timer, quiz and sequencer.

/// Playlist configuration constants
pub mod playlist {
    /// Maximum number of entries allowed in a single playlist
    pub const MAX_ENTRY_COUNT: usize = 100;
    /// Maximum length of a source identifier in characters
    pub const MAX_SOURCE_LENGTH: usize = 2048;
    /// Minimum duration in seconds for an entry carrying a quiz
    pub const MIN_DURATION: u64 = 1;
    /// Maximum duration in seconds for an entry carrying a quiz
    pub const MAX_DURATION: u64 = 600;
    /// Quiz time budget in seconds used when an entry declares no duration
    pub const DEFAULT_DURATION: u64 = 60;
}

/// Quiz configuration constants
pub mod quiz {
    /// Maximum length of a quiz prompt or template
    pub const MAX_PROMPT_LENGTH: usize = 200;
    /// Minimum number of answer options for a quiz
    pub const MIN_OPTION_COUNT: usize = 2;
    /// Maximum number of answer options for a quiz
    pub const MAX_OPTION_COUNT: usize = 8;
    /// Maximum length of an option label
    pub const MAX_LABEL_LENGTH: usize = 100;
    /// Token replaced by the selected option's label in outcome templates
    pub const LABEL_PLACEHOLDER: &str = "$data";
}

/// Settings constants
pub mod settings {
    /// Minimum display-speed multiplier
    pub const MIN_MULTIPLIER: u32 = 1;
    /// Maximum display-speed multiplier
    pub const MAX_MULTIPLIER: u32 = 16;
    /// Minimum real interval between countdown ticks in milliseconds
    pub const MIN_TICK_INTERVAL_MS: u64 = 10;
    /// Maximum real interval between countdown ticks in milliseconds
    pub const MAX_TICK_INTERVAL_MS: u64 = 1000;
    /// Maximum panel height in pixels
    pub const MAX_PANEL_HEIGHT: u32 = 1000;
    /// Maximum delay in milliseconds before a successful quiz completes
    pub const MAX_COMPLETION_DELAY_MS: u64 = 5000;
    /// Panel height in pixels when the quiz overlay is hidden
    pub const COLLAPSED_PANEL_HEIGHT: u32 = 0;
}
