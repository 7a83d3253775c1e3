//! Overlay settings
//!
//! A single immutable settings structure shared by the countdown, the quiz and
//! the sequencer. It replaces the scattered height, speed and delay constants
//! of a classic overlay with one validated value passed in at construction.

use web_time::Duration;

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::settings::{
    MAX_COMPLETION_DELAY_MS, MAX_MULTIPLIER, MAX_PANEL_HEIGHT, MAX_TICK_INTERVAL_MS,
    MIN_MULTIPLIER, MIN_TICK_INTERVAL_MS,
};

/// Errors that can occur while loading settings
#[derive(Error, Debug)]
pub enum Error {
    /// The settings document is not valid JSON or has the wrong shape
    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
    /// The settings parsed but violate a bound
    #[error("invalid settings: {0}")]
    Invalid(#[from] garde::Report),
}

fn validate_completion_delay(val: &Duration) -> garde::Result {
    if val.as_millis() <= u128::from(MAX_COMPLETION_DELAY_MS) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "completion_delay is outside of the bounds [0,{MAX_COMPLETION_DELAY_MS}]"
        )))
    }
}

/// Timing and layout settings for the overlay
///
/// The display-speed multiplier makes ads and their countdown run faster than
/// real time: with a multiplier of 10 a 60 second quiz budget physically
/// elapses in 6 seconds.
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    /// Factor applied to the playback rate of ad sources
    #[garde(range(min = MIN_MULTIPLIER, max = MAX_MULTIPLIER))]
    pub display_speed_multiplier: u32,
    /// Explicit real time between two countdown ticks
    ///
    /// When absent the interval follows the multiplier, `1000 / multiplier`
    /// milliseconds, so the countdown keeps pace with the ad. Setting it
    /// decouples the two.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[garde(range(min = MIN_TICK_INTERVAL_MS, max = MAX_TICK_INTERVAL_MS))]
    pub tick_interval_ms: Option<u64>,
    /// Panel height while a quiz is waiting for an answer
    #[garde(range(max = MAX_PANEL_HEIGHT))]
    pub default_panel_height: u32,
    /// Panel height once the quiz was answered correctly
    #[garde(range(max = MAX_PANEL_HEIGHT))]
    pub success_panel_height: u32,
    /// Panel height once the quiz was failed
    #[garde(range(max = MAX_PANEL_HEIGHT))]
    pub failure_panel_height: u32,
    /// Delay between a correct answer and the quiz completing, letting the
    /// success animation play
    #[garde(custom(|v, _| validate_completion_delay(v)))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub completion_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_multiplier(10)
    }
}

impl Settings {
    /// Creates the stock settings for a given display-speed multiplier
    ///
    /// The tick interval follows the multiplier.
    pub fn with_multiplier(display_speed_multiplier: u32) -> Self {
        let multiplier = display_speed_multiplier.max(1);
        Self {
            display_speed_multiplier: multiplier,
            tick_interval_ms: None,
            default_panel_height: 200,
            success_panel_height: 70,
            failure_panel_height: 80,
            completion_delay: Duration::from_millis(400),
        }
    }

    /// Parses settings from JSON and validates them
    ///
    /// Missing fields fall back to the defaults; a missing tick interval
    /// follows the loaded multiplier.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if the document cannot be parsed and
    /// `Error::Invalid` if a value is out of bounds.
    pub fn from_json(s: &str) -> Result<Self, Error> {
        let settings: Self = serde_json::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Real time between two countdown ticks
    pub fn tick_interval(&self) -> Duration {
        let ms = self
            .tick_interval_ms
            .unwrap_or_else(|| 1000 / u64::from(self.display_speed_multiplier.max(1)));
        Duration::from_millis(ms)
    }

    /// Playback rate applied to ad sources
    pub fn ad_playback_rate(&self) -> f64 {
        f64::from(self.display_speed_multiplier)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.display_speed_multiplier, 10);
        assert_eq!(settings.tick_interval(), Duration::from_millis(100));
        assert_eq!(settings.default_panel_height, 200);
        assert_eq!(settings.success_panel_height, 70);
        assert_eq!(settings.failure_panel_height, 80);
        assert_eq!(settings.completion_delay, Duration::from_millis(400));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_with_multiplier_derives_tick_interval() {
        assert_eq!(
            Settings::with_multiplier(5).tick_interval(),
            Duration::from_millis(200)
        );
        assert_eq!(
            Settings::with_multiplier(1).tick_interval(),
            Duration::from_millis(1000)
        );
        assert_eq!(Settings::with_multiplier(0).display_speed_multiplier, 1);
    }

    #[test]
    fn test_from_json_partial() {
        let settings =
            Settings::from_json(r#"{"display_speed_multiplier": 5, "completion_delay": 600}"#)
                .unwrap();

        assert_eq!(settings.display_speed_multiplier, 5);
        assert_eq!(settings.tick_interval(), Duration::from_millis(200));
        assert!((settings.ad_playback_rate() - 5.).abs() < f64::EPSILON);
        assert_eq!(settings.completion_delay, Duration::from_millis(600));
        assert_eq!(settings.default_panel_height, 200);
    }

    #[test]
    fn test_tick_interval_follows_loaded_multiplier() {
        for multiplier in [1u32, 2, 4, 5, 8, 16] {
            let settings = Settings::from_json(&format!(
                r#"{{"display_speed_multiplier": {multiplier}}}"#
            ))
            .unwrap();

            assert_eq!(
                settings.tick_interval(),
                Duration::from_millis(1000 / u64::from(multiplier)),
                "multiplier {multiplier}"
            );
        }
    }

    #[test]
    fn test_explicit_tick_interval_overrides_multiplier() {
        let settings =
            Settings::from_json(r#"{"display_speed_multiplier": 1, "tick_interval_ms": 10}"#)
                .unwrap();

        assert_eq!(settings.tick_interval(), Duration::from_millis(10));
        assert!((settings.ad_playback_rate() - 1.).abs() < f64::EPSILON);

        let result = Settings::from_json(r#"{"tick_interval_ms": 5}"#);
        assert!(matches!(result, Err(Error::Invalid(_))));
    }

    #[test]
    fn test_from_json_out_of_bounds() {
        let result = Settings::from_json(r#"{"display_speed_multiplier": 100}"#);
        assert!(matches!(result, Err(Error::Invalid(_))));

        let result = Settings::from_json(r#"{"completion_delay": 60000}"#);
        assert!(matches!(result, Err(Error::Invalid(_))));
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(Settings::from_json("{"), Err(Error::Json(_))));
    }

    #[test]
    fn test_settings_serialization() {
        let json = serde_json::to_string(&Settings::default()).unwrap();

        assert!(json.contains("\"completion_delay\":400"));
        assert!(!json.contains("tick_interval_ms"));
    }
}
