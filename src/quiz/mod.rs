//! Quiz overlay
//!
//! A quiz is a single question with a handful of keyed answer options, one of
//! which is correct. The `config` module holds the immutable, validated quiz
//! description carried by a playlist entry; the `state` module holds the
//! runtime state machine that accepts one answer and runs the countdown.

pub mod config;
pub mod state;

pub use config::{AnswerOption, Config};
pub use state::{AlarmMessage, Error, Outcome, Phase, Signal, State, UpdateMessage};
