//! Quiz configuration
//!
//! This module defines the immutable description of a quiz as it is loaded
//! from a playlist: the prompt, the two outcome templates and the keyed
//! answer options. Validation guarantees that exactly one option is correct.

use std::collections::BTreeMap;

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::constants::quiz::{
    LABEL_PLACEHOLDER, MAX_LABEL_LENGTH, MAX_OPTION_COUNT, MAX_PROMPT_LENGTH, MIN_OPTION_COUNT,
};

type ValidationResult = garde::Result;

/// Validates that exactly one option is marked correct
fn validate_single_correct(options: &BTreeMap<String, AnswerOption>) -> ValidationResult {
    match options.values().filter(|option| option.correct).count() {
        1 => Ok(()),
        count => Err(garde::Error::new(format!(
            "exactly one option must be correct, found {count}"
        ))),
    }
}

/// Validates option keys and the single correct option
fn validate_options(options: &BTreeMap<String, AnswerOption>) -> ValidationResult {
    if options.keys().any(|key| key.trim().is_empty()) {
        return Err(garde::Error::new("option keys cannot be empty"));
    }

    validate_single_correct(options)
}

/// A single answer option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AnswerOption {
    /// Text shown on the option and substituted into the outcome templates
    #[garde(length(min = 1, max = MAX_LABEL_LENGTH))]
    pub label: String,
    /// Whether this option is the correct answer
    #[serde(default)]
    #[garde(skip)]
    pub correct: bool,
}

/// The description of a quiz embedded in a playlist entry
///
/// Outcome templates may contain `$data`, which is replaced with the label
/// of the selected option once the viewer answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Config {
    /// The question shown before an answer is selected
    #[garde(length(min = 1, max = MAX_PROMPT_LENGTH))]
    pub prompt: String,
    /// Prompt shown after a correct answer
    #[garde(length(max = MAX_PROMPT_LENGTH))]
    pub success_template: String,
    /// Prompt shown after a wrong answer
    #[garde(length(max = MAX_PROMPT_LENGTH))]
    pub failure_template: String,
    /// Answer options keyed by a unique option key
    #[garde(
        length(min = MIN_OPTION_COUNT, max = MAX_OPTION_COUNT),
        custom(|v, _| validate_options(v)),
        dive
    )]
    pub options: BTreeMap<String, AnswerOption>,
}

impl Config {
    /// Looks up an option by key
    pub fn option(&self, key: &str) -> Option<&AnswerOption> {
        self.options.get(key)
    }

    /// Key of the correct option, if the quiz has exactly one
    pub fn correct_key(&self) -> Option<&str> {
        self.options
            .iter()
            .filter(|(_, option)| option.correct)
            .exactly_one()
            .ok()
            .map(|(key, _)| key.as_str())
    }

    /// Builds the prompt displayed once `option` has been selected
    ///
    /// Only the first `$data` is replaced; later occurrences stay verbatim.
    pub fn outcome_prompt(&self, option: &AnswerOption) -> String {
        let template = if option.correct {
            &self.success_template
        } else {
            &self.failure_template
        };

        template.replacen(LABEL_PLACEHOLDER, &option.label, 1)
    }
}
