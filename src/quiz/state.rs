//! Quiz runtime state machine
//!
//! Once activated, a quiz accepts at most one answer and runs a countdown
//! bound to its time budget. A correct answer stops the countdown and, after
//! a short presentation delay, completes the quiz. A wrong answer keeps the
//! quiz on screen until the countdown runs out, which completes it as failed.
//!
//! The state machine never renders anything. It reports what happened
//! through [`Signal`]s handed to an emitter function, and schedules its
//! delays through the same scheduling function the countdown uses.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;
use web_time::Duration;

use crate::{
    config::Settings,
    constants::settings::COLLAPSED_PANEL_HEIGHT,
    counter::{self, Counter},
    id::Id,
};

use super::config::Config;

/// Phase of the quiz as seen by the viewer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for an answer
    #[default]
    Unanswered,
    /// Answered correctly; the success animation is playing
    Succeeded,
    /// Answered wrongly; waiting for the countdown to run out
    Failed,
    /// Completed after a correct answer
    Revealed,
    /// Completed because the countdown ran out
    TimedOut,
}

impl Phase {
    /// Whether the quiz has completed and will not change again
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Revealed | Self::TimedOut)
    }
}

/// How a quiz completed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The viewer picked the correct option
    Succeeded,
    /// The countdown ran out without a correct answer
    FailedByTimeout,
}

/// Errors returned by the quiz state machine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The selected key is not one of the quiz options
    #[error("no option with key `{0}`")]
    InvalidSelection(String),
}

/// Alarm messages scheduled by the quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// The presentation delay after a correct answer has elapsed
    Reveal {
        /// The pending completion this alarm belongs to
        id: Id,
    },
}

/// Signals emitted to whoever drives the quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The countdown moved; carries the remaining display seconds
    Tick {
        /// Remaining display seconds
        remaining: u64,
    },
    /// The viewer selected a valid option
    Answered {
        /// Whether the option was the correct one
        correct: bool,
    },
    /// The quiz completed
    Completed(Outcome),
    /// The quiz was dismissed
    Dismissed {
        /// Height the quiz panel should collapse to
        panel_height: u32,
    },
}

/// An answer option as shown to the viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    /// Option key to send back when the viewer selects it
    pub key: String,
    /// Label displayed on the option
    pub label: String,
}

/// Presentation updates describing the quiz
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UpdateMessage {
    /// A quiz became active
    QuizAnnouncement {
        /// The question
        prompt: String,
        /// Selectable options, in key order
        options: Vec<OptionView>,
        /// Display seconds on the countdown
        remaining: u64,
    },
    /// The countdown moved
    Countdown {
        /// Display seconds left
        remaining: u64,
    },
    /// The viewer answered
    Answered {
        /// Key of the selected option
        selected: String,
        /// Whether the selection was correct
        correct: bool,
        /// Outcome prompt with the selected label substituted
        prompt: String,
    },
    /// The quiz completed
    Completed {
        /// How the quiz completed
        outcome: Outcome,
    },
}

/// Runtime state of an active quiz
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    config: Config,
    selected: Option<String>,
    phase: Phase,
    displayed_prompt: String,
    counter: Counter,
    pending_reveal: Option<Id>,
    completion_delay: Duration,
}

impl State {
    /// Activates a quiz and starts its countdown
    ///
    /// # Arguments
    ///
    /// * `config` - The quiz to present
    /// * `time_budget_seconds` - Display seconds the viewer has to answer
    /// * `settings` - Overlay settings providing the tick interval and the
    ///   completion delay
    /// * `schedule_message` - Function to schedule the countdown ticks
    pub fn activate<S: FnMut(crate::AlarmMessage, Duration)>(
        config: Config,
        time_budget_seconds: u64,
        settings: &Settings,
        schedule_message: S,
    ) -> Self {
        let counter = Counter::start(
            time_budget_seconds,
            settings.tick_interval(),
            schedule_message,
        );

        tracing::debug!(
            prompt = %config.prompt,
            budget = time_budget_seconds,
            "quiz activated"
        );

        Self {
            displayed_prompt: config.prompt.clone(),
            config,
            selected: None,
            phase: Phase::Unanswered,
            counter,
            pending_reveal: None,
            completion_delay: settings.completion_delay,
        }
    }

    /// Records the viewer's answer
    ///
    /// Only the first valid selection counts: later calls, and calls after
    /// the quiz completed, leave the state untouched and emit nothing.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidSelection` if `key` is not an option of this
    /// quiz. The state is left unchanged.
    pub fn select_option<S: FnMut(crate::AlarmMessage, Duration), E: FnMut(Signal)>(
        &mut self,
        key: &str,
        mut schedule_message: S,
        mut emit: E,
    ) -> Result<(), Error> {
        if self.selected.is_some() || self.phase.is_terminal() {
            tracing::debug!(key, "ignoring selection on an answered quiz");
            return Ok(());
        }

        let Some(option) = self.config.option(key) else {
            tracing::warn!(key, "selected option does not exist");
            return Err(Error::InvalidSelection(key.to_string()));
        };

        let correct = option.correct;
        self.displayed_prompt = self.config.outcome_prompt(option);
        self.selected = Some(key.to_string());
        self.phase = if correct {
            Phase::Succeeded
        } else {
            Phase::Failed
        };

        tracing::info!(key, correct, "quiz answered");
        emit(Signal::Answered { correct });

        if correct {
            self.counter.stop();

            if self.completion_delay.is_zero() {
                self.reveal(&mut emit);
            } else {
                let id = Id::new();
                self.pending_reveal = Some(id);
                schedule_message(AlarmMessage::Reveal { id }.into(), self.completion_delay);
            }
        }

        Ok(())
    }

    /// Handles a scheduled alarm addressed to this quiz
    ///
    /// Countdown ticks are forwarded to the counter; its expiry completes an
    /// unfinished quiz as timed out. Stale alarms are dropped.
    pub fn receive_alarm<S: FnMut(crate::AlarmMessage, Duration), E: FnMut(Signal)>(
        &mut self,
        message: &crate::AlarmMessage,
        schedule_message: S,
        mut emit: E,
    ) {
        match message {
            crate::AlarmMessage::Counter(tick) => {
                match self.counter.receive_alarm(tick, schedule_message) {
                    Some(counter::Event::Tick(remaining)) => emit(Signal::Tick { remaining }),
                    Some(counter::Event::Expired) => {
                        if matches!(self.phase, Phase::Unanswered | Phase::Failed) {
                            self.phase = Phase::TimedOut;
                            tracing::info!("quiz timed out");
                            emit(Signal::Completed(Outcome::FailedByTimeout));
                        }
                    }
                    None => (),
                }
            }
            crate::AlarmMessage::Quiz(AlarmMessage::Reveal { id }) => {
                if self.pending_reveal == Some(*id) {
                    self.reveal(&mut emit);
                } else {
                    tracing::trace!(reveal = %id, "dropping stale quiz completion");
                }
            }
        }
    }

    /// Dismisses the quiz
    ///
    /// Stops the countdown, cancels a pending completion and emits the
    /// collapsed panel height. The runtime state is consumed.
    pub fn dismiss<E: FnMut(Signal)>(mut self, mut emit: E) {
        self.counter.stop();
        self.pending_reveal = None;

        tracing::debug!(phase = ?self.phase, "quiz dismissed");
        emit(Signal::Dismissed {
            panel_height: COLLAPSED_PANEL_HEIGHT,
        });
    }

    fn reveal<E: FnMut(Signal)>(&mut self, emit: &mut E) {
        if self.phase == Phase::Succeeded {
            self.pending_reveal = None;
            self.phase = Phase::Revealed;
            emit(Signal::Completed(Outcome::Succeeded));
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Key of the selected option, if any
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Prompt to display: the question, or the outcome once answered
    pub fn displayed_prompt(&self) -> &str {
        &self.displayed_prompt
    }

    /// Display seconds left on the countdown
    pub fn remaining_seconds(&self) -> u64 {
        self.counter.remaining()
    }

    /// Whether the countdown is still ticking
    pub fn is_counting(&self) -> bool {
        self.counter.is_running()
    }

    /// The quiz being presented
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Options as shown to the viewer, in key order
    pub fn options(&self) -> Vec<OptionView> {
        self.config
            .options
            .iter()
            .map(|(key, option)| OptionView {
                key: key.clone(),
                label: option.label.clone(),
            })
            .collect()
    }

    /// Message announcing this quiz to the presentation layer
    pub fn announcement(&self) -> UpdateMessage {
        UpdateMessage::QuizAnnouncement {
            prompt: self.displayed_prompt.clone(),
            options: self.options(),
            remaining: self.remaining_seconds(),
        }
    }

    /// Presentation update describing a signal, if it has one
    pub fn update_for(&self, signal: Signal) -> Option<UpdateMessage> {
        match signal {
            Signal::Tick { remaining } => Some(UpdateMessage::Countdown { remaining }),
            Signal::Answered { correct } => Some(UpdateMessage::Answered {
                selected: self.selected.clone().unwrap_or_default(),
                correct,
                prompt: self.displayed_prompt.clone(),
            }),
            Signal::Completed(outcome) => Some(UpdateMessage::Completed { outcome }),
            Signal::Dismissed { .. } => None,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::quiz::config::tests::create_test_quiz;

    /// Records scheduled alarms and emitted signals
    #[derive(Default)]
    struct Recorder {
        alarms: Vec<(crate::AlarmMessage, Duration)>,
        signals: Vec<Signal>,
    }

    impl Recorder {
        fn take_alarms(&mut self) -> Vec<crate::AlarmMessage> {
            self.alarms.drain(..).map(|(alarm, _)| alarm).collect()
        }
    }

    fn activate(budget: u64, settings: &Settings, recorder: &mut Recorder) -> State {
        State::activate(create_test_quiz(), budget, settings, |msg, duration| {
            recorder.alarms.push((msg, duration));
        })
    }

    fn select(state: &mut State, key: &str, recorder: &mut Recorder) -> Result<(), Error> {
        let Recorder { alarms, signals } = recorder;
        state.select_option(
            key,
            |msg, duration| alarms.push((msg, duration)),
            |signal| signals.push(signal),
        )
    }

    fn deliver(state: &mut State, alarm: &crate::AlarmMessage, recorder: &mut Recorder) {
        let Recorder { alarms, signals } = recorder;
        state.receive_alarm(
            alarm,
            |msg, duration| alarms.push((msg, duration)),
            |signal| signals.push(signal),
        );
    }

    /// Delivers alarms until none are pending
    fn drain(state: &mut State, recorder: &mut Recorder) {
        loop {
            let pending = recorder.take_alarms();
            if pending.is_empty() {
                break;
            }
            for alarm in pending {
                deliver(state, &alarm, recorder);
            }
        }
    }

    #[test]
    fn test_activate_resets_state() {
        let mut recorder = Recorder::default();
        let state = activate(60, &Settings::default(), &mut recorder);

        assert_eq!(state.phase(), Phase::Unanswered);
        assert_eq!(state.selected(), None);
        assert_eq!(state.remaining_seconds(), 60);
        assert_eq!(state.displayed_prompt(), create_test_quiz().prompt);
        assert!(state.is_counting());
        assert_eq!(recorder.alarms.len(), 1);
        assert_eq!(recorder.alarms[0].1, Duration::from_millis(100));
    }

    #[test]
    fn test_select_correct_option() {
        let mut recorder = Recorder::default();
        let mut state = activate(60, &Settings::default(), &mut recorder);
        recorder.take_alarms();

        select(&mut state, "a", &mut recorder).unwrap();

        assert_eq!(state.phase(), Phase::Succeeded);
        assert_eq!(state.selected(), Some("a"));
        assert_eq!(
            state.displayed_prompt(),
            "Bien joué la Renault Zoé est bien à \"1 999 €\""
        );
        assert!(!state.is_counting());
        assert_eq!(recorder.signals, vec![Signal::Answered { correct: true }]);
        assert_eq!(recorder.alarms.len(), 1);
        assert_eq!(recorder.alarms[0].1, Duration::from_millis(400));
    }

    #[test]
    fn test_select_wrong_option_keeps_counting() {
        let mut recorder = Recorder::default();
        let mut state = activate(60, &Settings::default(), &mut recorder);
        recorder.take_alarms();

        select(&mut state, "b", &mut recorder).unwrap();

        assert_eq!(state.phase(), Phase::Failed);
        assert!(state.is_counting());
        assert_eq!(
            state.displayed_prompt(),
            "Et non la Renault Zoé n'est pas à \"2 500 €\""
        );
        assert_eq!(recorder.signals, vec![Signal::Answered { correct: false }]);
        assert!(recorder.alarms.is_empty());
    }

    #[test]
    fn test_every_wrong_key_fails() {
        for key in ["b", "c", "d"] {
            let mut recorder = Recorder::default();
            let mut state = activate(60, &Settings::default(), &mut recorder);

            select(&mut state, key, &mut recorder).unwrap();

            assert_eq!(state.phase(), Phase::Failed, "key {key}");
        }
    }

    #[test]
    fn test_second_selection_is_ignored() {
        let mut recorder = Recorder::default();
        let mut state = activate(60, &Settings::default(), &mut recorder);

        select(&mut state, "b", &mut recorder).unwrap();
        let prompt = state.displayed_prompt().to_string();
        select(&mut state, "a", &mut recorder).unwrap();

        assert_eq!(state.selected(), Some("b"));
        assert_eq!(state.phase(), Phase::Failed);
        assert_eq!(state.displayed_prompt(), prompt);
        assert_eq!(recorder.signals, vec![Signal::Answered { correct: false }]);
    }

    #[test]
    fn test_invalid_selection_leaves_state_unchanged() {
        let mut recorder = Recorder::default();
        let mut state = activate(60, &Settings::default(), &mut recorder);

        let result = select(&mut state, "z", &mut recorder);

        assert_eq!(result, Err(Error::InvalidSelection("z".to_string())));
        assert_eq!(state.phase(), Phase::Unanswered);
        assert_eq!(state.selected(), None);
        assert!(recorder.signals.is_empty());

        select(&mut state, "a", &mut recorder).unwrap();
        assert_eq!(state.phase(), Phase::Succeeded);
    }

    #[test]
    fn test_correct_answer_completes_after_delay() {
        let mut recorder = Recorder::default();
        let mut state = activate(60, &Settings::default(), &mut recorder);
        let first_tick = recorder.take_alarms();

        // three ticks before answering
        let mut pending = first_tick;
        for _ in 0..3 {
            let alarm = pending.pop().unwrap();
            deliver(&mut state, &alarm, &mut recorder);
            pending = recorder.take_alarms();
        }
        assert_eq!(state.remaining_seconds(), 57);

        select(&mut state, "a", &mut recorder).unwrap();
        let reveal = recorder.take_alarms();

        // the tick scheduled before the answer is dropped
        recorder.signals.clear();
        deliver(&mut state, &pending[0], &mut recorder);
        assert!(recorder.signals.is_empty());
        assert!(recorder.alarms.is_empty());
        assert_eq!(state.remaining_seconds(), 57);

        deliver(&mut state, &reveal[0], &mut recorder);
        assert_eq!(state.phase(), Phase::Revealed);
        assert_eq!(
            recorder.signals,
            vec![Signal::Completed(Outcome::Succeeded)]
        );
    }

    #[test]
    fn test_zero_delay_completes_immediately() {
        let settings = Settings {
            completion_delay: Duration::ZERO,
            ..Settings::default()
        };
        let mut recorder = Recorder::default();
        let mut state = activate(60, &settings, &mut recorder);
        recorder.take_alarms();

        select(&mut state, "a", &mut recorder).unwrap();

        assert_eq!(state.phase(), Phase::Revealed);
        assert_eq!(
            recorder.signals,
            vec![
                Signal::Answered { correct: true },
                Signal::Completed(Outcome::Succeeded),
            ]
        );
        assert!(recorder.alarms.is_empty());
    }

    #[test]
    fn test_unanswered_quiz_times_out() {
        let mut recorder = Recorder::default();
        let mut state = activate(3, &Settings::default(), &mut recorder);

        drain(&mut state, &mut recorder);

        assert_eq!(state.phase(), Phase::TimedOut);
        assert_eq!(
            recorder.signals,
            vec![
                Signal::Tick { remaining: 2 },
                Signal::Tick { remaining: 1 },
                Signal::Tick { remaining: 0 },
                Signal::Completed(Outcome::FailedByTimeout),
            ]
        );
    }

    #[test]
    fn test_wrong_answer_completes_on_timeout() {
        let mut recorder = Recorder::default();
        let mut state = activate(2, &Settings::default(), &mut recorder);

        select(&mut state, "c", &mut recorder).unwrap();
        drain(&mut state, &mut recorder);

        assert_eq!(state.phase(), Phase::TimedOut);
        assert_eq!(state.selected(), Some("c"));
        assert_eq!(
            recorder.signals.last(),
            Some(&Signal::Completed(Outcome::FailedByTimeout))
        );
    }

    #[test]
    fn test_selection_after_timeout_is_ignored() {
        let mut recorder = Recorder::default();
        let mut state = activate(0, &Settings::default(), &mut recorder);
        drain(&mut state, &mut recorder);
        recorder.signals.clear();

        select(&mut state, "a", &mut recorder).unwrap();

        assert_eq!(state.phase(), Phase::TimedOut);
        assert_eq!(state.selected(), None);
        assert!(recorder.signals.is_empty());
    }

    #[test]
    fn test_dismiss_emits_collapsed_height() {
        let mut recorder = Recorder::default();
        let state = activate(60, &Settings::default(), &mut recorder);

        state.dismiss(|signal| recorder.signals.push(signal));

        assert_eq!(
            recorder.signals,
            vec![Signal::Dismissed {
                panel_height: COLLAPSED_PANEL_HEIGHT
            }]
        );
    }

    #[test]
    fn test_stale_reveal_is_dropped() {
        let mut recorder = Recorder::default();
        let mut state = activate(60, &Settings::default(), &mut recorder);
        recorder.take_alarms();
        select(&mut state, "a", &mut recorder).unwrap();
        recorder.take_alarms();
        recorder.signals.clear();

        let stale = crate::AlarmMessage::Quiz(AlarmMessage::Reveal { id: Id::new() });
        deliver(&mut state, &stale, &mut recorder);

        assert_eq!(state.phase(), Phase::Succeeded);
        assert!(recorder.signals.is_empty());
    }

    #[test]
    fn test_options_in_key_order() {
        let mut recorder = Recorder::default();
        let state = activate(60, &Settings::default(), &mut recorder);

        let keys: Vec<_> = state.options().into_iter().map(|o| o.key).collect();

        assert_eq!(keys, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_update_for_answer() {
        let mut recorder = Recorder::default();
        let mut state = activate(60, &Settings::default(), &mut recorder);
        select(&mut state, "d", &mut recorder).unwrap();

        let update = state.update_for(Signal::Answered { correct: false });

        assert_eq!(
            update,
            Some(UpdateMessage::Answered {
                selected: "d".to_string(),
                correct: false,
                prompt: "Et non la Renault Zoé n'est pas à \"4 000 €\"".to_string(),
            })
        );
        assert_eq!(
            state.update_for(Signal::Dismissed { panel_height: 0 }),
            None
        );
    }

    #[test]
    fn test_announcement_serialization() {
        let mut recorder = Recorder::default();
        let state = activate(60, &Settings::default(), &mut recorder);

        let json = serde_json::to_string(&state.announcement()).unwrap();

        assert!(json.contains("QuizAnnouncement"));
        assert!(json.contains("1 999 €"));
        assert!(json.contains("\"remaining\":60"));
    }
}
