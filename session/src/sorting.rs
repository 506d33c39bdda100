//! Ascending number-sort state machine.
//!
//! Boards arrive from the generator in shuffled presentation order. Picks
//! must follow ascending numeric order; out-of-order picks accumulate
//! mistakes until the round fails, and cleared boards grow by one entry.

use std::time::Duration;

use mindspan_core::{
    Event, Level, Phase, PickError, SequenceError, SequencePayload, SequenceSpec, SessionOutcome,
    SortRules, Trial,
};

use crate::{FeedbackState, Progress, Resolution};

#[derive(Debug)]
pub(crate) struct SortMachine {
    rules: SortRules,
    count: Level,
    board: Vec<u32>,
    pending: Vec<u32>,
    mistakes: u32,
    session_failures: u32,
    feedback: Option<FeedbackState>,
}

impl SortMachine {
    pub(crate) fn new(rules: SortRules) -> Self {
        let count = rules.min_count();
        Self {
            rules,
            count,
            board: Vec::new(),
            pending: Vec::new(),
            mistakes: 0,
            session_failures: 0,
            feedback: None,
        }
    }

    pub(crate) fn start(&mut self, progress: &mut Progress, out_events: &mut Vec<Event>) {
        if !matches!(progress.phase, Phase::Idle) {
            return;
        }
        self.request_board(progress, out_events);
    }

    const fn spec(&self) -> SequenceSpec {
        SequenceSpec::DistinctNumbers {
            count: self.count,
            min: self.rules.number_min(),
            max: self.rules.number_max(),
        }
    }

    fn request_board(&mut self, progress: &mut Progress, out_events: &mut Vec<Event>) {
        self.board.clear();
        self.pending.clear();
        self.mistakes = 0;
        self.feedback = None;
        progress.set_phase(Phase::AwaitingSequence, out_events);
        out_events.push(Event::SequenceNeeded { spec: self.spec() });
    }

    fn reject_board(&self, reason: SequenceError, out_events: &mut Vec<Event>) {
        out_events.push(Event::SequenceRejected { reason });
        out_events.push(Event::SequenceNeeded { spec: self.spec() });
    }

    pub(crate) fn provide_board(
        &mut self,
        progress: &mut Progress,
        payload: SequencePayload,
        out_events: &mut Vec<Event>,
    ) {
        if !matches!(progress.phase, Phase::AwaitingSequence) {
            out_events.push(Event::SequenceRejected {
                reason: SequenceError::WrongPhase,
            });
            return;
        }

        let numbers = match payload {
            SequencePayload::Numbers(numbers) => numbers,
            SequencePayload::Digits(_) => {
                self.reject_board(SequenceError::PayloadMismatch, out_events);
                return;
            }
        };

        let expected = self.count.get() as usize;
        if numbers.len() != expected {
            self.reject_board(
                SequenceError::LengthMismatch {
                    expected,
                    actual: numbers.len(),
                },
                out_events,
            );
            return;
        }

        if let Some(number) = numbers
            .iter()
            .copied()
            .find(|number| *number < self.rules.number_min() || *number > self.rules.number_max())
        {
            self.reject_board(SequenceError::NumberOutOfRange { number }, out_events);
            return;
        }

        let mut sorted = numbers.clone();
        sorted.sort_unstable();
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
            self.reject_board(
                SequenceError::DuplicateNumber { number: pair[0] },
                out_events,
            );
            return;
        }

        self.pending = sorted;
        self.board = numbers;
        progress.set_phase(Phase::AwaitingInput, out_events);
        out_events.push(Event::RoundStarted {
            level: self.count,
            trial: Trial::First,
        });
        out_events.push(Event::BoardPresented {
            numbers: self.board.clone(),
        });
    }

    pub(crate) fn pick_number(
        &mut self,
        progress: &mut Progress,
        number: u32,
        out_events: &mut Vec<Event>,
    ) {
        if !matches!(progress.phase, Phase::AwaitingInput) {
            out_events.push(Event::NumberRejected {
                number,
                reason: PickError::WrongPhase,
            });
            return;
        }
        if !self.board.contains(&number) {
            out_events.push(Event::NumberRejected {
                number,
                reason: PickError::UnknownNumber,
            });
            return;
        }
        if !self.pending.contains(&number) {
            out_events.push(Event::NumberRejected {
                number,
                reason: PickError::AlreadyPicked,
            });
            return;
        }
        if self.pending.first() != Some(&number) {
            out_events.push(Event::NumberRejected {
                number,
                reason: PickError::OutOfOrder,
            });
            self.mistakes = self.mistakes.saturating_add(1);
            if self.mistakes >= self.rules.mistake_limit() {
                self.fail_round(progress, out_events);
            }
            return;
        }

        let _ = self.pending.remove(0);
        out_events.push(Event::NumberAccepted {
            number,
            remaining: self.pending.len(),
        });
        if self.pending.is_empty() {
            self.clear_round(progress, out_events);
        }
    }

    fn fail_round(&mut self, progress: &mut Progress, out_events: &mut Vec<Event>) {
        self.session_failures = self.session_failures.saturating_add(1);
        out_events.push(Event::RoundEvaluated {
            level: self.count,
            trial: Trial::First,
            correct: false,
        });
        let resolution = if self.session_failures >= self.rules.session_failure_limit() {
            Resolution::Finish {
                outcome: SessionOutcome::Lost,
            }
        } else {
            Resolution::NextRound {
                trial: Trial::First,
            }
        };
        self.feedback = Some(FeedbackState::new(self.rules.feedback().dwell(), resolution));
        progress.set_phase(Phase::Feedback, out_events);
    }

    fn clear_round(&mut self, progress: &mut Progress, out_events: &mut Vec<Event>) {
        progress.add_points(self.rules.scoring().award(self.count, Trial::First, true));
        out_events.push(Event::RoundEvaluated {
            level: self.count,
            trial: Trial::First,
            correct: true,
        });
        let resolution = if self.count >= self.rules.max_count() {
            Resolution::Finish {
                outcome: SessionOutcome::Won,
            }
        } else {
            Resolution::Advance {
                level: self.count.successor(),
            }
        };
        self.feedback = Some(FeedbackState::new(self.rules.feedback().dwell(), resolution));
        progress.set_phase(Phase::Feedback, out_events);
    }

    pub(crate) fn tick(
        &mut self,
        progress: &mut Progress,
        dt: Duration,
        out_events: &mut Vec<Event>,
    ) {
        let mut budget = dt;
        while !budget.is_zero() && matches!(progress.phase, Phase::Feedback) {
            let resolution = {
                let Some(feedback) = self.feedback.as_mut() else {
                    return;
                };
                match feedback.drain(&mut budget) {
                    Some(resolution) => resolution,
                    None => return,
                }
            };
            self.feedback = None;
            self.apply_resolution(resolution, progress, out_events);
        }
    }

    fn apply_resolution(
        &mut self,
        resolution: Resolution,
        progress: &mut Progress,
        out_events: &mut Vec<Event>,
    ) {
        match resolution {
            Resolution::NextRound { trial: _ } => self.request_board(progress, out_events),
            Resolution::Advance { level } => {
                self.count = level;
                out_events.push(Event::LevelAdvanced { level });
                self.request_board(progress, out_events);
            }
            Resolution::Finish { outcome } => progress.finish(outcome, self.count, out_events),
        }
    }

    pub(crate) fn abandon(&mut self, progress: &mut Progress, out_events: &mut Vec<Event>) {
        self.feedback = None;
        progress.abandon(out_events);
    }

    pub(crate) const fn count(&self) -> Level {
        self.count
    }

    pub(crate) const fn failure_count(&self) -> u32 {
        self.session_failures
    }

    pub(crate) fn numbers(&self) -> &[u32] {
        &self.board
    }

    pub(crate) fn is_picked(&self, number: u32) -> bool {
        self.board.contains(&number) && !self.pending.contains(&number)
    }
}
