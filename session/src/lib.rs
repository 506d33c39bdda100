#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for the MindSpan engine.
//!
//! A [`Session`] owns one complete game attempt from start to termination.
//! It is mutated exclusively through [`apply`], which executes a single
//! [`Command`] and records the resulting [`Event`] values in order. All
//! waiting (digit reveal pacing, feedback dwell, the fluency window) is
//! modelled as duration accumulators drained by `Command::Tick`, so replaying
//! the same command stream always yields the same event stream.

mod fluency;
mod sorting;

use std::time::Duration;

use mindspan_core::{
    evaluate, Command, Digit, Event, FailureAccounting, GameKind, GamePlan, InputError, Level,
    Phase, PickError, Score, SequenceError, SequencePayload, SequenceSpec, SessionOutcome,
    SessionSummary, SpanRules, Trial, TrialPolicy, WordError, WELCOME_BANNER,
};

use crate::{fluency::FluencyMachine, sorting::SortMachine};

/// Represents the authoritative state of one MindSpan game attempt.
#[derive(Debug)]
pub struct Session {
    banner: &'static str,
    progress: Progress,
    machine: Machine,
}

impl Session {
    /// Creates a new session configured by the provided plan.
    ///
    /// The session stays in [`Phase::Idle`] until `Command::Start` arrives.
    #[must_use]
    pub fn new(plan: GamePlan) -> Self {
        let game = plan.kind();
        let machine = match plan {
            GamePlan::Span(rules) => Machine::Span(SpanMachine::new(rules)),
            GamePlan::Sort(rules) => Machine::Sort(SortMachine::new(rules)),
            GamePlan::Fluency(rules) => Machine::Fluency(FluencyMachine::new(rules)),
        };
        Self {
            banner: WELCOME_BANNER,
            progress: Progress::new(game),
            machine,
        }
    }
}

/// Cross-game session state shared by every machine.
#[derive(Debug)]
pub(crate) struct Progress {
    game: GameKind,
    phase: Phase,
    score: Score,
    elapsed: Duration,
    summary: Option<SessionSummary>,
}

impl Progress {
    fn new(game: GameKind) -> Self {
        Self {
            game,
            phase: Phase::Idle,
            score: Score::default(),
            elapsed: Duration::ZERO,
            summary: None,
        }
    }

    pub(crate) fn set_phase(&mut self, phase: Phase, out_events: &mut Vec<Event>) {
        self.phase = phase;
        out_events.push(Event::PhaseChanged { phase });
    }

    pub(crate) fn add_points(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    fn advance_clock(&mut self, dt: Duration) {
        if !matches!(self.phase, Phase::Idle | Phase::Complete) {
            self.elapsed = self.elapsed.saturating_add(dt);
        }
    }

    /// Terminates the session, publishing its summary exactly once.
    pub(crate) fn finish(
        &mut self,
        outcome: SessionOutcome,
        highest_level: Level,
        out_events: &mut Vec<Event>,
    ) {
        self.set_phase(Phase::Complete, out_events);
        let summary = SessionSummary {
            game: self.game,
            outcome,
            highest_level,
            score: self.score,
            elapsed: self.elapsed,
        };
        self.summary = Some(summary.clone());
        out_events.push(Event::SessionEnded { summary });
    }

    fn abandon(&mut self, out_events: &mut Vec<Event>) {
        if matches!(self.phase, Phase::Complete) {
            return;
        }
        self.set_phase(Phase::Complete, out_events);
        out_events.push(Event::SessionAbandoned);
    }
}

/// Outcome applied once the feedback dwell expires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// Runs another round at the current level.
    NextRound {
        /// Attempt number the next round runs as.
        trial: Trial,
    },
    /// Promotes the session to the provided level.
    Advance {
        /// Level the session is promoted to.
        level: Level,
    },
    /// Terminates the session.
    Finish {
        /// Terminal result.
        outcome: SessionOutcome,
    },
}

/// Feedback dwell countdown holding the pending resolution.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FeedbackState {
    remaining: Duration,
    resolution: Resolution,
}

impl FeedbackState {
    pub(crate) const fn new(remaining: Duration, resolution: Resolution) -> Self {
        Self {
            remaining,
            resolution,
        }
    }

    /// Consumes tick budget; yields the resolution once the dwell elapses.
    pub(crate) fn drain(&mut self, budget: &mut Duration) -> Option<Resolution> {
        if *budget < self.remaining {
            self.remaining -= *budget;
            *budget = Duration::ZERO;
            return None;
        }
        *budget = budget.saturating_sub(self.remaining);
        self.remaining = Duration::ZERO;
        Some(self.resolution)
    }
}

#[derive(Debug)]
enum Machine {
    Span(SpanMachine),
    Sort(SortMachine),
    Fluency(FluencyMachine),
}

/// Segments of the timed reveal applied to each digit in turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Segment {
    LeadIn,
    Visible,
    Trail,
}

/// Timed cursor walking the sequence one digit at a time.
#[derive(Debug)]
struct RevealSchedule {
    index: usize,
    segment: Segment,
    remaining: Duration,
}

/// Digit-span state machine covering the forward and reverse recall games.
#[derive(Debug)]
struct SpanMachine {
    rules: SpanRules,
    level: Level,
    trial: Trial,
    level_misses: u32,
    session_failures: u32,
    sequence: Vec<Digit>,
    input: Vec<Digit>,
    reveal: Option<RevealSchedule>,
    feedback: Option<FeedbackState>,
}

impl SpanMachine {
    fn new(rules: SpanRules) -> Self {
        let level = rules.min_level();
        Self {
            rules,
            level,
            trial: Trial::First,
            level_misses: 0,
            session_failures: 0,
            sequence: Vec::new(),
            input: Vec::new(),
            reveal: None,
            feedback: None,
        }
    }

    fn start(&mut self, progress: &mut Progress, out_events: &mut Vec<Event>) {
        if !matches!(progress.phase, Phase::Idle) {
            return;
        }
        self.request_sequence(progress, out_events);
    }

    const fn spec(&self) -> SequenceSpec {
        SequenceSpec::Digits {
            length: self.level,
            range: self.rules.digit_range(),
        }
    }

    fn expected_len(&self) -> usize {
        self.level.get() as usize
    }

    fn request_sequence(&mut self, progress: &mut Progress, out_events: &mut Vec<Event>) {
        self.sequence.clear();
        self.input.clear();
        self.reveal = None;
        self.feedback = None;
        progress.set_phase(Phase::AwaitingSequence, out_events);
        out_events.push(Event::SequenceNeeded { spec: self.spec() });
    }

    fn reject_sequence(&self, reason: SequenceError, out_events: &mut Vec<Event>) {
        out_events.push(Event::SequenceRejected { reason });
        out_events.push(Event::SequenceNeeded { spec: self.spec() });
    }

    fn provide_sequence(
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

        let digits = match payload {
            SequencePayload::Digits(digits) => digits,
            SequencePayload::Numbers(_) => {
                self.reject_sequence(SequenceError::PayloadMismatch, out_events);
                return;
            }
        };

        let expected = self.expected_len();
        if digits.len() != expected {
            self.reject_sequence(
                SequenceError::LengthMismatch {
                    expected,
                    actual: digits.len(),
                },
                out_events,
            );
            return;
        }

        let range = self.rules.digit_range();
        if let Some(digit) = digits.iter().copied().find(|digit| !range.contains(*digit)) {
            self.reject_sequence(SequenceError::DigitOutOfRange { digit }, out_events);
            return;
        }

        self.sequence = digits;
        progress.set_phase(Phase::Presenting, out_events);
        out_events.push(Event::RoundStarted {
            level: self.level,
            trial: self.trial,
        });
        self.reveal = Some(RevealSchedule {
            index: 0,
            segment: Segment::LeadIn,
            remaining: self.rules.presentation().lead_in(),
        });
    }

    fn tick(&mut self, progress: &mut Progress, dt: Duration, out_events: &mut Vec<Event>) {
        let mut budget = dt;
        loop {
            if budget.is_zero() {
                break;
            }
            match progress.phase {
                Phase::Presenting => {
                    if !self.drain_reveal(&mut budget, progress, out_events) {
                        break;
                    }
                }
                Phase::Feedback => {
                    if !self.drain_feedback(&mut budget, progress, out_events) {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    /// Walks the reveal schedule with the remaining tick budget.
    ///
    /// Returns `true` when the schedule completed and the phase moved on,
    /// leaving any unspent budget for the caller to redistribute.
    fn drain_reveal(
        &mut self,
        budget: &mut Duration,
        progress: &mut Progress,
        out_events: &mut Vec<Event>,
    ) -> bool {
        loop {
            let finished = {
                let Some(reveal) = self.reveal.as_mut() else {
                    return false;
                };
                if *budget < reveal.remaining {
                    reveal.remaining -= *budget;
                    *budget = Duration::ZERO;
                    return false;
                }
                *budget = budget.saturating_sub(reveal.remaining);
                match reveal.segment {
                    Segment::LeadIn => {
                        if let Some(digit) = self.sequence.get(reveal.index).copied() {
                            out_events.push(Event::DigitShown {
                                index: reveal.index,
                                digit,
                            });
                        }
                        reveal.segment = Segment::Visible;
                        reveal.remaining = self.rules.presentation().visible();
                        false
                    }
                    Segment::Visible => {
                        out_events.push(Event::DigitHidden {
                            index: reveal.index,
                        });
                        reveal.segment = Segment::Trail;
                        reveal.remaining = self.rules.presentation().trail();
                        false
                    }
                    Segment::Trail => {
                        let next = reveal.index.saturating_add(1);
                        if next < self.sequence.len() {
                            reveal.index = next;
                            reveal.segment = Segment::LeadIn;
                            reveal.remaining = self.rules.presentation().lead_in();
                            false
                        } else {
                            true
                        }
                    }
                }
            };

            if finished {
                self.reveal = None;
                self.open_input(progress, out_events);
                return true;
            }
        }
    }

    fn open_input(&mut self, progress: &mut Progress, out_events: &mut Vec<Event>) {
        self.input.clear();
        progress.set_phase(Phase::AwaitingInput, out_events);
        out_events.push(Event::InputOpened {
            expected: self.sequence.len(),
        });
    }

    fn drain_feedback(
        &mut self,
        budget: &mut Duration,
        progress: &mut Progress,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let resolution = {
            let Some(feedback) = self.feedback.as_mut() else {
                return false;
            };
            match feedback.drain(budget) {
                Some(resolution) => resolution,
                None => return false,
            }
        };
        self.feedback = None;
        self.apply_resolution(resolution, progress, out_events);
        true
    }

    fn enter_digit(&mut self, progress: &mut Progress, digit: Digit, out_events: &mut Vec<Event>) {
        if !matches!(progress.phase, Phase::AwaitingInput) {
            out_events.push(Event::InputRejected {
                reason: InputError::WrongPhase,
            });
            return;
        }

        let position = self.input.len();
        self.input.push(digit);
        out_events.push(Event::DigitEntered { position, digit });

        if self.input.len() == self.sequence.len() {
            self.evaluate_round(progress, out_events);
        }
    }

    fn erase_digit(&mut self, progress: &mut Progress, out_events: &mut Vec<Event>) {
        if !matches!(progress.phase, Phase::AwaitingInput) {
            return;
        }
        if self.input.pop().is_some() {
            out_events.push(Event::DigitErased {
                position: self.input.len(),
            });
        }
    }

    fn evaluate_round(&mut self, progress: &mut Progress, out_events: &mut Vec<Event>) {
        let correct = evaluate(&self.sequence, &self.input, self.rules.mode());
        progress.add_points(self.rules.scoring().award(self.level, self.trial, correct));
        out_events.push(Event::RoundEvaluated {
            level: self.level,
            trial: self.trial,
            correct,
        });
        let resolution = self.resolve_round(correct);
        self.feedback = Some(FeedbackState::new(self.rules.feedback().dwell(), resolution));
        progress.set_phase(Phase::Feedback, out_events);
    }

    /// Decides what follows the feedback dwell, updating miss bookkeeping.
    fn resolve_round(&mut self, correct: bool) -> Resolution {
        if !correct {
            self.level_misses = self.level_misses.saturating_add(1);
            if matches!(
                self.rules.failure_accounting(),
                FailureAccounting::Immediate
            ) {
                self.session_failures = self.session_failures.saturating_add(1);
                if self.session_failures >= self.rules.session_failure_limit() {
                    return Resolution::Finish {
                        outcome: SessionOutcome::Lost,
                    };
                }
            }
        }

        match self.rules.trial_policy() {
            TrialPolicy::TwoPerLevel => match self.trial {
                Trial::First => Resolution::NextRound {
                    trial: Trial::Second,
                },
                Trial::Second => self.resolve_level(),
            },
            TrialPolicy::RetryFirstLevelOnly => {
                if correct {
                    self.resolve_level()
                } else if self.level == self.rules.min_level()
                    && matches!(self.trial, Trial::First)
                {
                    Resolution::NextRound {
                        trial: Trial::Second,
                    }
                } else {
                    Resolution::NextRound {
                        trial: Trial::First,
                    }
                }
            }
        }
    }

    /// Resolves the level once its trials are exhausted.
    fn resolve_level(&mut self) -> Resolution {
        if matches!(
            self.rules.failure_accounting(),
            FailureAccounting::DeferredPerLevel
        ) {
            self.session_failures = self.session_failures.saturating_add(self.level_misses);
        }
        if self.level_misses >= self.rules.level_miss_limit()
            || self.session_failures >= self.rules.session_failure_limit()
        {
            return Resolution::Finish {
                outcome: SessionOutcome::Lost,
            };
        }
        if self.level >= self.rules.max_level() {
            return Resolution::Finish {
                outcome: SessionOutcome::Won,
            };
        }
        Resolution::Advance {
            level: self.level.successor(),
        }
    }

    fn apply_resolution(
        &mut self,
        resolution: Resolution,
        progress: &mut Progress,
        out_events: &mut Vec<Event>,
    ) {
        match resolution {
            Resolution::NextRound { trial } => {
                self.trial = trial;
                self.request_sequence(progress, out_events);
            }
            Resolution::Advance { level } => {
                self.level = level;
                self.trial = Trial::First;
                self.level_misses = 0;
                out_events.push(Event::LevelAdvanced { level });
                self.request_sequence(progress, out_events);
            }
            Resolution::Finish { outcome } => {
                progress.finish(outcome, self.level, out_events);
            }
        }
    }

    fn abandon(&mut self, progress: &mut Progress, out_events: &mut Vec<Event>) {
        self.reveal = None;
        self.feedback = None;
        progress.abandon(out_events);
    }
}

/// Applies the provided command to the session, mutating state deterministically.
pub fn apply(session: &mut Session, command: Command, out_events: &mut Vec<Event>) {
    let Session {
        progress, machine, ..
    } = session;

    match command {
        Command::Start => match machine {
            Machine::Span(span) => span.start(progress, out_events),
            Machine::Sort(sort) => sort.start(progress, out_events),
            Machine::Fluency(fluency) => fluency.start(progress, out_events),
        },
        Command::Tick { dt } => {
            progress.advance_clock(dt);
            match machine {
                Machine::Span(span) => span.tick(progress, dt, out_events),
                Machine::Sort(sort) => sort.tick(progress, dt, out_events),
                Machine::Fluency(fluency) => fluency.tick(progress, dt, out_events),
            }
        }
        Command::ProvideSequence { payload } => match machine {
            Machine::Span(span) => span.provide_sequence(progress, payload, out_events),
            Machine::Sort(sort) => sort.provide_board(progress, payload, out_events),
            Machine::Fluency(_) => out_events.push(Event::SequenceRejected {
                reason: SequenceError::WrongPhase,
            }),
        },
        Command::EnterDigit { digit } => match machine {
            Machine::Span(span) => span.enter_digit(progress, digit, out_events),
            Machine::Sort(_) | Machine::Fluency(_) => out_events.push(Event::InputRejected {
                reason: InputError::WrongPhase,
            }),
        },
        Command::EraseDigit => {
            if let Machine::Span(span) = machine {
                span.erase_digit(progress, out_events);
            }
        }
        Command::PickNumber { number } => match machine {
            Machine::Sort(sort) => sort.pick_number(progress, number, out_events),
            Machine::Span(_) | Machine::Fluency(_) => out_events.push(Event::NumberRejected {
                number,
                reason: PickError::WrongPhase,
            }),
        },
        Command::SubmitWord { word } => match machine {
            Machine::Fluency(fluency) => fluency.submit_word(progress, word, out_events),
            Machine::Span(_) | Machine::Sort(_) => out_events.push(Event::WordRejected {
                word,
                reason: WordError::WrongPhase,
            }),
        },
        Command::Abandon => match machine {
            Machine::Span(span) => span.abandon(progress, out_events),
            Machine::Sort(sort) => sort.abandon(progress, out_events),
            Machine::Fluency(fluency) => fluency.abandon(progress, out_events),
        },
    }
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use std::time::Duration;

    use mindspan_core::{Digit, GameKind, Level, Phase, Score, SessionSummary, Trial};

    use super::{Machine, Session};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(session: &Session) -> &'static str {
        session.banner
    }

    /// Game the session is running.
    #[must_use]
    pub fn game(session: &Session) -> GameKind {
        session.progress.game
    }

    /// Phase the session is currently in.
    #[must_use]
    pub fn phase(session: &Session) -> Phase {
        session.progress.phase
    }

    /// Accumulated score.
    #[must_use]
    pub fn score(session: &Session) -> Score {
        session.progress.score
    }

    /// Wall-clock time accumulated while the session was active.
    #[must_use]
    pub fn elapsed(session: &Session) -> Duration {
        session.progress.elapsed
    }

    /// Closing summary, available once the session finished.
    #[must_use]
    pub fn summary(session: &Session) -> Option<&SessionSummary> {
        session.progress.summary.as_ref()
    }

    /// Current level: sequence length, board size, or accepted word count.
    #[must_use]
    pub fn level(session: &Session) -> Level {
        match &session.machine {
            Machine::Span(span) => span.level,
            Machine::Sort(sort) => sort.count(),
            Machine::Fluency(fluency) => fluency.word_level(),
        }
    }

    /// Level number shown to the player.
    #[must_use]
    pub fn display_level(session: &Session) -> u32 {
        match &session.machine {
            Machine::Span(span) => span.rules.display_level(span.level),
            Machine::Sort(sort) => sort.count().get(),
            Machine::Fluency(fluency) => fluency.word_level().get(),
        }
    }

    /// Failures accumulated toward the session limit.
    #[must_use]
    pub fn failure_count(session: &Session) -> u32 {
        match &session.machine {
            Machine::Span(span) => span.session_failures,
            Machine::Sort(sort) => sort.failure_count(),
            Machine::Fluency(_) => 0,
        }
    }

    /// Attempt number within the current level, for games with trials.
    #[must_use]
    pub fn trial(session: &Session) -> Option<Trial> {
        match &session.machine {
            Machine::Span(span) => Some(span.trial),
            Machine::Sort(_) | Machine::Fluency(_) => None,
        }
    }

    /// Captures a read-only view of collected span input.
    #[must_use]
    pub fn input_view(session: &Session) -> Option<InputView> {
        match &session.machine {
            Machine::Span(span) => Some(InputView {
                digits: span.input.clone(),
                expected: span.sequence.len(),
            }),
            Machine::Sort(_) | Machine::Fluency(_) => None,
        }
    }

    /// Captures a read-only view of the sort board.
    #[must_use]
    pub fn board_view(session: &Session) -> Option<BoardView> {
        match &session.machine {
            Machine::Sort(sort) => {
                let slots = sort
                    .numbers()
                    .iter()
                    .map(|number| BoardSlot {
                        number: *number,
                        picked: sort.is_picked(*number),
                    })
                    .collect();
                Some(BoardView { slots })
            }
            Machine::Span(_) | Machine::Fluency(_) => None,
        }
    }

    /// Captures a read-only view of the fluency collection window.
    #[must_use]
    pub fn fluency_view(session: &Session) -> Option<FluencyView> {
        match &session.machine {
            Machine::Fluency(fluency) => Some(FluencyView {
                prompt: fluency.prompt().to_owned(),
                remaining: fluency.remaining(),
                words: fluency.words().to_vec(),
            }),
            Machine::Span(_) | Machine::Sort(_) => None,
        }
    }

    /// Read-only snapshot of collected span input.
    #[derive(Clone, Debug)]
    pub struct InputView {
        digits: Vec<Digit>,
        expected: usize,
    }

    impl InputView {
        /// Digits collected so far, oldest first.
        #[must_use]
        pub fn digits(&self) -> &[Digit] {
            &self.digits
        }

        /// Number of digits the session expects.
        #[must_use]
        pub fn expected(&self) -> usize {
            self.expected
        }
    }

    /// Read-only snapshot of the sort board.
    #[derive(Clone, Debug)]
    pub struct BoardView {
        slots: Vec<BoardSlot>,
    }

    impl BoardView {
        /// Iterator over the board slots in presentation order.
        pub fn iter(&self) -> impl Iterator<Item = &BoardSlot> {
            self.slots.iter()
        }

        /// Consumes the view, yielding the underlying slots.
        #[must_use]
        pub fn into_vec(self) -> Vec<BoardSlot> {
            self.slots
        }
    }

    /// Immutable representation of one sort-board slot.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct BoardSlot {
        /// Number occupying the slot.
        pub number: u32,
        /// Whether the number was already picked this round.
        pub picked: bool,
    }

    /// Read-only snapshot of a fluency collection window.
    #[derive(Clone, Debug)]
    pub struct FluencyView {
        prompt: String,
        remaining: Duration,
        words: Vec<String>,
    }

    impl FluencyView {
        /// Prompt the player produces words for.
        #[must_use]
        pub fn prompt(&self) -> &str {
            &self.prompt
        }

        /// Time left in the collection window.
        #[must_use]
        pub fn remaining(&self) -> Duration {
            self.remaining
        }

        /// Words accepted so far, in submission order.
        #[must_use]
        pub fn words(&self) -> &[String] {
            &self.words
        }
    }
}
