#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the MindSpan engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative session, and pure systems. Adapters submit [`Command`]
//! values describing desired mutations, the session executes those commands
//! via its `apply` entry point, and then broadcasts [`Event`] values for
//! systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command
//! batches.

use std::{error::Error, fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to MindSpan.";

/// Gap observed before each digit of a span sequence becomes visible.
pub const PRESENTATION_LEAD_IN: Duration = Duration::from_millis(500);
/// Dwell during which a revealed digit stays visible.
pub const PRESENTATION_VISIBLE: Duration = Duration::from_millis(1000);
/// Gap observed after a digit hides before the next reveal is scheduled.
pub const PRESENTATION_TRAIL: Duration = Duration::from_millis(200);
/// Dwell during which a round verdict stays on screen.
pub const FEEDBACK_DISPLAY: Duration = Duration::from_millis(1500);
/// Transition time granted after the verdict before the next phase begins.
pub const FEEDBACK_TRANSITION: Duration = Duration::from_millis(300);
/// Collection window granted to a verbal fluency session.
pub const FLUENCY_WINDOW: Duration = Duration::from_secs(60);

/// Prompt pool drawn from when configuring verbal fluency sessions.
pub const FLUENCY_PROMPTS: [&str; 6] = [
    "animals",
    "fruits and vegetables",
    "things found in a kitchen",
    "occupations",
    "words starting with S",
    "cities",
];

/// Mini-games offered by the training suite.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    /// Forward digit recall.
    DigitSpan,
    /// Reverse digit recall.
    ReverseDigitSpan,
    /// Ascending number sorting.
    NumberSort,
    /// Timed verbal fluency.
    VerbalFluency,
}

impl GameKind {
    /// Every game kind, in catalog order.
    pub const ALL: [GameKind; 4] = [
        GameKind::DigitSpan,
        GameKind::ReverseDigitSpan,
        GameKind::NumberSort,
        GameKind::VerbalFluency,
    ];

    /// Stable identifier used in persistence keys and transfer strings.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::DigitSpan => "digit-span",
            Self::ReverseDigitSpan => "reverse-digit-span",
            Self::NumberSort => "number-sort",
            Self::VerbalFluency => "verbal-fluency",
        }
    }

    /// Resolves a slug back to its game kind.
    #[must_use]
    pub fn from_slug(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == value)
    }

    /// Human-readable title presented by adapters.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::DigitSpan => "Digit Span",
            Self::ReverseDigitSpan => "Reverse Digit Span",
            Self::NumberSort => "Number Sort",
            Self::VerbalFluency => "Verbal Fluency",
        }
    }
}

/// Single digit presented to or entered by the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digit(u8);

impl Digit {
    /// Smallest digit.
    pub const ZERO: Digit = Digit(0);
    /// Largest representable digit.
    pub const MAX: u8 = 9;

    /// Creates a digit, rejecting values above [`Digit::MAX`].
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Retrieves the numeric value of the digit.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Parses a digit from a keyboard character.
    #[must_use]
    pub fn from_char(value: char) -> Option<Self> {
        value.to_digit(10).map(|digit| Self(digit as u8))
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive digit range a sequence draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DigitRange {
    min: u8,
    max: u8,
}

impl DigitRange {
    /// Creates a new range, clamping both bounds to valid digits.
    #[must_use]
    pub const fn new(min: u8, max: u8) -> Self {
        let max = if max > Digit::MAX { Digit::MAX } else { max };
        let min = if min > max { max } else { min };
        Self { min, max }
    }

    /// Full 0–9 range.
    #[must_use]
    pub const fn full() -> Self {
        Self::new(0, Digit::MAX)
    }

    /// Positive 1–9 range.
    #[must_use]
    pub const fn positive() -> Self {
        Self::new(1, Digit::MAX)
    }

    /// Smallest digit the range admits.
    #[must_use]
    pub const fn min(&self) -> u8 {
        self.min
    }

    /// Largest digit the range admits.
    #[must_use]
    pub const fn max(&self) -> u8 {
        self.max
    }

    /// Reports whether the digit falls inside the range.
    #[must_use]
    pub const fn contains(&self, digit: Digit) -> bool {
        digit.get() >= self.min && digit.get() <= self.max
    }
}

/// Sequence length for the current set of rounds; increases on success.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Level(u32);

impl Level {
    /// Creates a new level wrapper with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying sequence length.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the level one step above this one.
    #[must_use]
    pub const fn successor(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Monotonically non-decreasing score accumulator.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Score(u32);

impl Score {
    /// Creates a new score with the provided value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric score.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns a score increased by the provided points, saturating at the top.
    #[must_use]
    pub const fn saturating_add(self, points: u32) -> Self {
        Self(self.0.saturating_add(points))
    }
}

/// Attempt number within a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trial {
    /// First attempt at the current level.
    First,
    /// Second attempt at the current level.
    Second,
}

impl Trial {
    /// One-based attempt number for presentation.
    #[must_use]
    pub const fn ordinal(self) -> u32 {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }
}

/// Coarse lifecycle state of a session, driving which commands are accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The session exists but has not started.
    Idle,
    /// The session requested a sequence and waits for the generator.
    AwaitingSequence,
    /// The sequence is being revealed on a timed schedule.
    Presenting,
    /// The session accepts player input.
    AwaitingInput,
    /// The round verdict is on screen for its dwell time.
    Feedback,
    /// The session terminated; no further mutation is accepted.
    Complete,
}

/// Direction the collected input is compared in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EvaluationMode {
    /// Input must repeat the sequence in presentation order.
    Forward,
    /// Input must repeat the sequence in reverse order.
    Reverse,
}

/// Compares collected input against the presented sequence.
///
/// The comparison is pure; consequences are applied by the session.
#[must_use]
pub fn evaluate(sequence: &[Digit], input: &[Digit], mode: EvaluationMode) -> bool {
    if sequence.len() != input.len() {
        return false;
    }

    match mode {
        EvaluationMode::Forward => sequence.iter().eq(input.iter()),
        EvaluationMode::Reverse => sequence.iter().rev().eq(input.iter()),
    }
}

/// Governs whether a second trial runs at a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrialPolicy {
    /// Both trials always run at every level.
    TwoPerLevel,
    /// A second trial runs only as a retry of a missed first trial, and only
    /// at the starting level.
    RetryFirstLevelOnly,
}

/// Governs when misses are folded into the session failure count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureAccounting {
    /// Misses are folded in when the level resolves.
    DeferredPerLevel,
    /// Every miss increments the failure count at evaluation time.
    Immediate,
}

/// Points awarded for correct rounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScoringRule {
    /// Award `level * points_per_level` once per level, on a correct first
    /// trial.
    FirstTrialOnly {
        /// Multiplier applied to the level on award.
        points_per_level: u32,
    },
    /// Award `level * points_per_level` for every correct round.
    EveryCorrectRound {
        /// Multiplier applied to the level on award.
        points_per_level: u32,
    },
}

impl ScoringRule {
    /// Computes the points awarded for a round verdict.
    #[must_use]
    pub const fn award(&self, level: Level, trial: Trial, correct: bool) -> u32 {
        if !correct {
            return 0;
        }

        match self {
            Self::FirstTrialOnly { points_per_level } => match trial {
                Trial::First => level.get().saturating_mul(*points_per_level),
                Trial::Second => 0,
            },
            Self::EveryCorrectRound { points_per_level } => {
                level.get().saturating_mul(*points_per_level)
            }
        }
    }
}

/// Pacing of the timed digit reveal schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresentationTiming {
    lead_in: Duration,
    visible: Duration,
    trail: Duration,
}

impl PresentationTiming {
    /// Creates a new pacing description.
    #[must_use]
    pub const fn new(lead_in: Duration, visible: Duration, trail: Duration) -> Self {
        Self {
            lead_in,
            visible,
            trail,
        }
    }

    /// Pacing observed by the production games.
    #[must_use]
    pub const fn standard() -> Self {
        Self::new(PRESENTATION_LEAD_IN, PRESENTATION_VISIBLE, PRESENTATION_TRAIL)
    }

    /// Gap before a digit becomes visible.
    #[must_use]
    pub const fn lead_in(&self) -> Duration {
        self.lead_in
    }

    /// Dwell during which a digit stays visible.
    #[must_use]
    pub const fn visible(&self) -> Duration {
        self.visible
    }

    /// Gap after a digit hides.
    #[must_use]
    pub const fn trail(&self) -> Duration {
        self.trail
    }
}

/// Dwell applied to the round verdict before the session moves on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeedbackTiming {
    display: Duration,
    transition: Duration,
}

impl FeedbackTiming {
    /// Creates a new feedback dwell description.
    #[must_use]
    pub const fn new(display: Duration, transition: Duration) -> Self {
        Self {
            display,
            transition,
        }
    }

    /// Dwell observed by the production games.
    #[must_use]
    pub const fn standard() -> Self {
        Self::new(FEEDBACK_DISPLAY, FEEDBACK_TRANSITION)
    }

    /// Time the verdict stays visible.
    #[must_use]
    pub const fn display(&self) -> Duration {
        self.display
    }

    /// Transition time granted after the verdict.
    #[must_use]
    pub const fn transition(&self) -> Duration {
        self.transition
    }

    /// Total dwell between the verdict and the next phase.
    #[must_use]
    pub fn dwell(&self) -> Duration {
        self.display.saturating_add(self.transition)
    }
}

/// Rule set governing a digit-span session.
#[derive(Clone, Debug, PartialEq)]
pub struct SpanRules {
    mode: EvaluationMode,
    min_level: Level,
    max_level: Level,
    digit_range: DigitRange,
    trial_policy: TrialPolicy,
    failure_accounting: FailureAccounting,
    level_miss_limit: u32,
    session_failure_limit: u32,
    scoring: ScoringRule,
    presentation: PresentationTiming,
    feedback: FeedbackTiming,
    display_offset: u32,
}

impl SpanRules {
    /// Rules of the forward digit recall game.
    #[must_use]
    pub fn forward() -> Self {
        Self {
            mode: EvaluationMode::Forward,
            min_level: Level::new(4),
            max_level: Level::new(9),
            digit_range: DigitRange::full(),
            trial_policy: TrialPolicy::TwoPerLevel,
            failure_accounting: FailureAccounting::DeferredPerLevel,
            level_miss_limit: 2,
            session_failure_limit: 3,
            scoring: ScoringRule::FirstTrialOnly {
                points_per_level: 10,
            },
            presentation: PresentationTiming::standard(),
            feedback: FeedbackTiming::standard(),
            display_offset: 3,
        }
    }

    /// Rules of the reverse digit recall game.
    #[must_use]
    pub fn reverse() -> Self {
        Self {
            mode: EvaluationMode::Reverse,
            min_level: Level::new(2),
            max_level: Level::new(8),
            digit_range: DigitRange::positive(),
            trial_policy: TrialPolicy::RetryFirstLevelOnly,
            failure_accounting: FailureAccounting::Immediate,
            level_miss_limit: 2,
            session_failure_limit: 2,
            scoring: ScoringRule::FirstTrialOnly {
                points_per_level: 10,
            },
            presentation: PresentationTiming::standard(),
            feedback: FeedbackTiming::standard(),
            display_offset: 1,
        }
    }

    /// Replaces the level bounds.
    #[must_use]
    pub fn with_levels(mut self, min_level: Level, max_level: Level) -> Self {
        self.min_level = min_level;
        self.max_level = max_level;
        self
    }

    /// Replaces the trial policy.
    #[must_use]
    pub fn with_trial_policy(mut self, policy: TrialPolicy) -> Self {
        self.trial_policy = policy;
        self
    }

    /// Replaces the failure accounting rule.
    #[must_use]
    pub fn with_failure_accounting(mut self, accounting: FailureAccounting) -> Self {
        self.failure_accounting = accounting;
        self
    }

    /// Replaces the session-wide failure limit.
    #[must_use]
    pub fn with_session_failure_limit(mut self, limit: u32) -> Self {
        self.session_failure_limit = limit;
        self
    }

    /// Replaces the scoring rule.
    #[must_use]
    pub fn with_scoring(mut self, scoring: ScoringRule) -> Self {
        self.scoring = scoring;
        self
    }

    /// Replaces the reveal pacing.
    #[must_use]
    pub fn with_presentation(mut self, presentation: PresentationTiming) -> Self {
        self.presentation = presentation;
        self
    }

    /// Replaces the feedback dwell.
    #[must_use]
    pub fn with_feedback(mut self, feedback: FeedbackTiming) -> Self {
        self.feedback = feedback;
        self
    }

    /// Direction the collected input is compared in.
    #[must_use]
    pub const fn mode(&self) -> EvaluationMode {
        self.mode
    }

    /// Sequence length the session starts at.
    #[must_use]
    pub const fn min_level(&self) -> Level {
        self.min_level
    }

    /// Sequence length that wins the session when completed.
    #[must_use]
    pub const fn max_level(&self) -> Level {
        self.max_level
    }

    /// Digit range sequences draw from.
    #[must_use]
    pub const fn digit_range(&self) -> DigitRange {
        self.digit_range
    }

    /// Trial policy applied at each level.
    #[must_use]
    pub const fn trial_policy(&self) -> TrialPolicy {
        self.trial_policy
    }

    /// Failure accounting rule.
    #[must_use]
    pub const fn failure_accounting(&self) -> FailureAccounting {
        self.failure_accounting
    }

    /// Misses at one level that lose the session.
    #[must_use]
    pub const fn level_miss_limit(&self) -> u32 {
        self.level_miss_limit
    }

    /// Accumulated failures that lose the session.
    #[must_use]
    pub const fn session_failure_limit(&self) -> u32 {
        self.session_failure_limit
    }

    /// Scoring rule applied to round verdicts.
    #[must_use]
    pub const fn scoring(&self) -> ScoringRule {
        self.scoring
    }

    /// Reveal pacing.
    #[must_use]
    pub const fn presentation(&self) -> PresentationTiming {
        self.presentation
    }

    /// Feedback dwell.
    #[must_use]
    pub const fn feedback(&self) -> FeedbackTiming {
        self.feedback
    }

    /// Level number shown to the player.
    ///
    /// Purely a presentation transform; decisions never consult it.
    #[must_use]
    pub const fn display_level(&self, level: Level) -> u32 {
        level.get().saturating_sub(self.display_offset)
    }
}

/// Rule set governing a number-sort session.
#[derive(Clone, Debug, PartialEq)]
pub struct SortRules {
    min_count: Level,
    max_count: Level,
    number_min: u32,
    number_max: u32,
    mistake_limit: u32,
    session_failure_limit: u32,
    scoring: ScoringRule,
    feedback: FeedbackTiming,
}

impl SortRules {
    /// Rules of the ascending number sorting game.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            min_count: Level::new(3),
            max_count: Level::new(8),
            number_min: 29,
            number_max: 99,
            mistake_limit: 2,
            session_failure_limit: 2,
            scoring: ScoringRule::EveryCorrectRound {
                points_per_level: 10,
            },
            feedback: FeedbackTiming::standard(),
        }
    }

    /// Replaces the board size bounds.
    ///
    /// Counts are clamped to the number range width so every board request
    /// the rules produce can be satisfied with distinct numbers.
    #[must_use]
    pub fn with_counts(mut self, min_count: Level, max_count: Level) -> Self {
        let width = self
            .number_max
            .saturating_sub(self.number_min)
            .saturating_add(1);
        let max_count = Level::new(max_count.get().min(width));
        let min_count = Level::new(min_count.get().min(max_count.get()));
        self.min_count = min_count;
        self.max_count = max_count;
        self
    }

    /// Replaces the feedback dwell.
    #[must_use]
    pub fn with_feedback(mut self, feedback: FeedbackTiming) -> Self {
        self.feedback = feedback;
        self
    }

    /// Replaces the session-wide failure limit.
    #[must_use]
    pub fn with_session_failure_limit(mut self, limit: u32) -> Self {
        self.session_failure_limit = limit;
        self
    }

    /// Board size the session starts at.
    #[must_use]
    pub const fn min_count(&self) -> Level {
        self.min_count
    }

    /// Board size that wins the session when cleared.
    #[must_use]
    pub const fn max_count(&self) -> Level {
        self.max_count
    }

    /// Smallest number a board may contain.
    #[must_use]
    pub const fn number_min(&self) -> u32 {
        self.number_min
    }

    /// Largest number a board may contain.
    #[must_use]
    pub const fn number_max(&self) -> u32 {
        self.number_max
    }

    /// Out-of-order picks that fail the round.
    #[must_use]
    pub const fn mistake_limit(&self) -> u32 {
        self.mistake_limit
    }

    /// Failed rounds that lose the session.
    #[must_use]
    pub const fn session_failure_limit(&self) -> u32 {
        self.session_failure_limit
    }

    /// Scoring rule applied to cleared boards.
    #[must_use]
    pub const fn scoring(&self) -> ScoringRule {
        self.scoring
    }

    /// Feedback dwell.
    #[must_use]
    pub const fn feedback(&self) -> FeedbackTiming {
        self.feedback
    }
}

/// Rule set governing a verbal fluency session.
#[derive(Clone, Debug, PartialEq)]
pub struct FluencyRules {
    prompt: String,
    window: Duration,
    min_word_chars: usize,
    points_per_word: u32,
}

impl FluencyRules {
    /// Rules of the verbal fluency game with the default prompt.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            prompt: FLUENCY_PROMPTS[0].to_owned(),
            window: FLUENCY_WINDOW,
            min_word_chars: 2,
            points_per_word: 10,
        }
    }

    /// Replaces the prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Replaces the collection window.
    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Prompt the player produces words for.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Collection window length.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Shortest accepted word length in characters.
    #[must_use]
    pub const fn min_word_chars(&self) -> usize {
        self.min_word_chars
    }

    /// Points awarded per accepted word.
    #[must_use]
    pub const fn points_per_word(&self) -> u32 {
        self.points_per_word
    }
}

/// Complete configuration for one session of a specific game.
#[derive(Clone, Debug, PartialEq)]
pub enum GamePlan {
    /// Digit-span configuration (forward or reverse).
    Span(SpanRules),
    /// Number-sort configuration.
    Sort(SortRules),
    /// Verbal fluency configuration.
    Fluency(FluencyRules),
}

impl GamePlan {
    /// Catalog of default configurations per game.
    #[must_use]
    pub fn standard(kind: GameKind) -> Self {
        match kind {
            GameKind::DigitSpan => Self::Span(SpanRules::forward()),
            GameKind::ReverseDigitSpan => Self::Span(SpanRules::reverse()),
            GameKind::NumberSort => Self::Sort(SortRules::standard()),
            GameKind::VerbalFluency => Self::Fluency(FluencyRules::standard()),
        }
    }

    /// Game the plan configures.
    #[must_use]
    pub const fn kind(&self) -> GameKind {
        match self {
            Self::Span(rules) => match rules.mode() {
                EvaluationMode::Forward => GameKind::DigitSpan,
                EvaluationMode::Reverse => GameKind::ReverseDigitSpan,
            },
            Self::Sort(_) => GameKind::NumberSort,
            Self::Fluency(_) => GameKind::VerbalFluency,
        }
    }
}

/// Shape of the sequence a session requests from the generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceSpec {
    /// Digits for a span round.
    Digits {
        /// Number of digits requested.
        length: Level,
        /// Range each digit is drawn from.
        range: DigitRange,
    },
    /// Distinct numbers for a sort board, delivered in shuffled order.
    DistinctNumbers {
        /// Number of board entries requested.
        count: Level,
        /// Smallest admissible number.
        min: u32,
        /// Largest admissible number.
        max: u32,
    },
}

/// Sequence values supplied by the generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SequencePayload {
    /// Digits answering a [`SequenceSpec::Digits`] request.
    Digits(Vec<Digit>),
    /// Numbers answering a [`SequenceSpec::DistinctNumbers`] request.
    Numbers(Vec<u32>),
}

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Starts the session, requesting the first round.
    Start,
    /// Advances the session clock by the provided delta time.
    Tick {
        /// Duration of wall-clock time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Supplies the sequence the session requested for the next round.
    ProvideSequence {
        /// Values produced by the generator.
        payload: SequencePayload,
    },
    /// Appends a digit to the collected input.
    EnterDigit {
        /// Digit entered by the player.
        digit: Digit,
    },
    /// Removes the most recently collected digit, if any.
    EraseDigit,
    /// Picks a number from the sort board.
    PickNumber {
        /// Number the player picked.
        number: u32,
    },
    /// Submits a word to a fluency session.
    SubmitWord {
        /// Word as typed by the player.
        word: String,
    },
    /// Tears the session down, cancelling all pending schedules.
    Abandon,
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that the session entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: Phase,
    },
    /// Requests a sequence from the generator for the next round.
    SequenceNeeded {
        /// Shape of the requested sequence.
        spec: SequenceSpec,
    },
    /// Reports that a supplied sequence was rejected.
    SequenceRejected {
        /// Specific reason the sequence was refused.
        reason: SequenceError,
    },
    /// Confirms that a round began.
    RoundStarted {
        /// Sequence length of the round.
        level: Level,
        /// Attempt number within the level.
        trial: Trial,
    },
    /// Reveals the digit at a position within the sequence.
    DigitShown {
        /// Zero-based position within the sequence.
        index: usize,
        /// Digit that became visible.
        digit: Digit,
    },
    /// Hides the digit at a position within the sequence.
    DigitHidden {
        /// Zero-based position within the sequence.
        index: usize,
    },
    /// Opens the input phase.
    InputOpened {
        /// Number of digits the session expects.
        expected: usize,
    },
    /// Confirms a digit was appended to the collected input.
    DigitEntered {
        /// Zero-based position the digit landed at.
        position: usize,
        /// Digit that was collected.
        digit: Digit,
    },
    /// Confirms the most recent digit was removed.
    DigitErased {
        /// Zero-based position the digit was removed from.
        position: usize,
    },
    /// Reports an input command that was refused.
    InputRejected {
        /// Specific reason the input was refused.
        reason: InputError,
    },
    /// Publishes a round verdict before the feedback dwell begins.
    RoundEvaluated {
        /// Sequence length of the evaluated round.
        level: Level,
        /// Attempt number within the level.
        trial: Trial,
        /// Whether the collected input matched.
        correct: bool,
    },
    /// Announces promotion to a new level.
    LevelAdvanced {
        /// Level that became active.
        level: Level,
    },
    /// Presents the full sort board.
    BoardPresented {
        /// Board numbers in presentation order.
        numbers: Vec<u32>,
    },
    /// Confirms an in-order pick.
    NumberAccepted {
        /// Number that was picked.
        number: u32,
        /// Board entries still unpicked.
        remaining: usize,
    },
    /// Reports a refused pick.
    NumberRejected {
        /// Number the player attempted to pick.
        number: u32,
        /// Specific reason the pick was refused.
        reason: PickError,
    },
    /// Presents the fluency prompt and collection window.
    PromptPresented {
        /// Prompt the player produces words for.
        prompt: String,
        /// Length of the collection window.
        window: Duration,
    },
    /// Confirms an accepted word.
    WordAccepted {
        /// Word in normalised form.
        word: String,
        /// Accepted words so far.
        total: u32,
    },
    /// Reports a refused word.
    WordRejected {
        /// Word as submitted.
        word: String,
        /// Specific reason the word was refused.
        reason: WordError,
    },
    /// Publishes the closing summary of a finished session.
    SessionEnded {
        /// Final session summary.
        summary: SessionSummary,
    },
    /// Confirms that the session was abandoned before finishing.
    SessionAbandoned,
}

/// Reasons a supplied sequence may be rejected by the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SequenceError {
    /// The session was not waiting for a sequence.
    WrongPhase,
    /// The payload length did not match the requested length.
    LengthMismatch {
        /// Length the session requested.
        expected: usize,
        /// Length the payload carried.
        actual: usize,
    },
    /// A digit fell outside the configured range.
    DigitOutOfRange {
        /// Offending digit.
        digit: Digit,
    },
    /// A board number fell outside the configured range.
    NumberOutOfRange {
        /// Offending number.
        number: u32,
    },
    /// A board number appeared more than once.
    DuplicateNumber {
        /// Offending number.
        number: u32,
    },
    /// The payload kind did not match the requested shape.
    PayloadMismatch,
}

/// Reasons an input command may be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputError {
    /// The session was not accepting input.
    WrongPhase,
}

/// Reasons a sort-board pick may be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PickError {
    /// The session was not accepting picks.
    WrongPhase,
    /// The number is not on the board.
    UnknownNumber,
    /// The number was already picked this round.
    AlreadyPicked,
    /// The number is not the smallest remaining entry.
    OutOfOrder,
}

/// Reasons a fluency word may be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WordError {
    /// The session was not collecting words.
    WrongPhase,
    /// The submission was empty after trimming.
    Empty,
    /// The submission was shorter than the configured minimum.
    TooShort,
    /// The word was already accepted this session.
    Duplicate,
}

/// Terminal result of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionOutcome {
    /// The session completed its top level or collection window.
    Won,
    /// The session hit a failure limit.
    Lost,
}

impl SessionOutcome {
    /// Reports whether the outcome is a win.
    #[must_use]
    pub const fn is_win(self) -> bool {
        matches!(self, Self::Won)
    }
}

/// Closing summary published exactly once per finished session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    /// Game the session belonged to.
    pub game: GameKind,
    /// Terminal result.
    pub outcome: SessionOutcome,
    /// Highest level reached before termination.
    pub highest_level: Level,
    /// Final accumulated score.
    pub score: Score,
    /// Wall-clock time between start and termination.
    pub elapsed: Duration,
}

/// Dated result appended to a game's persisted history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// ISO-8601 calendar date (`YYYY-MM-DD`) the session finished on.
    pub date: String,
    /// Game the record belongs to.
    pub game: GameKind,
    /// Highest level reached before termination.
    pub level: Level,
    /// Final accumulated score.
    pub score: Score,
    /// Whether the session terminated as won.
    pub won: bool,
    /// Wall-clock seconds between start and termination.
    pub seconds: u64,
}

/// Self-report rating bounded to the 0–10 scale.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Largest admissible rating.
    pub const MAX: u8 = 10;

    /// Creates a rating, rejecting values above [`Rating::MAX`].
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Retrieves the numeric rating.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(RatingOutOfRange { value })
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Error produced when a rating falls outside the 0–10 scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RatingOutOfRange {
    /// Value that was refused.
    pub value: u8,
}

impl fmt::Display for RatingOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rating {} exceeds the 0-10 scale", self.value)
    }
}

impl Error for RatingOutOfRange {}

/// Daily self-report symptom check-in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomReport {
    /// ISO-8601 calendar date the report covers.
    pub date: String,
    /// Sleep quality rating.
    pub sleep_quality: Rating,
    /// Fatigue severity rating.
    pub fatigue: Rating,
    /// Concentration difficulty rating.
    pub concentration: Rating,
    /// Mood rating.
    pub mood: Rating,
    /// Headache severity rating.
    pub headache: Rating,
    /// Optional free-text note.
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{
        evaluate, Digit, DigitRange, EvaluationMode, GameKind, GamePlan, Level, Rating, Score,
        ScoringRule, SessionRecord, SortRules, SpanRules, SymptomReport, Trial,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn digits(values: &[u8]) -> Vec<Digit> {
        values
            .iter()
            .map(|value| Digit::new(*value).expect("digit"))
            .collect()
    }

    #[test]
    fn forward_evaluation_matches_presentation_order() {
        let sequence = digits(&[1, 2, 3]);
        assert!(evaluate(&sequence, &digits(&[1, 2, 3]), EvaluationMode::Forward));
        assert!(!evaluate(&sequence, &digits(&[3, 2, 1]), EvaluationMode::Forward));
    }

    #[test]
    fn reverse_evaluation_matches_reversed_order() {
        let sequence = digits(&[1, 2, 3]);
        assert!(evaluate(&sequence, &digits(&[3, 2, 1]), EvaluationMode::Reverse));
        assert!(!evaluate(&sequence, &digits(&[1, 2, 3]), EvaluationMode::Reverse));
    }

    #[test]
    fn evaluation_rejects_length_mismatch() {
        let sequence = digits(&[1, 2, 3]);
        assert!(!evaluate(&sequence, &digits(&[1, 2]), EvaluationMode::Forward));
    }

    #[test]
    fn digit_rejects_values_above_nine() {
        assert!(Digit::new(9).is_some());
        assert!(Digit::new(10).is_none());
        assert_eq!(Digit::from_char('7').map(|digit| digit.get()), Some(7));
        assert!(Digit::from_char('x').is_none());
    }

    #[test]
    fn digit_range_clamps_bounds() {
        let range = DigitRange::new(3, 42);
        assert_eq!(range.min(), 3);
        assert_eq!(range.max(), 9);
        assert!(range.contains(Digit::new(5).expect("digit")));
        assert!(!range.contains(Digit::new(2).expect("digit")));
    }

    #[test]
    fn standard_sort_boards_draw_from_29_to_99() {
        let rules = SortRules::standard();
        assert_eq!(rules.number_min(), 29);
        assert_eq!(rules.number_max(), 99);
    }

    #[test]
    fn sort_counts_clamp_to_the_number_range_width() {
        let rules = SortRules::standard().with_counts(Level::new(5), Level::new(200));
        assert_eq!(rules.min_count(), Level::new(5));
        assert_eq!(rules.max_count(), Level::new(71));

        let rules = SortRules::standard().with_counts(Level::new(90), Level::new(100));
        assert_eq!(rules.min_count(), Level::new(71));
        assert_eq!(rules.max_count(), Level::new(71));
    }

    #[test]
    fn first_trial_scoring_awards_once_per_level() {
        let scoring = ScoringRule::FirstTrialOnly {
            points_per_level: 10,
        };
        assert_eq!(scoring.award(Level::new(4), Trial::First, true), 40);
        assert_eq!(scoring.award(Level::new(4), Trial::Second, true), 0);
        assert_eq!(scoring.award(Level::new(4), Trial::First, false), 0);
    }

    #[test]
    fn every_round_scoring_awards_both_trials() {
        let scoring = ScoringRule::EveryCorrectRound {
            points_per_level: 10,
        };
        assert_eq!(scoring.award(Level::new(5), Trial::First, true), 50);
        assert_eq!(scoring.award(Level::new(5), Trial::Second, true), 50);
    }

    #[test]
    fn display_level_offsets_internal_length() {
        assert_eq!(SpanRules::forward().display_level(Level::new(4)), 1);
        assert_eq!(SpanRules::reverse().display_level(Level::new(2)), 1);
    }

    #[test]
    fn standard_plans_report_their_kind() {
        for kind in GameKind::ALL {
            assert_eq!(GamePlan::standard(kind).kind(), kind);
        }
    }

    #[test]
    fn slugs_round_trip() {
        for kind in GameKind::ALL {
            assert_eq!(GameKind::from_slug(kind.slug()), Some(kind));
        }
        assert_eq!(GameKind::from_slug("tetris"), None);
    }

    #[test]
    fn rating_rejects_values_above_ten() {
        assert!(Rating::new(10).is_some());
        assert!(Rating::new(11).is_none());
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn session_record_round_trips_through_bincode() {
        let record = SessionRecord {
            date: "2024-11-03".to_owned(),
            game: GameKind::DigitSpan,
            level: Level::new(6),
            score: Score::new(150),
            won: true,
            seconds: 184,
        };
        assert_round_trip(&record);
    }

    #[test]
    fn symptom_report_round_trips_through_bincode() {
        let report = SymptomReport {
            date: "2024-11-03".to_owned(),
            sleep_quality: Rating::new(7).expect("rating"),
            fatigue: Rating::new(4).expect("rating"),
            concentration: Rating::new(5).expect("rating"),
            mood: Rating::new(6).expect("rating"),
            headache: Rating::new(1).expect("rating"),
            note: Some("slept badly".to_owned()),
        };
        assert_round_trip(&report);
    }

    #[test]
    fn game_kind_round_trips_through_bincode() {
        for kind in GameKind::ALL {
            assert_round_trip(&kind);
        }
    }
}
