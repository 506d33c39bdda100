//! Timed verbal fluency collection.

use std::time::Duration;

use mindspan_core::{Event, FluencyRules, Level, Phase, SessionOutcome, WordError};

use crate::Progress;

/// Collects distinct words against a prompt until the window closes.
///
/// Words are normalised (trimmed, lowercased) before duplicate detection, so
/// resubmitting a word with different casing is still refused. Completing the
/// window always counts as a win; the word tally stands in for the level.
#[derive(Debug)]
pub(crate) struct FluencyMachine {
    rules: FluencyRules,
    remaining: Duration,
    words: Vec<String>,
}

impl FluencyMachine {
    pub(crate) fn new(rules: FluencyRules) -> Self {
        let remaining = rules.window();
        Self {
            rules,
            remaining,
            words: Vec::new(),
        }
    }

    pub(crate) fn start(&mut self, progress: &mut Progress, out_events: &mut Vec<Event>) {
        if !matches!(progress.phase, Phase::Idle) {
            return;
        }
        progress.set_phase(Phase::AwaitingInput, out_events);
        out_events.push(Event::PromptPresented {
            prompt: self.rules.prompt().to_owned(),
            window: self.rules.window(),
        });
    }

    pub(crate) fn submit_word(
        &mut self,
        progress: &mut Progress,
        word: String,
        out_events: &mut Vec<Event>,
    ) {
        if !matches!(progress.phase, Phase::AwaitingInput) {
            out_events.push(Event::WordRejected {
                word,
                reason: WordError::WrongPhase,
            });
            return;
        }

        let normalised = word.trim().to_lowercase();
        if normalised.is_empty() {
            out_events.push(Event::WordRejected {
                word,
                reason: WordError::Empty,
            });
            return;
        }
        if normalised.chars().count() < self.rules.min_word_chars() {
            out_events.push(Event::WordRejected {
                word,
                reason: WordError::TooShort,
            });
            return;
        }
        if self.words.iter().any(|known| known == &normalised) {
            out_events.push(Event::WordRejected {
                word,
                reason: WordError::Duplicate,
            });
            return;
        }

        self.words.push(normalised.clone());
        progress.add_points(self.rules.points_per_word());
        let total = u32::try_from(self.words.len()).unwrap_or(u32::MAX);
        out_events.push(Event::WordAccepted {
            word: normalised,
            total,
        });
    }

    pub(crate) fn tick(
        &mut self,
        progress: &mut Progress,
        dt: Duration,
        out_events: &mut Vec<Event>,
    ) {
        if !matches!(progress.phase, Phase::AwaitingInput) {
            return;
        }
        if dt < self.remaining {
            self.remaining -= dt;
            return;
        }
        self.remaining = Duration::ZERO;
        progress.finish(SessionOutcome::Won, self.word_level(), out_events);
    }

    pub(crate) fn abandon(&mut self, progress: &mut Progress, out_events: &mut Vec<Event>) {
        progress.abandon(out_events);
    }

    /// Accepted word count expressed as the session level.
    pub(crate) fn word_level(&self) -> Level {
        Level::new(u32::try_from(self.words.len()).unwrap_or(u32::MAX))
    }

    pub(crate) fn prompt(&self) -> &str {
        self.rules.prompt()
    }

    pub(crate) const fn remaining(&self) -> Duration {
        self.remaining
    }

    pub(crate) fn words(&self) -> &[String] {
        &self.words
    }
}
