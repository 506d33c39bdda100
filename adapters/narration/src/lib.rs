#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared narration contracts for MindSpan adapters.
//!
//! Narration is a best-effort collaborator: digits are announced as they are
//! revealed, but a narrator that fails must never disturb the session.
//! Adapters call [`announce`], which logs failures at debug level and moves
//! on.

use anyhow::Result as AnyResult;
use mindspan_core::Digit;
use std::io::{self, Write};

/// Default BCP 47 language tag for spoken lines.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Default speech rate on the synthesiser's 0.0..=1.0 scale.
pub const DEFAULT_RATE: f32 = 0.5;

/// One utterance handed to a narrator.
#[derive(Clone, Debug, PartialEq)]
pub struct SpokenLine {
    /// Text to speak.
    pub text: String,
    /// BCP 47 language tag the text is phrased in.
    pub language: String,
    /// Speech rate on the synthesiser's 0.0..=1.0 scale.
    pub rate: f32,
}

impl SpokenLine {
    /// Creates a line with the default language and rate.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: DEFAULT_LANGUAGE.to_owned(),
            rate: DEFAULT_RATE,
        }
    }

    /// Returns the line rephrased under another language tag.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Returns the line with an adjusted speech rate.
    #[must_use]
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate.clamp(0.0, 1.0);
        self
    }
}

/// Voice backend capable of speaking MindSpan lines.
pub trait Narrator {
    /// Speaks one line, returning an error if the backend could not.
    fn speak(&mut self, line: &SpokenLine) -> AnyResult<()>;
}

/// Speaks a line, logging and swallowing any failure.
pub fn announce<N>(narrator: &mut N, line: &SpokenLine)
where
    N: Narrator + ?Sized,
{
    if let Err(error) = narrator.speak(line) {
        tracing::debug!(text = line.text.as_str(), %error, "narration failed");
    }
}

/// Builds the utterance announcing one revealed digit.
#[must_use]
pub fn digit_line(digit: Digit) -> SpokenLine {
    SpokenLine::new(digit_word(digit))
}

/// Returns the spoken English word for a digit.
#[must_use]
pub const fn digit_word(digit: Digit) -> &'static str {
    match digit.get() {
        0 => "zero",
        1 => "one",
        2 => "two",
        3 => "three",
        4 => "four",
        5 => "five",
        6 => "six",
        7 => "seven",
        8 => "eight",
        _ => "nine",
    }
}

/// Narrator that discards every line.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentNarrator;

impl Narrator for SilentNarrator {
    fn speak(&mut self, _line: &SpokenLine) -> AnyResult<()> {
        Ok(())
    }
}

/// Narrator that prints lines to standard output.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleNarrator;

impl Narrator for ConsoleNarrator {
    fn speak(&mut self, line: &SpokenLine) -> AnyResult<()> {
        let mut stdout = io::stdout();
        writeln!(stdout, "[voice] {}", line.text)?;
        stdout.flush()?;
        Ok(())
    }
}

/// Narrator that records lines for inspection in tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingNarrator {
    lines: Vec<SpokenLine>,
}

impl RecordingNarrator {
    /// Creates a recorder with an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines spoken so far, in order.
    #[must_use]
    pub fn lines(&self) -> &[SpokenLine] {
        &self.lines
    }

    /// Spoken texts so far, in order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|line| line.text.as_str()).collect()
    }
}

impl Narrator for RecordingNarrator {
    fn speak(&mut self, line: &SpokenLine) -> AnyResult<()> {
        self.lines.push(line.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct BrokenNarrator;

    impl Narrator for BrokenNarrator {
        fn speak(&mut self, _line: &SpokenLine) -> AnyResult<()> {
            Err(anyhow!("voice backend offline"))
        }
    }

    #[test]
    fn digits_map_to_their_spoken_words() {
        let zero = Digit::new(0).expect("digit");
        let nine = Digit::new(9).expect("digit");

        assert_eq!(digit_word(zero), "zero");
        assert_eq!(digit_word(nine), "nine");
        assert_eq!(digit_line(nine).text, "nine");
    }

    #[test]
    fn lines_default_to_the_standard_voice() {
        let line = SpokenLine::new("seven");

        assert_eq!(line.language, DEFAULT_LANGUAGE);
        assert!((line.rate - DEFAULT_RATE).abs() < f32::EPSILON);
    }

    #[test]
    fn builders_adjust_language_and_clamp_rate() {
        let line = SpokenLine::new("sieben")
            .with_language("de-DE")
            .with_rate(7.0);

        assert_eq!(line.language, "de-DE");
        assert!((line.rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn recording_narrator_keeps_lines_in_order() {
        let mut narrator = RecordingNarrator::new();
        announce(&mut narrator, &SpokenLine::new("four"));
        announce(&mut narrator, &SpokenLine::new("two"));

        assert_eq!(narrator.texts(), vec!["four", "two"]);
    }

    #[test]
    fn announce_swallows_backend_failures() {
        let mut narrator = BrokenNarrator;
        announce(&mut narrator, &SpokenLine::new("five"));
    }

    #[test]
    fn announce_reaches_boxed_narrators() {
        let mut narrator: Box<dyn Narrator> = Box::new(RecordingNarrator::new());
        announce(narrator.as_mut(), &SpokenLine::new("one"));
    }
}
