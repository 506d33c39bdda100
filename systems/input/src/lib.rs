#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure input system translating decoded key presses into session commands.
//!
//! Adapters decode their platform's key events into [`KeyPress`] values; this
//! system latches the session phase from the event stream and turns presses
//! into the commands the running game understands. Presses that arrive while
//! the session is not collecting input are dropped here rather than bounced
//! off the session as rejections.

use mindspan_core::{Command, Digit, Event, GameKind, Phase};

/// Platform-independent key press decoded by an adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyPress {
    /// Printable character.
    Char(char),
    /// Backspace / delete-backwards key.
    Backspace,
    /// Enter / return key.
    Enter,
    /// Escape key.
    Escape,
}

/// Translates key presses into commands for one running session.
#[derive(Debug)]
pub struct InputTranslator {
    game: GameKind,
    phase: Phase,
    pending: String,
}

impl InputTranslator {
    /// Creates a translator for the provided game.
    #[must_use]
    pub fn new(game: GameKind) -> Self {
        Self {
            game,
            phase: Phase::Idle,
            pending: String::new(),
        }
    }

    /// Characters typed toward the next sort pick or fluency word.
    ///
    /// Adapters may echo this buffer; span input is echoed from session
    /// events instead, since each digit is committed immediately.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Consumes session events and key presses, emitting session commands.
    pub fn handle(&mut self, events: &[Event], keys: &[KeyPress], out: &mut Vec<Command>) {
        for event in events {
            if let Event::PhaseChanged { phase } = event {
                self.phase = *phase;
                self.pending.clear();
            }
        }

        for key in keys {
            self.translate(*key, out);
        }
    }

    fn translate(&mut self, key: KeyPress, out: &mut Vec<Command>) {
        if matches!(key, KeyPress::Escape) {
            out.push(Command::Abandon);
            return;
        }
        if !matches!(self.phase, Phase::AwaitingInput) {
            return;
        }

        match self.game {
            GameKind::DigitSpan | GameKind::ReverseDigitSpan => self.translate_span(key, out),
            GameKind::NumberSort => self.translate_sort(key, out),
            GameKind::VerbalFluency => self.translate_fluency(key, out),
        }
    }

    fn translate_span(&mut self, key: KeyPress, out: &mut Vec<Command>) {
        match key {
            KeyPress::Char(ch) => {
                if let Some(digit) = Digit::from_char(ch) {
                    out.push(Command::EnterDigit { digit });
                }
            }
            KeyPress::Backspace => out.push(Command::EraseDigit),
            KeyPress::Enter | KeyPress::Escape => {}
        }
    }

    fn translate_sort(&mut self, key: KeyPress, out: &mut Vec<Command>) {
        match key {
            KeyPress::Char(ch) if ch.is_ascii_digit() => self.pending.push(ch),
            KeyPress::Backspace => {
                let _ = self.pending.pop();
            }
            KeyPress::Enter => {
                if let Ok(number) = self.pending.parse::<u32>() {
                    out.push(Command::PickNumber { number });
                }
                self.pending.clear();
            }
            KeyPress::Char(_) | KeyPress::Escape => {}
        }
    }

    fn translate_fluency(&mut self, key: KeyPress, out: &mut Vec<Command>) {
        match key {
            KeyPress::Char(ch) if ch.is_alphabetic() || ch == '-' || ch == '\'' => {
                self.pending.push(ch);
            }
            KeyPress::Backspace => {
                let _ = self.pending.pop();
            }
            KeyPress::Enter => {
                if !self.pending.is_empty() {
                    out.push(Command::SubmitWord {
                        word: std::mem::take(&mut self.pending),
                    });
                }
            }
            KeyPress::Char(_) | KeyPress::Escape => {}
        }
    }
}
