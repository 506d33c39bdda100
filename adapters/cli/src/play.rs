//! Interactive session runner pumping wall-clock time and key events.
//!
//! The loop owns the engine pieces for one session: keystrokes become
//! commands through the input system, sequence requests are answered by the
//! generator, frames advance the session with `Command::Tick`, and the
//! reporting system hands the finished record to the journal. The screen is
//! redrawn from read-only queries after every frame and doubles as the
//! narration backend when announcements are enabled.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use mindspan_core::{
    Command, Digit, Event, FeedbackTiming, GameKind, GamePlan, Phase, PickError,
    PresentationTiming, WordError, FLUENCY_PROMPTS,
};
use mindspan_narration::{announce, digit_line, Narrator, SpokenLine};
use mindspan_session::{apply, query, Session};
use mindspan_store::{Journal, KeyValueStore};
use mindspan_system_input::{InputTranslator, KeyPress};
use mindspan_system_reporting::Reporter;
use mindspan_system_sequence_gen::{Config as GeneratorConfig, SequenceGeneration};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Options resolved from configuration and flags for one session run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SessionOptions {
    /// Seed the generator derives every round from.
    pub(crate) seed: u64,
    /// Presentation speed scale; larger is faster. Validated by the caller.
    pub(crate) speed: f64,
    /// Whether revealed digits are announced.
    pub(crate) narration: bool,
}

/// Runs one interactive session and records its outcome in the journal.
pub(crate) fn run<S>(kind: GameKind, options: SessionOptions, journal: &mut Journal<S>) -> Result<()>
where
    S: KeyValueStore,
{
    let today = crate::today();
    let mut session = Session::new(scaled_plan(kind, options.speed, &today));
    let mut generation = SequenceGeneration::new(GeneratorConfig::new(options.seed));
    let mut translator = InputTranslator::new(kind);
    let mut reporter = Reporter::new();
    let mut screen = Screen::new(options.narration);

    screen.enter()?;
    let driven = drive(
        &mut session,
        &mut generation,
        &mut translator,
        &mut reporter,
        journal,
        &mut screen,
        &today,
    );
    screen.leave()?;
    driven?;

    print_outcome(&session, journal, kind);
    Ok(())
}

fn drive<S>(
    session: &mut Session,
    generation: &mut SequenceGeneration,
    translator: &mut InputTranslator,
    reporter: &mut Reporter,
    journal: &mut Journal<S>,
    screen: &mut Screen,
    today: &str,
) -> Result<()>
where
    S: KeyValueStore,
{
    let mut events: Vec<Event> = Vec::new();
    let mut commands: Vec<Command> = Vec::new();

    apply(session, Command::Start, &mut events);
    screen.observe(&events);
    screen.draw(session, translator.pending())?;

    let mut last_frame = Instant::now();
    loop {
        let keys = poll_keys()?;
        let dt = last_frame.elapsed();
        last_frame = Instant::now();

        translator.handle(&events, &keys, &mut commands);
        generation.handle(&events, &mut commands);
        reporter.handle(&events, today, |record| journal.record_session(record));

        events.clear();
        for command in commands.drain(..) {
            apply(session, command, &mut events);
        }
        apply(session, Command::Tick { dt }, &mut events);

        screen.observe(&events);
        if screen.narration() {
            speak_digits(&events, screen);
        }
        screen.draw(session, translator.pending())?;

        if query::phase(session) == Phase::Complete {
            reporter.handle(&events, today, |record| journal.record_session(record));
            return Ok(());
        }
    }
}

fn print_outcome<S>(session: &Session, journal: &Journal<S>, kind: GameKind)
where
    S: KeyValueStore,
{
    println!();
    match query::summary(session) {
        Some(summary) => {
            if summary.outcome.is_win() {
                println!("You won!");
            } else {
                println!("Session over.");
            }
            println!("  game   {}", summary.game.title());
            println!(
                "  level  {}",
                crate::display_level_for(kind, summary.highest_level)
            );
            println!("  score  {}", summary.score.get());
            println!("  time   {}s", summary.elapsed.as_secs());
            println!(
                "  sessions recorded for this game: {}",
                journal.history(kind).len()
            );
        }
        None => println!("Session abandoned; nothing was recorded."),
    }
}

/// Builds the standard plan for a game with the speed scale applied.
fn scaled_plan(kind: GameKind, speed: f64, today: &str) -> GamePlan {
    match GamePlan::standard(kind) {
        GamePlan::Span(rules) => {
            let presentation = rules.presentation();
            let feedback = rules.feedback();
            GamePlan::Span(
                rules
                    .with_presentation(PresentationTiming::new(
                        scale(presentation.lead_in(), speed),
                        scale(presentation.visible(), speed),
                        scale(presentation.trail(), speed),
                    ))
                    .with_feedback(FeedbackTiming::new(
                        scale(feedback.display(), speed),
                        scale(feedback.transition(), speed),
                    )),
            )
        }
        GamePlan::Sort(rules) => {
            let feedback = rules.feedback();
            GamePlan::Sort(rules.with_feedback(FeedbackTiming::new(
                scale(feedback.display(), speed),
                scale(feedback.transition(), speed),
            )))
        }
        GamePlan::Fluency(rules) => GamePlan::Fluency(rules.with_prompt(prompt_of_the_day(today))),
    }
}

fn scale(duration: Duration, speed: f64) -> Duration {
    duration.div_f64(speed)
}

/// Prompt rotated daily through the configured pool.
fn prompt_of_the_day(today: &str) -> &'static str {
    use chrono::Datelike;

    let ordinal = chrono::NaiveDate::parse_from_str(today, "%Y-%m-%d")
        .map(|date| date.num_days_from_ce().unsigned_abs() as usize)
        .unwrap_or(0);
    FLUENCY_PROMPTS[ordinal % FLUENCY_PROMPTS.len()]
}

fn poll_keys() -> Result<Vec<KeyPress>> {
    let mut keys = Vec::new();
    let mut wait = POLL_INTERVAL;
    while event::poll(wait)? {
        if let TermEvent::Key(key) = event::read()? {
            if let Some(press) = key_to_press(key) {
                keys.push(press);
            }
        }
        wait = Duration::ZERO;
    }
    Ok(keys)
}

fn key_to_press(key: KeyEvent) -> Option<KeyPress> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyPress::Escape)
        }
        KeyCode::Char(ch)
            if !key.modifiers.contains(KeyModifiers::CONTROL)
                && !key.modifiers.contains(KeyModifiers::ALT) =>
        {
            Some(KeyPress::Char(ch))
        }
        KeyCode::Backspace => Some(KeyPress::Backspace),
        KeyCode::Enter => Some(KeyPress::Enter),
        KeyCode::Esc => Some(KeyPress::Escape),
        _ => None,
    }
}

fn speak_digits<N>(events: &[Event], narrator: &mut N)
where
    N: Narrator,
{
    for event in events {
        if let Event::DigitShown { digit, .. } = event {
            announce(narrator, &digit_line(*digit));
        }
    }
}

/// Full-screen terminal renderer for one session.
///
/// Also serves as the narration backend: spoken lines land on a dedicated
/// screen row instead of interleaving with raw-mode output.
struct Screen {
    narration: bool,
    raw: bool,
    visible_digit: Option<Digit>,
    voice: Option<String>,
    notice: Option<(String, bool)>,
}

impl Screen {
    fn new(narration: bool) -> Self {
        Self {
            narration,
            raw: false,
            visible_digit: None,
            voice: None,
            notice: None,
        }
    }

    const fn narration(&self) -> bool {
        self.narration
    }

    fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode().context("failed to enable raw terminal mode")?;
        self.raw = true;
        execute!(io::stdout(), cursor::Hide)?;
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.raw {
            execute!(
                io::stdout(),
                terminal::Clear(ClearType::All),
                cursor::MoveTo(0, 0),
                cursor::Show
            )?;
            terminal::disable_raw_mode()?;
            self.raw = false;
        }
        Ok(())
    }

    fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::RoundStarted { .. } => {
                    self.visible_digit = None;
                    self.voice = None;
                    self.notice = None;
                }
                Event::DigitShown { digit, .. } => {
                    self.visible_digit = Some(*digit);
                }
                Event::DigitHidden { .. } => {
                    self.visible_digit = None;
                }
                Event::InputOpened { .. } => {
                    self.visible_digit = None;
                    self.voice = None;
                }
                Event::RoundEvaluated { correct, .. } => {
                    let text = if *correct { "Correct!" } else { "Not quite." };
                    self.notice = Some((text.to_owned(), *correct));
                }
                Event::NumberAccepted { .. } => {
                    self.notice = None;
                }
                Event::NumberRejected { number, reason } => {
                    let text = match reason {
                        PickError::OutOfOrder => {
                            format!("{number} is not the smallest remaining number.")
                        }
                        PickError::AlreadyPicked => format!("{number} was already picked."),
                        PickError::UnknownNumber => format!("{number} is not on the board."),
                        PickError::WrongPhase => continue,
                    };
                    self.notice = Some((text, false));
                }
                Event::WordAccepted { word, .. } => {
                    self.notice = Some((format!("Counted \"{word}\"."), true));
                }
                Event::WordRejected { word, reason } => {
                    let text = match reason {
                        WordError::Empty => "Submit a word first.".to_owned(),
                        WordError::TooShort => format!("\"{word}\" is too short."),
                        WordError::Duplicate => format!("\"{word}\" was already counted."),
                        WordError::WrongPhase => "Time is up.".to_owned(),
                    };
                    self.notice = Some((text, false));
                }
                _ => {}
            }
        }
    }

    fn draw(&mut self, session: &Session, pending: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, terminal::Clear(ClearType::All), cursor::MoveTo(0, 0))?;

        let game = query::game(session);
        let phase = query::phase(session);

        write_line(&mut stdout, 0, Color::Cyan, game.title())?;
        write_line(&mut stdout, 1, Color::Grey, &status_line(session))?;

        match phase {
            Phase::Idle | Phase::AwaitingSequence => {
                write_line(&mut stdout, 3, Color::White, "Get ready...")?;
            }
            Phase::Presenting => {
                write_line(&mut stdout, 3, Color::White, "Watch:")?;
                if let Some(digit) = self.visible_digit {
                    write_line(&mut stdout, 4, Color::Yellow, &format!("   {digit}"))?;
                }
            }
            Phase::AwaitingInput => self.draw_input(&mut stdout, session, pending)?,
            Phase::Feedback => self.draw_notice(&mut stdout, 3)?,
            Phase::Complete => {
                write_line(&mut stdout, 3, Color::White, "Session complete.")?;
            }
        }

        if self.narration {
            if let Some(voice) = &self.voice {
                write_line(&mut stdout, 8, Color::Magenta, &format!("voice: {voice}"))?;
            }
        }
        write_line(&mut stdout, 10, Color::DarkGrey, hint_line(game, phase))?;

        stdout.flush()?;
        Ok(())
    }

    fn draw_input(&self, stdout: &mut io::Stdout, session: &Session, pending: &str) -> Result<()> {
        match query::game(session) {
            GameKind::DigitSpan | GameKind::ReverseDigitSpan => {
                write_line(stdout, 3, Color::White, "Your answer:")?;
                if let Some(view) = query::input_view(session) {
                    let mut answer = String::new();
                    for digit in view.digits() {
                        answer.push_str(&format!("{digit} "));
                    }
                    for _ in view.digits().len()..view.expected() {
                        answer.push_str("_ ");
                    }
                    write_line(stdout, 4, Color::Yellow, answer.trim_end())?;
                }
            }
            GameKind::NumberSort => {
                write_line(stdout, 3, Color::White, "Pick every number in ascending order:")?;
                if let Some(view) = query::board_view(session) {
                    execute!(stdout, cursor::MoveTo(0, 4))?;
                    for slot in view.iter() {
                        let color = if slot.picked {
                            Color::DarkGrey
                        } else {
                            Color::Yellow
                        };
                        execute!(
                            stdout,
                            SetForegroundColor(color),
                            Print(format!("[{:>2}] ", slot.number)),
                            ResetColor
                        )?;
                    }
                }
                write_line(stdout, 5, Color::White, &format!("> {pending}"))?;
                self.draw_notice(stdout, 6)?;
            }
            GameKind::VerbalFluency => {
                if let Some(view) = query::fluency_view(session) {
                    write_line(stdout, 3, Color::White, &format!("Prompt: {}", view.prompt()))?;
                    let summary = match view.words().last() {
                        Some(latest) => {
                            format!("{} accepted (latest: {latest})", view.words().len())
                        }
                        None => "no words yet".to_owned(),
                    };
                    write_line(stdout, 4, Color::Grey, &summary)?;
                }
                write_line(stdout, 5, Color::White, &format!("> {pending}"))?;
                self.draw_notice(stdout, 6)?;
            }
        }
        Ok(())
    }

    fn draw_notice(&self, stdout: &mut io::Stdout, row: u16) -> Result<()> {
        if let Some((text, good)) = &self.notice {
            let color = if *good { Color::Green } else { Color::Red };
            write_line(stdout, row, color, text)?;
        }
        Ok(())
    }
}

impl Narrator for Screen {
    fn speak(&mut self, line: &SpokenLine) -> anyhow::Result<()> {
        self.voice = Some(line.text.clone());
        Ok(())
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

fn write_line(stdout: &mut io::Stdout, row: u16, color: Color, text: &str) -> Result<()> {
    execute!(
        stdout,
        cursor::MoveTo(0, row),
        SetForegroundColor(color),
        Print(text),
        ResetColor
    )?;
    Ok(())
}

fn status_line(session: &Session) -> String {
    let score = query::score(session).get();
    match query::game(session) {
        GameKind::DigitSpan | GameKind::ReverseDigitSpan => {
            let trial = query::trial(session).map_or(1, |trial| trial.ordinal());
            format!(
                "level {}  trial {}  score {}  misses {}",
                query::display_level(session),
                trial,
                score,
                query::failure_count(session),
            )
        }
        GameKind::NumberSort => format!(
            "board of {}  score {}  misses {}",
            query::display_level(session),
            score,
            query::failure_count(session),
        ),
        GameKind::VerbalFluency => {
            let remaining = query::fluency_view(session).map_or(0, |view| view.remaining().as_secs());
            format!("{remaining}s left  score {score}")
        }
    }
}

fn hint_line(game: GameKind, phase: Phase) -> &'static str {
    match (game, phase) {
        (_, Phase::Presenting) => "Watch closely.",
        (GameKind::DigitSpan, Phase::AwaitingInput) => {
            "Type the digits in the order shown.  Esc abandons."
        }
        (GameKind::ReverseDigitSpan, Phase::AwaitingInput) => {
            "Type the digits in reverse order.  Esc abandons."
        }
        (GameKind::NumberSort, Phase::AwaitingInput) => {
            "Type the smallest number and press Enter.  Esc abandons."
        }
        (GameKind::VerbalFluency, Phase::AwaitingInput) => {
            "Type a word and press Enter.  Esc abandons."
        }
        _ => "Esc abandons.",
    }
}

#[cfg(test)]
mod tests {
    use super::{key_to_press, prompt_of_the_day, scale, scaled_plan};
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
    use mindspan_core::{GameKind, GamePlan, FLUENCY_PROMPTS};
    use mindspan_system_input::KeyPress;
    use std::collections::BTreeSet;
    use std::time::Duration;

    #[test]
    fn characters_and_control_keys_map_to_presses() {
        assert_eq!(
            key_to_press(KeyEvent::new(KeyCode::Char('7'), KeyModifiers::NONE)),
            Some(KeyPress::Char('7'))
        );
        assert_eq!(
            key_to_press(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE)),
            Some(KeyPress::Backspace)
        );
        assert_eq!(
            key_to_press(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
            Some(KeyPress::Enter)
        );
        assert_eq!(
            key_to_press(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)),
            Some(KeyPress::Escape)
        );
        assert_eq!(
            key_to_press(KeyEvent::new(KeyCode::Home, KeyModifiers::NONE)),
            None
        );
    }

    #[test]
    fn ctrl_c_abandons_like_escape() {
        assert_eq!(
            key_to_press(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(KeyPress::Escape)
        );
    }

    #[test]
    fn key_releases_are_ignored() {
        let release =
            KeyEvent::new_with_kind(KeyCode::Char('7'), KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(key_to_press(release), None);
    }

    #[test]
    fn speed_scales_span_timing() {
        let plan = scaled_plan(GameKind::DigitSpan, 2.0, "2024-03-01");
        let GamePlan::Span(rules) = plan else {
            panic!("span plan expected");
        };

        assert_eq!(rules.presentation().lead_in(), Duration::from_millis(250));
        assert_eq!(rules.presentation().visible(), Duration::from_millis(500));
        assert_eq!(rules.presentation().trail(), Duration::from_millis(100));
        assert_eq!(rules.feedback().display(), Duration::from_millis(750));
    }

    #[test]
    fn half_speed_stretches_timing() {
        assert_eq!(scale(Duration::from_millis(500), 0.5), Duration::from_secs(1));
    }

    #[test]
    fn daily_prompts_rotate_through_the_pool() {
        let first = prompt_of_the_day("2024-03-01");
        assert!(FLUENCY_PROMPTS.contains(&first));
        assert_eq!(prompt_of_the_day("2024-03-01"), first);

        let week: BTreeSet<&str> = [
            "2024-03-01",
            "2024-03-02",
            "2024-03-03",
            "2024-03-04",
            "2024-03-05",
            "2024-03-06",
        ]
        .iter()
        .map(|date| prompt_of_the_day(date))
        .collect();
        assert_eq!(week.len(), FLUENCY_PROMPTS.len());
    }
}
