use std::time::Duration;

use mindspan_core::{
    Command, Event, FluencyRules, GameKind, GamePlan, Level, Phase, SessionOutcome, WordError,
};
use mindspan_session::{apply, query, Session};

fn start(rules: FluencyRules) -> Session {
    let mut session = Session::new(GamePlan::Fluency(rules));
    let mut events = Vec::new();
    apply(&mut session, Command::Start, &mut events);
    session
}

fn submit(session: &mut Session, word: &str) -> Vec<Event> {
    let mut events = Vec::new();
    apply(
        session,
        Command::SubmitWord {
            word: word.to_owned(),
        },
        &mut events,
    );
    events
}

#[test]
fn start_presents_the_prompt_and_window() {
    let mut session = Session::new(GamePlan::Fluency(
        FluencyRules::standard().with_prompt("animals"),
    ));
    let mut events = Vec::new();
    apply(&mut session, Command::Start, &mut events);

    assert!(events.contains(&Event::PromptPresented {
        prompt: "animals".to_owned(),
        window: Duration::from_secs(60),
    }));
    assert_eq!(query::phase(&session), Phase::AwaitingInput);
}

#[test]
fn accepted_words_accumulate_points() {
    let mut session = start(FluencyRules::standard());

    let events = submit(&mut session, "Badger");
    assert!(events.contains(&Event::WordAccepted {
        word: "badger".to_owned(),
        total: 1,
    }));

    let _ = submit(&mut session, "otter");
    assert_eq!(query::score(&session).get(), 20);
    assert_eq!(query::level(&session), Level::new(2));
}

#[test]
fn duplicates_are_refused_case_insensitively() {
    let mut session = start(FluencyRules::standard());
    let _ = submit(&mut session, "badger");

    let events = submit(&mut session, "  BADGER ");
    assert!(events.contains(&Event::WordRejected {
        word: "  BADGER ".to_owned(),
        reason: WordError::Duplicate,
    }));
    assert_eq!(query::score(&session).get(), 10);
}

#[test]
fn blank_and_short_words_are_refused() {
    let mut session = start(FluencyRules::standard());

    let events = submit(&mut session, "   ");
    assert!(events.contains(&Event::WordRejected {
        word: "   ".to_owned(),
        reason: WordError::Empty,
    }));

    let events = submit(&mut session, "a");
    assert!(events.contains(&Event::WordRejected {
        word: "a".to_owned(),
        reason: WordError::TooShort,
    }));

    assert_eq!(query::score(&session).get(), 0);
}

#[test]
fn window_expiry_ends_the_session_as_won() {
    let mut session = start(FluencyRules::standard().with_window(Duration::from_secs(5)));
    let _ = submit(&mut session, "badger");
    let _ = submit(&mut session, "otter");

    let mut events = Vec::new();
    apply(
        &mut session,
        Command::Tick {
            dt: Duration::from_secs(4),
        },
        &mut events,
    );
    assert!(events.is_empty(), "window closed early");

    apply(
        &mut session,
        Command::Tick {
            dt: Duration::from_secs(1),
        },
        &mut events,
    );

    let summary = query::summary(&session).expect("summary");
    assert_eq!(summary.game, GameKind::VerbalFluency);
    assert_eq!(summary.outcome, SessionOutcome::Won);
    assert_eq!(summary.highest_level, Level::new(2));
    assert_eq!(summary.score.get(), 20);
    assert_eq!(summary.elapsed, Duration::from_secs(5));
    assert_eq!(query::phase(&session), Phase::Complete);
}

#[test]
fn words_after_the_window_are_refused() {
    let mut session = start(FluencyRules::standard().with_window(Duration::from_secs(1)));
    let mut events = Vec::new();
    apply(
        &mut session,
        Command::Tick {
            dt: Duration::from_secs(2),
        },
        &mut events,
    );

    let events = submit(&mut session, "badger");
    assert!(events.contains(&Event::WordRejected {
        word: "badger".to_owned(),
        reason: WordError::WrongPhase,
    }));
    assert_eq!(query::level(&session), Level::new(0));
}

#[test]
fn remaining_window_is_visible_through_the_view() {
    let mut session = start(FluencyRules::standard().with_window(Duration::from_secs(30)));
    let mut events = Vec::new();
    apply(
        &mut session,
        Command::Tick {
            dt: Duration::from_secs(12),
        },
        &mut events,
    );

    let view = query::fluency_view(&session).expect("fluency view");
    assert_eq!(view.remaining(), Duration::from_secs(18));
    assert!(view.words().is_empty());
}
