use std::time::Duration;

use mindspan_core::{
    Command, Event, FeedbackTiming, GameKind, GamePlan, Level, Phase, PickError, SequenceError,
    SequencePayload, SessionOutcome, SortRules, Trial,
};
use mindspan_session::{apply, query, Session};

fn instant_rules() -> SortRules {
    SortRules::standard().with_feedback(FeedbackTiming::new(Duration::ZERO, Duration::ZERO))
}

fn start(rules: SortRules) -> Session {
    let mut session = Session::new(GamePlan::Sort(rules));
    let mut events = Vec::new();
    apply(&mut session, Command::Start, &mut events);
    session
}

fn provide(session: &mut Session, numbers: &[u32]) -> Vec<Event> {
    let mut events = Vec::new();
    apply(
        session,
        Command::ProvideSequence {
            payload: SequencePayload::Numbers(numbers.to_vec()),
        },
        &mut events,
    );
    events
}

fn pick(session: &mut Session, number: u32) -> Vec<Event> {
    let mut events = Vec::new();
    apply(session, Command::PickNumber { number }, &mut events);
    events
}

fn settle(session: &mut Session) -> Vec<Event> {
    let mut events = Vec::new();
    apply(
        session,
        Command::Tick {
            dt: Duration::from_millis(1),
        },
        &mut events,
    );
    events
}

#[test]
fn start_requests_a_three_entry_board() {
    let mut session = Session::new(GamePlan::Sort(SortRules::standard()));
    let mut events = Vec::new();
    apply(&mut session, Command::Start, &mut events);

    assert_eq!(query::phase(&session), Phase::AwaitingSequence);
    assert!(events.iter().any(|event| matches!(
        event,
        Event::SequenceNeeded { .. }
    )));
    assert_eq!(query::level(&session), Level::new(3));
}

#[test]
fn duplicate_board_entries_are_rejected() {
    let mut session = start(instant_rules());
    let events = provide(&mut session, &[42, 31, 42]);

    assert_eq!(
        events.first(),
        Some(&Event::SequenceRejected {
            reason: SequenceError::DuplicateNumber { number: 42 },
        })
    );
    assert_eq!(query::phase(&session), Phase::AwaitingSequence);
}

#[test]
fn boards_below_the_number_floor_are_rejected() {
    let mut session = start(instant_rules());
    let events = provide(&mut session, &[10, 45, 88]);

    assert_eq!(
        events.first(),
        Some(&Event::SequenceRejected {
            reason: SequenceError::NumberOutOfRange { number: 10 },
        })
    );
    assert!(events.iter().any(|event| matches!(
        event,
        Event::SequenceNeeded { .. }
    )));
    assert_eq!(query::phase(&session), Phase::AwaitingSequence);
}

#[test]
fn ascending_picks_clear_the_board_and_advance() {
    let mut session = start(instant_rules());
    let events = provide(&mut session, &[42, 31, 88]);
    assert!(events.contains(&Event::BoardPresented {
        numbers: vec![42, 31, 88],
    }));
    assert_eq!(query::phase(&session), Phase::AwaitingInput);

    assert!(pick(&mut session, 31).contains(&Event::NumberAccepted {
        number: 31,
        remaining: 2,
    }));
    assert!(pick(&mut session, 42).contains(&Event::NumberAccepted {
        number: 42,
        remaining: 1,
    }));
    let events = pick(&mut session, 88);
    assert!(events.contains(&Event::RoundEvaluated {
        level: Level::new(3),
        trial: Trial::First,
        correct: true,
    }));
    assert_eq!(query::score(&session).get(), 30);

    let events = settle(&mut session);
    assert!(events.contains(&Event::LevelAdvanced {
        level: Level::new(4),
    }));
    assert_eq!(query::phase(&session), Phase::AwaitingSequence);
}

#[test]
fn out_of_order_picks_fail_the_round_at_the_limit() {
    let mut session = start(instant_rules());
    let _ = provide(&mut session, &[42, 31, 88]);

    let events = pick(&mut session, 88);
    assert!(events.contains(&Event::NumberRejected {
        number: 88,
        reason: PickError::OutOfOrder,
    }));
    assert_eq!(query::phase(&session), Phase::AwaitingInput);

    let events = pick(&mut session, 42);
    assert!(events.contains(&Event::RoundEvaluated {
        level: Level::new(3),
        trial: Trial::First,
        correct: false,
    }));
    assert_eq!(query::phase(&session), Phase::Feedback);
    assert_eq!(query::failure_count(&session), 1);

    let _ = settle(&mut session);
    assert_eq!(
        query::phase(&session),
        Phase::AwaitingSequence,
        "a failed round must be replayed at the same size"
    );
    assert_eq!(query::level(&session), Level::new(3));
}

#[test]
fn second_failed_round_loses_the_session() {
    let mut session = start(instant_rules());

    for _ in 0..2 {
        let _ = provide(&mut session, &[42, 31, 88]);
        let _ = pick(&mut session, 88);
        let _ = pick(&mut session, 42);
        let _ = settle(&mut session);
    }

    assert_eq!(query::phase(&session), Phase::Complete);
    let summary = query::summary(&session).expect("summary");
    assert_eq!(summary.game, GameKind::NumberSort);
    assert_eq!(summary.outcome, SessionOutcome::Lost);
    assert_eq!(query::failure_count(&session), 2);
}

#[test]
fn clearing_the_largest_board_wins_the_session() {
    let rules = instant_rules().with_counts(Level::new(3), Level::new(3));
    let mut session = start(rules);

    let _ = provide(&mut session, &[42, 31, 88]);
    let _ = pick(&mut session, 31);
    let _ = pick(&mut session, 42);
    let _ = pick(&mut session, 88);
    let _ = settle(&mut session);

    let summary = query::summary(&session).expect("summary");
    assert_eq!(summary.outcome, SessionOutcome::Won);
    assert_eq!(summary.highest_level, Level::new(3));
    assert_eq!(summary.score.get(), 30);
}

#[test]
fn repeated_and_unknown_picks_are_refused_without_penalty() {
    let mut session = start(instant_rules());
    let _ = provide(&mut session, &[42, 31, 88]);
    let _ = pick(&mut session, 31);

    let events = pick(&mut session, 31);
    assert!(events.contains(&Event::NumberRejected {
        number: 31,
        reason: PickError::AlreadyPicked,
    }));

    let events = pick(&mut session, 55);
    assert!(events.contains(&Event::NumberRejected {
        number: 55,
        reason: PickError::UnknownNumber,
    }));

    assert_eq!(
        query::failure_count(&session),
        0,
        "only out-of-order picks count toward the mistake limit"
    );
    assert_eq!(query::phase(&session), Phase::AwaitingInput);
}

#[test]
fn board_view_tracks_picked_numbers() {
    let mut session = start(instant_rules());
    let _ = provide(&mut session, &[42, 31, 88]);
    let _ = pick(&mut session, 31);

    let view = query::board_view(&session).expect("board view");
    let slots = view.into_vec();
    assert_eq!(slots.len(), 3);
    assert!(slots
        .iter()
        .find(|slot| slot.number == 31)
        .is_some_and(|slot| slot.picked));
    assert!(slots
        .iter()
        .find(|slot| slot.number == 42)
        .is_some_and(|slot| !slot.picked));
}
