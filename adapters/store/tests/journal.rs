//! Journal behaviour over in-memory and file-backed stores.

use mindspan_core::{GameKind, Level, Rating, Score, SessionRecord, SymptomReport};
use mindspan_store::{FileStore, Journal, KeyValueStore, MemoryStore, StoreError};

fn record(date: &str, game: GameKind, level: u32, score: u32) -> SessionRecord {
    SessionRecord {
        date: date.to_owned(),
        game,
        level: Level::new(level),
        score: Score::new(score),
        won: true,
        seconds: 90,
    }
}

fn rating(value: u8) -> Rating {
    Rating::new(value).expect("rating")
}

fn report(date: &str, mood: u8) -> SymptomReport {
    SymptomReport {
        date: date.to_owned(),
        sleep_quality: rating(7),
        fatigue: rating(3),
        concentration: rating(4),
        mood: rating(mood),
        headache: rating(0),
        note: None,
    }
}

/// Store whose writes always fail, for exercising the swallow path.
struct ReadOnlyStore {
    inner: MemoryStore,
}

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, _value: String) -> Result<(), StoreError> {
        Err(StoreError::Write {
            path: std::path::PathBuf::from(key),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read only"),
        })
    }
}

#[test]
fn sessions_append_to_history_in_order() {
    let mut journal = Journal::new(MemoryStore::new());

    journal.record_session(&record("2024-03-01", GameKind::DigitSpan, 6, 150));
    journal.record_session(&record("2024-03-02", GameKind::DigitSpan, 7, 180));

    let history = journal.history(GameKind::DigitSpan);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].date, "2024-03-01");
    assert_eq!(history[1].date, "2024-03-02");
    assert!(journal.history(GameKind::NumberSort).is_empty());
}

#[test]
fn recording_updates_the_last_played_flag() {
    let mut journal = Journal::new(MemoryStore::new());
    assert_eq!(journal.last_played(GameKind::DigitSpan), None);

    journal.record_session(&record("2024-03-01", GameKind::DigitSpan, 6, 150));
    journal.record_session(&record("2024-03-05", GameKind::DigitSpan, 7, 180));

    assert_eq!(
        journal.last_played(GameKind::DigitSpan),
        Some("2024-03-05".to_owned())
    );
    assert_eq!(journal.last_played(GameKind::VerbalFluency), None);
}

#[test]
fn daily_progress_lists_each_game_once_per_date() {
    let mut journal = Journal::new(MemoryStore::new());

    journal.record_session(&record("2024-03-01", GameKind::DigitSpan, 6, 150));
    journal.record_session(&record("2024-03-01", GameKind::DigitSpan, 5, 120));
    journal.record_session(&record("2024-03-01", GameKind::NumberSort, 8, 200));
    journal.record_session(&record("2024-03-02", GameKind::DigitSpan, 7, 180));

    let progress = journal.daily_progress();
    assert_eq!(
        progress.get("2024-03-01"),
        Some(&vec!["digit-span".to_owned(), "number-sort".to_owned()])
    );
    assert_eq!(
        progress.get("2024-03-02"),
        Some(&vec!["digit-span".to_owned()])
    );
}

#[test]
fn corrupt_history_blobs_read_as_empty_and_recover() {
    let mut store = MemoryStore::new();
    store
        .set("history:digit-span", "{not json".to_owned())
        .expect("seed");

    let mut journal = Journal::new(store);
    assert!(journal.history(GameKind::DigitSpan).is_empty());

    journal.record_session(&record("2024-03-01", GameKind::DigitSpan, 6, 150));
    assert_eq!(journal.history(GameKind::DigitSpan).len(), 1);
}

#[test]
fn failed_writes_are_swallowed() {
    let mut journal = Journal::new(ReadOnlyStore {
        inner: MemoryStore::new(),
    });

    journal.record_session(&record("2024-03-01", GameKind::DigitSpan, 6, 150));
    journal.record_symptoms(&report("2024-03-01", 5));

    assert!(journal.history(GameKind::DigitSpan).is_empty());
    assert!(journal.symptom_history().is_empty());
}

#[test]
fn symptom_reports_overwrite_by_date() {
    let mut journal = Journal::new(MemoryStore::new());

    journal.record_symptoms(&report("2024-03-01", 4));
    journal.record_symptoms(&report("2024-03-02", 6));
    journal.record_symptoms(&report("2024-03-01", 8));

    let history = journal.symptom_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].date, "2024-03-01");
    assert_eq!(history[0].mood, rating(8));
    assert_eq!(history[1].date, "2024-03-02");

    assert_eq!(journal.symptoms_on("2024-03-01"), Some(report("2024-03-01", 8)));
    assert_eq!(journal.symptoms_on("2024-03-09"), None);
}

#[test]
fn merge_keeps_local_records_and_adds_new_dates() {
    let mut journal = Journal::new(MemoryStore::new());
    journal.record_session(&record("2024-03-02", GameKind::DigitSpan, 6, 150));

    let incoming = vec![
        record("2024-03-01", GameKind::DigitSpan, 5, 120),
        record("2024-03-02", GameKind::DigitSpan, 9, 999),
        record("2024-03-03", GameKind::DigitSpan, 7, 180),
    ];
    let added = journal.merge_history(GameKind::DigitSpan, &incoming);

    assert_eq!(added, 2);
    let history = journal.history(GameKind::DigitSpan);
    let dates: Vec<&str> = history.iter().map(|entry| entry.date.as_str()).collect();
    assert_eq!(dates, vec!["2024-03-01", "2024-03-02", "2024-03-03"]);
    assert_eq!(history[1].score, Score::new(150), "local record kept");
}

#[test]
fn file_store_round_trips_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mindspan.json");

    {
        let store = FileStore::open(&path).expect("open");
        let mut journal = Journal::new(store);
        journal.record_session(&record("2024-03-01", GameKind::ReverseDigitSpan, 8, 350));
    }

    let store = FileStore::open(&path).expect("reopen");
    let journal = Journal::new(store);
    let history = journal.history(GameKind::ReverseDigitSpan);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].score, Score::new(350));
    assert_eq!(
        journal.last_played(GameKind::ReverseDigitSpan),
        Some("2024-03-01".to_owned())
    );
}

#[test]
fn file_store_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested/data/mindspan.json");

    let mut store = FileStore::open(&path).expect("open");
    store.set("greeting", "hello".to_owned()).expect("set");

    assert!(path.exists());
}

#[test]
fn file_store_writes_stage_to_a_sibling_and_rename_into_place() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mindspan.json");
    let staging = dir.path().join("mindspan.json.tmp");
    std::fs::write(&staging, "{stale garbage").expect("seed");

    let mut store = FileStore::open(&path).expect("open");
    store.set("greeting", "hello".to_owned()).expect("set");

    assert!(!staging.exists(), "staging residue must be renamed away");
    let reopened = FileStore::open(&path).expect("reopen");
    assert_eq!(
        reopened.get("greeting").expect("get"),
        Some("hello".to_owned())
    );
}

#[test]
fn malformed_store_files_are_refused_on_open() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mindspan.json");
    std::fs::write(&path, "[1, 2, 3]").expect("seed");

    match FileStore::open(&path) {
        Err(StoreError::Malformed { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected malformed error, got {other:?}"),
    }
}
