#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reporting system that forwards finished sessions to a persistence sink.
//!
//! The session publishes [`Event::SessionEnded`] exactly once; this system
//! stamps the closing summary with the current date and hands the resulting
//! [`SessionRecord`] to an injected sink. Abandoned sessions leave no record.
//! The sink is a closure so the system itself stays free of IO.

use mindspan_core::{Event, SessionRecord, SessionSummary};

/// Pure reporting system covering one session.
#[derive(Debug, Default)]
pub struct Reporter {
    delivered: bool,
    last_record: Option<SessionRecord>,
}

impl Reporter {
    /// Creates a reporter that has not yet delivered a record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record delivered to the sink, if any.
    #[must_use]
    pub fn last_record(&self) -> Option<&SessionRecord> {
        self.last_record.as_ref()
    }

    /// Consumes session events, delivering at most one dated record.
    ///
    /// `today` is the calendar date (`YYYY-MM-DD`) stamped onto the record;
    /// the adapter owns the clock. The `deliver` closure is invoked at most
    /// once over the reporter's lifetime, even if the event batch is replayed.
    pub fn handle<F>(&mut self, events: &[Event], today: &str, mut deliver: F)
    where
        F: FnMut(&SessionRecord),
    {
        for event in events {
            if let Event::SessionEnded { summary } = event {
                if self.delivered {
                    continue;
                }
                self.delivered = true;
                let record = record_from_summary(summary, today);
                deliver(&record);
                self.last_record = Some(record);
            }
        }
    }
}

/// Converts a closing summary into the persisted record shape.
#[must_use]
pub fn record_from_summary(summary: &SessionSummary, today: &str) -> SessionRecord {
    SessionRecord {
        date: today.to_owned(),
        game: summary.game,
        level: summary.highest_level,
        score: summary.score,
        won: summary.outcome.is_win(),
        seconds: summary.elapsed.as_secs(),
    }
}
