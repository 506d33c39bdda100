#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use mindspan_core::{GameKind, SessionRecord};

const TRANSFER_DOMAIN: &str = "mindspan";
const TRANSFER_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded history payload.
pub(crate) const TRANSFER_HEADER: &str = "mindspan:v1";
/// Delimiter used to separate the prefix, game and payload segments.
const FIELD_DELIMITER: char = ':';

/// Snapshot of one game's recorded history.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct HistorySnapshot {
    /// Game the records belong to.
    pub(crate) game: GameKind,
    /// Records composing the history, oldest first.
    pub(crate) records: Vec<SessionRecord>,
}

impl HistorySnapshot {
    /// Encodes the snapshot into a single-line string suitable for clipboard transfer.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let json =
            serde_json::to_vec(&self.records).expect("history snapshot serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{TRANSFER_HEADER}:{}:{encoded}", self.game.slug())
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, HistoryTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(HistoryTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(HistoryTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(HistoryTransferError::MissingVersion)?;
        let game = parts.next().ok_or(HistoryTransferError::MissingGame)?;
        let payload = parts.next().ok_or(HistoryTransferError::MissingPayload)?;

        if domain != TRANSFER_DOMAIN {
            return Err(HistoryTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != TRANSFER_VERSION {
            return Err(HistoryTransferError::UnsupportedVersion(version.to_owned()));
        }
        let game = GameKind::from_slug(game)
            .ok_or_else(|| HistoryTransferError::UnknownGame(game.to_owned()))?;

        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(HistoryTransferError::InvalidEncoding)?;
        let records: Vec<SessionRecord> =
            serde_json::from_slice(&bytes).map_err(HistoryTransferError::InvalidPayload)?;

        if let Some(stray) = records.iter().find(|record| record.game != game) {
            return Err(HistoryTransferError::MismatchedRecord {
                date: stray.date.clone(),
                game: stray.game,
            });
        }

        Ok(Self { game, records })
    }
}

/// Errors that can occur while decoding history transfer strings.
#[derive(Debug)]
pub(crate) enum HistoryTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded history.
    MissingPrefix,
    /// The encoded history did not contain a version segment.
    MissingVersion,
    /// The encoded history did not name a game.
    MissingGame,
    /// The encoded history did not include the payload segment.
    MissingPayload,
    /// The encoded history used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded history used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The encoded history named a game this build does not know.
    UnknownGame(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
    /// The payload held a record belonging to a different game.
    MismatchedRecord {
        /// Date of the record that did not match.
        date: String,
        /// Game the stray record belongs to.
        game: GameKind,
    },
}

impl fmt::Display for HistoryTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "transfer payload was empty"),
            Self::MissingPrefix => write!(f, "transfer string is missing the prefix"),
            Self::MissingVersion => write!(f, "transfer string is missing the version"),
            Self::MissingGame => write!(f, "transfer string is missing the game"),
            Self::MissingPayload => write!(f, "transfer string is missing the payload"),
            Self::InvalidPrefix(prefix) => {
                write!(f, "transfer prefix '{prefix}' is not supported")
            }
            Self::UnsupportedVersion(version) => {
                write!(f, "transfer version '{version}' is not supported")
            }
            Self::UnknownGame(game) => write!(f, "transfer names unknown game '{game}'"),
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode transfer payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse transfer payload: {error}")
            }
            Self::MismatchedRecord { date, game } => {
                write!(
                    f,
                    "record dated {date} belongs to {} rather than the named game",
                    game.slug()
                )
            }
        }
    }
}

impl Error for HistoryTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindspan_core::{Level, Score};

    fn record(date: &str, game: GameKind) -> SessionRecord {
        SessionRecord {
            date: date.to_owned(),
            game,
            level: Level::new(6),
            score: Score::new(150),
            won: true,
            seconds: 80,
        }
    }

    #[test]
    fn round_trip_empty_history() {
        let snapshot = HistorySnapshot {
            game: GameKind::DigitSpan,
            records: Vec::new(),
        };

        let encoded = snapshot.encode();
        assert!(encoded.starts_with(&format!("{TRANSFER_HEADER}:digit-span:")));

        let decoded = HistorySnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn round_trip_recorded_history() {
        let snapshot = HistorySnapshot {
            game: GameKind::NumberSort,
            records: vec![
                record("2024-03-01", GameKind::NumberSort),
                record("2024-03-02", GameKind::NumberSort),
            ],
        };

        let encoded = snapshot.encode();
        let decoded = HistorySnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn foreign_prefixes_are_rejected() {
        let error = HistorySnapshot::decode("brainultra:v1:digit-span:e30").expect_err("prefix");
        assert!(matches!(error, HistoryTransferError::InvalidPrefix(_)));
    }

    #[test]
    fn future_versions_are_rejected() {
        let error = HistorySnapshot::decode("mindspan:v9:digit-span:e30").expect_err("version");
        assert!(matches!(error, HistoryTransferError::UnsupportedVersion(_)));
    }

    #[test]
    fn unknown_games_are_rejected() {
        let error = HistorySnapshot::decode("mindspan:v1:tetris:e30").expect_err("game");
        assert!(matches!(error, HistoryTransferError::UnknownGame(_)));
    }

    #[test]
    fn garbage_payloads_are_rejected() {
        let error =
            HistorySnapshot::decode("mindspan:v1:digit-span:!!not-base64!!").expect_err("payload");
        assert!(matches!(error, HistoryTransferError::InvalidEncoding(_)));
    }

    #[test]
    fn stray_records_for_other_games_are_rejected() {
        let snapshot = HistorySnapshot {
            game: GameKind::DigitSpan,
            records: vec![
                record("2024-03-01", GameKind::DigitSpan),
                record("2024-03-02", GameKind::VerbalFluency),
            ],
        };

        let error = HistorySnapshot::decode(&snapshot.encode()).expect_err("mismatch");
        assert!(matches!(
            error,
            HistoryTransferError::MismatchedRecord { .. }
        ));
    }

    #[test]
    fn blank_input_is_rejected() {
        let error = HistorySnapshot::decode("   ").expect_err("blank");
        assert!(matches!(error, HistoryTransferError::EmptyPayload));
    }
}
