//! Request-level error taxonomy.

use crate::store::{StoreError, StoreErrorKind};
use derive_more::{Display, Error};
use ludus_rules::RulesError;
use tracing::instrument;

/// Message shown to players when a game id does not resolve.
const GAME_DOESNT_EXIST: &str =
    "No game exists with the given ID. Maybe you aren't using the full link?";

/// Message shown to players whose seat id does not belong to the game.
const UNAUTHORIZED: &str = "Player with given id does not have access to game with given id.";

/// Closed set of failure kinds reported to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structural or grammar parse failure.
    Malformed,
    /// Config values violate range rules.
    InvalidConfig,
    /// Rule violation, wrong turn, or game already won.
    IllegalMove,
    /// Both seats are claimed.
    GameFull {
        /// Name in the white seat.
        white_name: String,
        /// Name in the black seat.
        black_name: String,
    },
    /// Game id not found.
    GameDoesntExist,
    /// Seat id does not belong to the game.
    Unauthorized,
    /// Storage or backend failure.
    Internal,
}

impl ErrorKind {
    /// Wire name used in the `error` field of responses.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Malformed => "MalformedError",
            Self::InvalidConfig => "InvalidConfigError",
            Self::IllegalMove => "IllegalMoveError",
            Self::GameFull { .. } => "GameFullError",
            Self::GameDoesntExist => "GameDoesntExistError",
            Self::Unauthorized => "UnauthorizedError",
            Self::Internal => "InternalServerError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Server error with kind, message and location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("{}: {} at {}:{}", kind, message, file, line)]
pub struct LudusError {
    /// What went wrong, as reported to clients.
    pub kind: ErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl LudusError {
    /// Creates a new error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Structural or grammar parse failure.
    #[track_caller]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Malformed, message)
    }

    /// Config outside the accepted range.
    #[track_caller]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfig, message)
    }

    /// Move rejected by the rules or by turn order.
    #[track_caller]
    pub fn illegal_move(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IllegalMove, message)
    }

    /// Both seats taken.
    #[track_caller]
    pub fn game_full(white_name: impl Into<String>, black_name: impl Into<String>) -> Self {
        let (white_name, black_name) = (white_name.into(), black_name.into());
        let message = format!(
            "You cannot join that game because it is already joined by players named '{}' and '{}'.",
            white_name, black_name
        );
        Self::new(
            ErrorKind::GameFull {
                white_name,
                black_name,
            },
            message,
        )
    }

    /// Unknown game id.
    #[track_caller]
    pub fn game_doesnt_exist() -> Self {
        Self::new(ErrorKind::GameDoesntExist, GAME_DOESNT_EXIST)
    }

    /// Seat id not part of the game.
    #[track_caller]
    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized, UNAUTHORIZED)
    }

    /// Backend failure. The message is for logs only.
    #[track_caller]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Message safe to send to clients; internal detail is replaced.
    pub fn public_message(&self) -> &str {
        match self.kind {
            ErrorKind::Internal => ErrorKind::Internal.name(),
            _ => &self.message,
        }
    }
}

impl From<RulesError> for LudusError {
    #[track_caller]
    fn from(err: RulesError) -> Self {
        match err {
            RulesError::Malformed(message) => Self::malformed(message),
            RulesError::InvalidConfig(message) => Self::invalid_config(message),
            RulesError::IllegalMove(message) => Self::illegal_move(message),
        }
    }
}

impl From<StoreError> for LudusError {
    #[track_caller]
    fn from(err: StoreError) -> Self {
        match err.kind {
            StoreErrorKind::NotFound => Self::game_doesnt_exist(),
            StoreErrorKind::Conflict | StoreErrorKind::Backend => Self::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(LudusError::malformed("x").kind.name(), "MalformedError");
        assert_eq!(LudusError::unauthorized().kind.name(), "UnauthorizedError");
        assert_eq!(
            LudusError::game_full("a", "b").kind.name(),
            "GameFullError"
        );
    }

    #[test]
    fn test_game_full_names_both_players() {
        let err = LudusError::game_full("Marcus", "Livia");
        assert_eq!(
            err.message,
            "You cannot join that game because it is already joined by players named 'Marcus' and 'Livia'."
        );
        assert_eq!(
            err.kind,
            ErrorKind::GameFull {
                white_name: "Marcus".to_string(),
                black_name: "Livia".to_string()
            }
        );
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = LudusError::internal("disk on fire");
        assert_eq!(err.public_message(), "InternalServerError");
        assert!(err.to_string().contains("disk on fire"));
        assert_eq!(LudusError::malformed("bad").public_message(), "bad");
    }

    #[test]
    fn test_rules_errors_keep_kind_and_message() {
        let err: LudusError = RulesError::illegal_move("Move is obstructed.").into();
        assert_eq!(err.kind, ErrorKind::IllegalMove);
        assert_eq!(err.message, "Move is obstructed.");
        let err: LudusError = RulesError::invalid_config("too small").into();
        assert_eq!(err.kind, ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_store_errors_map_to_missing_game_or_internal() {
        let err: LudusError = StoreError::not_found("game abc").into();
        assert_eq!(err.kind, ErrorKind::GameDoesntExist);
        assert!(err.message.contains("full link"));
        let err: LudusError = StoreError::conflict("locked").into();
        assert_eq!(err.kind, ErrorKind::Internal);
    }
}
