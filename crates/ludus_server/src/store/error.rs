//! Storage error types.

use derive_more::{Display, Error};
use tracing::instrument;

/// What kind of storage failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StoreErrorKind {
    /// The record does not exist.
    NotFound,
    /// A write raced another writer; the caller may retry.
    Conflict,
    /// Any other backend failure.
    Backend,
}

/// Storage error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Store error ({}): {} at {}:{}", kind, message, file, line)]
pub struct StoreError {
    /// Failure kind.
    pub kind: StoreErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a new storage error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Record missing.
    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound, message)
    }

    /// Write raced another writer.
    #[track_caller]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Conflict, message)
    }

    /// Generic backend failure.
    #[track_caller]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Backend, message)
    }

    /// Whether the failed operation can be retried as-is.
    pub fn is_conflict(&self) -> bool {
        self.kind == StoreErrorKind::Conflict
    }
}

impl From<diesel::result::Error> for StoreError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match &err {
            Error::NotFound => Self::not_found("Record not found"),
            Error::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
                Self::conflict(format!("Diesel error: {}", err))
            }
            Error::DatabaseError(_, info) if is_busy(info.message()) => {
                Self::conflict(format!("Diesel error: {}", err))
            }
            _ => Self::backend(format!("Diesel error: {}", err)),
        }
    }
}

impl From<diesel::ConnectionError> for StoreError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::backend(format!("Connection error: {}", err))
    }
}

/// SQLite reports lock contention only through its message text.
fn is_busy(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("database is locked") || message.contains("busy")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_from_diesel() {
        let err: StoreError = diesel::result::Error::NotFound.into();
        assert_eq!(err.kind, StoreErrorKind::NotFound);
    }

    #[test]
    fn test_busy_messages_are_conflicts() {
        assert!(is_busy("database is locked"));
        assert!(is_busy("SQLITE_BUSY: database table is locked"));
        assert!(!is_busy("no such table: games"));
    }

    #[test]
    fn test_location_is_recorded() {
        let err = StoreError::backend("boom");
        assert!(err.file.ends_with("error.rs"));
        assert!(err.line > 0);
        assert!(!err.is_conflict());
    }
}
