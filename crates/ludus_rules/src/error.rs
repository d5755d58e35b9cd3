//! Errors raised while parsing game input or applying moves.

/// Failure produced by the rules engine.
///
/// Every variant carries a human-readable message that is safe to show to
/// players.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RulesError {
    /// Input failed structural or grammar parsing.
    #[display("{}", _0)]
    Malformed(String),

    /// Game config values violate the range rules.
    #[display("{}", _0)]
    InvalidConfig(String),

    /// A move broke a rule of play, or the game is already won.
    #[display("{}", _0)]
    IllegalMove(String),
}

impl RulesError {
    /// Creates a [`RulesError::Malformed`].
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Creates a [`RulesError::InvalidConfig`].
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Creates a [`RulesError::IllegalMove`].
    pub fn illegal_move(message: impl Into<String>) -> Self {
        Self::IllegalMove(message.into())
    }

    /// Returns the message without the variant.
    pub fn message(&self) -> &str {
        match self {
            Self::Malformed(m) | Self::InvalidConfig(m) | Self::IllegalMove(m) => m,
        }
    }
}

impl std::error::Error for RulesError {}
