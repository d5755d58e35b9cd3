//! Game-shape parameters and the shared four-integer text grammar.

use crate::error::RulesError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::instrument;

/// Smallest allowed rank or file count.
const MIN_DIMENSION: usize = 4;

/// Immutable shape of a game: board dimensions and where each dux starts.
///
/// The compressed text form is `"rankCount,fileCount,whiteDuxFile,blackDuxFile"`,
/// and serde goes through that form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct GameConfig {
    rank_count: usize,
    file_count: usize,
    white_dux_file: usize,
    black_dux_file: usize,
}

impl GameConfig {
    /// Creates a config from its four integers.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::InvalidConfig`] if either dimension is below 4 or
    /// a dux file falls outside the board.
    #[instrument]
    pub fn new(
        rank_count: usize,
        file_count: usize,
        white_dux_file: usize,
        black_dux_file: usize,
    ) -> Result<Self, RulesError> {
        if rank_count < MIN_DIMENSION {
            return Err(RulesError::invalid_config(
                "Rank count must be 4 or greater.",
            ));
        }
        if file_count < MIN_DIMENSION {
            return Err(RulesError::invalid_config(
                "File count must be 4 or greater.",
            ));
        }
        if white_dux_file >= file_count {
            return Err(RulesError::invalid_config(
                "White dux file must be at least 0, and less than file count.",
            ));
        }
        if black_dux_file >= file_count {
            return Err(RulesError::invalid_config(
                "Black dux file must be at least 0, and less than file count.",
            ));
        }
        Ok(Self {
            rank_count,
            file_count,
            white_dux_file,
            black_dux_file,
        })
    }

    /// Parses the compressed form.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::Malformed`] if the text is not four
    /// comma-separated unsigned integers, or [`RulesError::InvalidConfig`] if
    /// the values are out of range.
    #[instrument]
    pub fn from_compressed(compressed: &str) -> Result<Self, RulesError> {
        let [rank_count, file_count, white_dux_file, black_dux_file] =
            parse_quad::<usize>(compressed, "Malformed new game config.")?;
        Self::new(rank_count, file_count, white_dux_file, black_dux_file)
    }

    /// Renders the compressed form.
    pub fn to_compressed(&self) -> String {
        self.to_string()
    }

    /// Number of ranks (rows).
    pub fn rank_count(&self) -> usize {
        self.rank_count
    }

    /// Number of files (columns).
    pub fn file_count(&self) -> usize {
        self.file_count
    }

    /// File of the white dux, on the second-to-last rank.
    pub fn white_dux_file(&self) -> usize {
        self.white_dux_file
    }

    /// File of the black dux, on rank 1.
    pub fn black_dux_file(&self) -> usize {
        self.black_dux_file
    }
}

impl Default for GameConfig {
    /// The standard 8x12 board.
    fn default() -> Self {
        Self {
            rank_count: 8,
            file_count: 12,
            white_dux_file: 6,
            black_dux_file: 5,
        }
    }
}

impl std::fmt::Display for GameConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.rank_count, self.file_count, self.white_dux_file, self.black_dux_file
        )
    }
}

impl FromStr for GameConfig {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_compressed(s)
    }
}

impl From<GameConfig> for String {
    fn from(config: GameConfig) -> Self {
        config.to_string()
    }
}

impl TryFrom<String> for GameConfig {
    type Error = RulesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_compressed(&s)
    }
}

/// Parses `^\d+,\d+,\d+,\d+$` into four integers.
///
/// Signs, whitespace, empty fields and overflow are all rejected with
/// `malformed_message`.
pub(crate) fn parse_quad<T: FromStr>(text: &str, malformed_message: &str) -> Result<[T; 4], RulesError> {
    let field = |part: &str| -> Result<T, RulesError> {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RulesError::malformed(malformed_message));
        }
        part.parse::<T>()
            .map_err(|_| RulesError::malformed(malformed_message))
    };

    let parts: Vec<&str> = text.split(',').collect();
    let [a, b, c, d] = parts.as_slice() else {
        return Err(RulesError::malformed(malformed_message));
    };
    Ok([field(a)?, field(b)?, field(c)?, field(d)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_standard_board() {
        assert_eq!(GameConfig::default().to_compressed(), "8,12,6,5");
    }

    #[test]
    fn test_parse_valid() {
        let config: GameConfig = "5,5,3,2".parse().unwrap();
        assert_eq!(config.rank_count(), 5);
        assert_eq!(config.file_count(), 5);
        assert_eq!(config.white_dux_file(), 3);
        assert_eq!(config.black_dux_file(), 2);
        assert_eq!(config.to_string(), "5,5,3,2");
    }

    #[test]
    fn test_small_dimensions_rejected() {
        assert!(matches!(
            GameConfig::new(3, 8, 0, 0),
            Err(RulesError::InvalidConfig(_))
        ));
        assert!(matches!(
            GameConfig::new(8, 3, 0, 0),
            Err(RulesError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_dux_outside_board_rejected() {
        assert!(matches!(
            GameConfig::new(8, 8, 8, 0),
            Err(RulesError::InvalidConfig(_))
        ));
        assert!(matches!(
            GameConfig::new(8, 8, 0, 9),
            Err(RulesError::InvalidConfig(_))
        ));
        assert!(GameConfig::new(4, 4, 3, 0).is_ok());
    }

    #[test]
    fn test_grammar_violations_are_malformed() {
        for text in [
            "", "5,5,3", "5,5,3,2,1", "5,5,3,-2", " 5,5,3,2", "5,5,3,2 ", "a,5,3,2", "5,,3,2",
            "5.0,5,3,2", "99999999999999999999999,5,3,2",
        ] {
            assert!(
                matches!(GameConfig::from_compressed(text), Err(RulesError::Malformed(_))),
                "expected malformed for {text:?}"
            );
        }
    }

    #[test]
    fn test_range_violation_after_valid_grammar_is_invalid_config() {
        assert!(matches!(
            GameConfig::from_compressed("5,5,5,2"),
            Err(RulesError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_serde_uses_compressed_form() {
        let config = GameConfig::new(6, 7, 1, 2).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, "\"6,7,1,2\"");
        let back: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert!(serde_json::from_str::<GameConfig>("\"2,7,1,2\"").is_err());
    }
}
