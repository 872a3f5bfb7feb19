//! Error types for the boundaries of the session controller.
//!
//! Control methods never fail; these errors only surface where untyped text
//! enters the crate (board-state strings and textual option updates).

use thiserror::Error;

/// Error type for board-state (FEN) inspection failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    /// FEN string has too few fields (needs at least placement and side to move)
    #[error("FEN must have at least 2 fields, found {found}")]
    TooFewParts { found: usize },
    /// Invalid side to move (must be 'w' or 'b')
    #[error("Invalid side to move '{found}', expected 'w' or 'b'")]
    InvalidSideToMove { found: String },
}

/// Error type for work descriptor construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkError {
    /// The step sequence was empty
    #[error("Cannot analyse an empty step sequence")]
    NoSteps,
    /// A non-root step carries no move
    #[error("Step at ply {ply} has no move")]
    MissingMove { ply: u32 },
    /// The board state of the analysed step is malformed
    #[error(transparent)]
    Fen(#[from] FenError),
}

/// Error type for textual settings updates
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// No setting with this name exists
    #[error("Unknown option '{name}'")]
    UnknownOption { name: String },
    /// The option requires a value but none was given
    #[error("Option '{name}' requires a value")]
    MissingValue { name: String },
    /// The value could not be parsed for this option
    #[error("Invalid value '{value}' for option '{name}'")]
    InvalidValue { name: String, value: String },
    /// The value parsed but lies outside the accepted range
    #[error("Value {value} for option '{name}' is outside {min}..={max}")]
    OutOfRange {
        name: String,
        value: u32,
        min: u32,
        max: u32,
    },
}
