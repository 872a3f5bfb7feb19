//! Lightweight inspection of FEN board-state strings.
//!
//! The controller never needs a full board; it only reads the side to move,
//! rewrites it for threat analysis, and counts pieces for the estimator.

use crate::error::FenError;
use crate::types::Color;

/// Piece letters counted towards the estimator's complexity floor.
const NON_PAWN_KING: [char; 4] = ['n', 'b', 'r', 'q'];

fn fields(fen: &str) -> Result<Vec<&str>, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(FenError::TooFewParts { found: parts.len() });
    }
    Ok(parts)
}

fn parse_side(field: &str) -> Result<Color, FenError> {
    match field {
        "w" => Ok(Color::White),
        "b" => Ok(Color::Black),
        other => Err(FenError::InvalidSideToMove {
            found: other.to_string(),
        }),
    }
}

/// Parse the side to move.
pub fn side_to_move(fen: &str) -> Result<Color, FenError> {
    let parts = fields(fen)?;
    parse_side(parts[1])
}

/// Return `fen` with its side-to-move field replaced by `color`.
///
/// All other fields are kept as they are.
pub fn with_side_to_move(fen: &str, color: Color) -> Result<String, FenError> {
    let side = color.fen_char().to_string();
    let mut parts = fields(fen)?;
    parse_side(parts[1])?;
    parts[1] = &side;
    Ok(parts.join(" "))
}

/// Count knights, bishops, rooks and queens of both colors.
#[must_use]
pub fn count_non_pawn_king(fen: &str) -> usize {
    fen.split_whitespace()
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| NON_PAWN_KING.contains(&c.to_ascii_lowercase()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_side_to_move() {
        assert_eq!(side_to_move(START), Ok(Color::White));
        assert_eq!(
            side_to_move("8/8/8/8/8/8/8/8 b - - 0 1"),
            Ok(Color::Black)
        );
    }

    #[test]
    fn test_with_side_to_move_keeps_other_fields() {
        let flipped = with_side_to_move(START, Color::Black).expect("valid fen");
        assert_eq!(
            flipped,
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_malformed_fen() {
        assert_eq!(
            side_to_move("rnbqkbnr/pppppppp"),
            Err(FenError::TooFewParts { found: 1 })
        );
        assert!(matches!(
            with_side_to_move("8/8/8/8/8/8/8/8 x - - 0 1", Color::White),
            Err(FenError::InvalidSideToMove { .. })
        ));
    }

    #[test]
    fn test_count_non_pawn_king() {
        assert_eq!(count_non_pawn_king(START), 14);
        assert_eq!(count_non_pawn_king("4k3/pppppppp/8/8/8/8/PPPPPPPP/4K3 w - - 0 1"), 0);
        // Side-to-move and castling letters must not be counted.
        assert_eq!(count_non_pawn_king("4k3/8/8/8/8/8/8/R3K3 b Q - 0 1"), 1);
    }
}
