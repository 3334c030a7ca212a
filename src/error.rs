use thiserror::Error;

use crate::board::{PieceId, Side, Square};

/// Why a move request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveRejection {
    #[error("no piece on {from}")]
    EmptySource { from: Square },

    #[error("piece {piece} cannot reach {to}")]
    IllegalDestination { piece: PieceId, to: Square },

    #[error("it is {to_move}'s turn")]
    WrongTurn { to_move: Side },

    #[error("black is played by the bot")]
    BotControlled,

    #[error("a move is still being applied")]
    TransactionInFlight,

    #[error("the game is over, {winner} won")]
    GameOver { winner: Side },
}

/// Errors reported by the engine. None of them are fatal: the game stays in
/// the last consistent state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid move: {0}")]
    InvalidMove(#[from] MoveRejection),

    #[error("invalid coordinate: {0:?}")]
    InvalidCoordinate(String),

    #[error("no such piece: {0}")]
    NoSuchPiece(PieceId),

    #[error("square out of range: file {file}, rank {rank}")]
    SquareOutOfRange { file: i16, rank: i16 },
}

impl EngineError {
    /// Malformed coordinates are reported separately but belong to the
    /// invalid-move family.
    pub fn is_invalid_move(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidMove(_) | EngineError::InvalidCoordinate(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let sq: Square = "D5".parse().unwrap();
        let err = EngineError::from(MoveRejection::EmptySource { from: sq });
        assert_eq!(err.to_string(), "invalid move: no piece on D5");

        let err = EngineError::from(MoveRejection::WrongTurn { to_move: Side::Black });
        assert_eq!(err.to_string(), "invalid move: it is black's turn");

        let err = EngineError::InvalidCoordinate("Z9".to_string());
        assert_eq!(err.to_string(), "invalid coordinate: \"Z9\"");
    }

    #[test]
    fn test_invalid_move_family() {
        assert!(EngineError::InvalidCoordinate("E".to_string()).is_invalid_move());
        assert!(EngineError::from(MoveRejection::BotControlled).is_invalid_move());
        assert!(!EngineError::NoSuchPiece(PieceId(3)).is_invalid_move());
        assert!(!EngineError::SquareOutOfRange { file: 8, rank: 0 }.is_invalid_move());
    }
}
