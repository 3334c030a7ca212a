use std::fmt;

use crate::board::{Piece, PieceId, PieceKind, Side, Square};
use crate::corruption::{CorruptionEffect, SpreadPattern};

/// A black piece turned back into a fresh white one by a cleanse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reversion {
    pub from: PieceId,
    pub to: PieceId,
    pub kind: PieceKind,
    pub square: Square,
}

/// Everything the engine reports to whoever is drawing the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Moved {
        piece: PieceId,
        kind: PieceKind,
        side: Side,
        from: Square,
        to: Square,
    },
    Captured {
        piece: PieceId,
        kind: PieceKind,
        side: Side,
        square: Square,
    },
    CorruptionSeeded {
        squares: Vec<Square>,
    },
    CorruptionSpread {
        pattern: SpreadPattern,
        squares: Vec<Square>,
    },
    CorruptionApplied {
        piece: PieceId,
        kind: PieceKind,
        square: Square,
        effect: CorruptionEffect,
        result: Piece,
    },
    Cleansed {
        king: Square,
        squares: Vec<Square>,
        reverted: Vec<Reversion>,
    },
    TurnSwitched {
        to_move: Side,
        black_turns: u32,
    },
    Passed {
        side: Side,
    },
    GameOver {
        winner: Side,
    },
}

struct SquareList<'a>(&'a [Square]);

impl fmt::Display for SquareList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("-");
        }
        for (i, sq) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", sq)?;
        }
        Ok(())
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GameEvent::Moved {
                piece,
                kind,
                side,
                from,
                to,
            } => write!(
                f,
                "move piece={} kind={} side={} from={} to={}",
                piece, kind, side, from, to
            ),
            GameEvent::Captured {
                piece,
                kind,
                side,
                square,
            } => write!(
                f,
                "capture piece={} kind={} side={} square={}",
                piece, kind, side, square
            ),
            GameEvent::CorruptionSeeded { squares } => {
                write!(f, "corruption-seed squares={}", SquareList(squares))
            }
            GameEvent::CorruptionSpread { pattern, squares } => write!(
                f,
                "corruption-spread pattern={} squares={}",
                pattern,
                SquareList(squares)
            ),
            GameEvent::CorruptionApplied {
                piece,
                kind,
                square,
                effect,
                result,
            } => write!(
                f,
                "corruption-effect piece={} kind={} square={} effect={} result={}:{}:{}@{}",
                piece, kind, square, effect, result.id, result.side, result.kind, result.square
            ),
            GameEvent::Cleansed {
                king,
                squares,
                reverted,
            } => {
                write!(
                    f,
                    "cleanse king={} squares={} reverted=",
                    king,
                    SquareList(squares)
                )?;
                if reverted.is_empty() {
                    return f.write_str("-");
                }
                for (i, r) in reverted.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}->{}:{}@{}", r.from, r.to, r.kind, r.square)?;
                }
                Ok(())
            }
            GameEvent::TurnSwitched {
                to_move,
                black_turns,
            } => write!(f, "turn side={} black-turns={}", to_move, black_turns),
            GameEvent::Passed { side } => write!(f, "pass side={}", side),
            GameEvent::GameOver { winner } => write!(f, "game-over winner={}", winner),
        }
    }
}
